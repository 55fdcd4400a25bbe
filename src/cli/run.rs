use crate::cli::{build_controller, invoke, InvocationError};
use crate::config::{expand_tilde, load_or_default, resolve_config_path, Config};
use crate::store::traits::{ObjectReader, TableWriter};
use crate::store::{DynamoDbTableWriter, LocalObjectReader, MemoryTable, S3ObjectReader};
use aws_config::BehaviorVersion;
use aws_lambda_events::event::s3::S3Event;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("transform config error: {0}")]
    Transform(#[from] crate::source::timestamp::TimestampError),

    #[error("failed to read event file '{path}': {source}")]
    EventFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse event file '{path}': {source}")]
    EventParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("lambda runtime error: {0}")]
    Runtime(String),
}

/// Options for a one-shot run from an event file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub event: PathBuf,
    /// Read objects from `<dir>/<bucket>/<key>` instead of S3
    pub local_root: Option<PathBuf>,
    /// Write to an in-memory table instead of DynamoDB
    pub dry_run: bool,
}

pub fn load_run_config(config_path: Option<&Path>) -> Result<Config, RunError> {
    let resolved = resolve_config_path(config_path);
    if let Some(path) = &resolved {
        info!(config_path = %path.display(), "Loading configuration");
    }
    Ok(load_or_default(resolved.as_deref())?)
}

pub fn read_event(path: &Path) -> Result<S3Event, RunError> {
    let text = std::fs::read_to_string(path).map_err(|source| RunError::EventFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| RunError::EventParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Process one event file and print the outcome as JSON.
pub async fn run(config: Config, options: RunOptions) -> Result<(), RunError> {
    let run_id = Uuid::new_v4();
    let event = read_event(&options.event)?;

    let sdk_config = OnceCell::new();
    let load_sdk = || aws_config::load_defaults(BehaviorVersion::latest());

    let reader: Arc<dyn ObjectReader> = match &options.local_root {
        Some(root) => Arc::new(LocalObjectReader::new(expand_tilde(root))),
        None => Arc::new(S3ObjectReader::new(
            sdk_config.get_or_init(load_sdk).await,
            &config.source,
        )),
    };

    let memory = Arc::new(MemoryTable::new());
    let table: Arc<dyn TableWriter> = if options.dry_run {
        memory.clone()
    } else {
        Arc::new(DynamoDbTableWriter::new(
            sdk_config.get_or_init(load_sdk).await,
            &config.table,
        ))
    };

    info!(
        run_id = %run_id,
        event = %options.event.display(),
        records = event.records.len(),
        dry_run = options.dry_run,
        "Starting run"
    );

    let controller = build_controller(&config, reader, table)?;
    let response = invoke(&controller, &event).await?;

    if options.dry_run {
        info!(
            run_id = %run_id,
            captured = memory.items(&config.table.name).len(),
            "Dry run: items kept in memory"
        );
    }

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{}", response.message),
    }

    Ok(())
}
