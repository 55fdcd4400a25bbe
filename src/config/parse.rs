use super::types::*;
use crate::config::{expand_env_vars, unexpanded_env_vars};
use crate::source::timestamp::TimestampFormat;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Load a config file, apply environment fallbacks, and validate it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut config = parse_config_str(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(err) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), err),
        )),
        other => other,
    })?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config)?;

    Ok(config)
}

/// Load the config at `path` if one was found, otherwise build one from
/// defaults and the process environment.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = Config::default();
            apply_env_overrides(&mut config, |name| std::env::var(name).ok());
            validate_config(&config)?;
            Ok(config)
        }
    }
}

/// Parse YAML text after `$env{VAR}` expansion. Does not validate.
pub fn parse_config_str(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    // An empty file is a valid "all defaults" config
    if yaml_string.trim().is_empty() {
        return Ok(Config::default());
    }

    Ok(serde_yaml::from_str(&yaml_string)?)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let unexpanded = unexpanded_env_vars(yaml_string);
    if unexpanded.is_empty() {
        return Ok(());
    }

    let error_msg = if unexpanded.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with an actual value",
            unexpanded[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with actual values",
            unexpanded.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

/// Fill settings the file left unset from the Lambda-style environment
/// (`TABLE_NAME`, `AWS_REGION`).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if config.table.name.is_empty() {
        if let Some(name) = lookup("TABLE_NAME").filter(|v| !v.is_empty()) {
            config.table.name = name;
        }
    }

    if config.table.region.is_none() {
        config.table.region = lookup("AWS_REGION").filter(|v| !v.is_empty());
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.table.name.trim().is_empty() {
        errors.push(
            "table.name must be set (in the config file or via the TABLE_NAME environment variable)"
                .to_string(),
        );
    }

    validate_transform(&config.transform, &mut errors);
    validate_writer(&config.writer, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_transform(transform: &TransformConfig, errors: &mut Vec<String>) {
    if transform.timestamp_field.is_empty() {
        errors.push("transform.timestamp_field cannot be empty".to_string());
    }

    if let Err(e) = TimestampFormat::parse(&transform.timestamp_format) {
        errors.push(format!("transform.timestamp_format: {}", e));
    }

    let mut seen = HashSet::new();
    for (i, attr) in transform.key_attributes.iter().enumerate() {
        if attr.is_empty() {
            errors.push(format!("transform.key_attributes[{}]: cannot be empty", i));
        } else if !seen.insert(attr) {
            errors.push(format!(
                "transform.key_attributes[{}]: duplicate attribute '{}'",
                i, attr
            ));
        }
    }
}

fn validate_writer(writer: &WriterConfig, errors: &mut Vec<String>) {
    if writer.batch_size == 0 || writer.batch_size > MAX_BATCH_SIZE {
        errors.push(format!(
            "writer.batch_size must be between 1 and {} (got {})",
            MAX_BATCH_SIZE, writer.batch_size
        ));
    }

    if writer.backoff.min >= writer.backoff.max {
        errors.push(format!(
            "writer.backoff.min ({:?}) must be less than writer.backoff.max ({:?})",
            writer.backoff.min, writer.backoff.max
        ));
    }

    if writer.throttling_errors.is_empty() {
        errors.push("writer.throttling_errors must name at least one error code".to_string());
    }
}
