use clap::{Parser, Subcommand};
use s3ddb::cli::run::{load_run_config, RunOptions};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "s3ddb")]
#[command(about = "Load newline-delimited JSON objects from S3 into DynamoDB", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve S3 notifications from the Lambda runtime (default)
    Lambda,
    /// Process one S3 event file and exit
    Run {
        #[arg(long)]
        event: PathBuf,
        /// Read objects from <DIR>/<bucket>/<key> instead of S3
        #[arg(long, value_name = "DIR")]
        local_root: Option<PathBuf>,
        /// Keep items in memory instead of writing to DynamoDB
        #[arg(long)]
        dry_run: bool,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let in_lambda = matches!(cli.command, Some(Commands::Lambda) | None);

    // CloudWatch does not render ANSI colors
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3ddb=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(!in_lambda))
        .init();

    match cli.command {
        Some(Commands::Lambda) | None => {
            let config = load_run_config(cli.config.as_deref())?;
            s3ddb::cli::lambda::run(config).await?;
        }
        Some(Commands::Run {
            event,
            local_root,
            dry_run,
        }) => {
            let config = load_run_config(cli.config.as_deref())?;
            let options = RunOptions {
                event,
                local_root,
                dry_run,
            };
            s3ddb::cli::run::run(config, options).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                s3ddb::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                let path = s3ddb::config::resolve_config_path(cli.config.as_deref());
                s3ddb::cli::config::validate(path)?;
            }
        },
    }

    Ok(())
}
