//! # Report Relay CLI
//!
//! Command-line front end for the report relay protocol.
//!
//! This module provides:
//! - `dispatch`: submit a payload file to a report request queue
//! - `retrieve`: fetch a generated report from the result bucket
//!
//! Both commands load AWS credentials from a `.env`-style file, overridable
//! by `AWS_*` environment variables, and print their result to stdout.
//! Progress is logged to stderr.

use clap::{Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use report_relay_core::providers::{S3ObjectStore, SqsQueueService};
use report_relay_core::{
    ConfigurationError, CredentialSettings, DispatchReceipt, MessageDispatcher, ObjectStore,
    PollPolicy, ProviderError, QueueAddress, QueueResolution, QueueResolver, QueueService,
    RelayConfig, RelayError, ResultRetriever, RetrievalTarget, RetrievedArtifact,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Credentials file read when `--env` is not given
pub const DEFAULT_ENV_FILE: &str = ".env.aws";

/// Bucket the report service writes results to
pub const DEFAULT_BUCKET: &str = "bp-temp-us";

/// Prefix shared by the environment variables that override the credentials file
const ENV_PREFIX: &str = "AWS";

// ============================================================================
// CLI Structure
// ============================================================================

/// Report Relay - submit report requests and collect the results
#[derive(Debug, Parser)]
#[command(name = "report-relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Submit report requests to a queue and download the results")]
pub struct Cli {
    /// Credentials file with AWS_* settings
    #[arg(short, long, default_value = DEFAULT_ENV_FILE)]
    pub env: PathBuf,

    /// Logging level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a report request
    Dispatch {
        /// File holding the message body (normally JSON)
        #[arg(short, long)]
        payload: PathBuf,

        /// Queue URL or queue name; omit to list available queues
        #[arg(short, long)]
        queue: Option<String>,

        /// Only list queues whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Download a generated report
    Retrieve {
        /// Object key of the result
        key: String,

        /// Bucket holding the result
        #[arg(short, long, default_value = DEFAULT_BUCKET)]
        bucket: String,

        /// Where to save the result (defaults to the key)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep polling until the result exists
        #[arg(short, long)]
        wait: bool,
    },
}

// ============================================================================
// Errors
// ============================================================================

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("No queue selected ({} available); specify one with --queue", .candidates.len())]
    QueueSelectionRequired { candidates: Vec<QueueAddress> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::QueueSelectionRequired { .. } => 10,
            Self::Relay(e) => match e {
                RelayError::ResolutionFailed { .. } => 3,
                RelayError::ServiceUnavailable { .. } => 4,
                RelayError::SubmissionFailed { .. } => 5,
                RelayError::NotFound { .. } => 6,
                RelayError::Timeout { .. } => 7,
                RelayError::HardFailure { .. } => 8,
            },
            Self::Io(_) => 9,
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(e: config::ConfigError) -> Self {
        Self::Configuration(ConfigurationError::Parsing {
            message: e.to_string(),
        })
    }
}

/// Client construction only fails on settings the providers cannot use
fn provider_setup_error(e: ProviderError) -> CliError {
    CliError::Configuration(ConfigurationError::Invalid {
        message: e.to_string(),
    })
}

// ============================================================================
// Main CLI Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let config = load_configuration(&cli.env)?;

    match cli.command {
        Commands::Dispatch {
            payload,
            queue,
            prefix,
        } => execute_dispatch_command(&config, &payload, queue, prefix).await,
        Commands::Retrieve {
            key,
            bucket,
            output,
            wait,
        } => execute_retrieve_command(&config, bucket, key, output, wait).await,
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over `--log-level`. Logs go to stderr so stdout only
/// carries command results.
pub fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .map_err(|e| ConfigurationError::Invalid {
            message: format!("invalid log level '{}': {}", cli.log_level, e),
        })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| {
        CliError::Configuration(ConfigurationError::Invalid {
            message: format!("failed to initialize logging: {}", e),
        })
    })
}

// ============================================================================
// Configuration
// ============================================================================

/// Build the client configuration from a credentials file and the environment
///
/// The file must exist. `AWS_*` environment variables override its values.
pub fn load_configuration(env_file: &Path) -> Result<RelayConfig, CliError> {
    load_configuration_with(
        env_file,
        Environment::with_prefix(ENV_PREFIX).keep_prefix(true),
    )
}

fn load_configuration_with(
    env_file: &Path,
    environment: Environment,
) -> Result<RelayConfig, CliError> {
    if !env_file.is_file() {
        return Err(ConfigurationError::Missing {
            key: format!("credentials file {}", env_file.display()),
        }
        .into());
    }

    // `.env` files are flat KEY=value lines, which the INI parser reads as
    // keys outside any section
    let file_values = read_values(
        Config::builder().add_source(
            File::new(&env_file.to_string_lossy(), FileFormat::Ini).required(true),
        ),
    )?;
    let env_values = read_values(Config::builder().add_source(environment))?;
    debug!(
        file = %env_file.display(),
        file_keys = file_values.len(),
        env_keys = env_values.len(),
        "Loaded configuration sources"
    );

    let settings = CredentialSettings::from_pairs(
        file_values
            .into_iter()
            .chain(env_values)
            .map(|(key, value)| (key, unquote(&value).to_string())),
    );

    let config = RelayConfig::from_settings(settings)?;
    info!(
        region = %config.region,
        endpoint = ?config.endpoint_url,
        "Configuration loaded"
    );
    Ok(config)
}

fn read_values(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<HashMap<String, String>, CliError> {
    Ok(builder.build()?.try_deserialize()?)
}

/// Strip one pair of matching surrounding quotes
fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Resolve the queue, then read the payload file and send it
///
/// Without a queue identifier the available queues are returned as
/// `QueueSelectionRequired`; the payload file is not touched and nothing is
/// sent.
pub async fn dispatch_payload<Q: QueueService + ?Sized>(
    service: &Q,
    payload: &Path,
    queue: Option<&str>,
    prefix: Option<&str>,
) -> Result<DispatchReceipt, CliError> {
    let address = match QueueResolver::new(service).resolve(queue, prefix).await? {
        QueueResolution::Resolved(address) => address,
        QueueResolution::Candidates(candidates) => {
            return Err(CliError::QueueSelectionRequired { candidates })
        }
    };

    let body = tokio::fs::read(payload).await?;
    info!(payload = %payload.display(), size_bytes = body.len(), "Read payload");

    Ok(MessageDispatcher::new(service)
        .dispatch(&address, &body)
        .await?)
}

/// Fetch a result and save it locally
pub async fn retrieve_result<S: ObjectStore + ?Sized>(
    store: &S,
    target: &RetrievalTarget,
    wait: bool,
) -> Result<RetrievedArtifact, CliError> {
    Ok(ResultRetriever::new(store, PollPolicy::from_wait_flag(wait))
        .retrieve(target)
        .await?)
}

async fn execute_dispatch_command(
    config: &RelayConfig,
    payload: &Path,
    queue: Option<String>,
    prefix: Option<String>,
) -> Result<(), CliError> {
    let sqs = SqsQueueService::new(config).map_err(provider_setup_error)?;

    match dispatch_payload(&sqs, payload, queue.as_deref(), prefix.as_deref()).await {
        Ok(receipt) => {
            println!("{}", receipt.message_id);
            Ok(())
        }
        Err(CliError::QueueSelectionRequired { candidates }) => {
            for candidate in &candidates {
                println!("{}", candidate);
            }
            println!("Please specify one of the above with --queue");
            Err(CliError::QueueSelectionRequired { candidates })
        }
        Err(e) => Err(e),
    }
}

async fn execute_retrieve_command(
    config: &RelayConfig,
    bucket: String,
    key: String,
    output: Option<PathBuf>,
    wait: bool,
) -> Result<(), CliError> {
    let s3 = S3ObjectStore::new(config).map_err(provider_setup_error)?;
    let target = RetrievalTarget::new(bucket, key, output);

    let artifact = retrieve_result(&s3, &target, wait).await?;
    println!("{}", artifact.path.display());
    Ok(())
}
