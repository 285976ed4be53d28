//! s3-safe-upload - upload a file to S3 unless it is already there
//!
//! Exits 0 when the selected operation succeeds and 1 otherwise. In `exists`
//! mode, 0 means the object is present.

use clap::{Parser, ValueEnum};
use s3_safe_upload::config::{ConfigLoader, StoreConfig};
use s3_safe_upload::logging::{init_logging, LogFormat};
use s3_safe_upload::upload::{CheckErrorPolicy, Uploader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Operation to run against the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Upload only if no object with the same name exists
    Safe,
    /// Upload without checking for an existing object
    Upload,
    /// Only check whether the object exists
    Exists,
}

/// Upload a local file to an S3-compatible bucket, skipping it if an object
/// with the same name already exists
#[derive(Parser, Debug)]
#[command(name = "s3-safe-upload")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Local file to upload; its base name is the object key
    file: PathBuf,

    /// YAML settings file (the environment is used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings file loaded into the environment first (default: .env if present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Operation to run
    #[arg(short, long, value_enum, default_value_t = Mode::Safe)]
    mode: Mode,

    /// Do not upload when the existence check fails with an error
    #[arg(long)]
    strict_check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let format: LogFormat = args.log_format.parse()?;
    init_logging(&args.log_level, format)?;

    info!("Starting s3-safe-upload v{}", s3_safe_upload::VERSION);

    let config = match &args.config {
        Some(path) => {
            ConfigLoader::load_settings_file(args.env_file.as_deref())?;
            let config = StoreConfig::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => ConfigLoader::from_env(args.env_file.as_deref())?,
    };

    let policy = if args.strict_check {
        CheckErrorPolicy::Abort
    } else {
        CheckErrorPolicy::Proceed
    };
    let uploader = Uploader::from_config(config, &args.file)?.with_check_error_policy(policy);

    let succeeded = match args.mode {
        Mode::Safe => uploader.safely_upload().await,
        Mode::Upload => uploader.upload().await,
        Mode::Exists => uploader.exists().await,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
