use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cv_tools_server::config::{
    self, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_OUTPUT_DIR, DEFAULT_PORT,
    DEFAULT_UPLOAD_DIR,
};
use cv_tools_server::server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The address to bind to.
    #[clap(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Scratch directory for uploaded images.
    #[clap(long, default_value = DEFAULT_UPLOAD_DIR, value_parser = parse_path)]
    pub upload_dir: PathBuf,

    /// Directory where visualizations are written and served from.
    #[clap(long, default_value = DEFAULT_OUTPUT_DIR, value_parser = parse_path)]
    pub output_dir: PathBuf,

    /// Maximum accepted upload size in bytes.
    #[clap(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: u64,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            host: args.host.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            upload_dir: args.upload_dir.clone(),
            output_dir: args.output_dir.clone(),
            max_upload_bytes: args.max_upload_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // TOML overrides CLI
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  bind: {}", app_config.bind_address());
    info!("  upload_dir: {:?}", app_config.upload_dir);
    info!("  output_dir: {:?}", app_config.output_dir);
    info!("  max_upload_bytes: {}", app_config.max_upload_bytes);
    info!("  allowed_extensions: {}", app_config.allowed_extensions.join(", "));

    run_server(app_config).await
}
