mod file_config;

pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use crate::uploads::DEFAULT_ALLOWED_EXTENSIONS;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            logging_level: RequestsLoggingLevel::default(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Immutable server configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_upload_bytes: u64,
    /// Lowercase, without the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let host = file.host.unwrap_or_else(|| cli.host.clone());
        if host.trim().is_empty() {
            bail!("host must not be empty");
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Invalid logging_level in config file: {}", s),
            },
            None => cli.logging_level.clone(),
        };

        let upload_dir = file
            .upload_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.upload_dir.clone());
        let output_dir = file
            .output_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.output_dir.clone());
        if upload_dir == output_dir {
            bail!(
                "upload_dir and output_dir must differ, both are {:?}",
                upload_dir
            );
        }

        let max_upload_bytes = file.max_upload_bytes.unwrap_or(cli.max_upload_bytes);
        if max_upload_bytes == 0 {
            bail!("max_upload_bytes must be greater than zero");
        }

        let allowed_extensions = match file.allowed_extensions {
            Some(extensions) => normalize_extensions(extensions)?,
            None => DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Ok(Self {
            host,
            port,
            logging_level,
            upload_dir,
            output_dir,
            max_upload_bytes,
            allowed_extensions,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn normalize_extensions(extensions: Vec<String>) -> Result<Vec<String>> {
    let mut normalized = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            bail!("Invalid extension in allowed_extensions: {:?}", ext);
        }
        if !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }
    if normalized.is_empty() {
        bail!("allowed_extensions must not be empty");
    }
    Ok(normalized)
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
