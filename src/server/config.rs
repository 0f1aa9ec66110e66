use super::RequestsLoggingLevel;
use crate::config::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES};

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    /// Request body limit for upload routes.
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
