use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub upload_dir: Option<String>,
    pub output_dir: Option<String>,
    pub max_upload_bytes: Option<u64>,
    pub allowed_extensions: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
