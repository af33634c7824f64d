//! Configuration for the wr command line

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline name used in logs and counters
    #[serde(default = "default_pipeline_name")]
    pub pipeline_name: String,

    /// Properties exposed to directives through the execution context
    #[serde(default)]
    pub properties: HashMap<String, String>,

    /// Default output schema when `--schema` is not given
    #[serde(default)]
    pub schema: Option<PathBuf>,
}

fn default_pipeline_name() -> String {
    "wrangler".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline_name: default_pipeline_name(),
            properties: HashMap::new(),
            schema: None,
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(config_path)
                .context(format!("Failed to load config from {}", config_path.display()));
        }

        // Try default locations
        let default_paths = [
            Some(PathBuf::from("wrangler.yml")),
            dirs::config_dir().map(|p| p.join("wrangler").join("wrangler.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        Ok(Config::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
