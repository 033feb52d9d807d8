use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graphmem: GraphMemConfig,
}

/// GraphMem-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GraphMemConfig {
    /// Path to the JSONL memory file holding the knowledge graph.
    #[serde(default = "default_memory_file")]
    pub memory_file: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GraphMemConfig {
    fn default() -> Self {
        Self {
            memory_file: default_memory_file(),
            log_level: default_log_level(),
        }
    }
}

fn default_memory_file() -> PathBuf {
    // Per-user default, compatible with existing memory files.
    dirs::home_dir()
        .map(|home| home.join(".claude").join("memory").join("graph.jsonl"))
        .unwrap_or_else(|| PathBuf::from("graph.jsonl"))
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration.
    ///
    /// Loads environment variables from .env file (if present) first, then
    /// resolves in this order:
    /// 1. Config file named by the GRAPHMEM_CONFIG environment variable
    /// 2. ./config.toml in the current directory
    /// 3. Built-in defaults when no config file exists
    ///
    /// The MEMORY_FILE_PATH environment variable overrides the memory file
    /// path regardless of where the rest of the config came from.
    pub fn load() -> Result<Self> {
        // .env is optional; ignore errors
        let _ = dotenv::dotenv();

        let config_path = std::env::var("GRAPHMEM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let mut config = if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
            toml::from_str(&config_str).context("Failed to parse config.toml")?
        } else {
            // The store runs fine with no config file at all
            Config {
                graphmem: GraphMemConfig::default(),
            }
        };

        if let Ok(path) = std::env::var("MEMORY_FILE_PATH") {
            config.graphmem.memory_file = PathBuf::from(path);
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.graphmem.memory_file.as_os_str().is_empty() {
            anyhow::bail!("memory_file must not be empty");
        }

        match self.graphmem.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => anyhow::bail!(
                "Invalid log_level: {} (expected error, warn, info, debug, or trace)",
                other
            ),
        }

        Ok(())
    }

    /// Get the memory file path
    pub fn memory_file(&self) -> &Path {
        &self.graphmem.memory_file
    }
}
