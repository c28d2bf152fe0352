use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SubtransError};

fn default_request_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the translation server (job submission lives at `/api`)
    pub endpoint: String,
    /// Overall timeout for a single request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Token budget for one translation batch
    pub max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the translated `.srt` files are written to
    pub directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                endpoint: "http://localhost:3000".to_string(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            batch: BatchConfig {
                max_tokens: 1024,
            },
            output: OutputConfig {
                directory: PathBuf::from("."),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubtransError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubtransError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubtransError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.max_tokens == 0 {
            return Err(SubtransError::Config("batch.max_tokens must be positive".to_string()));
        }
        if self.server.endpoint.trim().is_empty() {
            return Err(SubtransError::Config("server.endpoint must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.endpoint = "https://translate.example".to_string();
        config.batch.max_tokens = 256;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.server.endpoint, "https://translate.example");
        assert_eq!(loaded.batch.max_tokens, 256);
        assert_eq!(loaded.server.request_timeout_secs, 300);
    }

    #[test]
    fn test_timeout_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nendpoint = \"http://x\"\n\n[batch]\nmax_tokens = 10\n\n[output]\ndirectory = \"out\"\n",
        )
        .unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.server.request_timeout_secs, 300);
        assert_eq!(loaded.output.directory, PathBuf::from("out"));
    }

    #[test]
    fn test_zero_token_budget_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.batch.max_tokens = 0;
        config.save_to_file(&path).unwrap();

        assert!(matches!(Config::from_file(&path), Err(SubtransError::Config(_))));
    }
}
