use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Server configuration stored locally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_url: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Configuration manager for the .hoaxify directory
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self {
            config_dir: home_dir.join(".hoaxify"),
        })
    }

    #[cfg(test)]
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Save server configuration
    pub fn save_server_config(&self, config: &ServerConfig) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir)
                .context("Failed to create .hoaxify directory")?;
        }
        let json =
            serde_json::to_string_pretty(config).context("Failed to serialize server config")?;
        fs::write(self.config_file(), json).context("Failed to write server config file")?;
        Ok(())
    }

    /// Load server configuration, if one has been saved
    pub fn load_server_config(&self) -> Result<Option<ServerConfig>> {
        let config_file = self.config_file();
        if !config_file.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&config_file).context("Failed to read server config file")?;
        let config: ServerConfig =
            serde_json::from_str(&json).context("Failed to parse server config")?;
        Ok(Some(config))
    }

    /// Persist a resolved server URL so later runs reuse it without the
    /// CLI flag or environment variable.
    pub fn remember_server_url(&self, url: &str) -> Result<()> {
        self.save_server_config(&ServerConfig {
            server_url: url.to_string(),
            last_updated: chrono::Utc::now(),
        })
    }

    /// Determine the server URL to use based on priority:
    /// 1. CLI argument (highest priority)
    /// 2. Environment variable HOAXIFY_SERVER_URL
    /// 3. Saved configuration file
    /// 4. Built-in default (lowest priority)
    pub fn determine_server_url(&self, cli_override: Option<String>) -> Result<String> {
        if let Some(url) = cli_override {
            return Ok(url);
        }

        if let Ok(url) = std::env::var("HOAXIFY_SERVER_URL") {
            return Ok(url);
        }

        if let Some(config) = self.load_server_config()? {
            return Ok(config.server_url);
        }

        Ok(DEFAULT_SERVER_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cli_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());

        manager
            .save_server_config(&ServerConfig {
                server_url: "http://saved:8080".to_string(),
                last_updated: chrono::Utc::now(),
            })
            .unwrap();

        let url = manager
            .determine_server_url(Some("http://cli-override:8080".to_string()))
            .unwrap();
        assert_eq!(url, "http://cli-override:8080");
    }

    #[test]
    fn saved_config_beats_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());

        manager
            .save_server_config(&ServerConfig {
                server_url: "http://saved:8080".to_string(),
                last_updated: chrono::Utc::now(),
            })
            .unwrap();

        // Environment variable would shadow this; tests leave it unset
        let url = manager.determine_server_url(None).unwrap();
        assert_eq!(url, "http://saved:8080");
    }

    #[test]
    fn remembered_url_is_used_on_next_run() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());

        manager
            .remember_server_url("http://remembered:8080")
            .unwrap();

        let url = manager.determine_server_url(None).unwrap();
        assert_eq!(url, "http://remembered:8080");
    }

    #[test]
    fn falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());

        let url = manager.determine_server_url(None).unwrap();
        assert_eq!(url, DEFAULT_SERVER_URL);
    }
}
