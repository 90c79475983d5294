//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! API origin, the login surface path, and an optional override for the
//! credential storage directory.
//!
//! Configuration is stored at `~/.config/authrelay/config.json`. Individual
//! fields can be overridden through `AUTHRELAY_*` environment variables,
//! and a `.env` file is honored when present.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/storage directory paths
const APP_NAME: &str = "authrelay";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default API origin for local development
const DEFAULT_API_ORIGIN: &str = "http://localhost:3000";

/// Default login surface path
const DEFAULT_LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_origin: String,
    pub login_path: String,
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_origin: DEFAULT_API_ORIGIN.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            storage_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(origin) = std::env::var("AUTHRELAY_API_ORIGIN") {
            self.api_origin = origin;
        }
        if let Ok(path) = std::env::var("AUTHRELAY_LOGIN_PATH") {
            self.login_path = path;
        }
        if let Ok(dir) = std::env::var("AUTHRELAY_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted refresh credential and profile cache.
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
