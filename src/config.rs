//! Application configuration management.
//!
//! Holds the sheet endpoint URL. Loaded from
//! `~/.config/vecdash/config.json` when present, with the `VECDASH_SCRIPT_URL`
//! environment variable (or `.env` entry) taking precedence for easy testing
//! against a different deployment.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "vecdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured endpoint URL
const SCRIPT_URL_ENV: &str = "VECDASH_SCRIPT_URL";

/// Published Apps Script deployment serving the club's sheets
const DEFAULT_SCRIPT_URL: &str =
    "https://script.google.com/macros/s/AKfycbxbzNUWmn-tPtKM4N8LTOmbO2Y5iRHFmKZScSK6XL5BCzLI06vAfd0MXRpQ38-FXe0lvQ/exec";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub script_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Endpoint URL: env var, then config file, then the built-in deployment.
    pub fn script_url(&self) -> String {
        std::env::var(SCRIPT_URL_ENV)
            .ok()
            .or_else(|| self.script_url.clone())
            .unwrap_or_else(|| DEFAULT_SCRIPT_URL.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
