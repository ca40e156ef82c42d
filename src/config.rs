//! Client configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! holds the Steam Web API key and an optional storefront language.
//!
//! Configuration is stored at `~/.config/steamdex/config.json`; the
//! environment (`STEAM_API_KEY` / `STEAM_LANGUAGE`, including a local `.env`
//! file) takes precedence over the file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "steamdex";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub language: Option<String>,
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

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Read config from the environment only, consulting a `.env` file when
    /// one is present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            api_key: std::env::var("STEAM_API_KEY").ok(),
            language: std::env::var("STEAM_LANGUAGE").ok(),
        }
    }

    /// Config file overlaid with the environment; environment values win.
    pub fn resolve() -> Result<Self> {
        let file = Self::load()?;
        let env = Self::from_env();
        Ok(Self {
            api_key: env.api_key.or(file.api_key),
            language: env.language.or(file.language),
        })
    }
}
