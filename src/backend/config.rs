use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::error::{Error, Result};

/// User configuration, read once at startup from
/// `{config_dir}/gallery-tui/config.json`. A template is written on the
/// first run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the image service's API. Required.
    pub api_url: Option<String>,
    /// Base URL of the service's web pages, for the open-in-browser
    /// command. Falls back to `api_url`.
    pub web_url: Option<String>,
    /// Bearer token for authenticated endpoints such as the following feed.
    pub token: Option<String>,
    pub user_id: Option<u64>,
    /// Overrides the default image cache location.
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gallery-tui")
            .join("config.json")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
        } else {
            let config = Config::default();
            config.save_to(path)?;
            println!("Wrote a config template to {}", path.display());
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "api_url is not set in {}",
                    Self::default_path().display()
                ))
            })
    }
}
