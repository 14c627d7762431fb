use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Remote backend settings. Both `base_url` and `api_key` must be present
/// (and non-empty) for the remote tier to be used at all.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    pub tenant_id: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "revrec", "revrec")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "revrec", "revrec")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Whether the remote tier is usable: both the service URL and the
    /// access credential must be configured.
    pub fn remote_available(&self) -> bool {
        self.remote
            .as_ref()
            .is_some_and(|r| !r.base_url.is_empty() && !r.api_key.is_empty())
    }
}
