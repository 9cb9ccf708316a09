use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use service::ServiceConfig;

pub const APP_NAME: &str = "gcsdrive";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variables checked, in order, for an access token. Either
///  overrides the token in config.toml.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GCSDRIVE_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Project new buckets are created in
    pub project: Option<String>,
    /// OAuth2 bearer token. Prefer the environment variables
    pub access_token: Option<String>,
    pub storage_endpoint: Url,
    pub resource_manager_endpoint: Url,
    /// Seconds a bucket listing is trusted
    pub staleness_secs: u64,
    /// Page size of the listing each bucket's cache is built from
    pub list_page_size: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults = ServiceConfig::default();
        Self {
            project: None,
            access_token: None,
            storage_endpoint: defaults.storage_endpoint,
            resource_manager_endpoint: defaults.resource_manager_endpoint,
            staleness_secs: defaults.staleness.as_secs(),
            list_page_size: None,
        }
    }
}

impl AppConfig {
    /// Build the service config, taking the token from `env` when set there.
    pub fn service_config(&self, env: impl Fn(&str) -> Option<String>) -> ServiceConfig {
        let access_token = TOKEN_ENV_VARS
            .into_iter()
            .find_map(|name| env(name).filter(|token| !token.is_empty()))
            .or_else(|| self.access_token.clone());

        ServiceConfig {
            storage_endpoint: self.storage_endpoint.clone(),
            resource_manager_endpoint: self.resource_manager_endpoint.clone(),
            access_token,
            project: self.project.clone(),
            staleness: Duration::from_secs(self.staleness_secs),
            list_page_size: self.list_page_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the config directory (~/.gcsdrive)
    pub dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// The default config directory (~/.gcsdrive)
    pub fn default_dir() -> Result<PathBuf, StateError> {
        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf, StateError> {
        match dir {
            Some(dir) => Ok(dir),
            None => Self::default_dir(),
        }
    }

    /// Create the config directory and write `config` to it.
    pub fn init(dir: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let dir = Self::resolve_dir(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        Ok(Self {
            dir,
            config_path,
            config,
        })
    }

    pub fn load(dir: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = Self::resolve_dir(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            dir,
            config_path,
            config,
        })
    }

    pub fn service_config(&self) -> ServiceConfig {
        self.config.service_config(|name| std::env::var(name).ok())
    }

    pub fn default_service_config() -> ServiceConfig {
        AppConfig::default().service_config(|name| std::env::var(name).ok())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("config not initialized. Run 'gcsdrive init' first")]
    NotInitialized,

    #[error("config already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
