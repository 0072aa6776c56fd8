//! Service configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file) is a valid configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::lifecycle::{TokenPolicy, DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
use crate::linkage::DEFAULT_PAGE_SIZE;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "HANDYHUB_CONFIG";

const CONFIG_FILE: &str = "handyhub.toml";
const DATABASE_FILE: &str = "handyhub.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub bookings: BookingsConfig,
    pub messages: MessagesConfig,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind: SocketAddr,
    /// Base URL used when building response links
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; the platform data directory when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingsConfig {
    pub token_ttl_hours: u32,
    pub open_conversation_on_accept: bool,
    /// Seconds between expired-token sweeps; 0 disables the sweeper
    pub sweep_interval_secs: u64,
}

impl Default for BookingsConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS as u32,
            open_conversation_on_accept: true,
            sweep_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 200,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// TOML file of users imported at startup
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Could not determine the platform {0} directory")]
    NoPlatformDir(&'static str),
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config directly from TOML content
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the first location that applies: an explicit path, then
    /// `HANDYHUB_CONFIG`, then the platform config directory. Falls back to
    /// defaults when none of them names a file.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        if let Some(dirs) = project_dirs() {
            let path = dirs.config_dir().join(CONFIG_FILE);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ttl = i64::from(self.bookings.token_ttl_hours);
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&ttl) {
            return Err(ConfigError::Invalid(format!(
                "bookings.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }
        let messages = &self.messages;
        if messages.default_page_size == 0 || messages.max_page_size == 0 {
            return Err(ConfigError::Invalid("page sizes must be at least 1".into()));
        }
        if messages.default_page_size > messages.max_page_size {
            return Err(ConfigError::Invalid(
                "messages.default_page_size exceeds max_page_size".into(),
            ));
        }
        if !self.server.public_base_url.starts_with("http://")
            && !self.server.public_base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(
                "server.public_base_url must be an http(s) URL".into(),
            ));
        }
        Ok(())
    }

    pub fn token_policy(&self) -> TokenPolicy {
        TokenPolicy::with_ttl_hours(i64::from(self.bookings.token_ttl_hours))
    }

    /// Clamp a requested page size into the configured bounds
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.messages.default_page_size)
            .clamp(1, self.messages.max_page_size)
    }

    /// Database path, defaulting to the platform data directory
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        let dirs = project_dirs().ok_or(ConfigError::NoPlatformDir("data"))?;
        Ok(dirs.data_dir().join(DATABASE_FILE))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "handyhub", "handyhub")
}
