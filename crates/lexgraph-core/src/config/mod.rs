//! Configuration management with file persistence

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Lexgraph configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub extraction: ExtractionConfig,
    pub build: BuildConfig,
    pub sharing: SharingConfig,
    pub server: ServerConfig,
    pub learning: LearningConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; `None` means `<config dir>/lexgraph.db`
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// A BUILDING flag older than this may be taken over by a new build
    pub stale_after_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    pub link_base_url: String,
    pub token_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub admin_user_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub default_days: u32,
    pub max_days: u32,
    /// Percentage below which an entity type gets a low-accuracy insight
    pub low_accuracy_threshold: f64,
    pub min_samples: u32,
    pub recurring_error_threshold: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/knowledge-graph".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 900,
        }
    }
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            link_base_url: "http://localhost:3000".to_string(),
            token_bytes: 32,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            admin_user_ids: Vec::new(),
        }
    }
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            default_days: 30,
            max_days: 365,
            low_accuracy_threshold: 70.0,
            min_samples: 5,
            recurring_error_threshold: 5,
        }
    }
}

impl Config {
    /// Get the config directory path
    ///
    /// Uses `LEXGRAPH_CONFIG_DIR` when set, otherwise the platform config dir.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("LEXGRAPH_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("lexgraph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without applying environment overrides
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = self.to_toml()?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Render as the TOML written by [`Config::save`]
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("LEXGRAPH_EXTRACTION_URL") {
            self.extraction.base_url = url;
        }
        if let Ok(bind) = env::var("LEXGRAPH_BIND") {
            self.server.bind = bind;
        }
        if let Ok(path) = env::var("LEXGRAPH_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        if self.extraction.timeout_secs == 0 {
            bail!("extraction.timeout_secs must be greater than 0");
        }
        if self.extraction.base_url.trim().is_empty() {
            bail!("extraction.base_url must not be empty");
        }
        if self.build.stale_after_secs == 0 {
            bail!("build.stale_after_secs must be greater than 0");
        }
        if self.sharing.token_bytes < 16 {
            bail!("sharing.token_bytes must be at least 16");
        }
        if !(0.0..=100.0).contains(&self.learning.low_accuracy_threshold) {
            bail!("learning.low_accuracy_threshold must be between 0 and 100");
        }
        if self.learning.max_days == 0 || self.learning.default_days == 0 {
            bail!("learning.default_days and learning.max_days must be at least 1");
        }
        Ok(())
    }

    /// Resolved database path
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("lexgraph.db")),
        }
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "database.busy_timeout_ms" => Ok(self.database.busy_timeout_ms.to_string()),
            "extraction.base_url" => Ok(self.extraction.base_url.clone()),
            "extraction.timeout_secs" => Ok(self.extraction.timeout_secs.to_string()),
            "build.stale_after_secs" => Ok(self.build.stale_after_secs.to_string()),
            "sharing.link_base_url" => Ok(self.sharing.link_base_url.clone()),
            "server.bind" => Ok(self.server.bind.clone()),
            "server.admin_user_ids" => Ok(self.server.admin_user_ids.join(", ")),
            "learning.default_days" => Ok(self.learning.default_days.to_string()),
            "learning.low_accuracy_threshold" => {
                Ok(self.learning.low_accuracy_threshold.to_string())
            }
            _ => Err(anyhow!("Unknown config key: {}", key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.max_connections" => {
                self.database.max_connections = value.parse().context("Invalid number")?
            }
            "database.busy_timeout_ms" => {
                self.database.busy_timeout_ms = value.parse().context("Invalid number")?
            }
            "extraction.base_url" => self.extraction.base_url = value.to_string(),
            "extraction.timeout_secs" => {
                self.extraction.timeout_secs = value.parse().context("Invalid number")?
            }
            "build.stale_after_secs" => {
                self.build.stale_after_secs = value.parse().context("Invalid number")?
            }
            "sharing.link_base_url" => self.sharing.link_base_url = value.to_string(),
            "server.bind" => self.server.bind = value.to_string(),
            "server.admin_user_ids" => {
                self.server.admin_user_ids = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            "learning.default_days" => {
                self.learning.default_days = value.parse().context("Invalid number")?
            }
            "learning.low_accuracy_threshold" => {
                self.learning.low_accuracy_threshold = value.parse().context("Invalid number")?
            }
            _ => return Err(anyhow!("Unknown config key: {}", key)),
        }
        self.validate()
    }
}
