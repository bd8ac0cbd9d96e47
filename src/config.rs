use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

/// Default ledger user.
fn default_user() -> String {
    "default".to_string()
}

/// Default NAV fetch attempts per scheme.
fn default_fetch_attempts() -> u32 {
    3
}

/// Default per-request NAV fetch timeout (10 seconds).
fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Default pause between NAV fetch attempts (500 milliseconds).
fn default_retry_backoff() -> Duration {
    Duration::from_millis(500)
}

/// NAV source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// How many times to try the NAV source before reporting it down.
    pub fetch_attempts: u32,

    /// How long a single fetch may take before it counts as a failure.
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub fetch_timeout: Duration,

    /// Pause between consecutive fetch attempts.
    #[serde(
        default = "default_retry_backoff",
        deserialize_with = "deserialize_duration"
    )]
    pub retry_backoff: Duration,

    /// Override for the NAV API endpoint. Mainly useful for pointing at a
    /// local stub.
    pub base_url: Option<String>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            fetch_attempts: default_fetch_attempts(),
            fetch_timeout: default_fetch_timeout(),
            retry_backoff: default_retry_backoff(),
            base_url: None,
        }
    }
}

/// Pivot report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    /// Number of most recent NAV dates shown when no dates are given.
    pub days: usize,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self { days: 3 }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// Ledger user whose trades and reports commands operate on.
    #[serde(default = "default_user")]
    pub user: String,

    /// NAV source settings.
    #[serde(default)]
    pub nav: NavConfig,

    /// Pivot report settings.
    #[serde(default)]
    pub pivot: PivotConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            user: default_user(),
            nav: NavConfig::default(),
            pivot: PivotConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved data directory path.
    pub data_dir: PathBuf,

    /// Ledger user whose trades and reports commands operate on.
    pub user: String,

    /// NAV source settings.
    pub nav: NavConfig,

    /// Pivot report settings.
    pub pivot: PivotConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./fundbook.toml` if it exists in current directory
/// 2. `~/.local/share/fundbook/fundbook.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("fundbook.toml");
    if local_config.exists() {
        return local_config;
    }

    // XDG data directory fallback
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("fundbook").join("fundbook.toml");
    }

    // Final fallback to local
    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        let data_dir = config.resolve_data_dir(config_dir);

        Ok(Self {
            data_dir,
            user: config.user,
            nav: config.nav,
            pivot: config.pivot,
        })
    }

    /// Load config, creating a default if the file doesn't exist.
    ///
    /// If the config file doesn't exist, uses the config file's intended
    /// parent directory as the data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            // Resolve the config path relative to current directory
            let config_path = if config_path.is_relative() {
                std::env::current_dir()
                    .context("Failed to get current directory")?
                    .join(config_path)
            } else {
                config_path.to_path_buf()
            };

            // Use the intended config directory as data dir
            let config_dir = config_path
                .parent()
                .context("Config path has no parent directory")?;

            Ok(Self {
                data_dir: config_dir.to_path_buf(),
                user: default_user(),
                nav: NavConfig::default(),
                pivot: PivotConfig::default(),
            })
        }
    }
}
