//! Configuration management
//!
//! Handles loading and saving the TOML configuration file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use webtty_ui::events::Command;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoConfigDir,
}

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Connection to the browser
    pub browser: BrowserConfig,
    /// Terminal behaviour
    pub tty: TtyConfig,
    /// Key binding overrides
    pub keys: KeysConfig,
}

/// Connection to the browser
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserConfig {
    /// Address the websocket server listens on
    pub bind: String,
    /// Port the browser extension connects to
    pub websocket_port: u16,
    /// Page opened in the first tab
    pub startup_url: String,
    /// Quit after this many seconds
    pub time_limit: Option<u64>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            websocket_port: 3334,
            startup_url: "https://duckduckgo.com".into(),
            time_limit: None,
        }
    }
}

/// Terminal behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TtyConfig {
    /// How long link actions block further keys, in milliseconds
    pub wait_mode_ms: u64,
    /// Keys used to build link hint labels
    pub link_hint_keys: String,
    /// Start in monochrome mode
    pub monochrome: bool,
    /// Pixel frame interval requested from the browser, in milliseconds
    pub small_pixel_frame_rate: u64,
}

impl Default for TtyConfig {
    fn default() -> Self {
        Self {
            wait_mode_ms: 1000,
            link_hint_keys: "asdfwerxcv".into(),
            monochrome: false,
            small_pixel_frame_rate: 250,
        }
    }
}

impl TtyConfig {
    pub fn wait_mode_delay(&self) -> Duration {
        Duration::from_millis(self.wait_mode_ms)
    }
}

/// Key binding overrides, per binding mode
///
/// ```toml
/// [keys.normal]
/// "gg" = "scrollToTop"
/// "<C-d>" = "scrollHalfPageDown"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct KeysConfig {
    pub normal: HashMap<String, Command>,
    pub visual: HashMap<String, Command>,
    pub caret: HashMap<String, Command>,
}

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "webtty", "webtty").map(|p| p.config_dir().to_path_buf())
}

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Load configuration from the default location.
///
/// On first run the defaults are written there so they can be edited.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    if !path.exists() {
        let config = Config::default();
        if let Err(e) = save_config_to(&config, &path) {
            log::warn!("Could not write default config to {}: {}", path.display(), e);
        }
        return Ok(config);
    }
    load_config_from(&path)
}

/// Load configuration from a file; a missing file gives the defaults
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
