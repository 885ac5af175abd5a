use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tui: TuiConfig,
    pub data: DataConfig,
    pub gemini: GeminiConfig,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
    /// Enable mouse support in the terminal.
    pub mouse_enabled: bool,
}

/// Data directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

/// Gemini API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Model used for campaign copy and chat.
    pub text_model: String,
    /// Model used for marketing visuals.
    pub image_model: String,
    /// API root; overridable for self-hosted proxies and tests.
    pub base_url: String,
    /// Aspect ratio for generated visuals.
    pub aspect_ratio: String,
    /// Thinking budget for copy generation.
    pub thinking_budget: u32,
    /// Treat a missing key-selection capability as already authorized,
    /// reading `GEMINI_API_KEY` from the environment instead.
    pub trust_env_key: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tui: TuiConfig::default(),
            data: DataConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 50,
            mouse_enabled: false,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            text_model: "gemini-3-pro-preview".to_string(),
            image_model: "gemini-3-pro-image-preview".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            aspect_ratio: "4:3".to_string(),
            thinking_budget: 1024,
            trust_env_key: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/campaigner/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(config_path: &Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("campaigner"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("campaigner").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
