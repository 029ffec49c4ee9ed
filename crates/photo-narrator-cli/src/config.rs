//! Configuration file support for photo-narrator.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/photo-narrator/config.toml` (lowest priority)
//! - Project-local: `.photo-narrator.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Project-local config file name.
pub const PROJECT_CONFIG: &str = ".photo-narrator.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Speech output settings.
    pub speech: SpeechConfig,
    /// Camera settings.
    pub camera: CameraConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Number of predictions per image.
    pub top_k: Option<usize>,
    /// Inference device: "auto" or "cpu".
    pub device: Option<String>,
}

/// Speech configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak predictions aloud.
    pub enabled: Option<bool>,
    /// Text-to-speech command; the phrase is appended as the last argument.
    pub command: Option<String>,
    /// Phrase spoken before the labels.
    pub intro: Option<String>,
}

/// Camera configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture command containing `{output}`.
    pub command: Option<String>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/photo-narrator/config.toml`
    /// 2. Project-local: `.photo-narrator.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    fn validate(&self) -> Result<(), String> {
        if self.general.top_k == Some(0) {
            return Err("general.top_k must be at least 1".to_string());
        }

        if let Some(ref device) = self.general.device {
            if !matches!(device.as_str(), "auto" | "cpu") {
                return Err(format!(
                    "general.device must be 'auto' or 'cpu', got '{device}'"
                ));
            }
        }

        if let Some(ref f) = self.output.format {
            if !matches!(f.as_str(), "text" | "json" | "jsonl") {
                return Err(format!(
                    "output.format must be 'text', 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        if let Some(ref command) = self.camera.command {
            if !command.contains("{output}") {
                return Err(format!(
                    "camera.command must contain {{output}}, got '{command}'"
                ));
            }
        }

        if self.speech.command.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("speech.command must not be empty".to_string());
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.general.top_k = other.general.top_k.or(self.general.top_k);
        self.general.device = other.general.device.or_else(|| self.general.device.take());

        self.speech.enabled = other.speech.enabled.or(self.speech.enabled);
        self.speech.command = other.speech.command.or_else(|| self.speech.command.take());
        self.speech.intro = other.speech.intro.or_else(|| self.speech.intro.take());

        self.camera.command = other.camera.command.or_else(|| self.camera.command.take());

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("photo-narrator").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.photo-narrator.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
