//! Configuration file support for mechcount.
//!
//! Settings are stored as JSON. Every field is optional in the file; missing
//! fields take their defaults, so an empty object `{}` is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{service, upload, viewport, zoom};
use crate::detection::MockDetectionService;
use crate::model::CategoryPalette;
use crate::render::ViewportSize;
use crate::source::UploadPolicy;
use crate::zoom_math::ZoomSettings;

/// Log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// All log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Log verbosity level
    pub log_level: LogLevel,

    /// Upload acceptance rules
    pub upload: UploadConfig,

    /// Zoom limits and factors
    pub zoom: ZoomConfig,

    /// Artificial delay of the mock detection service
    pub mock_delay_ms: u64,

    /// Category color overrides and additions
    pub category_colors: Vec<CategoryColor>,

    /// Default viewport size
    pub viewport: ViewportConfig,
}

/// Upload section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_size: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: upload::MAX_FILE_SIZE,
            allowed_mime_types: upload::ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// Zoom section of the config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    pub step_factor: f32,
    pub wheel_in_factor: f32,
    pub wheel_out_factor: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: zoom::MIN,
            max: zoom::MAX,
            step_factor: zoom::STEP_FACTOR,
            wheel_in_factor: zoom::WHEEL_IN_FACTOR,
            wheel_out_factor: zoom::WHEEL_OUT_FACTOR,
        }
    }
}

/// Viewport section of the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: viewport::DEFAULT_WIDTH,
            height: viewport::DEFAULT_HEIGHT,
        }
    }
}

/// Color entry for one category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryColor {
    /// Category name as reported by the detection service
    pub name: String,
    /// RGB color for the category
    pub color: [u8; 3],
}

impl ViewerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            upload: UploadConfig::default(),
            zoom: ZoomConfig::default(),
            mock_delay_ms: service::MOCK_DELAY_MS,
            category_colors: Vec::new(),
            viewport: ViewportConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the viewer cannot work with.
    fn validate(&self) -> Result<(), ConfigError> {
        self.zoom_settings()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid("viewport size must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Upload policy with MIME types normalized to lowercase.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            allowed_mime_types: self
                .upload
                .allowed_mime_types
                .iter()
                .map(|m| m.trim().to_ascii_lowercase())
                .collect(),
            max_file_size: self.upload.max_file_size,
        }
    }

    pub fn zoom_settings(&self) -> ZoomSettings {
        ZoomSettings {
            min: self.zoom.min,
            max: self.zoom.max,
            step_factor: self.zoom.step_factor,
            wheel_in_factor: self.zoom.wheel_in_factor,
            wheel_out_factor: self.zoom.wheel_out_factor,
        }
    }

    /// Built-in palette with the configured overrides applied.
    pub fn palette(&self) -> CategoryPalette {
        self.category_colors
            .iter()
            .fold(CategoryPalette::new(), |palette, entry| {
                palette.with_color(&entry.name, entry.color)
            })
    }

    pub fn mock_service(&self) -> MockDetectionService {
        MockDetectionService::with_delay(Duration::from_millis(self.mock_delay_ms))
    }

    pub fn viewport_size(&self) -> ViewportSize {
        ViewportSize::new(self.viewport.width, self.viewport.height)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "mechcount-config.json"
    }

    /// Read and parse a config file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("mechcount").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("mechcount")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                Some(config)
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A value is out of the usable range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
