//! Configuration system
//!
//! Application settings load from TOML or RON, picked by file extension.
//! Every section has defaults, so a config file only needs the keys it
//! changes.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Requested framebuffer width in pixels
    pub width: u32,
    /// Requested framebuffer height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
    /// Enable vertical sync after the context is made current
    pub vsync: bool,
}

impl WindowConfig {
    /// Create a window configuration with vsync on
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            vsync: true,
        }
    }

    /// Enable or disable vsync
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.vsync = enabled;
        self
    }

    /// Both dimensions must be positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(800, 600, "Crazy Application")
    }
}

/// Logger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter passed to `env_logger` (`RUST_LOG` overrides it)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window section
    pub window: WindowConfig,
    /// Logging section
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a configuration for a window of the given size and title
    pub fn new(width: u32, height: u32, title: impl Into<String>) -> Self {
        Self {
            window: WindowConfig::new(width, height, title),
            logging: LoggingConfig::default(),
        }
    }

    /// Replace the window section
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Set the default log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()
    }
}

impl Config for AppConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        let mut path = std::env::temp_dir();
        path.push(format!("crazy-config-{}-{name}", std::process::id()));
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert!(config.window.vsync);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[window]\ntitle = \"T\"\n").unwrap();
        assert_eq!(config.window.title, "T");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let config = AppConfig::new(0, 600, "T");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let config = AppConfig::new(800, 0, "T");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_toml() {
        let path = temp_path("app.toml");
        let config = AppConfig::new(1024, 768, "Saved").with_log_level("debug");
        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_ron() {
        let path = temp_path("app.ron");
        std::fs::write(&path, "(window: (width: 320, height: 240, title: \"ron\", vsync: false))").unwrap();
        let loaded = AppConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.window, WindowConfig::new(320, 240, "ron").with_vsync(false));
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_path("app.json");
        std::fs::write(&path, "{}").unwrap();
        let result = AppConfig::load_from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = AppConfig::load_from_file(&temp_path("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
