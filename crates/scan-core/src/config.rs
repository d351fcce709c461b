//! Viewer configuration using Figment
//!
//! Configuration is layered (later sources win):
//! 1. Built-in defaults
//! 2. `config/line_scan.toml` (or an explicit path)
//! 3. Environment variables prefixed with `LINE_SCAN_`, nested with `__`
//!
//! # Example
//! ```no_run
//! use scan_core::ViewerConfig;
//!
//! // LINE_SCAN_DISPLAY__MAX_ZOOM=10 overrides the file value
//! let config = ViewerConfig::load()?;
//! config.validate()?;
//! println!("Reconnect after {:?}", config.reconnect_delay());
//! # Ok::<(), scan_core::ScanError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::protocol::DEFAULT_MAX_LINES;
use crate::transform::{ZoomLimits, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM_FACTOR};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/line_scan.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "LINE_SCAN_";

/// Top-level viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Stream endpoint settings
    #[serde(default)]
    pub stream: StreamConfig,
    /// Canvas settings
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Window title
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Stream endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Endpoint URL; unset means "resolve from UI, storage or environment"
    #[serde(default)]
    pub url: Option<String>,
    /// Fixed delay before reconnecting after an unrequested close
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

/// Canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Ring capacity used when the server omits `maxLines`
    #[serde(default = "default_max_lines")]
    pub default_max_lines: u32,
    /// Minimum zoom
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    /// Maximum zoom
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
    /// Zoom factor per wheel step
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f32,
}

// Default value functions
fn default_name() -> String {
    "Line Scan Viewer".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_max_lines() -> u32 {
    DEFAULT_MAX_LINES
}

fn default_min_zoom() -> f32 {
    DEFAULT_MIN_ZOOM
}

fn default_max_zoom() -> f32 {
    DEFAULT_MAX_ZOOM
}

fn default_zoom_factor() -> f32 {
    DEFAULT_ZOOM_FACTOR
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_max_lines: default_max_lines(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            zoom_factor: default_zoom_factor(),
        }
    }
}

impl ViewerConfig {
    /// Load from [`DEFAULT_CONFIG_PATH`] and the environment.
    ///
    /// A missing file is not an error; defaults fill in.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file path and the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(ScanError::InvalidConfig(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let display = &self.display;
        if display.default_max_lines == 0 {
            return Err(ScanError::InvalidConfig(
                "default_max_lines must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("min_zoom", display.min_zoom),
            ("max_zoom", display.max_zoom),
            ("zoom_factor", display.zoom_factor),
        ] {
            if !value.is_finite() {
                return Err(ScanError::InvalidConfig(format!(
                    "{name} {value} must be a finite number"
                )));
            }
        }
        if display.min_zoom <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "min_zoom {} must be positive",
                display.min_zoom
            )));
        }
        if display.max_zoom < display.min_zoom {
            return Err(ScanError::InvalidConfig(format!(
                "max_zoom {} is below min_zoom {}",
                display.max_zoom, display.min_zoom
            )));
        }
        if display.zoom_factor <= 1.0 {
            return Err(ScanError::InvalidConfig(format!(
                "zoom_factor {} must be greater than 1",
                display.zoom_factor
            )));
        }

        Ok(())
    }

    /// Zoom limits for the interaction controller.
    #[must_use]
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.display.min_zoom,
            max: self.display.max_zoom,
            factor: self.display.zoom_factor,
        }
    }

    /// Reconnect delay as a [`Duration`].
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.stream.reconnect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reconnect_delay(), Duration::from_secs(2));
        assert_eq!(config.zoom_limits(), ZoomLimits::default());
        assert_eq!(config.display.default_max_lines, 2048);
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        let config = ViewerConfig::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[stream]
url = "ws://scanner.local:9000/ws/stream"

[display]
max_zoom = 10.0
"#
        )
        .unwrap();

        let config = ViewerConfig::load_from(file.path()).unwrap();
        assert_eq!(
            config.stream.url.as_deref(),
            Some("ws://scanner.local:9000/ws/stream")
        );
        assert_eq!(config.display.max_zoom, 10.0);
        assert_eq!(config.display.min_zoom, 1.0);
        assert_eq!(config.stream.reconnect_delay_ms, 2000);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        std::env::set_var("LINE_SCAN_STREAM__RECONNECT_DELAY_MS", "500");
        let config = ViewerConfig::load_from("does/not/exist.toml");
        std::env::remove_var("LINE_SCAN_STREAM__RECONNECT_DELAY_MS");

        assert_eq!(config.unwrap().reconnect_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ViewerConfig::default();
        config.application.log_level = "verbose".into();
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.display.max_zoom = 0.5;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.display.zoom_factor = 1.0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.display.min_zoom = 0.0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.display.default_max_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_finite_zoom() {
        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut config = ViewerConfig::default();
            config.display.max_zoom = value;
            assert!(config.validate().is_err(), "max_zoom {value} accepted");

            let mut config = ViewerConfig::default();
            config.display.min_zoom = value;
            assert!(config.validate().is_err(), "min_zoom {value} accepted");

            let mut config = ViewerConfig::default();
            config.display.zoom_factor = value;
            assert!(config.validate().is_err(), "zoom_factor {value} accepted");
        }
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = ViewerConfig::default();
        config.application.log_level = "DEBUG".into();
        assert!(config.validate().is_ok());
    }
}
