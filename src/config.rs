//! Application configuration: compile-time constants and the runtime TOML file.
//!
//! # Constants
//!
//! Geometry and timing that every key shares are `const`s so the renderers can
//! use them without threading a config object through each paint call. The
//! values mirror what the keypad host and the hardware monitor expect:
//!
//! - Keys are 144×144 bitmaps (the host downsamples for smaller devices)
//! - The hardware monitor serves its tree at `http://localhost:8085/data.json`
//! - One poll per second, shared by every visible key
//!
//! # Runtime File
//!
//! [`AppConfig`] is read from `config/ohm-deck.toml` (or the path given on the
//! command line). Every section is optional; missing sections fall back to the
//! constants below.
//!
//! ```toml
//! [polling]
//! endpoint = "http://localhost:8085/data.json"
//! interval_ms = 1000
//! timeout_ms = 800
//!
//! [display]
//! key_size = 144
//!
//! [output]
//! directory = "frames"
//!
//! [logging]
//! level = "info"
//!
//! [[keys]]
//! id = "cpu-load"
//! settings = { sensor_name = "CPU Total", sensor_type = "line" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use embedded_graphics::pixelcolor::Rgb888;
use log::{info, warn};
use serde::Deserialize;

use crate::colors::{CHARCOAL, ORANGE};
use crate::host::SettingsMap;

// =============================================================================
// Canvas Configuration
// =============================================================================

/// Key bitmap edge length in pixels (square keys).
pub const KEY_SIZE: u32 = 144;

// =============================================================================
// Sensor History Configuration
// =============================================================================

/// Number of samples each binding keeps for the sparkline.
/// At one poll per second this is one minute of history.
pub const HISTORY_CAPACITY: usize = 60;

/// Sample ordinals divisible by this value get a vertical gridline.
/// A third of the capacity gives three gridlines across a full chart.
pub const GRIDLINE_SPACING: u64 = (HISTORY_CAPACITY / 3) as u64;

// =============================================================================
// Polling Configuration
// =============================================================================

/// Hardware monitor JSON endpoint.
pub const SENSOR_ENDPOINT: &str = "http://localhost:8085/data.json";

/// Cadence of the shared poll timer.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Per-request timeout. Kept under the poll interval so one stuck request
/// cannot overlap more than the following tick.
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(800);

// =============================================================================
// Default Theme
// =============================================================================

/// Foreground color used until settings provide one (`#ff8800`).
pub const DEFAULT_FOREGROUND: Rgb888 = ORANGE;

/// Background color used until settings provide one (`#181818`).
pub const DEFAULT_BACKGROUND: Rgb888 = CHARCOAL;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/ohm-deck.toml";

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Root of the TOML configuration file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Keys to show at startup, standing in for the host's "key shown" events.
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub endpoint: String,
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl PollingConfig {
    pub const fn interval(&self) -> Duration { Duration::from_millis(self.interval_ms) }

    pub const fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms) }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            endpoint: SENSOR_ENDPOINT.to_string(),
            interval_ms: POLL_INTERVAL.as_millis() as u64,
            timeout_ms: FETCH_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub key_size: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self { Self { key_size: KEY_SIZE } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the headless runner writes `<key>.png` files into.
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self { Self { directory: PathBuf::from("frames") } }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string() } }
}

/// One statically configured key.
#[derive(Debug, Deserialize, Clone)]
pub struct KeyConfig {
    pub id: String,
    #[serde(default)]
    pub settings: SettingsMap,
}

impl AppConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot run.
    fn validate(&self) -> anyhow::Result<()> {
        if self.polling.interval_ms == 0 {
            bail!("[polling] interval_ms must be greater than zero");
        }
        if self.display.key_size == 0 {
            bail!("[display] key_size must be greater than zero");
        }
        Ok(())
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Load from `path` (or [`DEFAULT_CONFIG_PATH`]), falling back to defaults
    /// when the file does not exist. A file that exists but fails to parse is
    /// an error.
    ///
    /// Nothing is logged here since the log filter itself comes from the
    /// result; report the returned [`ConfigOrigin`] once logging is up.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<(Self, ConfigOrigin)> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        if !path.exists() {
            return Ok((Self::default(), ConfigOrigin::Defaults(path.to_path_buf())));
        }
        let config = Self::load(path)?;
        Ok((config, ConfigOrigin::File(path.to_path_buf())))
    }
}

/// Where [`AppConfig::load_or_default`] got its configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No file at this path.
    Defaults(PathBuf),
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            Self::File(path) => info!("loaded config from {}", path.display()),
            Self::Defaults(path) => warn!("no config file at {}, using defaults", path.display()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_capacity() {
        assert_eq!(HISTORY_CAPACITY, 60, "History should hold one minute at 1 Hz");
    }

    #[test]
    fn test_gridline_spacing_is_third_of_capacity() {
        assert_eq!(GRIDLINE_SPACING, 20, "Gridlines every 1/3 of capacity");
    }

    #[test]
    fn test_fetch_timeout_below_poll_interval() {
        const _: () = assert!(FETCH_TIMEOUT.as_millis() < POLL_INTERVAL.as_millis());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.polling.endpoint, SENSOR_ENDPOINT);
        assert_eq!(config.polling.interval(), POLL_INTERVAL);
        assert_eq!(config.display.key_size, KEY_SIZE);
        assert_eq!(config.logging.level, "info");
        assert!(config.keys.is_empty());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = AppConfig::from_toml("[polling]\ninterval_ms = 2000\n").unwrap();
        assert_eq!(config.polling.interval(), Duration::from_secs(2));
        assert_eq!(config.polling.endpoint, SENSOR_ENDPOINT, "Unset endpoint keeps default");
        assert_eq!(config.polling.timeout(), FETCH_TIMEOUT);
    }

    #[test]
    fn test_keys_with_settings() {
        let text = r#"
            [[keys]]
            id = "gpu"
            settings = { sensor_name = "GPU Core", sensor_type = "knob", sensor_maximum = "100" }

            [[keys]]
            id = "bare"
        "#;
        let config = AppConfig::from_toml(text).unwrap();
        assert_eq!(config.keys.len(), 2);
        assert_eq!(config.keys[0].id, "gpu");
        assert_eq!(config.keys[0].settings.get("sensor_type").and_then(|v| v.as_str()), Some("knob"));
        assert!(config.keys[1].settings.is_empty(), "Missing settings table should be empty");
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(AppConfig::from_toml("[polling\n").is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = AppConfig::from_toml("[polling]\ninterval_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("interval_ms"), "Error should name the field: {err}");
    }

    #[test]
    fn test_zero_key_size_is_rejected() {
        assert!(AppConfig::from_toml("[display]\nkey_size = 0\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = Path::new("definitely/not/here.toml");
        let (config, origin) = AppConfig::load_or_default(Some(path)).unwrap();
        assert_eq!(config.polling.endpoint, SENSOR_ENDPOINT);
        assert_eq!(origin, ConfigOrigin::Defaults(path.to_path_buf()), "Caller is told defaults were used");
    }
}
