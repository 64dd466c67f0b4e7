//! Session configuration.
//!
//! Settings are loaded with the `config` crate from an optional TOML file,
//! with `DMM7510_*` environment variables taking precedence. Example file:
//!
//! ```toml
//! resource_string = "TCPIP::192.168.1.201::inst0::INSTR"
//! timeout_ms = 5000
//! line_terminator = "\n"
//! digitize_count = 15
//! ```
//!
//! - `resource_string`: VISA resource identifier of the multimeter.
//! - `timeout_ms`: read/write timeout applied to every transport exchange.
//! - `line_terminator`: appended to each outgoing SCPI command.
//! - `digitize_count`: digitizer samples taken per external trigger edge.
//!   This is a per-session constant, not a per-call parameter.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{DmmError, DmmResult};

/// Settings for a single DMM7510 session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Dmm7510Config {
    /// VISA resource string (e.g. `TCPIP::192.168.1.201::inst0::INSTR`).
    pub resource_string: String,

    /// Transport read/write timeout in milliseconds.
    pub timeout_ms: u64,

    /// Line terminator appended to outgoing commands (typically `\n`).
    pub line_terminator: String,

    /// Number of digitizer samples per external trigger edge.
    pub digitize_count: u32,
}

impl Default for Dmm7510Config {
    fn default() -> Self {
        Self {
            resource_string: "TCPIP::192.168.1.201::inst0::INSTR".to_string(),
            timeout_ms: 5000,
            line_terminator: "\n".to_string(),
            digitize_count: 15,
        }
    }
}

impl Dmm7510Config {
    /// Load settings from an optional TOML file and `DMM7510_*` environment
    /// variables, then validate them.
    pub fn load(path: Option<&Path>) -> DmmResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Self = builder
            .add_source(Environment::with_prefix("DMM7510").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check values that parse fine but make no sense.
    pub fn validate(&self) -> DmmResult<()> {
        if self.resource_string.trim().is_empty() {
            return Err(DmmError::Configuration(
                "resource_string must not be empty".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(DmmError::Configuration(
                "timeout_ms must be positive".to_string(),
            ));
        }
        if self.digitize_count == 0 {
            return Err(DmmError::Configuration(
                "digitize_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Transport timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Dmm7510Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resource_string, "TCPIP::192.168.1.201::inst0::INSTR");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.digitize_count, 15);
    }

    #[test]
    fn test_rejects_zero_digitize_count() {
        let config = Dmm7510Config {
            digitize_count: 0,
            ..Dmm7510Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DmmError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_empty_resource() {
        let config = Dmm7510Config {
            resource_string: "  ".to_string(),
            ..Dmm7510Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = Dmm7510Config {
            timeout_ms: 0,
            ..Dmm7510Config::default()
        };
        assert!(config.validate().is_err());
    }
}
