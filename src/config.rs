// Firmware version, motor count, calibration defaults, device sizing
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::eeprom::Layout;

// Bump when the stored layout changes (adding a field, resizing a record)
pub const FIRMWARE_VERSION: u8 = 10;

// Motors on the arm
pub const NUM_MOTORS: usize = 6;

// Erased EEPROM cells read back as 0xFF, so this can never be a valid version
pub const BLANK_BYTE: u8 = 0xFF;

// EEPROM size of the controller board (ATmega2560)
pub const EEPROM_CAPACITY: usize = 4096;

// Image file used by the CLI when no --image is given
pub const DEFAULT_IMAGE_PATH: &str = "eeprom.bin";

// Calibration written on first boot (degrees)
pub const DEFAULT_LIMIT_MAX: f32 = 90.0;
pub const DEFAULT_LIMIT_MIN: f32 = -90.0;
pub const DEFAULT_HOME: f32 = 0.0;

// PID gains written on first boot
pub const DEFAULT_KP: f32 = 5.0;
pub const DEFAULT_KI: f32 = 0.001;
pub const DEFAULT_KD: f32 = 0.0;

/// Errors raised while loading or validating a [`StoreConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Motor count must be at least 1")]
    NoMotors,

    #[error("Firmware version 0x{0:02X} is reserved for blank storage")]
    ReservedVersion(u8),

    #[error("Motor count {0} is too large to address")]
    TooManyMotors(usize),
}

/// Build-time parameters of the storage layout.
///
/// Supplied once when the store is created; every offset is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub motor_count: usize,
    pub firmware_version: u8,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            motor_count: NUM_MOTORS,
            firmware_version: FIRMWARE_VERSION,
        }
    }
}

impl StoreConfig {
    pub fn new(motor_count: usize, firmware_version: u8) -> Result<Self, ConfigError> {
        let config = Self {
            motor_count,
            firmware_version,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a config from a JSON file; missing fields fall back to the defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.motor_count == 0 {
            return Err(ConfigError::NoMotors);
        }
        if self.firmware_version == BLANK_BYTE {
            return Err(ConfigError::ReservedVersion(self.firmware_version));
        }
        if Layout::checked_end(self.motor_count).is_none() {
            return Err(ConfigError::TooManyMotors(self.motor_count));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.motor_count, 6);
        assert_eq!(config.firmware_version, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_motors() {
        assert!(matches!(StoreConfig::new(0, 10), Err(ConfigError::NoMotors)));
    }

    #[test]
    fn test_rejects_blank_version() {
        assert!(matches!(
            StoreConfig::new(6, 0xFF),
            Err(ConfigError::ReservedVersion(0xFF))
        ));
    }

    #[test]
    fn test_json_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"motor_count": 4}}"#).unwrap();

        let config = StoreConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.motor_count, 4);
        assert_eq!(config.firmware_version, FIRMWARE_VERSION);
    }

    #[test]
    fn test_json_huge_motor_count_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"motor_count": 4611686018427387904}}"#).unwrap();

        assert!(matches!(
            StoreConfig::from_json_file(file.path()),
            Err(ConfigError::TooManyMotors(4_611_686_018_427_387_904))
        ));
    }

    #[test]
    fn test_json_invalid_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"motor_count": 0, "firmware_version": 3}}"#).unwrap();

        assert!(matches!(
            StoreConfig::from_json_file(file.path()),
            Err(ConfigError::NoMotors)
        ));
    }
}
