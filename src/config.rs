//! Engine configuration for AlienFX sessions.
//!
//! Provides the readiness-polling budget, backend selection and the
//! optional JSON config file.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AlienFxError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Default effect tempo sent with every themed transaction.
pub const DEFAULT_SPEED: u16 = 200;

/// Slowest tempo the firmware accepts.
pub const MIN_SPEED: u16 = 1;

/// Fastest tempo the firmware accepts.
pub const MAX_SPEED: u16 = 1000;

/// Default number of status polls after each command.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;

/// Default delay between status polls in milliseconds.
pub const DEFAULT_POLL_DELAY_MS: u64 = 20;

/// Default control transfer timeout in milliseconds.
pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 1000;

// =============================================================================
// Session Config
// =============================================================================

/// Readiness protocol tuning for a [`DeviceSession`](crate::device::DeviceSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Status polls per command before giving up with `DeviceBusy`.
    pub poll_attempts: u32,
    /// Delay between polls.
    pub poll_delay_ms: u64,
    /// Timeout for a single control transfer.
    pub transfer_timeout_ms: u64,
}

impl SessionConfig {
    /// Reject budgets that could never observe a ready device.
    pub fn validate(&self) -> Result<()> {
        if self.poll_attempts == 0 {
            return Err(AlienFxError::InvalidInput(
                "poll_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_delay_ms: DEFAULT_POLL_DELAY_MS,
            transfer_timeout_ms: DEFAULT_TRANSFER_TIMEOUT_MS,
        }
    }
}

// =============================================================================
// Backend Selection
// =============================================================================

/// Which bus implementation sessions are opened on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Physical USB device via nusb.
    #[default]
    Usb,
    /// In-process stand-in that always reports ready.
    Simulated,
}

impl FromStr for BackendKind {
    type Err = AlienFxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "usb" => Ok(BackendKind::Usb),
            "simulated" | "sim" => Ok(BackendKind::Simulated),
            _ => Err(AlienFxError::InvalidInput(format!(
                "Unknown backend '{}'. Use: usb or simulated",
                s
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Usb => write!(f, "usb"),
            BackendKind::Simulated => write!(f, "simulated"),
        }
    }
}

// =============================================================================
// Engine Config File
// =============================================================================

/// Top-level engine configuration, optionally read from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: BackendKind,
    pub session: SessionConfig,
    /// Effect tempo used when a command does not give one.
    pub speed: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            session: SessionConfig::default(),
            speed: DEFAULT_SPEED,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.session.validate()?;
        validate_speed(config.speed)?;
        Ok(config)
    }
}

/// Validate an effect tempo.
pub fn validate_speed(speed: u16) -> Result<u16> {
    if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(AlienFxError::InvalidInput(format!(
            "Speed {} out of range. Valid range: {}-{}",
            speed, MIN_SPEED, MAX_SPEED
        )));
    }
    Ok(speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("usb".parse::<BackendKind>().unwrap(), BackendKind::Usb);
        assert_eq!("SIM".parse::<BackendKind>().unwrap(), BackendKind::Simulated);
        assert!("serial".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_zero_poll_budget_rejected() {
        let config = SessionConfig {
            poll_attempts: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_speed_range() {
        assert!(validate_speed(DEFAULT_SPEED).is_ok());
        assert!(validate_speed(0).is_err());
        assert!(validate_speed(MAX_SPEED + 1).is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"backend": "simulated", "session": {{"poll_attempts": 3}}}}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.backend, BackendKind::Simulated);
        assert_eq!(config.session.poll_attempts, 3);
        assert_eq!(config.session.poll_delay_ms, DEFAULT_POLL_DELAY_MS);
        assert_eq!(config.speed, DEFAULT_SPEED);
    }
}
