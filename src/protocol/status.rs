//! Device status report parsing.
//!
//! After each command the device answers a status request with a short
//! report. Only the first byte carries meaning.

use super::encoding::Encoding;
use crate::error::{AlienFxError, Result};

/// Offset of the status byte within a status report.
const OFFSET_STATUS: usize = 0;

/// Parsed readiness state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Device accepts the next command.
    Ready,
    /// Device is still applying the previous command.
    Busy,
    /// Any other status byte.
    Other(u8),
}

impl DeviceStatus {
    /// Parse a status report using the model's sentinels.
    ///
    /// # Errors
    /// Returns `InvalidResponse` if the report is empty.
    pub fn parse(buf: &[u8], encoding: &Encoding) -> Result<Self> {
        let byte = *buf.get(OFFSET_STATUS).ok_or_else(|| AlienFxError::InvalidResponse {
            message: "Empty status report".into(),
        })?;

        Ok(if byte == encoding.ready {
            DeviceStatus::Ready
        } else if byte == encoding.busy {
            DeviceStatus::Busy
        } else {
            DeviceStatus::Other(byte)
        })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DeviceStatus::Ready)
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Ready => write!(f, "ready"),
            DeviceStatus::Busy => write!(f, "busy"),
            DeviceStatus::Other(byte) => write!(f, "unknown ({:#04x})", byte),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentinels() {
        let encoding = Encoding::default();
        let mut buf = [0u8; 9];

        buf[0] = encoding.ready;
        assert_eq!(DeviceStatus::parse(&buf, &encoding).unwrap(), DeviceStatus::Ready);

        buf[0] = encoding.busy;
        assert_eq!(DeviceStatus::parse(&buf, &encoding).unwrap(), DeviceStatus::Busy);

        buf[0] = 0x42;
        assert_eq!(
            DeviceStatus::parse(&buf, &encoding).unwrap(),
            DeviceStatus::Other(0x42)
        );
    }

    #[test]
    fn test_empty_report() {
        assert!(DeviceStatus::parse(&[], &Encoding::default()).is_err());
    }
}
