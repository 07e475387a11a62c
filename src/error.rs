//! Custom error types for AlienFX lighting devices.
//!
//! This module provides fine-grained error handling for theme editing,
//! theme compilation and device transmission.

use thiserror::Error;

/// Main error type for AlienFX operations.
#[derive(Error, Debug)]
pub enum AlienFxError {
    /// Color string is not a 3- or 6-digit hex color.
    #[error("Invalid color '{0}'. Use #RGB or #RRGGBB")]
    InvalidColor(String),

    /// Mode string is not one of fixed, blink or morph.
    #[error("Invalid mode '{0}'. Valid modes: fixed, blink, morph")]
    InvalidMode(String),

    /// A region's zones need more command slots than the hardware has.
    #[error("Region '{region}' has {zones} zones but only {budget} command slots")]
    CapacityExceeded {
        region: String,
        zones: usize,
        budget: u16,
    },

    /// A zone requests a mode its region cannot display.
    #[error("Region '{region}' zone {sub_id:#04x} does not support {mode} mode")]
    UnsupportedMode {
        region: String,
        sub_id: u8,
        mode: String,
    },

    /// No device with the vendor/product pair is present.
    #[error("AlienFX device {vendor_id:04x}:{product_id:04x} not found. Check USB connection.")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// Device found but the interface could not be claimed.
    #[error("Permission denied opening device: {0}. Check udev rules or run as root.")]
    PermissionDenied(String),

    /// Device is already claimed by another session.
    #[error("Device {vendor_id:04x}:{product_id:04x} is already in use")]
    DeviceInUse { vendor_id: u16, product_id: u16 },

    /// Device never reported ready within the poll budget.
    #[error("Device busy: gave up after {sent} of {total} commands")]
    DeviceBusy { sent: usize, total: usize },

    /// Transmission was abandoned between commands.
    #[error("Transmission cancelled after {sent} of {total} commands")]
    Cancelled { sent: usize, total: usize },

    /// Session is spent and must be reopened.
    #[error("Session closed. Open a new session to continue.")]
    SessionClosed,

    /// Control transfer failed.
    #[error("USB transfer error: {0}")]
    Transfer(String),

    /// Invalid or malformed response from device.
    #[error("Invalid response from device: {message}")]
    InvalidResponse { message: String },

    /// No computer model with this name in the catalog.
    #[error("Unknown computer model '{0}'")]
    UnknownModel(String),

    /// No region with this name in the computer model.
    #[error("Unknown region '{0}'")]
    UnknownRegion(String),

    /// Catalog data is inconsistent.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Generic invalid input error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AlienFxError {
    /// Whether this error is a rejected input that left the previous state intact.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            AlienFxError::InvalidColor(_) | AlienFxError::InvalidMode(_)
        )
    }

    /// Classify an `nusb` error raised while opening or claiming a device.
    pub(crate) fn from_claim(err: nusb::Error, vendor_id: u16, product_id: u16) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => AlienFxError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::ResourceBusy => AlienFxError::DeviceInUse {
                vendor_id,
                product_id,
            },
            _ => AlienFxError::PermissionDenied(err.to_string()),
        }
    }
}

/// Result type alias for AlienFX operations.
pub type Result<T> = std::result::Result<T, AlienFxError>;
