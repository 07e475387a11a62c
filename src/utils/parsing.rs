//! Parsing utilities for CLI arguments and configuration values.
//!
//! This module provides reusable parsing functions for common input formats
//! used throughout the application.

use crate::error::{AlienFxError, Result};

// =============================================================================
// USB Id Parsing
// =============================================================================

/// Parse a 16-bit USB id.
///
/// Hex digits, with or without a `0x` prefix.
///
/// # Example
/// ```
/// use alienfx_rust::utils::parsing::parse_usb_id;
///
/// assert_eq!(parse_usb_id("0x187C").unwrap(), 0x187C);
/// assert_eq!(parse_usb_id("0512").unwrap(), 0x0512);
/// assert!(parse_usb_id("12345").is_err());
/// ```
pub fn parse_usb_id(s: &str) -> Result<u16> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    if digits.is_empty() || digits.len() > 4 {
        return Err(AlienFxError::InvalidInput(format!(
            "Invalid USB id '{}'. Use up to 4 hex digits",
            s
        )));
    }

    u16::from_str_radix(digits, 16)
        .map_err(|_| AlienFxError::InvalidInput(format!("Invalid USB id '{}'", s)))
}

/// Parse a `vendor:product` pair as printed by lsusb.
///
/// # Example
/// ```
/// use alienfx_rust::utils::parsing::parse_device_pair;
///
/// assert_eq!(parse_device_pair("187c:0512").unwrap(), (0x187C, 0x0512));
/// assert!(parse_device_pair("187c").is_err());
/// ```
pub fn parse_device_pair(s: &str) -> Result<(u16, u16)> {
    let (vendor, product) = s.split_once(':').ok_or_else(|| {
        AlienFxError::InvalidInput(format!(
            "Invalid device '{}'. Use VENDOR:PRODUCT, e.g. 187c:0512",
            s
        ))
    })?;
    Ok((parse_usb_id(vendor)?, parse_usb_id(product)?))
}

// =============================================================================
// Zone Address Parsing
// =============================================================================

/// Parse a zone sub-id, either hex (`0x11`) or decimal (`17`).
///
/// # Example
/// ```
/// use alienfx_rust::utils::parsing::parse_sub_id;
///
/// assert_eq!(parse_sub_id("0x11").unwrap(), 0x11);
/// assert_eq!(parse_sub_id("17").unwrap(), 17);
/// ```
pub fn parse_sub_id(s: &str) -> Result<u8> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|_| AlienFxError::InvalidInput(format!("Invalid zone id '{}'", s)))
}
