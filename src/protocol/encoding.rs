//! Per-model byte layout tables.
//!
//! The engine never derives these. Each computer model in the catalog
//! carries one, and every packet is built from it.

use serde::{Deserialize, Serialize};

use crate::error::{AlienFxError, Result};

// =============================================================================
// Classic AlienFX Table
// =============================================================================

/// Packet width of the classic 9-byte protocol.
pub const CLASSIC_PACKET_LEN: usize = 9;

/// First byte of every classic packet.
pub const CLASSIC_START_BYTE: u8 = 0x02;

/// Status byte meaning "ready for the next command".
pub const CLASSIC_STATUS_READY: u8 = 0x10;

/// Status byte meaning "still applying".
pub const CLASSIC_STATUS_BUSY: u8 = 0x11;

/// Bytes ahead of the color payload: start, opcode, region, sub-id.
pub const ZONE_HEADER_LEN: usize = 4;

// =============================================================================
// Table Types
// =============================================================================

/// How zone colors are packed into a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorDepth {
    /// 4 bits per channel, left and right packed into 3 bytes.
    #[default]
    Nibble,
    /// 8 bits per channel, 6 bytes.
    Byte,
}

impl ColorDepth {
    /// Payload bytes for a left/right color pair.
    pub const fn payload_len(&self) -> usize {
        match self {
            ColorDepth::Nibble => 3,
            ColorDepth::Byte => 6,
        }
    }
}

/// Opcode byte for each command meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Opcodes {
    pub morph: u8,
    pub blink: u8,
    pub fixed: u8,
    pub loop_end: u8,
    pub execute: u8,
    pub status: u8,
    pub reset: u8,
    pub speed: u8,
}

impl Default for Opcodes {
    fn default() -> Self {
        Self {
            morph: 0x01,
            blink: 0x02,
            fixed: 0x03,
            loop_end: 0x04,
            execute: 0x05,
            status: 0x06,
            reset: 0x07,
            speed: 0x0E,
        }
    }
}

/// Control-transfer setup for command writes and status reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLayout {
    /// USB configuration to activate before claiming.
    pub configuration: u8,
    pub interface: u8,
    pub write_request_type: u8,
    pub write_request: u8,
    pub write_value: u16,
    pub read_request_type: u8,
    pub read_request: u8,
    pub read_value: u16,
    pub index: u16,
    /// Bytes requested per status read.
    pub status_len: usize,
}

impl Default for ControlLayout {
    fn default() -> Self {
        // HID class SET_REPORT / GET_REPORT on interface 0
        Self {
            configuration: 1,
            interface: 0,
            write_request_type: 0x21,
            write_request: 0x09,
            write_value: 0x0202,
            read_request_type: 0xA1,
            read_request: 0x01,
            read_value: 0x0101,
            index: 0,
            status_len: CLASSIC_PACKET_LEN,
        }
    }
}

/// Complete byte layout for one hardware family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encoding {
    pub packet_len: usize,
    pub start_byte: u8,
    pub color_depth: ColorDepth,
    pub opcodes: Opcodes,
    pub ready: u8,
    pub busy: u8,
    pub reset_lights_on: u8,
    pub reset_lights_off: u8,
    /// Sub-id addressing every zone of a region at once.
    pub broadcast_zone: u8,
    pub control: ControlLayout,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            packet_len: CLASSIC_PACKET_LEN,
            start_byte: CLASSIC_START_BYTE,
            color_depth: ColorDepth::Nibble,
            opcodes: Opcodes::default(),
            ready: CLASSIC_STATUS_READY,
            busy: CLASSIC_STATUS_BUSY,
            reset_lights_on: 0x04,
            reset_lights_off: 0x03,
            broadcast_zone: 0xFF,
            control: ControlLayout::default(),
        }
    }
}

impl Encoding {
    /// Smallest packet that holds a zone command.
    pub const fn zone_packet_len(&self) -> usize {
        ZONE_HEADER_LEN + self.color_depth.payload_len()
    }

    /// Reject tables whose packets cannot carry a zone command.
    pub fn validate(&self) -> Result<()> {
        if self.packet_len < self.zone_packet_len() {
            return Err(AlienFxError::InvalidCatalog(format!(
                "packet_len {} too short for {:?} colors (need {})",
                self.packet_len,
                self.color_depth,
                self.zone_packet_len()
            )));
        }
        if self.control.status_len == 0 {
            return Err(AlienFxError::InvalidCatalog(
                "status_len must be at least 1".into(),
            ));
        }
        if self.ready == self.busy {
            return Err(AlienFxError::InvalidCatalog(
                "ready and busy sentinels must differ".into(),
            ));
        }
        Ok(())
    }
}
