//! Command packets and their builders.
//!
//! Every builder takes the model's [`Encoding`] and returns a zero-padded,
//! fixed-width [`Command`].

use std::hash::{Hash, Hasher};

use super::encoding::{ColorDepth, Encoding};
use crate::model::{HardwareRegion, Mode, Rgb, Zone};

// =============================================================================
// Command
// =============================================================================

/// One control transfer worth of bytes plus a diagnostic legend.
///
/// Two commands with the same bytes are equal whatever their legend.
#[derive(Debug, Clone)]
pub struct Command {
    bytes: Vec<u8>,
    legend: String,
}

impl Command {
    pub fn new(bytes: Vec<u8>, legend: impl Into<String>) -> Self {
        Self {
            bytes,
            legend: legend.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Human-readable description, for logs only.
    pub fn legend(&self) -> &str {
        &self.legend
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Command {}

impl Hash for Command {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<40}", self.legend)?;
        for byte in &self.bytes {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}

// =============================================================================
// Command Builders
// =============================================================================

/// Opcode for a zone mode.
pub fn mode_opcode(encoding: &Encoding, mode: Mode) -> u8 {
    match mode {
        Mode::Fixed => encoding.opcodes.fixed,
        Mode::Blink => encoding.opcodes.blink,
        Mode::Morph => encoding.opcodes.morph,
    }
}

/// Build the command that sets one zone.
///
/// Layout: `[start, opcode, hex_id, sub_id, colors…]`. Both colors are
/// always carried. The device ignores the right color for fixed and blink.
pub fn build_zone_cmd(encoding: &Encoding, region: &HardwareRegion, zone: &Zone) -> Command {
    let mut buf = header(encoding, mode_opcode(encoding, zone.mode()));
    buf.push(region.hex_id);
    buf.push(zone.sub_id());
    buf.extend(color_payload(encoding.color_depth, zone.left_color(), zone.right_color()));

    let legend = format!(
        "{}[{:#04x}] {} {}/{}",
        region.name,
        zone.sub_id(),
        zone.mode(),
        zone.left_color(),
        zone.right_color()
    );
    finish(encoding, buf, legend)
}

/// Build a fixed black command addressed to every zone of `region`.
pub fn build_broadcast_off_cmd(encoding: &Encoding, region: &HardwareRegion) -> Command {
    let mut buf = header(encoding, encoding.opcodes.fixed);
    buf.push(region.hex_id);
    buf.push(encoding.broadcast_zone);
    buf.extend(color_payload(encoding.color_depth, Rgb::BLACK, Rgb::BLACK));

    finish(encoding, buf, format!("{}[all] off", region.name))
}

/// Build a reset command. `arg` is one of the encoding's reset arguments.
pub fn build_reset_cmd(encoding: &Encoding, arg: u8) -> Command {
    let mut buf = header(encoding, encoding.opcodes.reset);
    buf.push(arg);
    finish(encoding, buf, format!("reset {:#04x}", arg))
}

/// Build a tempo command (big-endian u16).
pub fn build_speed_cmd(encoding: &Encoding, speed: u16) -> Command {
    let mut buf = header(encoding, encoding.opcodes.speed);
    buf.extend_from_slice(&speed.to_be_bytes());
    finish(encoding, buf, format!("speed {}", speed))
}

pub fn build_loop_end_cmd(encoding: &Encoding) -> Command {
    finish(encoding, header(encoding, encoding.opcodes.loop_end), "loop end")
}

pub fn build_execute_cmd(encoding: &Encoding) -> Command {
    finish(encoding, header(encoding, encoding.opcodes.execute), "execute")
}

/// Build the request that precedes each status read.
pub fn build_status_request_cmd(encoding: &Encoding) -> Command {
    finish(encoding, header(encoding, encoding.opcodes.status), "status")
}

fn header(encoding: &Encoding, opcode: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoding.packet_len);
    buf.push(encoding.start_byte);
    buf.push(opcode);
    buf
}

fn finish(encoding: &Encoding, mut buf: Vec<u8>, legend: impl Into<String>) -> Command {
    // Validated tables always fit, so this only pads.
    buf.resize(encoding.packet_len.max(buf.len()), 0x00);
    Command::new(buf, legend)
}

fn color_payload(depth: ColorDepth, left: Rgb, right: Rgb) -> Vec<u8> {
    match depth {
        ColorDepth::Nibble => {
            let [lr, lg, lb] = left.nibbles();
            let [rr, rg, rb] = right.nibbles();
            vec![lr << 4 | lg, lb << 4 | rr, rg << 4 | rb]
        }
        ColorDepth::Byte => vec![left.r, left.g, left.b, right.r, right.g, right.b],
    }
}
