//! Physical USB backend.
//!
//! This module uses `nusb` to reach the lighting controller's control
//! endpoint. Command packets go out as class SET_REPORT requests and status
//! comes back through GET_REPORT, with the exact setup taken from the
//! model's [`ControlLayout`].

use std::time::Duration;

use nusb::transfer::{Control, ControlType, Recipient};
use tracing::{debug, info};

use super::channel::{UsbBus, UsbChannel};
use crate::error::{AlienFxError, Result};
use crate::protocol::{ControlLayout, Encoding};

/// Bus over the host's real USB devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NusbBus;

impl UsbBus for NusbBus {
    fn name(&self) -> &'static str {
        "usb"
    }

    fn open(
        &self,
        vendor_id: u16,
        product_id: u16,
        encoding: &Encoding,
        timeout: Duration,
    ) -> Result<Box<dyn UsbChannel>> {
        let layout = encoding.control;

        let device_info = nusb::list_devices()
            .map_err(|e| AlienFxError::Transfer(e.to_string()))?
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .ok_or(AlienFxError::DeviceNotFound {
                vendor_id,
                product_id,
            })?;

        let device = device_info
            .open()
            .map_err(|e| AlienFxError::from_claim(e, vendor_id, product_id))?;

        // Re-selecting the active configuration fails while drivers are bound.
        let active = device
            .active_configuration()
            .map(|c| c.configuration_value())
            .ok();
        if active != Some(layout.configuration) {
            debug!(
                "Switching configuration {:?} -> {}",
                active, layout.configuration
            );
            device
                .set_configuration(layout.configuration)
                .map_err(|e| AlienFxError::from_claim(e, vendor_id, product_id))?;
        }

        // Detaches the HID kernel driver first where the platform has one.
        let interface = device
            .detach_and_claim_interface(layout.interface)
            .map_err(|e| AlienFxError::from_claim(e, vendor_id, product_id))?;

        info!(
            "Claimed interface {} on {:04x}:{:04x}",
            layout.interface, vendor_id, product_id
        );

        Ok(Box::new(NusbChannel {
            interface,
            layout,
            timeout,
        }))
    }
}

/// Claimed interface plus its control setup.
pub struct NusbChannel {
    interface: nusb::Interface,
    layout: ControlLayout,
    timeout: Duration,
}

impl NusbChannel {
    fn write_control(&self) -> Result<Control> {
        control_for(
            self.layout.write_request_type,
            self.layout.write_request,
            self.layout.write_value,
            self.layout.index,
        )
    }

    fn read_control(&self) -> Result<Control> {
        control_for(
            self.layout.read_request_type,
            self.layout.read_request,
            self.layout.read_value,
            self.layout.index,
        )
    }
}

impl UsbChannel for NusbChannel {
    fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        let control = self.write_control()?;
        let written = self
            .interface
            .control_out_blocking(control, packet, self.timeout)
            .map_err(|e| AlienFxError::Transfer(e.to_string()))?;

        if written != packet.len() {
            return Err(AlienFxError::Transfer(format!(
                "Short write: {} of {} bytes",
                written,
                packet.len()
            )));
        }
        Ok(())
    }

    fn read_status(&mut self, request: &[u8], buf: &mut [u8]) -> Result<usize> {
        self.write_packet(request)?;

        let control = self.read_control()?;
        self.interface
            .control_in_blocking(control, buf, self.timeout)
            .map_err(|e| AlienFxError::Transfer(e.to_string()))
    }
}

/// Split a `bmRequestType` byte into nusb's control type and recipient.
///
/// The direction bit is implied by whether the transfer is in or out.
fn control_for(request_type: u8, request: u8, value: u16, index: u16) -> Result<Control> {
    let control_type = match (request_type >> 5) & 0x03 {
        0 => ControlType::Standard,
        1 => ControlType::Class,
        2 => ControlType::Vendor,
        _ => {
            return Err(AlienFxError::InvalidCatalog(format!(
                "Reserved request type {:#04x}",
                request_type
            )));
        }
    };

    let recipient = match request_type & 0x1F {
        0 => Recipient::Device,
        1 => Recipient::Interface,
        2 => Recipient::Endpoint,
        3 => Recipient::Other,
        _ => {
            return Err(AlienFxError::InvalidCatalog(format!(
                "Reserved recipient in request type {:#04x}",
                request_type
            )));
        }
    };

    Ok(Control {
        control_type,
        recipient,
        request,
        value,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_request_types() {
        let write = control_for(0x21, 0x09, 0x0202, 0).unwrap();
        assert_eq!(write.control_type, ControlType::Class);
        assert_eq!(write.recipient, Recipient::Interface);
        assert_eq!(write.request, 0x09);

        let read = control_for(0xA1, 0x01, 0x0101, 0).unwrap();
        assert_eq!(read.control_type, ControlType::Class);
        assert_eq!(read.recipient, Recipient::Interface);
    }

    #[test]
    fn test_reserved_request_type() {
        assert!(control_for(0x60, 0, 0, 0).is_err());
        assert!(control_for(0x25, 0, 0, 0).is_err());
    }
}
