//! Device transmission layer.
//!
//! Sessions are opened on a [`UsbBus`]. Two buses exist: [`NusbBus`] for
//! real hardware and [`SimulatedBus`] as an in-process drop-in.

pub mod channel;
pub mod session;
pub mod simulated;
pub mod usb;

pub use channel::{UsbBus, UsbChannel};
pub use session::DeviceSession;
pub use simulated::{SIMULATED_PRODUCT_ID, SIMULATED_VENDOR_ID, SimulatedBehavior, SimulatedBus};
pub use usb::NusbBus;

use crate::config::BackendKind;

/// Bus for a configured backend.
pub fn bus_for(kind: BackendKind) -> Box<dyn UsbBus> {
    match kind {
        BackendKind::Usb => Box::new(NusbBus),
        BackendKind::Simulated => Box::new(SimulatedBus::new()),
    }
}
