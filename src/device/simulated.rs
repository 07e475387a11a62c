//! In-process stand-in for the lighting controller.
//!
//! `SimulatedBus` honours the same open/claim/send contract as the USB
//! backend without touching hardware. Every packet a session writes is
//! recorded so callers can inspect what the device would have applied.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::channel::{UsbBus, UsbChannel};
use crate::error::{AlienFxError, Result};
use crate::protocol::Encoding;

/// Vendor id of the device every simulated bus carries.
pub const SIMULATED_VENDOR_ID: u16 = 0x187C;

/// Product id of the device every simulated bus carries.
pub const SIMULATED_PRODUCT_ID: u16 = 0xFFFF;

/// How a simulated device answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimulatedBehavior {
    /// Reports ready after every command.
    #[default]
    AlwaysReady,
    /// Reports busy forever.
    NeverReady,
    /// The n-th packet write (0-based) fails once with a transfer error.
    FaultOnWrite(usize),
    /// Present but refuses every claim, as without udev access.
    Denied,
}

#[derive(Debug)]
struct SimulatedDevice {
    vendor_id: u16,
    product_id: u16,
    behavior: SimulatedBehavior,
    claimed: bool,
    writes: usize,
    fault_fired: bool,
    polls: usize,
    applied: Vec<Vec<u8>>,
}

impl SimulatedDevice {
    fn new(vendor_id: u16, product_id: u16, behavior: SimulatedBehavior) -> Self {
        Self {
            vendor_id,
            product_id,
            behavior,
            claimed: false,
            writes: 0,
            fault_fired: false,
            polls: 0,
            applied: Vec::new(),
        }
    }

    fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// Simulated bus. Clones share the same devices.
#[derive(Debug, Clone)]
pub struct SimulatedBus {
    devices: Arc<Mutex<Vec<SimulatedDevice>>>,
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBus {
    /// A bus carrying only the always-present device.
    pub fn new() -> Self {
        let device = SimulatedDevice::new(
            SIMULATED_VENDOR_ID,
            SIMULATED_PRODUCT_ID,
            SimulatedBehavior::AlwaysReady,
        );
        Self {
            devices: Arc::new(Mutex::new(vec![device])),
        }
    }

    /// Attach another device, or change the behavior of an existing one.
    pub fn with_device(self, vendor_id: u16, product_id: u16, behavior: SimulatedBehavior) -> Self {
        self.attach(vendor_id, product_id, behavior);
        self
    }

    pub fn attach(&self, vendor_id: u16, product_id: u16, behavior: SimulatedBehavior) {
        let mut devices = self.lock();
        match devices.iter_mut().find(|d| d.matches(vendor_id, product_id)) {
            Some(device) => device.behavior = behavior,
            None => devices.push(SimulatedDevice::new(vendor_id, product_id, behavior)),
        }
    }

    /// Packets the device accepted, in order. Status requests are excluded.
    pub fn applied(&self, vendor_id: u16, product_id: u16) -> Vec<Vec<u8>> {
        self.inspect(vendor_id, product_id, |d| d.applied.clone())
            .unwrap_or_default()
    }

    /// Number of status reports served.
    pub fn polls(&self, vendor_id: u16, product_id: u16) -> usize {
        self.inspect(vendor_id, product_id, |d| d.polls)
            .unwrap_or_default()
    }

    pub fn is_claimed(&self, vendor_id: u16, product_id: u16) -> bool {
        self.inspect(vendor_id, product_id, |d| d.claimed)
            .unwrap_or_default()
    }

    fn inspect<T>(&self, vendor_id: u16, product_id: u16, f: impl FnOnce(&SimulatedDevice) -> T) -> Option<T> {
        self.lock()
            .iter()
            .find(|d| d.matches(vendor_id, product_id))
            .map(f)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SimulatedDevice>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UsbBus for SimulatedBus {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn open(
        &self,
        vendor_id: u16,
        product_id: u16,
        encoding: &Encoding,
        _timeout: Duration,
    ) -> Result<Box<dyn UsbChannel>> {
        let mut devices = self.lock();
        let index = devices
            .iter()
            .position(|d| d.matches(vendor_id, product_id))
            .ok_or(AlienFxError::DeviceNotFound {
                vendor_id,
                product_id,
            })?;

        let device = &mut devices[index];
        if device.behavior == SimulatedBehavior::Denied {
            return Err(AlienFxError::PermissionDenied(format!(
                "Simulated device {:04x}:{:04x} refused the claim",
                vendor_id, product_id
            )));
        }
        if device.claimed {
            return Err(AlienFxError::DeviceInUse {
                vendor_id,
                product_id,
            });
        }
        device.claimed = true;
        debug!("Simulated device {:04x}:{:04x} claimed", vendor_id, product_id);

        Ok(Box::new(SimulatedChannel {
            bus: self.clone(),
            index,
            ready: encoding.ready,
            busy: encoding.busy,
        }))
    }
}

/// Claimed simulated device.
struct SimulatedChannel {
    bus: SimulatedBus,
    index: usize,
    ready: u8,
    busy: u8,
}

impl UsbChannel for SimulatedChannel {
    fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        let mut devices = self.bus.lock();
        let device = &mut devices[self.index];

        let write = device.writes;
        device.writes += 1;
        if device.behavior == SimulatedBehavior::FaultOnWrite(write) && !device.fault_fired {
            device.fault_fired = true;
            return Err(AlienFxError::Transfer(format!(
                "Simulated fault on write {}",
                write
            )));
        }

        device.applied.push(packet.to_vec());
        Ok(())
    }

    fn read_status(&mut self, _request: &[u8], buf: &mut [u8]) -> Result<usize> {
        let mut devices = self.bus.lock();
        let device = &mut devices[self.index];
        device.polls += 1;

        let status = match device.behavior {
            SimulatedBehavior::NeverReady => self.busy,
            _ => self.ready,
        };

        buf.fill(0);
        if let Some(first) = buf.first_mut() {
            *first = status;
        }
        Ok(buf.len())
    }
}

impl Drop for SimulatedChannel {
    fn drop(&mut self) {
        if let Some(device) = self.bus.lock().get_mut(self.index) {
            device.claimed = false;
        }
    }
}
