//! Capability interface shared by the real and simulated backends.

use std::time::Duration;

use crate::error::Result;
use crate::protocol::Encoding;

/// An exclusively claimed control channel to one device.
///
/// Dropping the channel releases the claim.
pub trait UsbChannel: Send {
    /// Write one packet as a single control transfer.
    fn write_packet(&mut self, packet: &[u8]) -> Result<()>;

    /// Write `request`, then read a status report into `buf`.
    ///
    /// Returns the number of bytes read.
    fn read_status(&mut self, request: &[u8], buf: &mut [u8]) -> Result<usize>;
}

/// A bus that sessions are opened on.
pub trait UsbBus {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Locate and claim the device.
    ///
    /// # Errors
    /// - `DeviceNotFound` if no device matches the pair
    /// - `PermissionDenied` if the device cannot be claimed
    /// - `DeviceInUse` if another session holds the device
    fn open(
        &self,
        vendor_id: u16,
        product_id: u16,
        encoding: &Encoding,
        timeout: Duration,
    ) -> Result<Box<dyn UsbChannel>>;
}
