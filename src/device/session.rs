//! Exclusive transmission session with one lighting controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::channel::{UsbBus, UsbChannel};
use crate::config::SessionConfig;
use crate::error::{AlienFxError, Result};
use crate::protocol::{Command, DeviceStatus, Encoding, build_status_request_cmd};

// =============================================================================
// DeviceSession
// =============================================================================

/// Owned channel to one device plus the readiness protocol.
///
/// Commands are written one at a time. After each write the device is
/// polled until it reports ready or the poll budget runs out.
///
/// # Example
///
/// ```
/// use alienfx_rust::config::SessionConfig;
/// use alienfx_rust::device::{DeviceSession, SimulatedBus, SIMULATED_PRODUCT_ID, SIMULATED_VENDOR_ID};
/// use alienfx_rust::protocol::{Encoding, build_execute_cmd};
///
/// let bus = SimulatedBus::new();
/// let encoding = Encoding::default();
/// let mut session = DeviceSession::open(
///     &bus,
///     SIMULATED_VENDOR_ID,
///     SIMULATED_PRODUCT_ID,
///     &encoding,
///     SessionConfig::default(),
/// )?;
/// session.send(&[build_execute_cmd(&encoding)])?;
/// session.close();
/// # Ok::<(), alienfx_rust::error::AlienFxError>(())
/// ```
pub struct DeviceSession {
    /// `None` once the session is spent.
    channel: Option<Box<dyn UsbChannel>>,
    encoding: Encoding,
    config: SessionConfig,
    vendor_id: u16,
    product_id: u16,
    status_request: Command,
    commands_sent: usize,
}

impl DeviceSession {
    /// Locate and claim a device on `bus`.
    ///
    /// # Errors
    /// - `DeviceNotFound` if the pair is not present
    /// - `PermissionDenied` if the device cannot be claimed
    /// - `DeviceInUse` if another session holds it
    pub fn open(
        bus: &dyn UsbBus,
        vendor_id: u16,
        product_id: u16,
        encoding: &Encoding,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;
        encoding.validate()?;

        let timeout = Duration::from_millis(config.transfer_timeout_ms);
        let channel = bus.open(vendor_id, product_id, encoding, timeout)?;
        info!(
            "Opened {} session on {:04x}:{:04x}",
            bus.name(),
            vendor_id,
            product_id
        );

        Ok(Self {
            channel: Some(channel),
            encoding: *encoding,
            config,
            vendor_id,
            product_id,
            status_request: build_status_request_cmd(encoding),
            commands_sent: 0,
        })
    }

    /// Send commands in order, waiting for readiness after each.
    ///
    /// # Errors
    /// - `DeviceBusy` if the device never reported ready. Commands before
    ///   the failing one stay applied and the session is spent.
    /// - `Transfer` on a failed control transfer. The session is spent.
    /// - `SessionClosed` if the session was already spent.
    pub fn send(&mut self, commands: &[Command]) -> Result<()> {
        self.send_cancellable(commands, &AtomicBool::new(false))
    }

    /// Like [`send`](Self::send), but stops between commands once `cancel`
    /// is set.
    ///
    /// A cancelled session stays usable.
    pub fn send_cancellable(&mut self, commands: &[Command], cancel: &AtomicBool) -> Result<()> {
        if self.channel.is_none() {
            return Err(AlienFxError::SessionClosed);
        }

        let total = commands.len();
        for (i, command) in commands.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!("Transmission cancelled after {} of {} commands", i, total);
                return Err(AlienFxError::Cancelled { sent: i, total });
            }

            debug!("-> {}", command);
            if let Err(e) = self.transmit(command) {
                warn!("Transfer failed on command {} of {}: {}", i + 1, total, e);
                self.spend();
                return Err(e);
            }
            self.commands_sent += 1;

            if !self.wait_ready()? {
                warn!(
                    "Device not ready after {} polls, abandoning {} commands",
                    self.config.poll_attempts,
                    total - i - 1
                );
                self.spend();
                return Err(AlienFxError::DeviceBusy { sent: i + 1, total });
            }
        }

        Ok(())
    }

    /// Release the device.
    pub fn close(mut self) {
        self.spend();
    }

    /// Whether this session must be reopened before sending again.
    pub fn is_spent(&self) -> bool {
        self.channel.is_none()
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Commands written over the life of this session.
    pub fn commands_sent(&self) -> usize {
        self.commands_sent
    }

    fn channel(&mut self) -> Result<&mut Box<dyn UsbChannel>> {
        self.channel.as_mut().ok_or(AlienFxError::SessionClosed)
    }

    fn transmit(&mut self, command: &Command) -> Result<()> {
        self.channel()?.write_packet(command.bytes())
    }

    /// Poll status until ready. `Ok(false)` when the budget runs out.
    fn wait_ready(&mut self) -> Result<bool> {
        let attempts = self.config.poll_attempts;
        let delay = Duration::from_millis(self.config.poll_delay_ms);
        let mut buf = vec![0u8; self.encoding.control.status_len];

        for attempt in 1..=attempts {
            let request = self.status_request.bytes().to_vec();
            let result = self.channel()?.read_status(&request, &mut buf);
            let read = match result {
                Ok(n) => n,
                Err(e) => {
                    warn!("Status read failed: {}", e);
                    self.spend();
                    return Err(e);
                }
            };

            let status = match DeviceStatus::parse(&buf[..read.min(buf.len())], &self.encoding) {
                Ok(status) => status,
                Err(e) => {
                    self.spend();
                    return Err(e);
                }
            };
            debug!("Poll {}/{}: {}", attempt, attempts, status);
            if status.is_ready() {
                return Ok(true);
            }

            if attempt < attempts && !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        Ok(false)
    }

    fn spend(&mut self) {
        if self.channel.take().is_some() {
            info!(
                "Closed session on {:04x}:{:04x}",
                self.vendor_id, self.product_id
            );
        }
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("vendor_id", &format_args!("{:04x}", self.vendor_id))
            .field("product_id", &format_args!("{:04x}", self.product_id))
            .field("spent", &self.is_spent())
            .field("commands_sent", &self.commands_sent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::simulated::{
        SIMULATED_PRODUCT_ID, SIMULATED_VENDOR_ID, SimulatedBehavior, SimulatedBus,
    };
    use crate::protocol::{build_execute_cmd, build_loop_end_cmd, build_reset_cmd};

    const BUSY_PID: u16 = 0x0512;

    fn fast_config() -> SessionConfig {
        SessionConfig {
            poll_attempts: 3,
            poll_delay_ms: 0,
            ..SessionConfig::default()
        }
    }

    fn three_commands(encoding: &Encoding) -> Vec<Command> {
        vec![
            build_reset_cmd(encoding, encoding.reset_lights_on),
            build_loop_end_cmd(encoding),
            build_execute_cmd(encoding),
        ]
    }

    #[test]
    fn test_send_applies_in_order() {
        let encoding = Encoding::default();
        let bus = SimulatedBus::new();
        let mut session = DeviceSession::open(
            &bus,
            SIMULATED_VENDOR_ID,
            SIMULATED_PRODUCT_ID,
            &encoding,
            fast_config(),
        )
        .unwrap();

        let commands = three_commands(&encoding);
        session.send(&commands).unwrap();

        let applied = bus.applied(SIMULATED_VENDOR_ID, SIMULATED_PRODUCT_ID);
        let expected: Vec<Vec<u8>> = commands.iter().map(|c| c.bytes().to_vec()).collect();
        assert_eq!(applied, expected);
        assert_eq!(bus.polls(SIMULATED_VENDOR_ID, SIMULATED_PRODUCT_ID), 3);
        assert_eq!(session.commands_sent(), 3);
    }

    #[test]
    fn test_never_ready_is_busy_and_spends_session() {
        let encoding = Encoding::default();
        let bus = SimulatedBus::new().with_device(SIMULATED_VENDOR_ID, BUSY_PID, SimulatedBehavior::NeverReady);
        let mut session =
            DeviceSession::open(&bus, SIMULATED_VENDOR_ID, BUSY_PID, &encoding, fast_config()).unwrap();

        let err = session.send(&three_commands(&encoding)).unwrap_err();
        assert!(matches!(err, AlienFxError::DeviceBusy { sent: 1, total: 3 }));
        assert_eq!(bus.polls(SIMULATED_VENDOR_ID, BUSY_PID), 3);
        assert_eq!(bus.applied(SIMULATED_VENDOR_ID, BUSY_PID).len(), 1);

        assert!(session.is_spent());
        assert!(!bus.is_claimed(SIMULATED_VENDOR_ID, BUSY_PID));
        assert!(matches!(
            session.send(&three_commands(&encoding)),
            Err(AlienFxError::SessionClosed)
        ));
    }

    #[test]
    fn test_transfer_error_spends_session() {
        let encoding = Encoding::default();
        let bus = SimulatedBus::new().with_device(SIMULATED_VENDOR_ID, BUSY_PID, SimulatedBehavior::FaultOnWrite(1));
        let mut session =
            DeviceSession::open(&bus, SIMULATED_VENDOR_ID, BUSY_PID, &encoding, fast_config()).unwrap();

        assert!(matches!(
            session.send(&three_commands(&encoding)),
            Err(AlienFxError::Transfer(_))
        ));
        assert!(session.is_spent());

        // A fresh session works once the fault has fired.
        let mut fresh =
            DeviceSession::open(&bus, SIMULATED_VENDOR_ID, BUSY_PID, &encoding, fast_config()).unwrap();
        assert!(fresh.send(&three_commands(&encoding)).is_ok());
    }

    #[test]
    fn test_cancel_between_commands() {
        let encoding = Encoding::default();
        let bus = SimulatedBus::new();
        let mut session = DeviceSession::open(
            &bus,
            SIMULATED_VENDOR_ID,
            SIMULATED_PRODUCT_ID,
            &encoding,
            fast_config(),
        )
        .unwrap();

        let cancel = AtomicBool::new(true);
        let err = session
            .send_cancellable(&three_commands(&encoding), &cancel)
            .unwrap_err();
        assert!(matches!(err, AlienFxError::Cancelled { sent: 0, total: 3 }));
        assert!(!session.is_spent());
        assert!(session.send(&three_commands(&encoding)).is_ok());
    }

    #[test]
    fn test_close_releases_claim() {
        let encoding = Encoding::default();
        let bus = SimulatedBus::new();
        let open = || {
            DeviceSession::open(
                &bus,
                SIMULATED_VENDOR_ID,
                SIMULATED_PRODUCT_ID,
                &encoding,
                fast_config(),
            )
        };

        let session = open().unwrap();
        assert!(matches!(open(), Err(AlienFxError::DeviceInUse { .. })));
        session.close();
        assert!(open().is_ok());
    }
}
