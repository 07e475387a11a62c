//! Zone-by-zone hardware validation.
//!
//! `BlockTester` lights one zone at a time so a person watching the machine
//! can confirm each catalog entry. Every catalog run ends with the lights
//! off, including runs that fail, get cancelled or panic.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::catalog::{Catalog, ComputerModel};
use crate::config::{DEFAULT_SPEED, SessionConfig};
use crate::device::{DeviceSession, UsbBus};
use crate::error::{AlienFxError, Result};
use crate::model::{Mode, Rgb, Theme};
use crate::protocol::{Command, Encoding};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of looking for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found,
    NotFound,
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Found => write!(f, "found"),
            ProbeOutcome::NotFound => write!(f, "not found"),
        }
    }
}

/// Parameters shared by every zone test of a catalog run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestPlan {
    pub speed: u16,
    pub color1: Rgb,
    pub color2: Rgb,
    /// Stop at the first failing zone instead of testing the rest.
    pub stop_on_failure: bool,
}

impl Default for TestPlan {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            color1: Rgb::new(0xFF, 0, 0),
            color2: Rgb::new(0, 0, 0xFF),
            stop_on_failure: false,
        }
    }
}

/// Outcome of one zone test.
#[derive(Debug)]
pub struct ZoneOutcome {
    pub region: String,
    pub sub_id: u8,
    pub mode: Mode,
    /// `None` when the zone test passed.
    pub error: Option<AlienFxError>,
}

impl ZoneOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a catalog run, in test order.
#[derive(Debug, Default)]
pub struct CatalogReport {
    pub outcomes: Vec<ZoneOutcome>,
    /// The run stopped early because the cancel flag was set.
    pub cancelled: bool,
    /// The final lights-off failed. The zone outcomes are still valid.
    pub turn_off_error: Option<AlienFxError>,
}

impl CatalogReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ZoneOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.turn_off_error.is_none() && self.failures().next().is_none()
    }
}

// =============================================================================
// BlockTester
// =============================================================================

/// Diagnostic driver for one computer model.
pub struct BlockTester<'a> {
    bus: &'a dyn UsbBus,
    model: &'a ComputerModel,
    config: SessionConfig,
    session: Option<DeviceSession>,
    turn_off_count: usize,
}

impl<'a> BlockTester<'a> {
    /// No device is touched until the first test.
    pub fn new(bus: &'a dyn UsbBus, model: &'a ComputerModel, config: SessionConfig) -> Self {
        Self {
            bus,
            model,
            config,
            session: None,
            turn_off_count: 0,
        }
    }

    pub fn model(&self) -> &ComputerModel {
        self.model
    }

    /// Check whether a device is present.
    ///
    /// # Errors
    /// Open failures other than `DeviceNotFound` are returned as-is.
    pub fn probe(&mut self, vendor_id: u16, product_id: u16) -> Result<ProbeOutcome> {
        let encoding = self.model.encoding;
        self.probe_with(vendor_id, product_id, &encoding)
    }

    /// Probe every model in `catalog`.
    pub fn probe_catalog(&mut self, catalog: &Catalog) -> Result<Vec<(String, ProbeOutcome)>> {
        catalog
            .models()
            .iter()
            .map(|m| {
                let outcome = self.probe_with(m.vendor_id, m.product_id, &m.encoding)?;
                Ok((m.name.clone(), outcome))
            })
            .collect()
    }

    fn probe_with(&mut self, vendor_id: u16, product_id: u16, encoding: &Encoding) -> Result<ProbeOutcome> {
        // Our own claim would make the device look busy.
        self.release();

        match DeviceSession::open(self.bus, vendor_id, product_id, encoding, self.config) {
            Ok(session) => {
                session.close();
                Ok(ProbeOutcome::Found)
            }
            Err(AlienFxError::DeviceNotFound { .. }) => Ok(ProbeOutcome::NotFound),
            Err(e) => Err(e),
        }
    }

    /// Light one zone and leave it lit.
    ///
    /// Zones of the region below the target are compiled dark. Only the
    /// target zone's command is sent.
    ///
    /// # Errors
    /// - `UnknownRegion` if the model has no such region
    /// - `InvalidInput` if `zone_sub_id` is outside the region's budget
    /// - any compile or send error
    pub fn run_zone_test(
        &mut self,
        region: &str,
        zone_sub_id: u8,
        mode: Mode,
        speed: u16,
        color1: Rgb,
        color2: Rgb,
    ) -> Result<()> {
        self.zone_test(region, zone_sub_id, mode, speed, (color1, color2), &AtomicBool::new(false))
    }

    fn zone_test(
        &mut self,
        region_name: &str,
        zone_sub_id: u8,
        mode: Mode,
        speed: u16,
        (color1, color2): (Rgb, Rgb),
        cancel: &AtomicBool,
    ) -> Result<()> {
        let region = self.model.region(region_name)?.clone();
        let in_budget = region
            .last_sub_id()
            .is_some_and(|last| (region.hex_id..=last).contains(&zone_sub_id));
        if !in_budget {
            return Err(AlienFxError::InvalidInput(format!(
                "Zone {:#04x} is outside region {}",
                zone_sub_id, region
            )));
        }

        let mut theme = Theme::new("zone test");
        let area = theme.bind(region);
        for _ in area.region().hex_id..zone_sub_id {
            area.add_zone()?;
        }
        area.add_zone_with(mode, color1, color2)?;

        let compiler = self.model.compiler();
        let target = compiler
            .compile(&theme)?
            .pop()
            .ok_or_else(|| AlienFxError::InvalidInput("Zone test compiled to nothing".into()))?;
        let program = compiler.frame(vec![target], Some(speed))?;

        self.send(&program, cancel)
    }

    /// Send the lights-off program for every lightable region.
    pub fn turn_off(&mut self) -> Result<()> {
        self.turn_off_count += 1;
        let program = self.model.compiler().lights_off_program(&self.model.regions);
        self.send(&program, &AtomicBool::new(false))
    }

    /// How many times [`turn_off`](Self::turn_off) has run.
    pub fn turn_off_count(&self) -> usize {
        self.turn_off_count
    }

    /// Test every supported mode of every zone of every lightable region.
    ///
    /// Zone failures are recorded in the report. The lights are turned off
    /// exactly once when the run ends, however it ends.
    ///
    /// A failed turn-off is recorded in [`CatalogReport::turn_off_error`].
    ///
    /// # Errors
    /// Returns early if the device cannot be opened at all.
    pub fn run_catalog(&mut self, plan: &TestPlan, cancel: &AtomicBool) -> Result<CatalogReport> {
        let mut guard = TurnOffGuard {
            tester: self,
            armed: true,
        };
        let mut report = guard.tester.sweep(plan, cancel)?;

        guard.armed = false;
        if let Err(e) = guard.tester.turn_off() {
            warn!("Failed to turn lights off after test run: {}", e);
            report.turn_off_error = Some(e);
        }
        Ok(report)
    }

    fn sweep(&mut self, plan: &TestPlan, cancel: &AtomicBool) -> Result<CatalogReport> {
        let model = self.model;
        let mut report = CatalogReport::default();

        'regions: for region in model.lightable_regions() {
            let Some(last) = region.last_sub_id() else {
                continue;
            };
            for sub_id in region.hex_id..=last {
                for mode in region.supported_modes() {
                    if cancel.load(Ordering::Relaxed) {
                        report.cancelled = true;
                        break 'regions;
                    }

                    let result =
                        self.zone_test(&region.name, sub_id, mode, plan.speed, (plan.color1, plan.color2), cancel);
                    let error = match result {
                        Ok(()) => None,
                        Err(AlienFxError::Cancelled { .. }) => {
                            report.cancelled = true;
                            break 'regions;
                        }
                        Err(
                            e @ (AlienFxError::DeviceNotFound { .. }
                            | AlienFxError::PermissionDenied(_)
                            | AlienFxError::DeviceInUse { .. }),
                        ) => return Err(e),
                        Err(e) => {
                            warn!("{}[{:#04x}] {} failed: {}", region.name, sub_id, mode, e);
                            Some(e)
                        }
                    };

                    let failed = error.is_some();
                    report.outcomes.push(ZoneOutcome {
                        region: region.name.clone(),
                        sub_id,
                        mode,
                        error,
                    });
                    if failed && plan.stop_on_failure {
                        break 'regions;
                    }
                }
            }
        }

        info!(
            "Catalog run on {}: {} of {} zone tests passed",
            model.name,
            report.passed(),
            report.outcomes.len()
        );
        Ok(report)
    }

    fn send(&mut self, program: &[Command], cancel: &AtomicBool) -> Result<()> {
        if self.session.as_ref().is_none_or(DeviceSession::is_spent) {
            self.session = Some(DeviceSession::open(
                self.bus,
                self.model.vendor_id,
                self.model.product_id,
                &self.model.encoding,
                self.config,
            )?);
        }

        match self.session.as_mut() {
            Some(session) => session.send_cancellable(program, cancel),
            None => Err(AlienFxError::SessionClosed),
        }
    }

    /// Close the held session, if any.
    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

/// Turns the lights off when dropped while armed.
struct TurnOffGuard<'t, 'a> {
    tester: &'t mut BlockTester<'a>,
    armed: bool,
}

impl Drop for TurnOffGuard<'_, '_> {
    fn drop(&mut self) {
        if self.armed
            && let Err(e) = self.tester.turn_off()
        {
            warn!("Failed to turn lights off after test run: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{SIMULATED_PRODUCT_ID, SIMULATED_VENDOR_ID, SimulatedBehavior, SimulatedBus};

    const FAULTY_PID: u16 = 0x0BAD;

    fn fast_config() -> SessionConfig {
        SessionConfig {
            poll_attempts: 2,
            poll_delay_ms: 0,
            ..SessionConfig::default()
        }
    }

    fn simulated_model() -> ComputerModel {
        Catalog::builtin().find("simulated").unwrap().clone()
    }

    #[test]
    fn test_probe() {
        let bus = SimulatedBus::new();
        let model = simulated_model();
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        assert_eq!(
            tester.probe(SIMULATED_VENDOR_ID, SIMULATED_PRODUCT_ID).unwrap(),
            ProbeOutcome::Found
        );
        assert_eq!(tester.probe(0x187C, 0x0001).unwrap(), ProbeOutcome::NotFound);
        assert!(!bus.is_claimed(SIMULATED_VENDOR_ID, SIMULATED_PRODUCT_ID));
    }

    #[test]
    fn test_probe_catalog() {
        let bus = SimulatedBus::new();
        let model = simulated_model();
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        let table = tester.probe_catalog(&Catalog::builtin()).unwrap();
        let found: Vec<&str> = table
            .iter()
            .filter(|(_, o)| *o == ProbeOutcome::Found)
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(found, vec!["Simulated"]);
    }

    #[test]
    fn test_zone_test_sends_only_target() {
        let bus = SimulatedBus::new();
        let model = simulated_model();
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        tester
            .run_zone_test("keyboard", 0x12, Mode::Morph, 300, Rgb::WHITE, Rgb::BLACK)
            .unwrap();

        // reset, speed, zone, loop end, execute
        let applied = bus.applied(SIMULATED_VENDOR_ID, SIMULATED_PRODUCT_ID);
        assert_eq!(applied.len(), 5);
        assert_eq!(&applied[2][..4], &[0x02, 0x01, 0x10, 0x12]);
    }

    #[test]
    fn test_zone_test_validates_sub_id() {
        let bus = SimulatedBus::new();
        let model = simulated_model();
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        for sub_id in [0x0F, 0x14] {
            assert!(matches!(
                tester.run_zone_test("keyboard", sub_id, Mode::Fixed, 200, Rgb::WHITE, Rgb::WHITE),
                Err(AlienFxError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            tester.run_zone_test("power", 0x50, Mode::Morph, 200, Rgb::WHITE, Rgb::WHITE),
            Err(AlienFxError::UnsupportedMode { .. })
        ));
        assert!(bus.applied(SIMULATED_VENDOR_ID, SIMULATED_PRODUCT_ID).is_empty());
    }

    #[test]
    fn test_catalog_run_turns_off_once() {
        let bus = SimulatedBus::new();
        let model = simulated_model();
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        let report = tester.run_catalog(&TestPlan::default(), &AtomicBool::new(false)).unwrap();

        // keyboard 4 zones x 3 modes, logo 1 x 3, power 2 x 2
        assert_eq!(report.outcomes.len(), 19);
        assert!(report.is_success());
        assert_eq!(tester.turn_off_count(), 1);
    }

    #[test]
    fn test_cancelled_run_still_turns_off() {
        let bus = SimulatedBus::new();
        let model = simulated_model();
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        let report = tester.run_catalog(&TestPlan::default(), &AtomicBool::new(true)).unwrap();
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert_eq!(tester.turn_off_count(), 1);
    }

    #[test]
    fn test_stop_on_failure() {
        let bus = SimulatedBus::new();
        let mut model = simulated_model();
        model.product_id = FAULTY_PID;
        bus.attach(SIMULATED_VENDOR_ID, FAULTY_PID, SimulatedBehavior::FaultOnWrite(0));
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        let plan = TestPlan {
            stop_on_failure: true,
            ..TestPlan::default()
        };
        let report = tester.run_catalog(&plan, &AtomicBool::new(false)).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.is_success());
        assert_eq!(tester.turn_off_count(), 1);
    }

    #[test]
    fn test_probe_reports_denied_device() {
        let bus = SimulatedBus::new().with_device(
            SIMULATED_VENDOR_ID,
            FAULTY_PID,
            SimulatedBehavior::Denied,
        );
        let model = simulated_model();
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        assert!(matches!(
            tester.probe(SIMULATED_VENDOR_ID, FAULTY_PID),
            Err(AlienFxError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_denied_device_aborts_and_turns_off() {
        let bus = SimulatedBus::new();
        let mut model = simulated_model();
        model.product_id = FAULTY_PID;
        bus.attach(SIMULATED_VENDOR_ID, FAULTY_PID, SimulatedBehavior::Denied);
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        assert!(matches!(
            tester.run_catalog(&TestPlan::default(), &AtomicBool::new(false)),
            Err(AlienFxError::PermissionDenied(_))
        ));
        assert_eq!(tester.turn_off_count(), 1);
        assert!(bus.applied(SIMULATED_VENDOR_ID, FAULTY_PID).is_empty());
    }

    #[test]
    fn test_busy_device_keeps_report_when_turn_off_fails() {
        let bus = SimulatedBus::new();
        let mut model = simulated_model();
        model.product_id = FAULTY_PID;
        bus.attach(SIMULATED_VENDOR_ID, FAULTY_PID, SimulatedBehavior::NeverReady);
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        let report = tester.run_catalog(&TestPlan::default(), &AtomicBool::new(false)).unwrap();

        assert_eq!(report.outcomes.len(), 19);
        assert_eq!(report.failures().count(), 19);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.error, Some(AlienFxError::DeviceBusy { sent: 1, .. }))));
        assert!(matches!(
            report.turn_off_error,
            Some(AlienFxError::DeviceBusy { sent: 1, .. })
        ));
        assert!(!report.is_success());
        assert_eq!(tester.turn_off_count(), 1);
    }

    #[test]
    fn test_missing_device_aborts_and_turns_off() {
        let bus = SimulatedBus::new();
        let mut model = simulated_model();
        model.product_id = 0x0001;
        let mut tester = BlockTester::new(&bus, &model, fast_config());

        assert!(matches!(
            tester.run_catalog(&TestPlan::default(), &AtomicBool::new(false)),
            Err(AlienFxError::DeviceNotFound { .. })
        ));
        assert_eq!(tester.turn_off_count(), 1);
    }
}
