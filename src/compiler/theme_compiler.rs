//! Theme to command compilation.
//!
//! Compilation is pure and deterministic. Output order is area declaration
//! order, then zone sub-id order. Some firmware keeps only the last write
//! per region, so callers rely on that order.

use std::sync::Arc;

use crate::config::validate_speed;
use crate::error::{AlienFxError, Result};
use crate::model::{Area, HardwareRegion, Theme};
use crate::protocol::{
    Command, Encoding, build_broadcast_off_cmd, build_execute_cmd, build_loop_end_cmd,
    build_reset_cmd, build_speed_cmd, build_zone_cmd,
};

/// Compiles themes into command sequences for one encoding table.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'e> {
    encoding: &'e Encoding,
}

impl<'e> Compiler<'e> {
    pub fn new(encoding: &'e Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> &Encoding {
        self.encoding
    }

    /// Compile every zone of every area, one command per zone.
    ///
    /// # Errors
    /// - `CapacityExceeded` if an area has more zones than its region's budget
    /// - `UnsupportedMode` if a zone uses a mode its region cannot display
    pub fn compile(&self, theme: &Theme) -> Result<Vec<Command>> {
        let mut commands = Vec::with_capacity(theme.zone_count());
        for area in theme.areas() {
            commands.extend(self.compile_area(area)?);
        }
        Ok(commands)
    }

    /// Compile a single area. Nothing is emitted unless every zone passes.
    pub fn compile_area(&self, area: &Area) -> Result<Vec<Command>> {
        let region = area.region();

        if area.len() > region.max_commands as usize {
            return Err(AlienFxError::CapacityExceeded {
                region: region.name.clone(),
                zones: area.len(),
                budget: region.max_commands,
            });
        }

        if let Some(zone) = area.zones().iter().find(|z| !region.supports(z.mode())) {
            return Err(AlienFxError::UnsupportedMode {
                region: region.name.clone(),
                sub_id: zone.sub_id(),
                mode: zone.mode().to_string(),
            });
        }

        Ok(area
            .zones()
            .iter()
            .map(|zone| build_zone_cmd(self.encoding, region, zone))
            .collect())
    }

    /// Wrap zone commands into a complete device transaction.
    ///
    /// `reset(lights on)`, optional `speed`, body, `loop end`, `execute`.
    pub fn frame(&self, body: Vec<Command>, speed: Option<u16>) -> Result<Vec<Command>> {
        let mut program = Vec::with_capacity(body.len() + 4);
        program.push(build_reset_cmd(self.encoding, self.encoding.reset_lights_on));
        if let Some(speed) = speed {
            program.push(build_speed_cmd(self.encoding, validate_speed(speed)?));
        }
        program.extend(body);
        program.push(build_loop_end_cmd(self.encoding));
        program.push(build_execute_cmd(self.encoding));
        Ok(program)
    }

    /// Compile and frame a theme in one step.
    pub fn program(&self, theme: &Theme, speed: u16) -> Result<Vec<Command>> {
        let body = self.compile(theme)?;
        self.frame(body, Some(speed))
    }

    /// One broadcast "off" command per lightable region.
    pub fn lights_off(&self, regions: &[Arc<HardwareRegion>]) -> Vec<Command> {
        regions
            .iter()
            .filter(|r| r.can_light)
            .map(|r| build_broadcast_off_cmd(self.encoding, r))
            .collect()
    }

    /// Full transaction that leaves every region dark.
    pub fn lights_off_program(&self, regions: &[Arc<HardwareRegion>]) -> Vec<Command> {
        let mut program = vec![build_reset_cmd(self.encoding, self.encoding.reset_lights_off)];
        program.extend(self.lights_off(regions));
        program.push(build_loop_end_cmd(self.encoding));
        program.push(build_execute_cmd(self.encoding));
        program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, Rgb};

    fn region(hex_id: u8, max_commands: u16) -> Arc<HardwareRegion> {
        Arc::new(HardwareRegion::new("keyboard", "Keyboard", hex_id, max_commands))
    }

    fn four_zone_theme() -> Theme {
        let mut theme = Theme::new("scenario");
        let area = theme.bind(region(0x10, 4));
        for mode in [Mode::Fixed, Mode::Blink, Mode::Morph, Mode::Fixed] {
            area.add_zone_with(mode, Rgb::new(0xFF, 0, 0), Rgb::new(0, 0, 0xFF))
                .unwrap();
        }
        theme
    }

    #[test]
    fn test_four_zones_in_order() {
        let encoding = Encoding::default();
        let commands = Compiler::new(&encoding).compile(&four_zone_theme()).unwrap();

        assert_eq!(commands.len(), 4);
        let sub_ids: Vec<u8> = commands.iter().map(|c| c.bytes()[3]).collect();
        assert_eq!(sub_ids, vec![0x10, 0x11, 0x12, 0x13]);
        let opcodes: Vec<u8> = commands.iter().map(|c| c.bytes()[1]).collect();
        assert_eq!(opcodes, vec![0x03, 0x02, 0x01, 0x03]);
    }

    #[test]
    fn test_fifth_zone_exceeds_capacity() {
        let encoding = Encoding::default();
        let mut theme = four_zone_theme();
        theme.area_mut("keyboard").unwrap().add_zone().unwrap();

        let err = Compiler::new(&encoding).compile(&theme).unwrap_err();
        assert!(matches!(
            err,
            AlienFxError::CapacityExceeded { ref region, zones: 5, budget: 4 } if region == "keyboard"
        ));
    }

    #[test]
    fn test_no_partial_emission_for_failing_area() {
        let encoding = Encoding::default();
        let compiler = Compiler::new(&encoding);

        let mut theme = Theme::new("t");
        let area = theme.bind(region(0x10, 2));
        area.add_zone_with(Mode::Fixed, Rgb::WHITE, Rgb::BLACK).unwrap();
        area.add_zone_with(Mode::Fixed, Rgb::WHITE, Rgb::BLACK).unwrap();
        area.add_zone_with(Mode::Fixed, Rgb::WHITE, Rgb::BLACK).unwrap();

        assert!(compiler.compile_area(theme.area("keyboard").unwrap()).is_err());
        assert!(compiler.compile(&theme).is_err());
    }

    #[test]
    fn test_unsupported_modes() {
        let encoding = Encoding::default();
        let compiler = Compiler::new(&encoding);

        for (mode, caps) in [
            (Mode::Blink, (true, false, true)),
            (Mode::Morph, (true, true, false)),
            (Mode::Fixed, (false, true, true)),
        ] {
            let limited = Arc::new(
                HardwareRegion::new("logo", "", 0x30, 2).with_capabilities(caps.0, caps.1, caps.2),
            );
            let mut theme = Theme::new("t");
            let area = theme.bind(limited);
            area.add_zone().unwrap();
            area.add_zone().unwrap().set_mode(mode);

            match compiler.compile(&theme) {
                Err(AlienFxError::UnsupportedMode { region, sub_id, mode: m }) => {
                    assert_eq!(region, "logo");
                    assert_eq!(m, mode.to_string());
                    // A dark region fails on its first zone.
                    assert_eq!(sub_id, if caps.0 { 0x31 } else { 0x30 });
                }
                other => panic!("expected UnsupportedMode for {mode}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_compile_is_deterministic() {
        let encoding = Encoding::default();
        let compiler = Compiler::new(&encoding);
        let theme = four_zone_theme();

        let first = compiler.compile(&theme).unwrap();
        let second = compiler.compile(&theme).unwrap();
        let first_bytes: Vec<&[u8]> = first.iter().map(Command::bytes).collect();
        let second_bytes: Vec<&[u8]> = second.iter().map(Command::bytes).collect();
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_area_order_is_declaration_order() {
        let encoding = Encoding::default();
        let mut theme = Theme::new("t");
        theme
            .bind(Arc::new(HardwareRegion::new("logo", "", 0x30, 1)))
            .add_zone()
            .unwrap();
        theme.bind(region(0x10, 4)).add_zone().unwrap();

        let commands = Compiler::new(&encoding).compile(&theme).unwrap();
        assert_eq!(commands[0].bytes()[2], 0x30);
        assert_eq!(commands[1].bytes()[2], 0x10);
    }

    #[test]
    fn test_program_framing() {
        let encoding = Encoding::default();
        let program = Compiler::new(&encoding)
            .program(&four_zone_theme(), 500)
            .unwrap();

        assert_eq!(program.len(), 8);
        assert_eq!(&program[0].bytes()[..3], &[0x02, 0x07, 0x04]);
        assert_eq!(&program[1].bytes()[..4], &[0x02, 0x0E, 0x01, 0xF4]);
        assert_eq!(program[6].bytes()[1], 0x04);
        assert_eq!(program[7].bytes()[1], 0x05);

        assert!(Compiler::new(&encoding).program(&four_zone_theme(), 0).is_err());
    }

    #[test]
    fn test_lights_off_skips_dark_regions() {
        let encoding = Encoding::default();
        let regions = vec![
            region(0x10, 4),
            Arc::new(HardwareRegion::new("bezel", "", 0x70, 1).with_capabilities(false, false, false)),
            Arc::new(HardwareRegion::new("logo", "", 0x30, 1)),
        ];

        let compiler = Compiler::new(&encoding);
        let off = compiler.lights_off(&regions);
        assert_eq!(off.len(), 2);
        assert!(off.iter().all(|c| c.bytes()[3] == encoding.broadcast_zone));

        let program = compiler.lights_off_program(&regions);
        assert_eq!(program.len(), 5);
        assert_eq!(program[0].bytes()[2], encoding.reset_lights_off);
    }
}
