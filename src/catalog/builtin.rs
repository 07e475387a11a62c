//! Built-in model table.

use std::sync::Arc;

use super::ComputerModel;
use crate::device::{SIMULATED_PRODUCT_ID, SIMULATED_VENDOR_ID};
use crate::model::HardwareRegion;
use crate::protocol::Encoding;

/// Dell / Alienware vendor id.
pub const ALIENWARE_VID: u16 = 0x187C;

pub const M11X_PID: u16 = 0x0514;
pub const M14X_PID: u16 = 0x0521;
pub const M17X_PID: u16 = 0x0512;

fn region(name: &str, description: &str, hex_id: u8, max_commands: u16) -> Arc<HardwareRegion> {
    Arc::new(HardwareRegion::new(name, description, hex_id, max_commands))
}

fn region_with(
    name: &str,
    description: &str,
    hex_id: u8,
    max_commands: u16,
    (can_light, can_blink, can_morph): (bool, bool, bool),
) -> Arc<HardwareRegion> {
    Arc::new(
        HardwareRegion::new(name, description, hex_id, max_commands)
            .with_capabilities(can_light, can_blink, can_morph),
    )
}

fn model(name: &str, product_id: u16, regions: Vec<Arc<HardwareRegion>>) -> ComputerModel {
    ComputerModel {
        name: name.into(),
        vendor_id: ALIENWARE_VID,
        product_id,
        regions,
        encoding: Encoding::default(),
    }
}

pub(super) fn models() -> Vec<ComputerModel> {
    vec![
        model(
            "M11x",
            M11X_PID,
            vec![
                region("keyboard", "Keyboard", 0x10, 4),
                region("speakers", "Front speakers", 0x20, 2),
                region("logo", "Alien head", 0x30, 1),
                region_with("power", "Power button", 0x50, 2, (true, true, false)),
            ],
        ),
        model(
            "M14x",
            M14X_PID,
            vec![
                region("keyboard", "Keyboard", 0x10, 4),
                region("speakers", "Speaker grilles", 0x20, 2),
                region("logo", "Alien head", 0x30, 1),
                region("touchpad", "Touchpad", 0x40, 1),
                region_with("power", "Power button", 0x50, 2, (true, true, false)),
                region_with("media_bar", "Media bar", 0x60, 1, (true, false, true)),
            ],
        ),
        model(
            "M17x",
            M17X_PID,
            vec![
                region("keyboard", "Keyboard", 0x10, 4),
                region("speakers", "Speaker grilles", 0x20, 2),
                region("logo", "Alien head", 0x30, 1),
                region("touchpad", "Touchpad", 0x40, 1),
                region_with("power", "Power button", 0x50, 2, (true, true, false)),
                region_with("media_bar", "Media bar", 0x60, 1, (true, false, true)),
                region_with("hdd", "Drive activity", 0x70, 1, (false, false, false)),
            ],
        ),
        ComputerModel {
            name: "Simulated".into(),
            vendor_id: SIMULATED_VENDOR_ID,
            product_id: SIMULATED_PRODUCT_ID,
            regions: vec![
                region("keyboard", "Keyboard", 0x10, 4),
                region("logo", "Alien head", 0x30, 1),
                region_with("power", "Power button", 0x50, 2, (true, true, false)),
            ],
            encoding: Encoding::default(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_ids_do_not_overlap() {
        for model in models() {
            let mut ids: Vec<u8> = model
                .regions
                .iter()
                .flat_map(|r| {
                    let last = r.last_sub_id().unwrap();
                    r.hex_id..=last
                })
                .collect();
            let total = ids.len();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), total, "overlapping sub-ids in {}", model.name);
        }
    }
}
