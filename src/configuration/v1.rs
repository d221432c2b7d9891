//! Register table of the LArPix v1 ASIC
//!
//! 63 registers, 32 channels. The v1 register space is small
//! enough that most fields fit a single byte; the two mode
//! registers pack several one-bit switches each.

use std::sync::OnceLock;

use crate::configuration::registermap::{AsicVersion, FieldSpec, RegisterMap};

pub const NUM_REGISTERS : usize = 63;
pub const NUM_BITS      : usize = 504;
pub const NUM_CHANNELS  : usize = 32;

const CSA_GROUP : &[&str] = &["csa_gain", "csa_bypass", "internal_bypass"];
const MODE_GROUP : &[&str] = &["test_mode", "cross_trigger_mode",
                               "periodic_reset", "fifo_diagnostic"];

fn fields() -> Vec<FieldSpec> {
  vec![
    FieldSpec::list("pixel_trim_thresholds", (0, 256), NUM_CHANNELS, 8, 31),
    FieldSpec::scalar("global_threshold", (256, 264), 0, 255),
    FieldSpec::compound("csa_gain", (264, 265), 0, 1, CSA_GROUP),
    FieldSpec::compound("csa_bypass", (265, 266), 0, 1, CSA_GROUP),
    FieldSpec::compound("internal_bypass", (267, 268), 0, 1, CSA_GROUP),
    FieldSpec::list("csa_bypass_select", (272, 304), NUM_CHANNELS, 1, 1),
    FieldSpec::list("csa_monitor_select", (304, 336), NUM_CHANNELS, 1, 1),
    FieldSpec::list("csa_testpulse_enable", (336, 368), NUM_CHANNELS, 1, 1),
    FieldSpec::scalar("csa_testpulse_dac_amplitude", (368, 376), 0, 255),
    FieldSpec::compound("test_mode", (376, 378), 0, 2, MODE_GROUP),
    FieldSpec::compound("cross_trigger_mode", (378, 379), 0, 1, MODE_GROUP),
    FieldSpec::compound("periodic_reset", (379, 380), 0, 1, MODE_GROUP),
    FieldSpec::compound("fifo_diagnostic", (380, 381), 0, 1, MODE_GROUP),
    FieldSpec::scalar("sample_cycles", (384, 392), 0, 255),
    FieldSpec::scalar("test_burst_length", (392, 408), 0, 65535),
    FieldSpec::scalar("adc_burst_length", (408, 416), 0, 255),
    FieldSpec::list("channel_mask", (416, 448), NUM_CHANNELS, 1, 1),
    FieldSpec::list("external_trigger_mask", (448, 480), NUM_CHANNELS, 1, 1),
    FieldSpec::scalar("reset_cycles", (480, 504), 0, (1 << 24) - 1),
  ]
}

pub(crate) fn registermap() -> &'static RegisterMap {
  static MAP : OnceLock<RegisterMap> = OnceLock::new();
  MAP.get_or_init(|| {
    RegisterMap::build(AsicVersion::V1, NUM_REGISTERS, NUM_BITS, NUM_CHANNELS, fields())
  })
}
