//! Register table of the LArPix v2b ASIC
//!
//! 256 registers, 2048 bits, 64 channels. The analog front end
//! matches v2; the digital periphery renames the serial links
//! (MISO/MOSI become PISO/POSI), drops the slope controls, and
//! adds the LVDS transmitter trim block at the top of the
//! register space.

use std::sync::OnceLock;

use crate::configuration::registermap::{AsicVersion, FieldSpec, RegisterMap};

pub const NUM_REGISTERS : usize = 256;
pub const NUM_BITS      : usize = 2048;
pub const NUM_CHANNELS  : usize = 64;

const CSA_GROUP : &[&str] = &["csa_gain", "csa_bypass_enable", "bypass_caps_en"];
const REF_GROUP : &[&str] = &["ref_current_trim", "override_ref", "ref_kickstart"];
const DMON_GROUP : &[&str] = &["digital_monitor_enable", "digital_monitor_select"];
const POWER_GROUP : &[&str] = &["enable_tx_dynamic_powerdown", "load_config_defaults",
                                "enable_fifo_diagnostics", "clk_ctrl",
                                "tx_dynamic_powerdown_cycles"];
const UART_GROUP : &[&str] = &["test_mode_uart0", "test_mode_uart1",
                               "test_mode_uart2", "test_mode_uart3"];
const TRIGGER_GROUP : &[&str] = &["enable_cross_trigger", "enable_periodic_reset",
                                  "enable_rolling_periodic_reset", "enable_periodic_trigger",
                                  "enable_rolling_periodic_trigger",
                                  "enable_periodic_trigger_veto", "enable_hit_veto"];
const RESET_GROUP : &[&str] = &["enable_dynamic_reset", "enable_min_delta_adc",
                                "threshold_polarity", "reset_length", "mark_first_packet"];
const TX_SLICES01_GROUP : &[&str] = &["tx_slices0", "tx_slices1"];
const TX_SLICES23_GROUP : &[&str] = &["tx_slices2", "tx_slices3"];
const I_TX_DIFF01_GROUP : &[&str] = &["i_tx_diff0", "i_tx_diff1"];
const I_TX_DIFF23_GROUP : &[&str] = &["i_tx_diff2", "i_tx_diff3"];
const I_RX01_GROUP : &[&str] = &["i_rx0", "i_rx1"];
const I_RX23_GROUP : &[&str] = &["i_rx2", "i_rx3"];
const I_RX_CLK_GROUP : &[&str] = &["i_rx_clk", "i_rx_rst"];
const V_CM_LVDS01_GROUP : &[&str] = &["v_cm_lvds_tx0", "v_cm_lvds_tx1"];
const V_CM_LVDS23_GROUP : &[&str] = &["v_cm_lvds_tx2", "v_cm_lvds_tx3"];

pub(crate) fn fields() -> Vec<FieldSpec> {
  vec![
    FieldSpec::list("pixel_trim_dac", (0, 512), NUM_CHANNELS, 8, 31),
    FieldSpec::scalar("threshold_global", (512, 520), 0, 255),
    FieldSpec::compound("csa_gain", (520, 521), 0, 1, CSA_GROUP),
    FieldSpec::compound("csa_bypass_enable", (521, 522), 0, 1, CSA_GROUP),
    FieldSpec::compound("bypass_caps_en", (522, 523), 0, 1, CSA_GROUP),
    FieldSpec::list("csa_enable", (528, 592), NUM_CHANNELS, 1, 1),
    FieldSpec::scalar("ibias_tdac", (592, 596), 0, 15),
    FieldSpec::scalar("ibias_comp", (600, 604), 0, 15),
    FieldSpec::scalar("ibias_buffer", (608, 612), 0, 15),
    FieldSpec::scalar("ibias_csa", (616, 620), 0, 15),
    FieldSpec::scalar("ibias_vref_buffer", (624, 628), 0, 15),
    FieldSpec::scalar("ibias_vcm_buffer", (632, 636), 0, 15),
    FieldSpec::scalar("ibias_tpulse", (640, 644), 0, 15),
    FieldSpec::compound("ref_current_trim", (648, 653), 0, 31, REF_GROUP),
    FieldSpec::compound("override_ref", (653, 654), 0, 1, REF_GROUP),
    FieldSpec::compound("ref_kickstart", (654, 655), 0, 1, REF_GROUP),
    FieldSpec::scalar("vref_dac", (656, 664), 0, 255),
    FieldSpec::scalar("vcm_dac", (664, 672), 0, 255),
    FieldSpec::list("csa_bypass_select", (672, 736), NUM_CHANNELS, 1, 1),
    FieldSpec::list("csa_monitor_select", (736, 800), NUM_CHANNELS, 1, 1),
    FieldSpec::list("csa_testpulse_enable", (800, 864), NUM_CHANNELS, 1, 1),
    FieldSpec::scalar("csa_testpulse_dac", (864, 872), 0, 255),
    FieldSpec::list("current_monitor_bank0", (872, 876), 4, 1, 1),
    FieldSpec::list("current_monitor_bank1", (880, 884), 4, 1, 1),
    FieldSpec::list("current_monitor_bank2", (888, 892), 4, 1, 1),
    FieldSpec::list("current_monitor_bank3", (896, 900), 4, 1, 1),
    FieldSpec::list("voltage_monitor_bank0", (904, 907), 3, 1, 1),
    FieldSpec::list("voltage_monitor_bank1", (912, 915), 3, 1, 1),
    FieldSpec::list("voltage_monitor_bank2", (920, 923), 3, 1, 1),
    FieldSpec::list("voltage_monitor_bank3", (928, 931), 3, 1, 1),
    FieldSpec::list("voltage_monitor_refgen", (936, 944), 8, 1, 1),
    FieldSpec::compound("digital_monitor_enable", (944, 945), 0, 1, DMON_GROUP),
    FieldSpec::compound("digital_monitor_select", (945, 949), 0, 10, DMON_GROUP),
    FieldSpec::scalar("digital_monitor_chan", (952, 958), 0, 63),
    FieldSpec::scalar("adc_hold_delay", (960, 976), 0, 65535),
    FieldSpec::scalar("chip_id", (976, 984), 0, 255),
    FieldSpec::compound("enable_tx_dynamic_powerdown", (984, 985), 0, 1, POWER_GROUP),
    FieldSpec::compound("load_config_defaults", (985, 986), 0, 1, POWER_GROUP),
    FieldSpec::compound("enable_fifo_diagnostics", (986, 987), 0, 1, POWER_GROUP),
    FieldSpec::compound("clk_ctrl", (987, 989), 0, 3, POWER_GROUP),
    FieldSpec::compound("tx_dynamic_powerdown_cycles", (989, 992), 0, 7, POWER_GROUP),
    FieldSpec::list("enable_piso_upstream", (992, 996), 4, 1, 1),
    FieldSpec::list("enable_piso_downstream", (1000, 1004), 4, 1, 1),
    FieldSpec::list("enable_posi", (1008, 1012), 4, 1, 1),
    FieldSpec::compound("test_mode_uart0", (1016, 1018), 0, 3, UART_GROUP),
    FieldSpec::compound("test_mode_uart1", (1018, 1020), 0, 3, UART_GROUP),
    FieldSpec::compound("test_mode_uart2", (1020, 1022), 0, 3, UART_GROUP),
    FieldSpec::compound("test_mode_uart3", (1022, 1024), 0, 3, UART_GROUP),
    FieldSpec::compound("enable_cross_trigger", (1024, 1025), 0, 1, TRIGGER_GROUP),
    FieldSpec::compound("enable_periodic_reset", (1025, 1026), 0, 1, TRIGGER_GROUP),
    FieldSpec::compound("enable_rolling_periodic_reset", (1026, 1027), 0, 1, TRIGGER_GROUP),
    FieldSpec::compound("enable_periodic_trigger", (1027, 1028), 0, 1, TRIGGER_GROUP),
    FieldSpec::compound("enable_rolling_periodic_trigger", (1028, 1029), 0, 1, TRIGGER_GROUP),
    FieldSpec::compound("enable_periodic_trigger_veto", (1029, 1030), 0, 1, TRIGGER_GROUP),
    FieldSpec::compound("enable_hit_veto", (1030, 1031), 0, 1, TRIGGER_GROUP),
    FieldSpec::scalar("shadow_reset_length", (1032, 1040), 0, 255),
    FieldSpec::scalar("adc_burst_length", (1040, 1048), 0, 255),
    FieldSpec::list("channel_mask", (1048, 1112), NUM_CHANNELS, 1, 1),
    FieldSpec::list("external_trigger_mask", (1112, 1176), NUM_CHANNELS, 1, 1),
    FieldSpec::list("cross_trigger_mask", (1176, 1240), NUM_CHANNELS, 1, 1),
    FieldSpec::list("periodic_trigger_mask", (1240, 1304), NUM_CHANNELS, 1, 1),
    FieldSpec::scalar("periodic_reset_cycles", (1304, 1328), 0, (1 << 24) - 1),
    FieldSpec::scalar("periodic_trigger_cycles", (1328, 1360), 0, u32::MAX),
    FieldSpec::compound("enable_dynamic_reset", (1360, 1361), 0, 1, RESET_GROUP),
    FieldSpec::compound("enable_min_delta_adc", (1361, 1362), 0, 1, RESET_GROUP),
    FieldSpec::compound("threshold_polarity", (1362, 1363), 0, 1, RESET_GROUP),
    FieldSpec::compound("reset_length", (1363, 1366), 0, 7, RESET_GROUP),
    FieldSpec::compound("mark_first_packet", (1366, 1367), 0, 1, RESET_GROUP),
    FieldSpec::scalar("reset_threshold", (1368, 1376), 0, 255),
    FieldSpec::scalar("min_delta_adc", (1376, 1384), 0, 255),
    FieldSpec::list("digital_threshold", (1384, 1896), NUM_CHANNELS, 8, 255),
    FieldSpec::scalar("RESERVED", (1896, 1912), 0, 0),
    FieldSpec::compound("tx_slices0", (1912, 1916), 0, 15, TX_SLICES01_GROUP),
    FieldSpec::compound("tx_slices1", (1916, 1920), 0, 15, TX_SLICES01_GROUP),
    FieldSpec::compound("tx_slices2", (1920, 1924), 0, 15, TX_SLICES23_GROUP),
    FieldSpec::compound("tx_slices3", (1924, 1928), 0, 15, TX_SLICES23_GROUP),
    FieldSpec::compound("i_tx_diff0", (1928, 1932), 0, 15, I_TX_DIFF01_GROUP),
    FieldSpec::compound("i_tx_diff1", (1932, 1936), 0, 15, I_TX_DIFF01_GROUP),
    FieldSpec::compound("i_tx_diff2", (1936, 1940), 0, 15, I_TX_DIFF23_GROUP),
    FieldSpec::compound("i_tx_diff3", (1940, 1944), 0, 15, I_TX_DIFF23_GROUP),
    FieldSpec::compound("i_rx0", (1944, 1948), 0, 15, I_RX01_GROUP),
    FieldSpec::compound("i_rx1", (1948, 1952), 0, 15, I_RX01_GROUP),
    FieldSpec::compound("i_rx2", (1952, 1956), 0, 15, I_RX23_GROUP),
    FieldSpec::compound("i_rx3", (1956, 1960), 0, 15, I_RX23_GROUP),
    FieldSpec::compound("i_rx_clk", (1960, 1964), 0, 15, I_RX_CLK_GROUP),
    FieldSpec::compound("i_rx_rst", (1964, 1968), 0, 15, I_RX_CLK_GROUP),
    FieldSpec::scalar("i_rx_ext_trig", (1968, 1972), 0, 15),
    FieldSpec::scalar("r_term0", (1976, 1981), 0, 31),
    FieldSpec::scalar("r_term1", (1984, 1989), 0, 31),
    FieldSpec::scalar("r_term2", (1992, 1997), 0, 31),
    FieldSpec::scalar("r_term3", (2000, 2005), 0, 31),
    FieldSpec::scalar("r_term_clk", (2008, 2013), 0, 31),
    FieldSpec::scalar("r_term_reset", (2016, 2021), 0, 31),
    FieldSpec::scalar("r_term_ext_trig", (2024, 2029), 0, 31),
    FieldSpec::compound("v_cm_lvds_tx0", (2032, 2035), 0, 7, V_CM_LVDS01_GROUP),
    FieldSpec::compound("v_cm_lvds_tx1", (2036, 2039), 0, 7, V_CM_LVDS01_GROUP),
    FieldSpec::compound("v_cm_lvds_tx2", (2040, 2043), 0, 7, V_CM_LVDS23_GROUP),
    FieldSpec::compound("v_cm_lvds_tx3", (2044, 2047), 0, 7, V_CM_LVDS23_GROUP),
  ]
}

pub(crate) fn registermap() -> &'static RegisterMap {
  static MAP : OnceLock<RegisterMap> = OnceLock::new();
  MAP.get_or_init(|| {
    RegisterMap::build(AsicVersion::V2b, NUM_REGISTERS, NUM_BITS, NUM_CHANNELS, fields())
  })
}
