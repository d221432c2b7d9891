//! Register table of the LightPix v1 ASIC
//!
//! LightPix reuses the full v2 register layout and appends two
//! registers of photon counting controls at the top.

use std::sync::OnceLock;

use crate::configuration::registermap::{AsicVersion, FieldSpec, RegisterMap};
use crate::configuration::v2;

pub const NUM_REGISTERS : usize = 239;
pub const NUM_BITS      : usize = 1912;
pub const NUM_CHANNELS  : usize = 64;

const LIGHTPIX_GROUP : &[&str] = &["lightpix_mode", "hit_threshold"];

fn fields() -> Vec<FieldSpec> {
  let mut fields = vec![
    FieldSpec::compound("lightpix_mode", (1896, 1897), 0, 1, LIGHTPIX_GROUP),
    FieldSpec::compound("hit_threshold", (1897, 1904), 0, 127, LIGHTPIX_GROUP),
    FieldSpec::scalar("timeout", (1904, 1912), 0, 255),
  ];
  fields.extend(v2::fields());
  fields
}

pub(crate) fn registermap() -> &'static RegisterMap {
  static MAP : OnceLock<RegisterMap> = OnceLock::new();
  MAP.get_or_init(|| {
    RegisterMap::build(AsicVersion::LightpixV1,
                       NUM_REGISTERS, NUM_BITS, NUM_CHANNELS, fields())
  })
}
