//! The data driven register map engine
//!
//! Every ASIC generation declares its configuration registers as
//! one flat table of `FieldSpec`s over a continuous little-endian
//! bit space of `num_registers * 8` bits. The table is built once
//! per process and shared by all `Configuration` instances of
//! that generation; instances carry only their own register
//! image.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use crate::configuration::{lightpix_v1, v1, v2, v2b};

/// One of the four LArPix ASIC generations
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AsicVersion {
  V1,
  V2,
  V2b,
  LightpixV1,
}

impl AsicVersion {

  /// The class tag used in configuration files
  pub fn config_class(&self) -> &'static str {
    match self {
      AsicVersion::V1         => "Configuration_v1",
      AsicVersion::V2         => "Configuration_v2",
      AsicVersion::V2b        => "Configuration_v2b",
      AsicVersion::LightpixV1 => "Configuration_Lightpix_v1",
    }
  }

  pub fn from_config_class(class : &str) -> Option<AsicVersion> {
    match class {
      "Configuration_v1"          => Some(AsicVersion::V1),
      "Configuration_v2"          => Some(AsicVersion::V2),
      "Configuration_v2b"         => Some(AsicVersion::V2b),
      "Configuration_Lightpix_v1" => Some(AsicVersion::LightpixV1),
      _                           => None,
    }
  }
}

impl fmt::Display for AsicVersion {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr : &str;
    match self {
      AsicVersion::V1         => {repr = "v1";}
      AsicVersion::V2         => {repr = "v2";}
      AsicVersion::V2b        => {repr = "v2b";}
      AsicVersion::LightpixV1 => {repr = "lightpix-v1";}
    }
    write!(f, "{}", repr)
  }
}

/// Value shape of a named configuration field
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FieldShape {
  /// One value in a contiguous bit range
  Scalar { min : u32, max : u32 },
  /// `len` packed sub-fields of `width` bits each, one per
  /// channel (or UART, or monitoring bank)
  List { len : usize, width : usize, min : u8, max : u8 },
}

/// Declaration of one named configuration field
#[derive(Debug, Clone)]
pub struct FieldSpec {
  pub name     : &'static str,
  /// [start, end) in the generation's register bit space
  pub bits     : (usize, usize),
  pub shape    : FieldShape,
  /// Names of all fields sharing register bytes with this one
  /// (including this one); empty for fields that own their
  /// registers outright
  pub siblings : &'static [&'static str],
}

impl FieldSpec {

  pub(crate) fn scalar(name : &'static str,
                       bits : (usize, usize),
                       min  : u32,
                       max  : u32) -> Self {
    Self {
      name,
      bits,
      shape    : FieldShape::Scalar { min, max },
      siblings : &[],
    }
  }

  pub(crate) fn list(name  : &'static str,
                     bits  : (usize, usize),
                     len   : usize,
                     width : usize,
                     max   : u8) -> Self {
    Self {
      name,
      bits,
      shape    : FieldShape::List { len, width, min : 0, max },
      siblings : &[],
    }
  }

  pub(crate) fn compound(name     : &'static str,
                         bits     : (usize, usize),
                         min      : u32,
                         max      : u32,
                         siblings : &'static [&'static str]) -> Self {
    Self {
      name,
      bits,
      shape : FieldShape::Scalar { min, max },
      siblings,
    }
  }

  pub(crate) fn compound_list(name     : &'static str,
                              bits     : (usize, usize),
                              len      : usize,
                              width    : usize,
                              max      : u8,
                              siblings : &'static [&'static str]) -> Self {
    Self {
      name,
      bits,
      shape : FieldShape::List { len, width, min : 0, max },
      siblings,
    }
  }

  pub fn is_compound(&self) -> bool {
    !self.siblings.is_empty()
  }

  /// Addresses of the physical registers this field touches
  pub fn registers(&self) -> Range<usize> {
    self.bits.0 / 8..(self.bits.1 - 1) / 8 + 1
  }
}

/// The immutable per-generation field table
#[derive(Debug)]
pub struct RegisterMap {
  pub version       : AsicVersion,
  pub num_registers : usize,
  pub num_bits      : usize,
  pub num_channels  : usize,
  pub fields        : Vec<FieldSpec>,
  index             : HashMap<&'static str, usize>,
  /// Per register, the mask of bits claimed by any field
  defined_bits      : Vec<u8>,
}

impl RegisterMap {

  pub(crate) fn build(version       : AsicVersion,
                      num_registers : usize,
                      num_bits      : usize,
                      num_channels  : usize,
                      fields        : Vec<FieldSpec>) -> Self {
    let mut index        = HashMap::with_capacity(fields.len());
    let mut defined_bits = vec![0u8; num_registers];
    for (k, field) in fields.iter().enumerate() {
      debug_assert!(field.bits.1 <= num_bits,
                    "field {} exceeds the register space", field.name);
      debug_assert!(field.bits.0 < field.bits.1);
      index.insert(field.name, k);
      for bit in field.bits.0..field.bits.1 {
        let mask = 1u8 << (bit % 8);
        debug_assert!(defined_bits[bit / 8] & mask == 0 || field.is_compound(),
                      "field {} overlaps a non-sibling field", field.name);
        defined_bits[bit / 8] |= mask;
      }
    }
    Self {
      version,
      num_registers,
      num_bits,
      num_channels,
      fields,
      index,
      defined_bits,
    }
  }

  pub fn field(&self, name : &str) -> Option<&FieldSpec> {
    self.index.get(name).map(|&k| &self.fields[k])
  }

  pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.fields.iter().map(|field| field.name)
  }

  /// All fields with bits inside the given register, in table
  /// order
  pub fn fields_in_register(&self, address : u8) -> Vec<&FieldSpec> {
    self.fields.iter()
        .filter(|field| field.registers().contains(&(address as usize)))
        .collect()
  }

  /// Mask of the bits in a register byte that belong to any
  /// declared field
  pub fn defined_mask(&self, address : u8) -> u8 {
    self.defined_bits[address as usize]
  }
}

/// Shared table for a generation, built on first use
pub fn registermap(version : AsicVersion) -> &'static RegisterMap {
  match version {
    AsicVersion::V1         => v1::registermap(),
    AsicVersion::V2         => v2::registermap(),
    AsicVersion::V2b        => v2b::registermap(),
    AsicVersion::LightpixV1 => lightpix_v1::registermap(),
  }
}
