//! Unique address of a physical ASIC within the DAQ hierarchy
//!

use std::fmt;
use std::str::FromStr;

use crate::errors::KeyError;

/// The `(io_group, io_channel, chip_id)` triple addressing one
/// chip. A plain value, equal by value, usable as a map key.
/// Immutable once constructed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChipKey {
  io_group   : u8,
  io_channel : u8,
  chip_id    : u8,
}

impl ChipKey {

  pub fn new(io_group : u8, io_channel : u8, chip_id : u8) -> Self {
    Self {
      io_group,
      io_channel,
      chip_id,
    }
  }

  pub fn io_group(&self) -> u8 {
    self.io_group
  }

  pub fn io_channel(&self) -> u8 {
    self.io_channel
  }

  pub fn chip_id(&self) -> u8 {
    self.chip_id
  }
}

impl fmt::Display for ChipKey {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}-{}-{}", self.io_group, self.io_channel, self.chip_id)
  }
}

impl FromStr for ChipKey {
  type Err = KeyError;

  fn from_str(key : &str) -> Result<Self, Self::Err> {
    let mut fields = Vec::<u8>::with_capacity(3);
    for part in key.split('-') {
      match part.parse::<u8>() {
        Ok(value) => fields.push(value),
        Err(_)    => return Err(KeyError::BadFormat(String::from(key))),
      }
    }
    if fields.len() != 3 {
      return Err(KeyError::BadFormat(String::from(key)));
    }
    Ok(ChipKey::new(fields[0], fields[1], fields[2]))
  }
}

#[cfg(test)]
mod test_key {
  use super::*;

  #[test]
  fn key_string_roundtrip() {
    let key = ChipKey::new(1, 2, 123);
    assert_eq!(key.to_string(), "1-2-123");
    assert_eq!("1-2-123".parse::<ChipKey>().unwrap(), key);
  }

  #[test]
  fn key_rejects_garbage() {
    assert!("1-2".parse::<ChipKey>().is_err());
    assert!("1-2-3-4".parse::<ChipKey>().is_err());
    assert!("1-2-300".parse::<ChipKey>().is_err());
    assert!("a-b-c".parse::<ChipKey>().is_err());
  }

  #[test]
  fn key_is_a_map_key() {
    use std::collections::HashMap;
    let mut chips = HashMap::<ChipKey, u32>::new();
    chips.insert(ChipKey::new(1, 1, 2), 42);
    assert_eq!(chips[&ChipKey::new(1, 1, 2)], 42);
  }
}
