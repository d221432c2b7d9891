//! A packet-like object carrying only an integer timestamp
//!

use std::fmt;

use crate::errors::PacketFormatError;

cfg_if::cfg_if! {
  if #[cfg(feature = "random")]  {
    use crate::FromRandom;
    extern crate rand;
    use rand::Rng;
  }
}

/// 56 bit unix timestamp emitted by the readout system, not by
/// a chip. Functions smoothly in lists of packets.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimestampPacket {
  pub timestamp : u64,
}

impl TimestampPacket {

  pub const PACKET_TYPE : u8    = 4;
  pub const NUM_BITS    : usize = 56;

  pub fn new(timestamp : u64) -> Self {
    Self {
      timestamp : timestamp & ((1 << Self::NUM_BITS) - 1),
    }
  }

  /// Decode the 7 byte little-endian code from a dataserver
  /// timestamp message
  pub fn from_code(code : &[u8]) -> Result<Self, PacketFormatError> {
    if code.len() != 7 {
      return Err(PacketFormatError::WrongByteSize { expected : 7, got : code.len() });
    }
    let mut word = [0u8; 8];
    word[..7].copy_from_slice(code);
    Ok(Self::new(u64::from_le_bytes(word)))
  }

  pub fn bytes(&self) -> [u8; 8] {
    self.timestamp.to_le_bytes()
  }
}

impl fmt::Display for TimestampPacket {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "<TimestampPacket {}>", self.timestamp)
  }
}

#[cfg(feature = "random")]
impl FromRandom for TimestampPacket {
  fn from_random() -> Self {
    let mut rng = rand::thread_rng();
    TimestampPacket::new(rng.gen::<u64>())
  }
}

#[cfg(test)]
mod test_timestamp {
  use super::*;

  #[test]
  fn code_roundtrip() {
    let pkt  = TimestampPacket::new(123456789);
    let code = pkt.bytes();
    assert_eq!(code[7], 0);
    assert_eq!(TimestampPacket::from_code(&code[..7]).unwrap(), pkt);
  }

  #[test]
  fn timestamp_is_truncated_to_56_bits() {
    let pkt = TimestampPacket::new(u64::MAX);
    assert_eq!(pkt.timestamp, (1 << 56) - 1);
  }
}
