//! The 54 bit UART word of the original (v1) ASIC generation
//!
//! On the wire the packet is 7 bytes, the two most significant
//! bits of the last byte are padding. Internally the word is the
//! low 54 bits of the little-endian loaded 7 byte integer; a
//! field occupying bits `[a,b)` of the 54 bit space reads as
//! `(word >> (54 - b)) & ((1 << (b - a)) - 1)`. As for the
//! generation 2 word, field accessors are unchecked overlay
//! views.

use std::fmt;

use crate::errors::PacketFormatError;
use crate::key::ChipKey;
use crate::packets::PacketType;

cfg_if::cfg_if! {
  if #[cfg(feature = "random")]  {
    use crate::FromRandom;
    extern crate rand;
    use rand::Rng;
  }
}

#[derive(Debug, Copy, Clone)]
pub struct PacketV1 {
  bits           : u64,
  pub io_group   : Option<u8>,
  pub io_channel : Option<u8>,
}

impl PacketV1 {

  pub const SIZE     : usize = 7;
  pub const NUM_BITS : usize = 54;

  const WORD_MASK : u64 = (1 << Self::NUM_BITS) - 1;

  const PARITY_BITS           : (usize, usize) = (0, 1);
  const FIFO_FULL_BITS        : (usize, usize) = (1, 2);
  const FIFO_HALF_BITS        : (usize, usize) = (2, 3);
  const DATAWORD_BITS         : (usize, usize) = (3, 13);
  const TIMESTAMP_BITS        : (usize, usize) = (13, 37);
  const CHANNEL_ID_BITS       : (usize, usize) = (37, 44);
  const CHIPID_BITS           : (usize, usize) = (44, 52);
  const PACKET_TYPE_BITS      : (usize, usize) = (52, 54);
  const REGISTER_ADDRESS_BITS : (usize, usize) = (36, 44);
  const REGISTER_DATA_BITS    : (usize, usize) = (28, 36);
  const TEST_COUNTER_HIGH_BITS : (usize, usize) = (40, 44);
  const TEST_COUNTER_LOW_BITS  : (usize, usize) = (1, 13);

  pub fn new() -> Self {
    Self {
      bits       : 0,
      io_group   : None,
      io_channel : None,
    }
  }

  pub fn from_bytes(bytes : &[u8]) -> Result<Self, PacketFormatError> {
    if bytes.len() != Self::SIZE {
      return Err(PacketFormatError::WrongByteSize { expected : Self::SIZE,
                                                    got      : bytes.len() });
    }
    let mut word = [0u8; 8];
    word[..Self::SIZE].copy_from_slice(bytes);
    let mut pkt = Self::new();
    // the two padding bits are dropped
    pkt.bits = u64::from_le_bytes(word) & Self::WORD_MASK;
    Ok(pkt)
  }

  pub fn bytes(&self) -> [u8; 7] {
    let word = self.bits.to_le_bytes();
    let mut bytes = [0u8; 7];
    bytes.copy_from_slice(&word[..Self::SIZE]);
    bytes
  }

  pub fn as_u64(&self) -> u64 {
    self.bits
  }

  fn get_bits(&self, range : (usize, usize)) -> u64 {
    let width = range.1 - range.0;
    let mask  = (1u64 << width) - 1;
    self.bits >> (Self::NUM_BITS - range.1) & mask
  }

  fn set_bits(&mut self, range : (usize, usize), value : u64) {
    let width = range.1 - range.0;
    let mask  = (1u64 << width) - 1;
    let shift = Self::NUM_BITS - range.1;
    self.bits = self.bits & !(mask << shift) | ((value & mask) << shift);
  }

  pub fn packet_type(&self) -> Option<PacketType> {
    PacketType::from_u8(self.get_bits(Self::PACKET_TYPE_BITS) as u8)
  }

  pub fn set_packet_type(&mut self, ptype : PacketType) {
    self.set_bits(Self::PACKET_TYPE_BITS, ptype.to_u8() as u64);
  }

  pub fn chipid(&self) -> u8 {
    self.get_bits(Self::CHIPID_BITS) as u8
  }

  pub fn set_chipid(&mut self, chipid : u8) {
    self.set_bits(Self::CHIPID_BITS, chipid as u64);
  }

  pub fn channel_id(&self) -> u8 {
    self.get_bits(Self::CHANNEL_ID_BITS) as u8
  }

  pub fn set_channel_id(&mut self, channel_id : u8) {
    self.set_bits(Self::CHANNEL_ID_BITS, channel_id as u64);
  }

  pub fn timestamp(&self) -> u32 {
    self.get_bits(Self::TIMESTAMP_BITS) as u32
  }

  pub fn set_timestamp(&mut self, timestamp : u32) {
    self.set_bits(Self::TIMESTAMP_BITS, timestamp as u64);
  }

  /// The ADC word, with its least significant bit forced to
  /// zero. The v1 chip uses that bit as part of the parity
  /// region, so the stored value is reported rounded down to
  /// even. Kept for compatibility with the original readout.
  pub fn dataword(&self) -> u16 {
    let raw = self.get_bits(Self::DATAWORD_BITS) as u16;
    raw - raw % 2
  }

  pub fn set_dataword(&mut self, dataword : u16) {
    self.set_bits(Self::DATAWORD_BITS, dataword as u64);
  }

  pub fn fifo_half_flag(&self) -> bool {
    self.get_bits(Self::FIFO_HALF_BITS) == 1
  }

  pub fn set_fifo_half_flag(&mut self, flag : bool) {
    self.set_bits(Self::FIFO_HALF_BITS, flag as u64);
  }

  pub fn fifo_full_flag(&self) -> bool {
    self.get_bits(Self::FIFO_FULL_BITS) == 1
  }

  pub fn set_fifo_full_flag(&mut self, flag : bool) {
    self.set_bits(Self::FIFO_FULL_BITS, flag as u64);
  }

  pub fn register_address(&self) -> u8 {
    self.get_bits(Self::REGISTER_ADDRESS_BITS) as u8
  }

  pub fn set_register_address(&mut self, address : u8) {
    self.set_bits(Self::REGISTER_ADDRESS_BITS, address as u64);
  }

  pub fn register_data(&self) -> u8 {
    self.get_bits(Self::REGISTER_DATA_BITS) as u8
  }

  pub fn set_register_data(&mut self, data : u8) {
    self.set_bits(Self::REGISTER_DATA_BITS, data as u64);
  }

  /// 16 bit counter of a TEST packet, split over two bit ranges
  pub fn test_counter(&self) -> u16 {
    ((self.get_bits(Self::TEST_COUNTER_HIGH_BITS) << 12)
      | self.get_bits(Self::TEST_COUNTER_LOW_BITS)) as u16
  }

  pub fn set_test_counter(&mut self, counter : u16) {
    self.set_bits(Self::TEST_COUNTER_HIGH_BITS, (counter >> 12) as u64);
    self.set_bits(Self::TEST_COUNTER_LOW_BITS, (counter & 0xfff) as u64);
  }

  pub fn parity(&self) -> u8 {
    self.get_bits(Self::PARITY_BITS) as u8
  }

  pub fn set_parity(&mut self, parity : u8) {
    self.set_bits(Self::PARITY_BITS, parity as u64);
  }

  /// Odd parity over bits [1,54)
  pub fn compute_parity(&self) -> u8 {
    let covered = self.bits & ((1 << (Self::NUM_BITS - 1)) - 1);
    ((covered.count_ones() + 1) % 2) as u8
  }

  pub fn assign_parity(&mut self) {
    self.set_parity(self.compute_parity());
  }

  pub fn has_valid_parity(&self) -> bool {
    self.parity() == self.compute_parity()
  }

  pub fn chip_key(&self) -> Option<ChipKey> {
    match (self.io_group, self.io_channel) {
      (Some(group), Some(channel)) => Some(ChipKey::new(group, channel, self.chipid())),
      _                            => None,
    }
  }
}

impl Default for PacketV1 {
  fn default() -> Self {
    Self::new()
  }
}

impl PartialEq for PacketV1 {
  fn eq(&self, other : &Self) -> bool {
    self.bits == other.bits
  }
}

impl fmt::Display for PacketV1 {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<PacketV1");
    let ptype = self.packet_type().unwrap_or(PacketType::Data);
    match ptype {
      PacketType::ConfigWrite | PacketType::ConfigRead => {
        repr += &(format!(" {}", ptype));
        repr += &(format!(" | chip: {}", self.chipid()));
        repr += &(format!(" | register: {}", self.register_address()));
        repr += &(format!(" | value: {}", self.register_data()));
      }
      PacketType::Test => {
        repr += &(format!(" {}", ptype));
        repr += &(format!(" | chip: {}", self.chipid()));
        repr += &(format!(" | counter: {}", self.test_counter()));
      }
      PacketType::Data => {
        repr += &(format!(" {}", ptype));
        repr += &(format!(" | chip: {}", self.chipid()));
        repr += &(format!(" | channel: {}", self.channel_id()));
        repr += &(format!(" | timestamp: {}", self.timestamp()));
        repr += &(format!(" | dataword: {}", self.dataword()));
        if self.fifo_half_flag() {
          repr += " | FIFO half";
        }
        if self.fifo_full_flag() {
          repr += " | FIFO full";
        }
      }
    }
    match self.chip_key() {
      Some(key) => {repr += &(format!(" | key: {}", key));}
      None      => ()
    }
    repr += &(format!(" | parity: {} (valid: {})>", self.parity(), self.has_valid_parity()));
    write!(f, "{}", repr)
  }
}

#[cfg(feature = "random")]
impl FromRandom for PacketV1 {
  fn from_random() -> Self {
    let mut pkt = PacketV1::new();
    let mut rng = rand::thread_rng();
    pkt.bits    = rng.gen::<u64>() & PacketV1::WORD_MASK;
    pkt
  }
}

#[cfg(test)]
mod test_packet_v1 {
  use super::*;

  #[test]
  fn data_packet_with_chipid() {
    let mut pkt = PacketV1::new();
    pkt.set_packet_type(PacketType::Data);
    pkt.set_chipid(100);
    assert_eq!(pkt.bytes(), [0x90, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
    let back = PacketV1::from_bytes(&[0x90, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(back.packet_type(), Some(PacketType::Data));
    assert_eq!(back.chipid(), 100);
  }

  #[test]
  fn wrong_size_is_rejected() {
    assert_eq!(PacketV1::from_bytes(&[0u8; 8]),
               Err(PacketFormatError::WrongByteSize { expected : 7, got : 8 }));
    assert!(PacketV1::from_bytes(&[0u8; 6]).is_err());
  }

  #[test]
  fn padding_bits_are_dropped() {
    let pkt = PacketV1::from_bytes(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0]).unwrap();
    assert_eq!(pkt.as_u64(), 0);
    assert_eq!(pkt.bytes(), [0u8; 7]);
  }

  #[test]
  fn field_roundtrip() {
    let mut pkt = PacketV1::new();
    pkt.set_packet_type(PacketType::Data);
    pkt.set_chipid(250);
    pkt.set_channel_id(101);
    pkt.set_timestamp(123456);
    pkt.set_dataword(120);
    pkt.set_fifo_half_flag(true);
    pkt.assign_parity();
    let back = PacketV1::from_bytes(&pkt.bytes()).unwrap();
    assert_eq!(back, pkt);
    assert_eq!(back.chipid(), 250);
    assert_eq!(back.channel_id(), 101);
    assert_eq!(back.timestamp(), 123456);
    assert_eq!(back.dataword(), 120);
    assert!(back.fifo_half_flag());
    assert!(!back.fifo_full_flag());
    assert!(back.has_valid_parity());
  }

  #[test]
  fn dataword_reads_rounded_down_to_even() {
    let mut pkt = PacketV1::new();
    pkt.set_dataword(277);
    assert_eq!(pkt.dataword(), 276);
    pkt.set_dataword(276);
    assert_eq!(pkt.dataword(), 276);
  }

  #[test]
  fn parity_flips_on_any_single_covered_bit() {
    let mut pkt = PacketV1::new();
    pkt.set_chipid(100);
    pkt.set_timestamp(0xabcdef);
    pkt.assign_parity();
    assert!(pkt.has_valid_parity());
    for bit in 0..53 {
      let mut flipped = pkt;
      flipped.bits ^= 1u64 << bit;
      assert!(!flipped.has_valid_parity(), "bit {} did not break parity", bit);
    }
  }

  #[test]
  fn test_counter_split_field() {
    let mut pkt = PacketV1::new();
    pkt.set_packet_type(PacketType::Test);
    pkt.set_test_counter(0xbeef);
    assert_eq!(pkt.test_counter(), 0xbeef);
    let back = PacketV1::from_bytes(&pkt.bytes()).unwrap();
    assert_eq!(back.test_counter(), 0xbeef);
  }

  #[test]
  fn config_overlay() {
    let mut pkt = PacketV1::new();
    pkt.set_packet_type(PacketType::ConfigWrite);
    pkt.set_chipid(5);
    pkt.set_register_address(32);
    pkt.set_register_data(16);
    pkt.assign_parity();
    let back = PacketV1::from_bytes(&pkt.bytes()).unwrap();
    assert_eq!(back.register_address(), 32);
    assert_eq!(back.register_data(), 16);
  }
}
