//! The 64 bit UART word of the v2 ASIC generation
//! (also spoken by the v2b and LightPix v1 chips)
//!
//! On the wire the packet is 8 bytes. Internally we keep the
//! word as the `u64` obtained by little-endian loading those
//! bytes; a field occupying datasheet bits `[a,b)` then reads as
//! `(word >> (64 - b)) & ((1 << (b - a)) - 1)`. Field accessors
//! are unchecked views into the word: nothing stops a caller
//! from setting `register_address` on a data packet - the bits
//! simply overlay.

use std::fmt;

use crate::errors::PacketFormatError;
use crate::key::ChipKey;
use crate::packets::{PacketType, TriggerType};

cfg_if::cfg_if! {
  if #[cfg(feature = "random")]  {
    use crate::FromRandom;
    extern crate rand;
    use rand::Rng;
  }
}

/// A generation 2 UART word plus routing metadata.
///
/// `io_group` and `io_channel` are not part of the wire bits;
/// equality is bit-for-bit over the wire word only.
#[derive(Debug, Copy, Clone)]
pub struct PacketV2 {
  bits                 : u64,
  pub io_group         : Option<u8>,
  pub io_channel       : Option<u8>,
  /// Interpret the timestamp region as FIFO diagnostics
  /// (`enable_fifo_diagnostics` set on the chip)
  pub fifo_diagnostics : bool,
}

impl PacketV2 {

  pub const SIZE     : usize = 8;
  pub const NUM_BITS : usize = 64;

  const PACKET_TYPE_BITS       : (usize, usize) = (0, 2);
  const CHIP_ID_BITS           : (usize, usize) = (2, 10);
  const CHANNEL_ID_BITS        : (usize, usize) = (10, 16);
  const TIMESTAMP_BITS         : (usize, usize) = (16, 48);
  const FIRST_PACKET_BITS      : (usize, usize) = (16, 17);
  const DATAWORD_BITS          : (usize, usize) = (48, 56);
  const TRIGGER_TYPE_BITS      : (usize, usize) = (56, 58);
  const LOCAL_FIFO_BITS        : (usize, usize) = (58, 60);
  const SHARED_FIFO_BITS       : (usize, usize) = (60, 62);
  const DOWNSTREAM_MARKER_BITS : (usize, usize) = (62, 63);
  const PARITY_BITS            : (usize, usize) = (63, 64);
  const REGISTER_ADDRESS_BITS  : (usize, usize) = (10, 18);
  const REGISTER_DATA_BITS     : (usize, usize) = (18, 26);
  // timestamp region overlay in FIFO diagnostics mode
  const FIFO_DIAG_TIMESTAMP_BITS : (usize, usize) = (16, 32);
  const SHARED_FIFO_EVENTS_BITS  : (usize, usize) = (32, 44);
  const LOCAL_FIFO_EVENTS_BITS   : (usize, usize) = (44, 46);

  pub fn new() -> Self {
    Self {
      bits             : 0,
      io_group         : None,
      io_channel       : None,
      fifo_diagnostics : false,
    }
  }

  pub fn from_bytes(bytes : &[u8]) -> Result<Self, PacketFormatError> {
    if bytes.len() != Self::SIZE {
      return Err(PacketFormatError::WrongByteSize { expected : Self::SIZE,
                                                    got      : bytes.len() });
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(bytes);
    let mut pkt = Self::new();
    pkt.bits = u64::from_le_bytes(word);
    Ok(pkt)
  }

  pub fn bytes(&self) -> [u8; 8] {
    self.bits.to_le_bytes()
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

  pub fn chip_id(&self) -> u8 {
    self.get_bits(Self::CHIP_ID_BITS) as u8
  }

  pub fn set_chip_id(&mut self, chip_id : u8) {
    self.set_bits(Self::CHIP_ID_BITS, chip_id as u64);
  }

  pub fn channel_id(&self) -> u8 {
    self.get_bits(Self::CHANNEL_ID_BITS) as u8
  }

  pub fn set_channel_id(&mut self, channel_id : u8) {
    self.set_bits(Self::CHANNEL_ID_BITS, channel_id as u64);
  }

  pub fn timestamp(&self) -> u32 {
    if self.fifo_diagnostics {
      return self.get_bits(Self::FIFO_DIAG_TIMESTAMP_BITS) as u32;
    }
    self.get_bits(Self::TIMESTAMP_BITS) as u32
  }

  pub fn set_timestamp(&mut self, timestamp : u32) {
    if self.fifo_diagnostics {
      self.set_bits(Self::FIFO_DIAG_TIMESTAMP_BITS, timestamp as u64);
      return;
    }
    self.set_bits(Self::TIMESTAMP_BITS, timestamp as u64);
  }

  /// Overlay view of the timestamp MSB, set by the chip when
  /// `mark_first_packet` is enabled
  pub fn first_packet(&self) -> u8 {
    self.get_bits(Self::FIRST_PACKET_BITS) as u8
  }

  pub fn set_first_packet(&mut self, marker : u8) {
    self.set_bits(Self::FIRST_PACKET_BITS, marker as u64);
  }

  pub fn dataword(&self) -> u8 {
    self.get_bits(Self::DATAWORD_BITS) as u8
  }

  pub fn set_dataword(&mut self, dataword : u8) {
    self.set_bits(Self::DATAWORD_BITS, dataword as u64);
  }

  pub fn trigger_type(&self) -> Option<TriggerType> {
    TriggerType::from_u8(self.get_bits(Self::TRIGGER_TYPE_BITS) as u8)
  }

  pub fn set_trigger_type(&mut self, ttype : TriggerType) {
    self.set_bits(Self::TRIGGER_TYPE_BITS, ttype.to_u8() as u64);
  }

  pub fn local_fifo(&self) -> u8 {
    self.get_bits(Self::LOCAL_FIFO_BITS) as u8
  }

  pub fn set_local_fifo(&mut self, flags : u8) {
    self.set_bits(Self::LOCAL_FIFO_BITS, flags as u64);
  }

  pub fn shared_fifo(&self) -> u8 {
    self.get_bits(Self::SHARED_FIFO_BITS) as u8
  }

  pub fn set_shared_fifo(&mut self, flags : u8) {
    self.set_bits(Self::SHARED_FIFO_BITS, flags as u64);
  }

  pub fn local_fifo_half(&self) -> bool {
    self.local_fifo() & 1 == 1
  }

  pub fn local_fifo_full(&self) -> bool {
    self.local_fifo() >> 1 & 1 == 1
  }

  pub fn shared_fifo_half(&self) -> bool {
    self.shared_fifo() & 1 == 1
  }

  pub fn shared_fifo_full(&self) -> bool {
    self.shared_fifo() >> 1 & 1 == 1
  }

  pub fn downstream_marker(&self) -> u8 {
    self.get_bits(Self::DOWNSTREAM_MARKER_BITS) as u8
  }

  pub fn set_downstream_marker(&mut self, marker : u8) {
    self.set_bits(Self::DOWNSTREAM_MARKER_BITS, marker as u64);
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

  pub fn shared_fifo_events(&self) -> u16 {
    self.get_bits(Self::SHARED_FIFO_EVENTS_BITS) as u16
  }

  pub fn set_shared_fifo_events(&mut self, events : u16) {
    self.set_bits(Self::SHARED_FIFO_EVENTS_BITS, events as u64);
  }

  pub fn local_fifo_events(&self) -> u8 {
    self.get_bits(Self::LOCAL_FIFO_EVENTS_BITS) as u8
  }

  pub fn set_local_fifo_events(&mut self, events : u8) {
    self.set_bits(Self::LOCAL_FIFO_EVENTS_BITS, events as u64);
  }

  pub fn parity(&self) -> u8 {
    self.get_bits(Self::PARITY_BITS) as u8
  }

  pub fn set_parity(&mut self, parity : u8) {
    self.set_bits(Self::PARITY_BITS, parity as u64);
  }

  /// Odd parity over everything but the parity bit itself
  pub fn compute_parity(&self) -> u8 {
    (((self.bits >> 1).count_ones() + 1) % 2) as u8
  }

  pub fn assign_parity(&mut self) {
    self.set_parity(self.compute_parity());
  }

  pub fn has_valid_parity(&self) -> bool {
    self.parity() == self.compute_parity()
  }

  pub fn chip_key(&self) -> Option<ChipKey> {
    match (self.io_group, self.io_channel) {
      (Some(group), Some(channel)) => Some(ChipKey::new(group, channel, self.chip_id())),
      _                            => None,
    }
  }
}

impl Default for PacketV2 {
  fn default() -> Self {
    Self::new()
  }
}

impl PartialEq for PacketV2 {
  fn eq(&self, other : &Self) -> bool {
    self.bits == other.bits
  }
}

impl fmt::Display for PacketV2 {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<PacketV2");
    // a 2 bit type field is always a valid PacketType
    let ptype = self.packet_type().unwrap_or(PacketType::Data);
    match ptype {
      PacketType::ConfigWrite | PacketType::ConfigRead => {
        repr += &(format!(" {}", ptype));
        repr += &(format!(" | chip: {}", self.chip_id()));
        repr += &(format!(" | register: {}", self.register_address()));
        repr += &(format!(" | value: {}", self.register_data()));
      }
      _ => {
        repr += &(format!(" {}", ptype));
        repr += &(format!(" | chip: {}", self.chip_id()));
        repr += &(format!(" | channel: {}", self.channel_id()));
        repr += &(format!(" | timestamp: {}", self.timestamp()));
        repr += &(format!(" | dataword: {}", self.dataword()));
        if let Some(ttype) = self.trigger_type() {
          repr += &(format!(" | trigger: {}", ttype));
        }
        if self.downstream_marker() == 1 {
          repr += " | downstream";
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
impl FromRandom for PacketV2 {
  fn from_random() -> Self {
    let mut pkt = PacketV2::new();
    let mut rng = rand::thread_rng();
    pkt.bits    = rng.gen::<u64>();
    pkt
  }
}

#[cfg(test)]
mod test_packet_v2 {
  use super::*;

  // the 8 byte word from the larpix-control tutorial
  const TUTORIAL_WORD : [u8; 8] = [0x02, 0x91, 0x15, 0xcd, 0x5b, 0x07, 0x85, 0x00];

  #[test]
  fn decode_tutorial_word() {
    let pkt = PacketV2::from_bytes(&TUTORIAL_WORD).unwrap();
    assert_eq!(pkt.packet_type(), Some(PacketType::Data));
    assert_eq!(pkt.chip_id(), 2);
    assert_eq!(pkt.channel_id(), 5);
    assert_eq!(pkt.timestamp(), 123456789);
    assert_eq!(pkt.dataword(), 145);
    assert_eq!(pkt.downstream_marker(), 1);
    assert_eq!(pkt.parity(), 0);
    assert!(pkt.has_valid_parity());
  }

  #[test]
  fn encode_is_decode_inverse() {
    let pkt = PacketV2::from_bytes(&TUTORIAL_WORD).unwrap();
    assert_eq!(pkt.bytes(), TUTORIAL_WORD);
    let mut built = PacketV2::new();
    built.set_packet_type(PacketType::Data);
    built.set_chip_id(2);
    built.set_channel_id(5);
    built.set_timestamp(123456789);
    built.set_dataword(145);
    built.set_downstream_marker(1);
    built.assign_parity();
    assert_eq!(built, pkt);
    assert_eq!(built.bytes(), TUTORIAL_WORD);
  }

  #[test]
  fn wrong_size_is_rejected() {
    assert_eq!(PacketV2::from_bytes(&[0u8; 7]),
               Err(PacketFormatError::WrongByteSize { expected : 8, got : 7 }));
    assert!(PacketV2::from_bytes(&[0u8; 9]).is_err());
  }

  #[test]
  fn config_fields_roundtrip() {
    let mut pkt = PacketV2::new();
    pkt.set_packet_type(PacketType::ConfigWrite);
    pkt.set_chip_id(12);
    pkt.set_register_address(64);
    pkt.set_register_data(255);
    pkt.assign_parity();
    let copy = PacketV2::from_bytes(&pkt.bytes()).unwrap();
    assert_eq!(copy.packet_type(), Some(PacketType::ConfigWrite));
    assert_eq!(copy.chip_id(), 12);
    assert_eq!(copy.register_address(), 64);
    assert_eq!(copy.register_data(), 255);
    assert!(copy.has_valid_parity());
  }

  #[test]
  fn parity_flips_on_any_single_bit() {
    let mut pkt = PacketV2::new();
    pkt.set_chip_id(42);
    pkt.set_timestamp(0xdeadbeef);
    pkt.assign_parity();
    assert!(pkt.has_valid_parity());
    for bit in 1..64 {
      let mut flipped = pkt;
      flipped.bits ^= 1u64 << bit;
      assert!(!flipped.has_valid_parity(), "bit {} did not break parity", bit);
    }
  }

  #[test]
  fn first_packet_overlays_timestamp_msb() {
    let mut pkt = PacketV2::new();
    pkt.set_timestamp(0x8000_0000);
    assert_eq!(pkt.first_packet(), 1);
    pkt.set_timestamp(0x7fff_ffff);
    assert_eq!(pkt.first_packet(), 0);
    // the marker is physical word bit 47, byte 5 bit 7 on the wire
    let mut marked = PacketV2::new();
    marked.set_first_packet(1);
    assert_eq!(marked.as_u64(), 1u64 << 47);
    assert_eq!(marked.bytes()[5] >> 7 & 1, 1);
    assert_eq!(marked.timestamp(), 0x8000_0000);
    marked.set_first_packet(0);
    assert_eq!(marked.as_u64(), 0);
  }

  #[test]
  fn fifo_diagnostics_reinterprets_timestamp() {
    let mut pkt = PacketV2::new();
    pkt.fifo_diagnostics = true;
    pkt.set_timestamp(0xbeef);
    pkt.set_shared_fifo_events(1234);
    pkt.set_local_fifo_events(2);
    assert_eq!(pkt.timestamp(), 0xbeef);
    assert_eq!(pkt.shared_fifo_events(), 1234);
    assert_eq!(pkt.local_fifo_events(), 2);
    // the plain timestamp view sees the packed diagnostics
    let mut plain = PacketV2::from_bytes(&pkt.bytes()).unwrap();
    plain.fifo_diagnostics = false;
    assert_ne!(plain.timestamp(), 0xbeef);
  }
}
