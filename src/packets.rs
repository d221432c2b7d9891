//! LArPix UART packets and packet-like objects
//!
//! The bit packed UART words come in two flavors: the 54 bit
//! generation 1 word (`PacketV1`, 7 wire bytes) and the 64 bit
//! generation 2 word (`PacketV2`, 8 wire bytes, also used by the
//! v2b and LightPix chips). On top of those there are three
//! packet-like objects without a UART representation which carry
//! out-of-band information from the readout system: timestamps,
//! sync events and external triggers.

pub mod packet_v1;
pub mod packet_v2;
pub mod timestamp;
pub mod sync;
pub mod trigger;

pub use packet_v1::PacketV1;
pub use packet_v2::PacketV2;
pub use timestamp::TimestampPacket;
pub use sync::SyncPacket;
pub use trigger::TriggerPacket;

use std::fmt;

use crate::key::ChipKey;

/// The 2 bit type field shared by both UART generations
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PacketType {
  Data,
  Test,
  ConfigWrite,
  ConfigRead,
}

impl PacketType {

  pub fn to_u8(&self) -> u8 {
    match self {
      PacketType::Data        => 0,
      PacketType::Test        => 1,
      PacketType::ConfigWrite => 2,
      PacketType::ConfigRead  => 3,
    }
  }

  pub fn from_u8(value : u8) -> Option<PacketType> {
    match value {
      0 => Some(PacketType::Data),
      1 => Some(PacketType::Test),
      2 => Some(PacketType::ConfigWrite),
      3 => Some(PacketType::ConfigRead),
      _ => None,
    }
  }
}

impl fmt::Display for PacketType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr : &str;
    match self {
      PacketType::Data        => {repr = "Data";}
      PacketType::Test        => {repr = "Test";}
      PacketType::ConfigWrite => {repr = "Config write";}
      PacketType::ConfigRead  => {repr = "Config read";}
    }
    write!(f, "{}", repr)
  }
}

/// Trigger flavor of a generation 2 data packet
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TriggerType {
  Normal,
  External,
  Cross,
  Periodic,
}

impl TriggerType {

  pub fn to_u8(&self) -> u8 {
    match self {
      TriggerType::Normal   => 0,
      TriggerType::External => 1,
      TriggerType::Cross    => 2,
      TriggerType::Periodic => 3,
    }
  }

  pub fn from_u8(value : u8) -> Option<TriggerType> {
    match value {
      0 => Some(TriggerType::Normal),
      1 => Some(TriggerType::External),
      2 => Some(TriggerType::Cross),
      3 => Some(TriggerType::Periodic),
      _ => None,
    }
  }
}

impl fmt::Display for TriggerType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr : &str;
    match self {
      TriggerType::Normal   => {repr = "normal";}
      TriggerType::External => {repr = "external";}
      TriggerType::Cross    => {repr = "cross";}
      TriggerType::Periodic => {repr = "periodic";}
    }
    write!(f, "{}", repr)
  }
}

/// Any packet-like object, for heterogeneous packet lists
/// (chip read histories, message framing)
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
  V1(PacketV1),
  V2(PacketV2),
  Timestamp(TimestampPacket),
  Sync(SyncPacket),
  Trigger(TriggerPacket),
}

impl Packet {

  /// Routing key, if the packet carries complete routing metadata
  pub fn chip_key(&self) -> Option<ChipKey> {
    match self {
      Packet::V1(pkt) => pkt.chip_key(),
      Packet::V2(pkt) => pkt.chip_key(),
      _               => None,
    }
  }
}

impl fmt::Display for Packet {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Packet::V1(pkt)        => write!(f, "{}", pkt),
      Packet::V2(pkt)        => write!(f, "{}", pkt),
      Packet::Timestamp(pkt) => write!(f, "{}", pkt),
      Packet::Sync(pkt)      => write!(f, "{}", pkt),
      Packet::Trigger(pkt)   => write!(f, "{}", pkt),
    }
  }
}

impl From<PacketV1> for Packet {
  fn from(pkt : PacketV1) -> Self {
    Packet::V1(pkt)
  }
}

impl From<PacketV2> for Packet {
  fn from(pkt : PacketV2) -> Self {
    Packet::V2(pkt)
  }
}

impl From<TimestampPacket> for Packet {
  fn from(pkt : TimestampPacket) -> Self {
    Packet::Timestamp(pkt)
  }
}

impl From<SyncPacket> for Packet {
  fn from(pkt : SyncPacket) -> Self {
    Packet::Sync(pkt)
  }
}

impl From<TriggerPacket> for Packet {
  fn from(pkt : TriggerPacket) -> Self {
    Packet::Trigger(pkt)
  }
}
