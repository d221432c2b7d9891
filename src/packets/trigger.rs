//! A packet-like object for external trigger words of the
//! PACMAN stream
//!

use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriggerPacket {
  pub trigger_type : u8,
  pub timestamp    : Option<u32>,
  pub io_group     : Option<u8>,
}

impl TriggerPacket {

  pub const PACKET_TYPE : u8 = 7;

  pub fn new(trigger_type : u8) -> Self {
    Self {
      trigger_type,
      timestamp : None,
      io_group  : None,
    }
  }
}

impl fmt::Display for TriggerPacket {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<TriggerPacket");
    repr += &(format!(" type: {}", self.trigger_type));
    if let Some(group) = self.io_group {
      repr += &(format!(" | io group: {}", group));
    }
    if let Some(timestamp) = self.timestamp {
      repr += &(format!(" | timestamp: {}", timestamp));
    }
    write!(f, "{}>", repr)
  }
}
