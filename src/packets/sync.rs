//! A packet-like object for sync words of the PACMAN stream
//!

use std::fmt;

/// Start-of-run sync
pub const SYNC_TYPE_SYNC       : u8 = b'S';
/// Periodic heartbeat
pub const SYNC_TYPE_HEARTBEAT  : u8 = b'H';
/// Clock source switch
pub const SYNC_TYPE_CLK_SOURCE : u8 = b'C';

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SyncPacket {
  pub sync_type  : u8,
  pub clk_source : Option<u8>,
  pub timestamp  : Option<u32>,
  pub io_group   : Option<u8>,
}

impl SyncPacket {

  pub const PACKET_TYPE : u8 = 6;

  pub fn new(sync_type : u8) -> Self {
    Self {
      sync_type,
      clk_source : None,
      timestamp  : None,
      io_group   : None,
    }
  }

  fn pretty_sync_type(&self) -> &'static str {
    match self.sync_type {
      SYNC_TYPE_SYNC       => "SYNC",
      SYNC_TYPE_HEARTBEAT  => "HEARTBEAT",
      SYNC_TYPE_CLK_SOURCE => "CLOCK SWITCH",
      _                    => "OTHER",
    }
  }
}

impl fmt::Display for SyncPacket {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<SyncPacket");
    repr += &(format!(" {}", self.pretty_sync_type()));
    if let Some(group) = self.io_group {
      repr += &(format!(" | io group: {}", group));
    }
    if let Some(timestamp) = self.timestamp {
      repr += &(format!(" | timestamp: {}", timestamp));
    }
    if let Some(source) = self.clk_source {
      repr += &(format!(" | clk source: {}", source));
    }
    write!(f, "{}>", repr)
  }
}

#[cfg(test)]
mod test_sync {
  use super::*;

  #[test]
  fn sync_types_render() {
    let mut pkt = SyncPacket::new(SYNC_TYPE_SYNC);
    pkt.timestamp = Some(42);
    assert!(pkt.to_string().contains("SYNC"));
    assert!(pkt.to_string().contains("timestamp: 42"));
    assert!(SyncPacket::new(b'x').to_string().contains("OTHER"));
  }
}
