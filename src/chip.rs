//! The software model of one physical ASIC
//!
//! A `Chip` ties the routing key, the configuration register
//! image and the history of packets received from the chip
//! together, and turns configuration state into the UART packets
//! of its generation.

use std::fmt;

use crate::configuration::{AsicVersion, Configuration};
use crate::errors::ConfigurationError;
use crate::key::ChipKey;
use crate::packets::{Packet, PacketType, PacketV1, PacketV2};

pub struct Chip {
  pub chip_key    : ChipKey,
  pub config      : Configuration,
  reads           : Vec<Packet>,
  /// Position of the first read not yet handed out by
  /// `export_reads(true)`
  new_reads_index : usize,
}

impl Chip {

  pub fn new(chip_key : ChipKey, version : AsicVersion) -> Self {
    Self {
      chip_key,
      config          : Configuration::new(version),
      reads           : Vec::new(),
      new_reads_index : 0,
    }
  }

  pub fn version(&self) -> AsicVersion {
    self.config.version()
  }

  /// Configuration write packets carrying the current image,
  /// for all registers or the given subset. Packets come with
  /// valid parity and the routing metadata of this chip.
  pub fn configuration_write_packets(&self, registers : Option<&[u8]>)
    -> Result<Vec<Packet>, ConfigurationError> {
    self.config_packets(PacketType::ConfigWrite, registers)
  }

  /// Configuration read request packets, for all registers or
  /// the given subset. Read requests carry zero data bits.
  pub fn configuration_read_packets(&self, registers : Option<&[u8]>)
    -> Result<Vec<Packet>, ConfigurationError> {
    self.config_packets(PacketType::ConfigRead, registers)
  }

  fn config_packets(&self,
                    ptype     : PacketType,
                    registers : Option<&[u8]>) -> Result<Vec<Packet>, ConfigurationError> {
    let reads = ptype == PacketType::ConfigRead;
    match registers {
      None => {
        Ok(self.config.all_data().iter()
               .map(|&(address, value)| {
                 self.config_packet(ptype, address, if reads { 0 } else { value })
               })
               .collect())
      }
      Some(addresses) => {
        let mut packets = Vec::<Packet>::with_capacity(addresses.len());
        for &address in addresses {
          // doubles as the bounds check for read requests
          let value = self.config.register(address)?;
          packets.push(self.config_packet(ptype, address, if reads { 0 } else { value }));
        }
        Ok(packets)
      }
    }
  }

  fn config_packet(&self, ptype : PacketType, address : u8, value : u8) -> Packet {
    match self.version() {
      AsicVersion::V1 => {
        let mut pkt = PacketV1::new();
        pkt.set_packet_type(ptype);
        pkt.set_chipid(self.chip_key.chip_id());
        pkt.set_register_address(address);
        pkt.set_register_data(value);
        pkt.assign_parity();
        pkt.io_group   = Some(self.chip_key.io_group());
        pkt.io_channel = Some(self.chip_key.io_channel());
        Packet::V1(pkt)
      }
      _ => {
        let mut pkt = PacketV2::new();
        pkt.set_packet_type(ptype);
        pkt.set_chip_id(self.chip_key.chip_id());
        pkt.set_register_address(address);
        pkt.set_register_data(value);
        pkt.assign_parity();
        pkt.io_group   = Some(self.chip_key.io_group());
        pkt.io_channel = Some(self.chip_key.io_channel());
        Packet::V2(pkt)
      }
    }
  }

  /// Append a packet received from the chip to the read history
  pub fn record_read(&mut self, packet : Packet) {
    self.reads.push(packet);
  }

  pub fn num_reads(&self) -> usize {
    self.reads.len()
  }

  /// Hand out the read history. With `only_new` only packets
  /// recorded since the last `export_reads(true)` are returned;
  /// either way the cursor advances to the end of the history.
  pub fn export_reads(&mut self, only_new : bool) -> Vec<Packet> {
    let start = if only_new { self.new_reads_index } else { 0 };
    self.new_reads_index = self.reads.len();
    self.reads[start..].to_vec()
  }

  /// Fold the configuration read responses of the read history
  /// back into the register image. Later responses overwrite
  /// earlier ones for the same register. Responses addressed to
  /// another chip id are ignored.
  pub fn sync_configuration(&mut self) -> Result<(), ConfigurationError> {
    let num_registers = self.config.map().num_registers;
    let mut pairs = Vec::<(u8, u8)>::new();
    for packet in self.reads.iter() {
      let (address, value) = match (self.config.version(), packet) {
        (AsicVersion::V1, Packet::V1(pkt))
          if pkt.packet_type() == Some(PacketType::ConfigRead)
            && pkt.chipid() == self.chip_key.chip_id() => {
          (pkt.register_address(), pkt.register_data())
        }
        (version, Packet::V2(pkt))
          if version != AsicVersion::V1
            && pkt.packet_type() == Some(PacketType::ConfigRead)
            && pkt.chip_id() == self.chip_key.chip_id() => {
          (pkt.register_address(), pkt.register_data())
        }
        _ => continue,
      };
      if address as usize >= num_registers {
        warn!("chip {} reported register {} which it does not have",
              self.chip_key, address);
        continue;
      }
      pairs.push((address, value));
    }
    self.config.from_dict_registers(&pairs)
  }
}

impl fmt::Display for Chip {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<Chip");
    repr += &(format!(" {}", self.chip_key));
    repr += &(format!(" | {}", self.version()));
    repr += &(format!(" | {} reads", self.reads.len()));
    write!(f, "{}>", repr)
  }
}

#[cfg(test)]
mod test_chip {
  use super::*;
  use crate::configuration::FieldValue;

  fn v2_chip() -> Chip {
    Chip::new(ChipKey::new(1, 2, 10), AsicVersion::V2)
  }

  #[test]
  fn write_packets_cover_every_register() {
    let chip    = v2_chip();
    let packets = chip.configuration_write_packets(None).unwrap();
    assert_eq!(packets.len(), 237);
    for (address, packet) in packets.iter().enumerate() {
      match packet {
        Packet::V2(pkt) => {
          assert_eq!(pkt.packet_type(), Some(PacketType::ConfigWrite));
          assert_eq!(pkt.chip_id(), 10);
          assert_eq!(pkt.register_address() as usize, address);
          assert!(pkt.has_valid_parity());
          assert_eq!(pkt.chip_key(), Some(ChipKey::new(1, 2, 10)));
        }
        other => panic!("expected a v2 packet, got {}", other),
      }
    }
    // power-on default of the global threshold register
    match &packets[64] {
      Packet::V2(pkt) => assert_eq!(pkt.register_data(), 255),
      _               => unreachable!(),
    }
  }

  #[test]
  fn read_packets_carry_zero_data() {
    let chip    = v2_chip();
    let packets = chip.configuration_read_packets(Some(&[64, 65])).unwrap();
    assert_eq!(packets.len(), 2);
    match &packets[0] {
      Packet::V2(pkt) => {
        assert_eq!(pkt.packet_type(), Some(PacketType::ConfigRead));
        assert_eq!(pkt.register_address(), 64);
        assert_eq!(pkt.register_data(), 0);
        assert!(pkt.has_valid_parity());
      }
      _ => unreachable!(),
    }
    assert_eq!(chip.configuration_read_packets(None).unwrap().len(), 237);
    assert_eq!(chip.configuration_read_packets(Some(&[240])),
               Err(ConfigurationError::UnknownRegister(240)));
  }

  #[test]
  fn v1_chip_speaks_the_v1_uart() {
    let chip    = Chip::new(ChipKey::new(1, 1, 100), AsicVersion::V1);
    let packets = chip.configuration_write_packets(None).unwrap();
    assert_eq!(packets.len(), 63);
    match &packets[32] {
      Packet::V1(pkt) => {
        assert_eq!(pkt.packet_type(), Some(PacketType::ConfigWrite));
        assert_eq!(pkt.chipid(), 100);
        assert_eq!(pkt.register_address(), 32);
        // global_threshold default
        assert_eq!(pkt.register_data(), 16);
        assert!(pkt.has_valid_parity());
      }
      other => panic!("expected a v1 packet, got {}", other),
    }
  }

  #[test]
  fn sync_takes_the_latest_response() {
    let mut chip = v2_chip();
    let mut pkt  = PacketV2::new();
    pkt.set_packet_type(PacketType::ConfigRead);
    pkt.set_chip_id(10);
    pkt.set_register_address(64);
    pkt.set_register_data(10);
    pkt.assign_parity();
    chip.record_read(Packet::V2(pkt));
    pkt.set_register_data(20);
    pkt.assign_parity();
    chip.record_read(Packet::V2(pkt));
    // a response for somebody else
    pkt.set_chip_id(11);
    pkt.set_register_data(30);
    pkt.assign_parity();
    chip.record_read(Packet::V2(pkt));
    chip.sync_configuration().unwrap();
    assert_eq!(chip.config.get("threshold_global").unwrap(), FieldValue::Scalar(20));
  }

  #[test]
  fn export_reads_cursor() {
    let mut chip = v2_chip();
    let mut pkt  = PacketV2::new();
    pkt.set_chip_id(10);
    chip.record_read(Packet::V2(pkt));
    chip.record_read(Packet::V2(pkt));
    assert_eq!(chip.export_reads(true).len(), 2);
    assert_eq!(chip.export_reads(true).len(), 0);
    chip.record_read(Packet::V2(pkt));
    assert_eq!(chip.export_reads(true).len(), 1);
    assert_eq!(chip.export_reads(false).len(), 3);
    // a full export also resets the cursor
    assert_eq!(chip.export_reads(true).len(), 0);
  }
}
