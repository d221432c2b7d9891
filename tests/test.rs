#[cfg(test)]
pub mod tests {

  extern crate rand;
  use rand::Rng;

  use larpix_dataclasses::chip::Chip;
  use larpix_dataclasses::configuration::{AsicVersion, Configuration};
  use larpix_dataclasses::dataserver::{dataserver_message_decode,
                                       dataserver_message_encode,
                                       DATASERVER_VERSION};
  use larpix_dataclasses::key::ChipKey;
  use larpix_dataclasses::packets::{Packet, PacketType, PacketV1, PacketV2,
                                    TimestampPacket};
  use larpix_dataclasses::pacman;
  use larpix_dataclasses::pacman::{MsgType, PacmanMsg};
  use larpix_dataclasses::FromRandom;

  #[test]
  fn serialization_circle_test_for_packet_v1() {
    // try this 100 times
    for _n in 0..100 {
      let pkt       = PacketV1::from_random();
      let pkt_ser   = pkt.bytes();
      let pkt_deser = PacketV1::from_bytes(&pkt_ser).unwrap();
      assert_eq!(pkt_deser, pkt);
      assert_eq!(pkt_deser.as_u64(), pkt.as_u64());
    }
  }

  #[test]
  fn serialization_circle_test_for_packet_v2() {
    for _n in 0..100 {
      let pkt       = PacketV2::from_random();
      let pkt_ser   = pkt.bytes();
      let pkt_deser = PacketV2::from_bytes(&pkt_ser).unwrap();
      assert_eq!(pkt_deser, pkt);
      assert_eq!(pkt_deser.chip_id(), pkt.chip_id());
      assert_eq!(pkt_deser.timestamp(), pkt.timestamp());
      assert_eq!(pkt_deser.dataword(), pkt.dataword());
    }
  }

  #[test]
  fn serialization_circle_test_for_timestamp() {
    for _n in 0..100 {
      let pkt  = TimestampPacket::from_random();
      let code = pkt.bytes();
      assert_eq!(TimestampPacket::from_code(&code[..7]).unwrap(), pkt);
    }
  }

  #[test]
  fn serialization_circle_test_for_pacman_msg() {
    let mut rng = rand::thread_rng();
    for _n in 0..100 {
      let mut packets = Vec::<Packet>::new();
      packets.push(Packet::Timestamp(TimestampPacket::new(rng.gen::<u32>() as u64)));
      for _ in 0..rng.gen_range(1..20) {
        let mut pkt    = PacketV2::from_random();
        pkt.io_channel = Some(rng.gen_range(1..5));
        packets.push(Packet::V2(pkt));
      }
      let msg   = pacman::format(&packets, MsgType::Data).unwrap();
      let wire  = msg.to_bytes();
      let back  = PacmanMsg::from_bytes(&wire).unwrap();
      assert_eq!(back, msg);
      let deser = pacman::parse(&back, Some(1)).unwrap();
      assert_eq!(deser.len(), packets.len());
      for (sent, received) in packets.iter().zip(deser.iter()) {
        match (sent, received) {
          (Packet::Timestamp(sent), Packet::Timestamp(received)) => {
            assert_eq!(received, sent);
          }
          (Packet::V2(sent), Packet::V2(received)) => {
            assert_eq!(received, sent);
            assert_eq!(received.io_channel, sent.io_channel);
            assert_eq!(received.io_group, Some(1));
          }
          _ => panic!("packet changed kind on the wire"),
        }
      }
    }
  }

  #[test]
  fn serialization_circle_test_for_dataserver() {
    let mut rng = rand::thread_rng();
    for _n in 0..100 {
      let mut packets = Vec::<Packet>::new();
      for _ in 0..rng.gen_range(1..20) {
        let mut pkt    = PacketV2::from_random();
        pkt.io_channel = Some(rng.gen_range(1..5));
        packets.push(Packet::V2(pkt));
      }
      let msgs = dataserver_message_encode(&packets, DATASERVER_VERSION).unwrap();
      assert_eq!(msgs.len(), packets.len());
      let back = dataserver_message_decode(&msgs, AsicVersion::V2,
                                           Some(2), DATASERVER_VERSION).unwrap();
      assert_eq!(back, packets);
    }
  }

  #[test]
  fn register_circle_test_for_configuration() {
    for _n in 0..100 {
      let config   = Configuration::from_random();
      let mut copy = Configuration::new(config.version());
      copy.from_dict_registers(&config.all_data()).unwrap();
      assert_eq!(copy, config);
    }
  }

  #[test]
  fn configuration_write_read_circle() {
    // a chip's write packets, read back as config read responses,
    // reproduce the configuration on a fresh chip
    let mut rng = rand::thread_rng();
    for _n in 0..100 {
      let key      = ChipKey::new(1, 1, rng.gen::<u8>());
      let mut chip = Chip::new(key, AsicVersion::V2);
      chip.config.from_dict_registers(
        &(0..237).map(|address| (address as u8, rng.gen::<u8>()))
                 .collect::<Vec<(u8, u8)>>()).unwrap();
      let mut twin = Chip::new(key, AsicVersion::V2);
      for packet in chip.configuration_write_packets(None).unwrap() {
        match packet {
          Packet::V2(mut pkt) => {
            pkt.set_packet_type(PacketType::ConfigRead);
            pkt.assign_parity();
            twin.record_read(Packet::V2(pkt));
          }
          _ => unreachable!(),
        }
      }
      twin.sync_configuration().unwrap();
      assert_eq!(twin.config, chip.config);
    }
  }
}
