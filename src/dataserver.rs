//! The legacy dataserver message format
//!
//! Predecessor of the PACMAN stream: every packet travels in its
//! own small message of an 8 byte header (format version, message
//! type, io channel) and an 8 byte payload. Both UART generations
//! fit the payload, the 7 byte generation 1 word is padded with a
//! null byte. Since the payload size alone can not tell the
//! generations apart, decoding takes the expected generation as
//! an argument.

use crate::configuration::AsicVersion;
use crate::errors::MessageFormatError;
use crate::packets::{Packet, PacketV1, PacketV2, TimestampPacket};

pub const HEADER_LEN : usize = 8;
pub const MSG_LEN    : usize = 16;

/// Format version stamped into the header, `(major, minor)`
pub const DATASERVER_VERSION : (u8, u8) = (1, 0);

const MSG_TYPE_DATA      : u8 = b'D';
const MSG_TYPE_TIMESTAMP : u8 = b'T';
const MSG_TYPE_HEARTBEAT : u8 = b'H';

fn header(msg_type : u8, io_channel : u8, version : (u8, u8)) -> [u8; HEADER_LEN] {
  let mut header = [0u8; HEADER_LEN];
  header[0] = version.0;
  header[1] = version.1;
  header[2] = msg_type;
  header[3] = io_channel;
  // bytes 4..8 are reserved and zero
  header
}

/// Frame packets into dataserver messages, one message per
/// packet. UART packets need their `io_channel` set; sync and
/// trigger objects have no representation in this format.
pub fn dataserver_message_encode(packets : &[Packet],
                                 version : (u8, u8))
  -> Result<Vec<Vec<u8>>, MessageFormatError> {
  let mut msgs = Vec::<Vec<u8>>::with_capacity(packets.len());
  for packet in packets {
    let mut msg = Vec::<u8>::with_capacity(MSG_LEN);
    match packet {
      Packet::V1(pkt) => {
        let io_channel = pkt.io_channel.ok_or(MessageFormatError::MissingIoChannel)?;
        msg.extend_from_slice(&header(MSG_TYPE_DATA, io_channel, version));
        msg.extend_from_slice(&pkt.bytes());
        msg.push(0); // pad the 7 byte word to 8
      }
      Packet::V2(pkt) => {
        let io_channel = pkt.io_channel.ok_or(MessageFormatError::MissingIoChannel)?;
        msg.extend_from_slice(&header(MSG_TYPE_DATA, io_channel, version));
        msg.extend_from_slice(&pkt.bytes());
      }
      Packet::Timestamp(pkt) => {
        msg.extend_from_slice(&header(MSG_TYPE_TIMESTAMP, 0, version));
        msg.extend_from_slice(&pkt.bytes());
      }
      other => {
        return Err(MessageFormatError::UnsupportedPacket(format!("{}", other)));
      }
    }
    msgs.push(msg);
  }
  Ok(msgs)
}

/// Unpack dataserver messages. `asic_version` selects how data
/// payloads are decoded, `io_group` is attached to every UART
/// packet. Heartbeats are dropped, a header with an unexpected
/// format version is only logged.
pub fn dataserver_message_decode(msgs         : &[Vec<u8>],
                                 asic_version : AsicVersion,
                                 io_group     : Option<u8>,
                                 version      : (u8, u8))
  -> Result<Vec<Packet>, MessageFormatError> {
  let mut packets = Vec::<Packet>::with_capacity(msgs.len());
  for msg in msgs {
    if msg.len() < HEADER_LEN {
      return Err(MessageFormatError::StreamTooShort);
    }
    if (msg[0], msg[1]) != version {
      warn!("dataserver message of version {}.{}, expected {}.{}",
            msg[0], msg[1], version.0, version.1);
    }
    let payload = &msg[HEADER_LEN..];
    match msg[2] {
      MSG_TYPE_DATA => {
        if payload.len() != 8 {
          return Err(MessageFormatError::StreamTooShort);
        }
        match asic_version {
          AsicVersion::V1 => {
            let mut pkt    = PacketV1::from_bytes(&payload[..7])?;
            pkt.io_channel = Some(msg[3]);
            pkt.io_group   = io_group;
            packets.push(Packet::V1(pkt));
          }
          _ => {
            let mut pkt    = PacketV2::from_bytes(payload)?;
            pkt.io_channel = Some(msg[3]);
            pkt.io_group   = io_group;
            packets.push(Packet::V2(pkt));
          }
        }
      }
      MSG_TYPE_TIMESTAMP => {
        if payload.len() != 8 {
          return Err(MessageFormatError::StreamTooShort);
        }
        packets.push(Packet::Timestamp(TimestampPacket::from_code(&payload[..7])?));
      }
      MSG_TYPE_HEARTBEAT => (),
      tag => {
        return Err(MessageFormatError::UnknownMsgType(tag));
      }
    }
  }
  Ok(packets)
}

#[cfg(test)]
mod test_dataserver {
  use super::*;

  #[test]
  fn v2_message_layout() {
    let mut pkt = PacketV2::new();
    pkt.set_chip_id(2);
    pkt.set_channel_id(5);
    pkt.set_timestamp(123456789);
    pkt.assign_parity();
    pkt.io_channel = Some(4);
    let msgs = dataserver_message_encode(&[Packet::V2(pkt)], DATASERVER_VERSION).unwrap();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].len(), MSG_LEN);
    assert_eq!(&msgs[0][..4], &[1, 0, b'D', 4]);
    assert_eq!(&msgs[0][8..], &pkt.bytes());
  }

  #[test]
  fn v2_roundtrip() {
    let mut pkt = PacketV2::new();
    pkt.set_chip_id(33);
    pkt.set_dataword(99);
    pkt.assign_parity();
    pkt.io_channel = Some(2);
    let msgs = dataserver_message_encode(&[Packet::V2(pkt)], DATASERVER_VERSION).unwrap();
    let back = dataserver_message_decode(&msgs, AsicVersion::V2,
                                         Some(1), DATASERVER_VERSION).unwrap();
    match &back[0] {
      Packet::V2(received) => {
        assert_eq!(received, &pkt);
        assert_eq!(received.io_channel, Some(2));
        assert_eq!(received.io_group, Some(1));
      }
      other => panic!("expected a v2 packet, got {}", other),
    }
  }

  #[test]
  fn v1_word_is_null_padded() {
    let mut pkt = PacketV1::new();
    pkt.set_chipid(100);
    pkt.assign_parity();
    pkt.io_channel = Some(1);
    let msgs = dataserver_message_encode(&[Packet::V1(pkt)], DATASERVER_VERSION).unwrap();
    assert_eq!(msgs[0].len(), MSG_LEN);
    assert_eq!(msgs[0][15], 0);
    let back = dataserver_message_decode(&msgs, AsicVersion::V1,
                                         None, DATASERVER_VERSION).unwrap();
    assert_eq!(back[0], Packet::V1(pkt));
  }

  #[test]
  fn timestamps_travel_as_their_own_messages() {
    let pkt  = TimestampPacket::new(987654321);
    let msgs = dataserver_message_encode(&[Packet::Timestamp(pkt)],
                                         DATASERVER_VERSION).unwrap();
    assert_eq!(msgs[0][2], b'T');
    let back = dataserver_message_decode(&msgs, AsicVersion::V2,
                                         None, DATASERVER_VERSION).unwrap();
    assert_eq!(back[0], Packet::Timestamp(pkt));
  }

  #[test]
  fn heartbeats_are_dropped() {
    let mut msg = vec![0u8; MSG_LEN];
    msg[0] = 1;
    msg[2] = b'H';
    let back = dataserver_message_decode(&[msg], AsicVersion::V2,
                                         None, DATASERVER_VERSION).unwrap();
    assert!(back.is_empty());
  }

  #[test]
  fn bad_messages_are_rejected() {
    let pkt = PacketV2::new();
    assert_eq!(dataserver_message_encode(&[Packet::V2(pkt)], DATASERVER_VERSION),
               Err(MessageFormatError::MissingIoChannel));
    let mut msg = vec![0u8; MSG_LEN];
    msg[2] = b'X';
    assert_eq!(dataserver_message_decode(&[msg], AsicVersion::V2,
                                         None, DATASERVER_VERSION),
               Err(MessageFormatError::UnknownMsgType(b'X')));
    assert_eq!(dataserver_message_decode(&[vec![0u8; 4]], AsicVersion::V2,
                                         None, DATASERVER_VERSION),
               Err(MessageFormatError::StreamTooShort));
  }
}
