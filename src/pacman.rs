//! The PACMAN ZMQ message format
//!
//! PACMAN readout boards exchange fixed layout binary messages:
//! an 8 byte header (message type, 32 bit unix timestamp, word
//! count) followed by any number of 16 byte words. Word tags are
//! context sensitive: the tag `D` means a received data word
//! inside a DATA message but a transmit request inside REQUEST
//! and REPLY messages, and `P` is a ping or a pong depending on
//! the direction.
//!
//! `format` and `parse` translate between packet lists and
//! messages. A DATA message carries its header timestamp as a
//! leading `TimestampPacket` on the packet side.

use std::fmt;

use chrono::Utc;

use crate::errors::MessageFormatError;
use crate::packets::{Packet, PacketV2, SyncPacket, TimestampPacket, TriggerPacket};
use crate::serialization::{parse_u16, parse_u32, parse_u8};

pub const HEADER_LEN : usize = 8;
pub const WORD_LEN   : usize = 16;

const WORD_TYPE_DATA  : u8 = b'D';
const WORD_TYPE_TRIG  : u8 = b'T';
const WORD_TYPE_SYNC  : u8 = b'S';
const WORD_TYPE_PING  : u8 = b'P';
const WORD_TYPE_WRITE : u8 = b'W';
const WORD_TYPE_READ  : u8 = b'R';
const WORD_TYPE_ERR   : u8 = b'E';

/// Direction and role of a PACMAN message
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MsgType {
  /// Readout stream, board to client
  Data,
  /// Client to board
  Request,
  /// Board to client, answering a request
  Reply,
}

impl MsgType {

  pub fn to_u8(&self) -> u8 {
    match self {
      MsgType::Data    => b'D',
      MsgType::Request => b'?',
      MsgType::Reply   => b'!',
    }
  }

  pub fn from_u8(value : u8) -> Option<MsgType> {
    match value {
      b'D' => Some(MsgType::Data),
      b'?' => Some(MsgType::Request),
      b'!' => Some(MsgType::Reply),
      _    => None,
    }
  }
}

impl fmt::Display for MsgType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr : &str;
    match self {
      MsgType::Data    => {repr = "DATA";}
      MsgType::Request => {repr = "REQUEST";}
      MsgType::Reply   => {repr = "REPLY";}
    }
    write!(f, "{}", repr)
  }
}

/// One 16 byte word of a PACMAN message
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PacmanWord {
  /// A UART word received by the board, with receipt timestamp
  Data  { io_channel : u8, timestamp : u32, packet : [u8; 8] },
  /// A UART word to transmit
  Tx    { io_channel : u8, packet : [u8; 8] },
  /// Trigger type is a 16-bit field on the wire
  Trig  { trigger_type : u16, timestamp : u32 },
  Sync  { sync_type : u8, clk_source : u8, timestamp : u32 },
  Ping,
  Pong,
  /// Write a PACMAN board register (not a chip register)
  Write { register : u32, value : u32 },
  Read  { register : u32, value : u32 },
  Err   { err_type : u8, payload : [u8; 14] },
}

impl PacmanWord {

  pub fn to_bytes(&self) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    match self {
      PacmanWord::Data { io_channel, timestamp, packet } => {
        word[0] = WORD_TYPE_DATA;
        word[1] = *io_channel;
        word[4..8].copy_from_slice(&timestamp.to_le_bytes());
        word[8..16].copy_from_slice(packet);
      }
      PacmanWord::Tx { io_channel, packet } => {
        word[0] = WORD_TYPE_DATA;
        word[1] = *io_channel;
        word[8..16].copy_from_slice(packet);
      }
      PacmanWord::Trig { trigger_type, timestamp } => {
        word[0] = WORD_TYPE_TRIG;
        word[1..3].copy_from_slice(&trigger_type.to_le_bytes());
        word[4..8].copy_from_slice(&timestamp.to_le_bytes());
      }
      PacmanWord::Sync { sync_type, clk_source, timestamp } => {
        word[0] = WORD_TYPE_SYNC;
        word[1] = *sync_type;
        word[2] = *clk_source;
        word[4..8].copy_from_slice(&timestamp.to_le_bytes());
      }
      PacmanWord::Ping | PacmanWord::Pong => {
        word[0] = WORD_TYPE_PING;
      }
      PacmanWord::Write { register, value } => {
        word[0] = WORD_TYPE_WRITE;
        word[4..8].copy_from_slice(&register.to_le_bytes());
        word[12..16].copy_from_slice(&value.to_le_bytes());
      }
      PacmanWord::Read { register, value } => {
        word[0] = WORD_TYPE_READ;
        word[4..8].copy_from_slice(&register.to_le_bytes());
        word[12..16].copy_from_slice(&value.to_le_bytes());
      }
      PacmanWord::Err { err_type, payload } => {
        word[0] = WORD_TYPE_ERR;
        word[1] = *err_type;
        word[2..16].copy_from_slice(payload);
      }
    }
    word
  }

  /// Decode one word. The message type resolves the context
  /// sensitive tags.
  pub fn from_bytes(word     : &[u8; WORD_LEN],
                    msg_type : MsgType) -> Result<PacmanWord, MessageFormatError> {
    let mut packet = [0u8; 8];
    match word[0] {
      WORD_TYPE_DATA => {
        packet.copy_from_slice(&word[8..16]);
        match msg_type {
          MsgType::Data => {
            let mut timestamp = [0u8; 4];
            timestamp.copy_from_slice(&word[4..8]);
            Ok(PacmanWord::Data { io_channel : word[1],
                                  timestamp  : u32::from_le_bytes(timestamp),
                                  packet })
          }
          _ => Ok(PacmanWord::Tx { io_channel : word[1], packet }),
        }
      }
      WORD_TYPE_TRIG => {
        let mut timestamp = [0u8; 4];
        timestamp.copy_from_slice(&word[4..8]);
        Ok(PacmanWord::Trig { trigger_type : u16::from_le_bytes([word[1], word[2]]),
                              timestamp    : u32::from_le_bytes(timestamp) })
      }
      WORD_TYPE_SYNC => {
        let mut timestamp = [0u8; 4];
        timestamp.copy_from_slice(&word[4..8]);
        Ok(PacmanWord::Sync { sync_type  : word[1],
                              clk_source : word[2],
                              timestamp  : u32::from_le_bytes(timestamp) })
      }
      WORD_TYPE_PING => {
        match msg_type {
          MsgType::Request => Ok(PacmanWord::Ping),
          MsgType::Reply   => Ok(PacmanWord::Pong),
          MsgType::Data    => Err(MessageFormatError::UnknownWordType(word[0])),
        }
      }
      WORD_TYPE_WRITE | WORD_TYPE_READ => {
        let mut register = [0u8; 4];
        let mut value    = [0u8; 4];
        register.copy_from_slice(&word[4..8]);
        value.copy_from_slice(&word[12..16]);
        let register = u32::from_le_bytes(register);
        let value    = u32::from_le_bytes(value);
        if word[0] == WORD_TYPE_WRITE {
          Ok(PacmanWord::Write { register, value })
        } else {
          Ok(PacmanWord::Read { register, value })
        }
      }
      WORD_TYPE_ERR => {
        let mut payload = [0u8; 14];
        payload.copy_from_slice(&word[2..16]);
        Ok(PacmanWord::Err { err_type : word[1], payload })
      }
      tag => Err(MessageFormatError::UnknownWordType(tag)),
    }
  }
}

/// A complete PACMAN message, header plus words
#[derive(Debug, Clone, PartialEq)]
pub struct PacmanMsg {
  pub msg_type  : MsgType,
  /// Unix timestamp of the header, seconds
  pub timestamp : u32,
  pub words     : Vec<PacmanWord>,
}

impl PacmanMsg {

  pub fn to_bytes(&self) -> Vec<u8> {
    let mut stream = Vec::<u8>::with_capacity(HEADER_LEN + self.words.len() * WORD_LEN);
    stream.push(self.msg_type.to_u8());
    stream.extend_from_slice(&self.timestamp.to_le_bytes());
    stream.push(0);
    stream.extend_from_slice(&(self.words.len() as u16).to_le_bytes());
    for word in self.words.iter() {
      stream.extend_from_slice(&word.to_bytes());
    }
    stream
  }

  pub fn from_bytes(stream : &Vec<u8>) -> Result<PacmanMsg, MessageFormatError> {
    if stream.len() < HEADER_LEN {
      return Err(MessageFormatError::StreamTooShort);
    }
    let mut pos = 0usize;
    let tag       = parse_u8(stream, &mut pos);
    let msg_type  = MsgType::from_u8(tag)
      .ok_or(MessageFormatError::UnknownMsgType(tag))?;
    let timestamp = parse_u32(stream, &mut pos);
    pos += 1; // pad byte
    let count     = parse_u16(stream, &mut pos) as usize;
    let payload   = stream.len() - HEADER_LEN;
    if payload % WORD_LEN != 0 {
      return Err(MessageFormatError::WrongWordSize);
    }
    if payload / WORD_LEN != count {
      return Err(MessageFormatError::StreamTooShort);
    }
    let mut words = Vec::<PacmanWord>::with_capacity(count);
    for _ in 0..count {
      let mut word = [0u8; WORD_LEN];
      word.copy_from_slice(&stream[pos..pos + WORD_LEN]);
      words.push(PacmanWord::from_bytes(&word, msg_type)?);
      pos += WORD_LEN;
    }
    Ok(PacmanMsg { msg_type, timestamp, words })
  }
}

impl fmt::Display for PacmanMsg {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<PacmanMsg");
    repr += &(format!(" {}", self.msg_type));
    repr += &(format!(" | timestamp: {}", self.timestamp));
    repr += &(format!(" | {} words", self.words.len()));
    write!(f, "{}>", repr)
  }
}

/// Frame a packet list into one message.
///
/// A leading (or any) `TimestampPacket` supplies the header
/// timestamp instead of becoming a word; without one the header
/// gets the current unix time. Generation 2 packets need their
/// `io_channel` set. Generation 1 packets predate PACMAN and can
/// not be framed.
pub fn format(packets : &[Packet], msg_type : MsgType) -> Result<PacmanMsg, MessageFormatError> {
  let mut timestamp = Utc::now().timestamp() as u32;
  let mut words     = Vec::<PacmanWord>::new();
  for packet in packets {
    match packet {
      Packet::Timestamp(pkt) => {
        timestamp = pkt.timestamp as u32;
      }
      Packet::V2(pkt) => {
        let io_channel = pkt.io_channel.ok_or(MessageFormatError::MissingIoChannel)?;
        let word = match msg_type {
          MsgType::Data => PacmanWord::Data { io_channel,
                                              timestamp : 0,
                                              packet    : pkt.bytes() },
          _             => PacmanWord::Tx   { io_channel,
                                              packet    : pkt.bytes() },
        };
        words.push(word);
      }
      Packet::Sync(pkt) => {
        words.push(PacmanWord::Sync { sync_type  : pkt.sync_type,
                                      clk_source : pkt.clk_source.unwrap_or(0),
                                      timestamp  : pkt.timestamp.unwrap_or(0) });
      }
      Packet::Trigger(pkt) => {
        words.push(PacmanWord::Trig { trigger_type : pkt.trigger_type as u16,
                                      timestamp    : pkt.timestamp.unwrap_or(0) });
      }
      Packet::V1(_) => {
        return Err(MessageFormatError::UnsupportedPacket(
          String::from("a generation 1 packet")));
      }
    }
  }
  Ok(PacmanMsg { msg_type, timestamp, words })
}

/// Unpack a message into packets.
///
/// A DATA message re-emits its header timestamp as a leading
/// `TimestampPacket`. UART words become `PacketV2` with the
/// word's `io_channel` and the given `io_group`; control words
/// (ping, board register access, errors) carry no packet payload
/// and are skipped.
pub fn parse(msg : &PacmanMsg, io_group : Option<u8>) -> Result<Vec<Packet>, MessageFormatError> {
  let mut packets = Vec::<Packet>::with_capacity(msg.words.len() + 1);
  if msg.msg_type == MsgType::Data {
    packets.push(Packet::Timestamp(TimestampPacket::new(msg.timestamp as u64)));
  }
  for word in msg.words.iter() {
    match word {
      PacmanWord::Data { io_channel, packet, .. }
      | PacmanWord::Tx { io_channel, packet } => {
        let mut pkt    = PacketV2::from_bytes(packet)?;
        pkt.io_channel = Some(*io_channel);
        pkt.io_group   = io_group;
        packets.push(Packet::V2(pkt));
      }
      PacmanWord::Trig { trigger_type, timestamp } => {
        let mut pkt   = TriggerPacket::new(*trigger_type as u8);
        pkt.timestamp = Some(*timestamp);
        pkt.io_group  = io_group;
        packets.push(Packet::Trigger(pkt));
      }
      PacmanWord::Sync { sync_type, clk_source, timestamp } => {
        let mut pkt    = SyncPacket::new(*sync_type);
        pkt.clk_source = Some(*clk_source);
        pkt.timestamp  = Some(*timestamp);
        pkt.io_group   = io_group;
        packets.push(Packet::Sync(pkt));
      }
      _ => (), // control traffic, no packet representation
    }
  }
  Ok(packets)
}

#[cfg(test)]
mod test_pacman {
  use super::*;
  use crate::packets::sync::SYNC_TYPE_SYNC;

  fn data_packet(channel : u8, timestamp : u32) -> PacketV2 {
    let mut pkt = PacketV2::new();
    pkt.set_chip_id(21);
    pkt.set_channel_id(channel % 64);
    pkt.set_timestamp(timestamp);
    pkt.set_dataword(channel.wrapping_mul(3));
    pkt.assign_parity();
    pkt.io_channel = Some(1);
    pkt
  }

  #[test]
  fn header_framing() {
    let msg = PacmanMsg {
      msg_type  : MsgType::Data,
      timestamp : 0x01020304,
      words     : vec![PacmanWord::Trig { trigger_type : 1, timestamp : 7 }],
    };
    let stream = msg.to_bytes();
    assert_eq!(stream.len(), HEADER_LEN + WORD_LEN);
    assert_eq!(stream[0], b'D');
    assert_eq!(&stream[1..5], &[0x04, 0x03, 0x02, 0x01]);
    assert_eq!(stream[5], 0);
    assert_eq!(&stream[6..8], &[1, 0]);
    assert_eq!(PacmanMsg::from_bytes(&stream).unwrap(), msg);
  }

  #[test]
  fn word_roundtrips() {
    let words = [
      (PacmanWord::Data { io_channel : 2, timestamp : 77, packet : [1; 8] }, MsgType::Data),
      (PacmanWord::Tx { io_channel : 3, packet : [2; 8] }, MsgType::Request),
      (PacmanWord::Trig { trigger_type : 0x1b42, timestamp : 12345 }, MsgType::Data),
      (PacmanWord::Sync { sync_type : SYNC_TYPE_SYNC, clk_source : 1, timestamp : 9 },
       MsgType::Data),
      (PacmanWord::Ping, MsgType::Request),
      (PacmanWord::Pong, MsgType::Reply),
      (PacmanWord::Write { register : 0xdead, value : 0xbeef }, MsgType::Request),
      (PacmanWord::Read { register : 16, value : 0 }, MsgType::Request),
      (PacmanWord::Err { err_type : b'!', payload : [7; 14] }, MsgType::Reply),
    ];
    for (word, msg_type) in words.iter() {
      let back = PacmanWord::from_bytes(&word.to_bytes(), *msg_type).unwrap();
      assert_eq!(back, *word, "{:?} did not survive the wire", word);
    }
    // the 16-bit trigger type sits at bytes 1..3, little endian
    let trig = PacmanWord::Trig { trigger_type : 0x1b42, timestamp : 12345 };
    assert_eq!(&trig.to_bytes()[1..3], &[0x42, 0x1b]);
  }

  #[test]
  fn tag_d_is_resolved_by_message_type() {
    let word = PacmanWord::Tx { io_channel : 4, packet : [9; 8] };
    match PacmanWord::from_bytes(&word.to_bytes(), MsgType::Data).unwrap() {
      PacmanWord::Data { io_channel, packet, .. } => {
        assert_eq!(io_channel, 4);
        assert_eq!(packet, [9; 8]);
      }
      other => panic!("expected a data word, got {:?}", other),
    }
  }

  #[test]
  fn data_stream_roundtrip() {
    let mut packets = vec![Packet::Timestamp(TimestampPacket::new(1234))];
    for k in 0..100u8 {
      packets.push(Packet::V2(data_packet(k, 5000 + k as u32)));
    }
    let mut sync   = SyncPacket::new(SYNC_TYPE_SYNC);
    sync.timestamp = Some(42);
    packets.push(Packet::Sync(sync));
    let mut trig   = TriggerPacket::new(b'B');
    trig.timestamp = Some(43);
    packets.push(Packet::Trigger(trig));

    let msg = format(&packets, MsgType::Data).unwrap();
    assert_eq!(msg.timestamp, 1234);
    assert_eq!(msg.words.len(), 102);
    let wire = msg.to_bytes();
    assert_eq!(wire.len(), HEADER_LEN + 102 * WORD_LEN);
    let back = parse(&PacmanMsg::from_bytes(&wire).unwrap(), Some(3)).unwrap();
    assert_eq!(back.len(), packets.len());
    assert_eq!(back[0], Packet::Timestamp(TimestampPacket::new(1234)));
    for k in 0..100usize {
      match (&packets[k + 1], &back[k + 1]) {
        (Packet::V2(sent), Packet::V2(received)) => {
          assert_eq!(received, sent);
          assert_eq!(received.io_channel, Some(1));
          assert_eq!(received.io_group, Some(3));
        }
        _ => panic!("packet {} changed kind", k),
      }
    }
    match &back[101] {
      Packet::Sync(pkt) => {
        assert_eq!(pkt.sync_type, SYNC_TYPE_SYNC);
        assert_eq!(pkt.timestamp, Some(42));
        assert_eq!(pkt.io_group, Some(3));
      }
      other => panic!("expected a sync packet, got {}", other),
    }
    match &back[102] {
      Packet::Trigger(pkt) => {
        assert_eq!(pkt.trigger_type, b'B');
        assert_eq!(pkt.timestamp, Some(43));
      }
      other => panic!("expected a trigger packet, got {}", other),
    }
  }

  #[test]
  fn request_frames_tx_words() {
    let mut pkt = data_packet(0, 0);
    pkt.io_channel = Some(2);
    let msg = format(&[Packet::V2(pkt)], MsgType::Request).unwrap();
    assert_eq!(msg.words, vec![PacmanWord::Tx { io_channel : 2, packet : pkt.bytes() }]);
  }

  #[test]
  fn format_rejects_unroutable_packets() {
    let mut pkt    = data_packet(0, 0);
    pkt.io_channel = None;
    assert_eq!(format(&[Packet::V2(pkt)], MsgType::Data),
               Err(MessageFormatError::MissingIoChannel));
    let v1 = crate::packets::PacketV1::new();
    assert!(matches!(format(&[Packet::V1(v1)], MsgType::Data),
                     Err(MessageFormatError::UnsupportedPacket(_))));
  }

  #[test]
  fn malformed_streams_are_rejected() {
    assert_eq!(PacmanMsg::from_bytes(&vec![b'D', 0, 0]),
               Err(MessageFormatError::StreamTooShort));
    assert_eq!(PacmanMsg::from_bytes(&vec![b'X', 0, 0, 0, 0, 0, 0, 0]),
               Err(MessageFormatError::UnknownMsgType(b'X')));
    // word region not a whole number of words
    let mut stream = PacmanMsg { msg_type  : MsgType::Data,
                                 timestamp : 0,
                                 words     : vec![PacmanWord::Ping] }.to_bytes();
    stream.truncate(HEADER_LEN + 3);
    assert_eq!(PacmanMsg::from_bytes(&stream), Err(MessageFormatError::WrongWordSize));
    // fewer words than the header promises
    stream.truncate(HEADER_LEN);
    assert_eq!(PacmanMsg::from_bytes(&stream), Err(MessageFormatError::StreamTooShort));
  }
}
