//! Deserialization helpers for the framing layers
//!
//! Little-endian cursor based readers. The caller is responsible
//! for checking that the stream is long enough before parsing
//! a fixed size region with these.

pub fn parse_u8(bs : &Vec::<u8>, pos : &mut usize) -> u8 {
  let value = u8::from_le_bytes([bs[*pos]]);
  *pos += 1;
  value
}

pub fn parse_u16(bs : &Vec::<u8>, pos : &mut usize) -> u16 {
  let value = u16::from_le_bytes([bs[*pos], bs[*pos+1]]);
  *pos += 2;
  value
}

pub fn parse_u32(bs : &Vec::<u8>, pos : &mut usize) -> u32 {
  let value = u32::from_le_bytes([bs[*pos], bs[*pos+1], bs[*pos+2], bs[*pos+3]]);
  *pos += 4;
  value
}

pub fn parse_u64(bs : &Vec::<u8>, pos : &mut usize) -> u64 {
  let value = u64::from_le_bytes([bs[*pos],   bs[*pos+1], bs[*pos+2], bs[*pos+3],
                                  bs[*pos+4], bs[*pos+5], bs[*pos+6], bs[*pos+7]]);
  *pos += 8;
  value
}

#[cfg(test)]
mod test_serialization {
  use super::*;

  #[test]
  fn parse_helpers_advance_the_cursor() {
    let stream = vec![0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
    let mut pos = 0usize;
    assert_eq!(parse_u8(&stream, &mut pos), 0x01);
    assert_eq!(pos, 1);
    assert_eq!(parse_u16(&stream, &mut pos), 0x0302);
    assert_eq!(pos, 3);
    assert_eq!(parse_u32(&stream, &mut pos), 0x07060504);
    assert_eq!(pos, 7);
  }
}
