//! Conversions between unsigned integers and fixed width
//! bit sequences, plus bit level access to register images.
//!
//! The configuration register space of a chip is treated as one
//! continuous little-endian bit space: bit `i` lives in byte
//! `i / 8` at position `i % 8`, least significant bit first.
//! All register map operations go through `read_bits`/`write_bits`
//! so that fields sharing a register byte can never clobber
//! each other.

pub use crate::errors::BitfieldError;

/// Bit order of a bit sequence.
///
/// `Big` puts the most significant bit first,
/// `Little` the least significant bit first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Endian {
  Big,
  Little,
}

/// Encode a non-negative integer into exactly `width` bits.
pub fn from_uint(value : u64, width : usize, endian : Endian) -> Result<Vec<bool>, BitfieldError> {
  if width < 64 && value >> width != 0 {
    return Err(BitfieldError::ValueTooWide { value, width });
  }
  let mut bits = Vec::<bool>::with_capacity(width);
  for k in 0..width {
    let shift = match endian {
      Endian::Big    => width - 1 - k,
      Endian::Little => k,
    };
    bits.push((value >> shift) & 1 == 1);
  }
  Ok(bits)
}

/// Decode a bit sequence back into an unsigned integer.
pub fn to_uint(bits : &[bool], endian : Endian) -> u64 {
  let mut value = 0u64;
  for (k, bit) in bits.iter().enumerate() {
    if !bit {
      continue;
    }
    let shift = match endian {
      Endian::Big    => bits.len() - 1 - k,
      Endian::Little => k,
    };
    value |= 1 << shift;
  }
  value
}

/// Read `width` bits starting at absolute bit `start` from a
/// register image, little-endian bit order. `width` <= 64.
pub fn read_bits(image : &[u8], start : usize, width : usize) -> u64 {
  let mut value = 0u64;
  for k in 0..width {
    let bit = start + k;
    if image[bit / 8] >> (bit % 8) & 1 == 1 {
      value |= 1 << k;
    }
  }
  value
}

/// Write the low `width` bits of `value` into a register image
/// starting at absolute bit `start`. Bits outside the range are
/// untouched.
pub fn write_bits(image : &mut [u8], start : usize, width : usize, value : u64) {
  for k in 0..width {
    let bit  = start + k;
    let mask = 1u8 << (bit % 8);
    if value >> k & 1 == 1 {
      image[bit / 8] |= mask;
    } else {
      image[bit / 8] &= !mask;
    }
  }
}

#[cfg(test)]
mod test_bitfield {
  use super::*;

  #[test]
  fn uint_roundtrip_both_endians() {
    for &width in [1usize, 2, 4, 8, 16, 24, 32].iter() {
      // exhaustive for narrow fields, corners + a stride for wide ones
      let values : Vec<u64>;
      if width <= 8 {
        values = (0..1u64 << width).collect();
      } else {
        let max = (1u64 << width) - 1;
        values = vec![0, 1, max / 3, max / 2, max - 1, max];
      }
      for &value in values.iter() {
        for &endian in [Endian::Big, Endian::Little].iter() {
          let bits = from_uint(value, width, endian).unwrap();
          assert_eq!(bits.len(), width);
          assert_eq!(to_uint(&bits, endian), value);
        }
      }
    }
  }

  #[test]
  fn from_uint_rejects_wide_values() {
    assert!(from_uint(2, 1, Endian::Big).is_err());
    assert!(from_uint(256, 8, Endian::Little).is_err());
    assert_eq!(from_uint(256, 8, Endian::Little),
               Err(BitfieldError::ValueTooWide { value : 256, width : 8 }));
    assert!(from_uint(255, 8, Endian::Little).is_ok());
  }

  #[test]
  fn endianness_is_mirrored() {
    let big    = from_uint(0b110, 3, Endian::Big).unwrap();
    let little = from_uint(0b110, 3, Endian::Little).unwrap();
    assert_eq!(big,    vec![true, true, false]);
    assert_eq!(little, vec![false, true, true]);
  }

  #[test]
  fn image_bits_are_lsb_first() {
    let mut image = vec![0u8; 4];
    write_bits(&mut image, 0, 3, 0b111);
    assert_eq!(image[0], 0x07);
    write_bits(&mut image, 8, 8, 0xa5);
    assert_eq!(image[1], 0xa5);
    assert_eq!(read_bits(&image, 8, 8), 0xa5);
    // crossing a byte boundary
    write_bits(&mut image, 20, 8, 0xff);
    assert_eq!(read_bits(&image, 20, 8), 0xff);
    assert_eq!(image[2], 0xf0);
    assert_eq!(image[3], 0x0f);
  }

  #[test]
  fn write_bits_preserves_neighbours() {
    let mut image = vec![0xffu8; 2];
    write_bits(&mut image, 4, 4, 0);
    assert_eq!(image[0], 0x0f);
    assert_eq!(image[1], 0xff);
  }
}
