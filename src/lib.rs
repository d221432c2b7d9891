//! LArPix dataclasses
//!
//! Data structures for the LArPix readout chain: the bit packed
//! UART words of all ASIC generations, the register map driven
//! configuration engine, the software chip model and the two
//! wire formats the readout hardware speaks (PACMAN messages and
//! the legacy dataserver format).
//!
//! The crate only moves and reshapes bytes, it opens no sockets
//! and owns no hardware.

#[macro_use] extern crate log;

pub mod bitfield;
pub mod chip;
pub mod configuration;
pub mod dataserver;
pub mod errors;
pub mod key;
pub mod packets;
pub mod pacman;
pub mod serialization;

#[cfg(feature = "random")]
pub trait FromRandom {
  fn from_random() -> Self;
}
