//! Error types for the LArPix dataclasses
//!
//! Every concern gets its own enum. All errors propagate
//! synchronously to the caller, nothing is retried or
//! swallowed at this layer.

use std::fmt;

/// An integer does not fit the requested bit width
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BitfieldError {
  ValueTooWide { value : u64, width : usize },
}

impl fmt::Display for BitfieldError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      BitfieldError::ValueTooWide { value, width } => {
        write!(f, "<BitfieldError : value {} does not fit in {} bits>", value, width)
      }
    }
  }
}

/// A raw UART word has the wrong size for its generation
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PacketFormatError {
  WrongByteSize { expected : usize, got : usize },
}

impl fmt::Display for PacketFormatError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      PacketFormatError::WrongByteSize { expected, got } => {
        write!(f, "<PacketFormatError : expected {} bytes, got {}>", expected, got)
      }
    }
  }
}

/// A malformed chip key string
#[derive(Debug, Clone, PartialEq)]
pub enum KeyError {
  BadFormat(String),
}

impl fmt::Display for KeyError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      KeyError::BadFormat(key) => {
        write!(f, "<KeyError : '{}' is not of the form 'io_group-io_channel-chip_id'>", key)
      }
    }
  }
}

/// Register map / configuration failures.
///
/// Domain violations (`OutOfRange`, `WrongLength`, `WrongShape`)
/// leave the stored field value untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
  /// Field name absent from the generation's register map
  UnknownField(String),
  /// Register address beyond the generation's register space
  UnknownRegister(u8),
  /// Scalar (or list element) outside the declared min/max
  OutOfRange { field : String, value : u32, min : u32, max : u32 },
  /// List value with the wrong number of elements
  WrongLength { field : String, expected : usize, got : usize },
  /// Scalar value for a list field or vice versa
  WrongShape(String),
  /// Config file declares a different generation class
  VersionMismatch { expected : String, got : String },
  /// Config file is unreadable or structurally invalid
  BadConfigFile(String),
}

impl fmt::Display for ConfigurationError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ConfigurationError::UnknownField(name) => {
        write!(f, "<ConfigurationError : '{}' is not a known register>", name)
      }
      ConfigurationError::UnknownRegister(addr) => {
        write!(f, "<ConfigurationError : no register at address {}>", addr)
      }
      ConfigurationError::OutOfRange { field, value, min, max } => {
        write!(f, "<ConfigurationError : {} = {} out of bounds [{},{}]>", field, value, min, max)
      }
      ConfigurationError::WrongLength { field, expected, got } => {
        write!(f, "<ConfigurationError : {} takes {} values, got {}>", field, expected, got)
      }
      ConfigurationError::WrongShape(field) => {
        write!(f, "<ConfigurationError : wrong value shape for {}>", field)
      }
      ConfigurationError::VersionMismatch { expected, got } => {
        write!(f, "<ConfigurationError : configuration is of class {}, not {}>", got, expected)
      }
      ConfigurationError::BadConfigFile(reason) => {
        write!(f, "<ConfigurationError : bad configuration file - {}>", reason)
      }
    }
  }
}

/// Message framing failures (PACMAN and dataserver formats)
#[derive(Debug, Clone, PartialEq)]
pub enum MessageFormatError {
  StreamTooShort,
  /// Word region is not a multiple of the word size
  WrongWordSize,
  UnknownMsgType(u8),
  UnknownWordType(u8),
  /// Formatting a packet that has no io_channel assigned
  MissingIoChannel,
  /// Packet variant the format cannot carry
  UnsupportedPacket(String),
  PacketError(PacketFormatError),
}

impl fmt::Display for MessageFormatError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      MessageFormatError::StreamTooShort => {
        write!(f, "<MessageFormatError : stream too short>")
      }
      MessageFormatError::WrongWordSize => {
        write!(f, "<MessageFormatError : payload is not a whole number of words>")
      }
      MessageFormatError::UnknownMsgType(tag) => {
        write!(f, "<MessageFormatError : unknown message type {:#04x}>", tag)
      }
      MessageFormatError::UnknownWordType(tag) => {
        write!(f, "<MessageFormatError : unknown word type {:#04x}>", tag)
      }
      MessageFormatError::MissingIoChannel => {
        write!(f, "<MessageFormatError : all packets must have a declared io_channel>")
      }
      MessageFormatError::UnsupportedPacket(what) => {
        write!(f, "<MessageFormatError : can not frame {}>", what)
      }
      MessageFormatError::PacketError(err) => {
        write!(f, "<MessageFormatError : embedded packet invalid - {}>", err)
      }
    }
  }
}

impl From<PacketFormatError> for MessageFormatError {
  fn from(err : PacketFormatError) -> Self {
    MessageFormatError::PacketError(err)
  }
}
