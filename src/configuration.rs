//! ASIC configuration registers
//!
//! A `Configuration` is the software image of the configuration
//! register space of one chip. Fields are addressed by name
//! through the generation's shared [`RegisterMap`]; the image
//! itself is a plain byte vector, one byte per physical
//! register, so that the raw register view and the named field
//! view can never disagree.
//!
//! Fresh instances come up with the power-on defaults of their
//! generation, loaded from the JSON tables embedded at compile
//! time under `configs/chip/`.

mod lightpix_v1;
pub mod registermap;
mod v1;
mod v2;
mod v2b;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

pub use registermap::{registermap, AsicVersion, FieldShape, FieldSpec, RegisterMap};

use serde::{Deserialize, Serialize};

use crate::bitfield::{read_bits, write_bits};
use crate::errors::ConfigurationError;

cfg_if::cfg_if! {
  if #[cfg(feature = "random")]  {
    use crate::FromRandom;
    extern crate rand;
    use rand::Rng;
  }
}

/// Below this many differing list elements, `compare` reports a
/// sparse per-element diff instead of both full lists
pub const SPARSE_DIFF_THRESHOLD : usize = 5;

/// The value of one named configuration field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
  Scalar(u32),
  List(Vec<u8>),
}

/// One differing element of a list field
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDiff {
  pub index : usize,
  pub value : u8,
  pub other : u8,
}

/// Difference of one field between two configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldDiff {
  Scalar { value : u32, other : u32 },
  List   { value : Vec<u8>, other : Vec<u8> },
  Sparse ( Vec<ElementDiff> ),
}

const DEFAULT_V1_JSON          : &str = include_str!("../configs/chip/default_v1.json");
const DEFAULT_V2_JSON          : &str = include_str!("../configs/chip/default_v2.json");
const DEFAULT_V2B_JSON         : &str = include_str!("../configs/chip/default_v2b.json");
const DEFAULT_LIGHTPIX_V1_JSON : &str = include_str!("../configs/chip/default_lightpix_v1.json");

/// Power-on register image of a generation, decoded once per
/// process from the embedded default table. The table has to
/// name every field of the map exactly once, anything else is a
/// packaging error and aborts.
fn default_image(version : AsicVersion) -> &'static [u8] {
  static IMAGES : OnceLock<BTreeMap<&'static str, Vec<u8>>> = OnceLock::new();
  let images = IMAGES.get_or_init(|| {
    let mut images = BTreeMap::new();
    for (text, version) in [(DEFAULT_V1_JSON,          AsicVersion::V1),
                            (DEFAULT_V2_JSON,          AsicVersion::V2),
                            (DEFAULT_V2B_JSON,         AsicVersion::V2b),
                            (DEFAULT_LIGHTPIX_V1_JSON, AsicVersion::LightpixV1)] {
      match build_default_image(version, text) {
        Ok(image) => {
          images.insert(version.config_class(), image);
        }
        Err(err) => {
          panic!("embedded default table for {} is broken : {}", version, err);
        }
      }
    }
    images
  });
  &images[version.config_class()]
}

fn build_default_image(version : AsicVersion,
                       text    : &str) -> Result<Vec<u8>, ConfigurationError> {
  let map = registermap(version);
  let document : serde_json::Value = serde_json::from_str(text)
    .map_err(|err| ConfigurationError::BadConfigFile(err.to_string()))?;
  check_class(version, &document)?;
  let values = register_values(&document)?;
  if values.len() != map.fields.len() {
    return Err(ConfigurationError::BadConfigFile(
      format!("default table names {} of {} fields", values.len(), map.fields.len())));
  }
  let mut image = vec![0u8; map.num_registers];
  apply_register_values(map, &mut image, values)?;
  Ok(image)
}

/// The class tag of a configuration document has to match the
/// generation it is decoded as
fn check_class(version  : AsicVersion,
               document : &serde_json::Value) -> Result<(), ConfigurationError> {
  let class = document.get("class")
    .and_then(|class| class.as_str())
    .ok_or_else(|| ConfigurationError::BadConfigFile(String::from("no class tag")))?;
  if class != version.config_class() {
    return Err(ConfigurationError::VersionMismatch {
      expected : version.config_class().to_string(),
      got      : class.to_string() });
  }
  Ok(())
}

fn register_values(document : &serde_json::Value)
  -> Result<&serde_json::Map<String, serde_json::Value>, ConfigurationError> {
  document.get("register_values")
          .and_then(|values| values.as_object())
          .ok_or_else(|| ConfigurationError::BadConfigFile(
            String::from("no register_values object")))
}

/// Write a JSON field table into a register image. Unknown
/// fields and malformed or out-of-range values are errors,
/// fields the table does not mention keep their image bits.
fn apply_register_values(map    : &'static RegisterMap,
                         image  : &mut [u8],
                         values : &serde_json::Map<String, serde_json::Value>)
  -> Result<(), ConfigurationError> {
  for (name, value) in values {
    let field = map.field(name)
      .ok_or_else(|| ConfigurationError::UnknownField(name.clone()))?;
    match field.shape {
      FieldShape::Scalar { .. } => {
        let scalar = value.as_u64()
          .ok_or_else(|| ConfigurationError::BadConfigFile(
            format!("{} is not an unsigned integer", name)))?;
        if scalar > u32::MAX as u64 {
          return Err(ConfigurationError::BadConfigFile(
            format!("{} does not fit 32 bits", name)));
        }
        write_field_scalar(field, image, scalar as u32)?;
      }
      FieldShape::List { .. } => {
        let elements = value.as_array()
          .ok_or_else(|| ConfigurationError::BadConfigFile(
            format!("{} is not an array", name)))?;
        let mut list = Vec::<u8>::with_capacity(elements.len());
        for element in elements {
          let element = element.as_u64().filter(|&el| el < 256)
            .ok_or_else(|| ConfigurationError::BadConfigFile(
              format!("{} holds a value that is not a byte", name)))?;
          list.push(element as u8);
        }
        write_field_list(field, image, &list)?;
      }
    }
  }
  Ok(())
}

fn write_field_scalar(field : &FieldSpec,
                      image : &mut [u8],
                      value : u32) -> Result<(), ConfigurationError> {
  match field.shape {
    FieldShape::Scalar { min, max } => {
      if value < min || value > max {
        return Err(ConfigurationError::OutOfRange {
          field : field.name.to_string(), value, min, max });
      }
      write_bits(image, field.bits.0, field.bits.1 - field.bits.0, value as u64);
      Ok(())
    }
    FieldShape::List { .. } => {
      Err(ConfigurationError::WrongShape(field.name.to_string()))
    }
  }
}

fn write_field_list(field  : &FieldSpec,
                    image  : &mut [u8],
                    values : &[u8]) -> Result<(), ConfigurationError> {
  match field.shape {
    FieldShape::List { len, width, min, max } => {
      if values.len() != len {
        return Err(ConfigurationError::WrongLength {
          field : field.name.to_string(), expected : len, got : values.len() });
      }
      // validate everything before touching the image
      for &value in values {
        if value < min || value > max {
          return Err(ConfigurationError::OutOfRange {
            field : field.name.to_string(),
            value : value as u32, min : min as u32, max : max as u32 });
        }
      }
      for (k, &value) in values.iter().enumerate() {
        write_bits(image, field.bits.0 + k * width, width, value as u64);
      }
      Ok(())
    }
    FieldShape::Scalar { .. } => {
      Err(ConfigurationError::WrongShape(field.name.to_string()))
    }
  }
}

fn read_field_scalar(field : &FieldSpec, image : &[u8]) -> u32 {
  read_bits(image, field.bits.0, field.bits.1 - field.bits.0) as u32
}

fn read_field_list(field : &FieldSpec, image : &[u8]) -> Vec<u8> {
  match field.shape {
    FieldShape::List { len, width, .. } => {
      (0..len).map(|k| read_bits(image, field.bits.0 + k * width, width) as u8)
              .collect()
    }
    FieldShape::Scalar { .. } => Vec::new(),
  }
}

/// The configuration register image of one chip
#[derive(Debug, Clone)]
pub struct Configuration {
  map   : &'static RegisterMap,
  image : Vec<u8>,
}

impl Configuration {

  /// A configuration holding the power-on defaults of the given
  /// generation
  pub fn new(version : AsicVersion) -> Self {
    Self {
      map   : registermap(version),
      image : default_image(version).to_vec(),
    }
  }

  pub fn version(&self) -> AsicVersion {
    self.map.version
  }

  pub fn map(&self) -> &'static RegisterMap {
    self.map
  }

  /// Value of a named field
  pub fn get(&self, name : &str) -> Result<FieldValue, ConfigurationError> {
    let field = self.map.field(name)
      .ok_or_else(|| ConfigurationError::UnknownField(name.to_string()))?;
    match field.shape {
      FieldShape::Scalar { .. } => Ok(FieldValue::Scalar(read_field_scalar(field, &self.image))),
      FieldShape::List   { .. } => Ok(FieldValue::List(read_field_list(field, &self.image))),
    }
  }

  pub fn set(&mut self, name : &str, value : FieldValue) -> Result<(), ConfigurationError> {
    match value {
      FieldValue::Scalar(scalar) => self.set_scalar(name, scalar),
      FieldValue::List(list)     => self.set_list(name, &list),
    }
  }

  /// Set a scalar field. Siblings sharing the register bytes
  /// keep their bits.
  pub fn set_scalar(&mut self, name : &str, value : u32) -> Result<(), ConfigurationError> {
    let field = self.map.field(name)
      .ok_or_else(|| ConfigurationError::UnknownField(name.to_string()))?;
    write_field_scalar(field, &mut self.image, value)
  }

  /// Set all elements of a list field at once
  pub fn set_list(&mut self, name : &str, values : &[u8]) -> Result<(), ConfigurationError> {
    let field = self.map.field(name)
      .ok_or_else(|| ConfigurationError::UnknownField(name.to_string()))?;
    write_field_list(field, &mut self.image, values)
  }

  /// Set one element of a list field
  pub fn set_element(&mut self,
                     name  : &str,
                     index : usize,
                     value : u8) -> Result<(), ConfigurationError> {
    let field = self.map.field(name)
      .ok_or_else(|| ConfigurationError::UnknownField(name.to_string()))?;
    match field.shape {
      FieldShape::List { len, width, min, max } => {
        if index >= len {
          return Err(ConfigurationError::WrongLength {
            field : name.to_string(), expected : len, got : index + 1 });
        }
        if value < min || value > max {
          return Err(ConfigurationError::OutOfRange {
            field : name.to_string(),
            value : value as u32, min : min as u32, max : max as u32 });
        }
        write_bits(&mut self.image, field.bits.0 + index * width, width, value as u64);
        Ok(())
      }
      FieldShape::Scalar { .. } => {
        Err(ConfigurationError::WrongShape(name.to_string()))
      }
    }
  }

  /// Byte value of the physical register at `address`
  pub fn register(&self, address : u8) -> Result<u8, ConfigurationError> {
    if address as usize >= self.map.num_registers {
      return Err(ConfigurationError::UnknownRegister(address));
    }
    Ok(self.image[address as usize])
  }

  /// The whole image as `(address, value)` pairs, the form the
  /// configuration write packets take
  pub fn all_data(&self) -> Vec<(u8, u8)> {
    self.image.iter().enumerate()
        .map(|(address, &value)| (address as u8, value))
        .collect()
  }

  /// Overwrite registers from `(address, value)` pairs, e.g.
  /// collected configuration read packets. Bits of a register
  /// byte not claimed by any field are ignored. The image is
  /// untouched if any address is out of range.
  pub fn from_dict_registers(&mut self, pairs : &[(u8, u8)]) -> Result<(), ConfigurationError> {
    for &(address, _) in pairs {
      if address as usize >= self.map.num_registers {
        return Err(ConfigurationError::UnknownRegister(address));
      }
    }
    for &(address, value) in pairs {
      let mask = self.map.defined_mask(address);
      self.image[address as usize] =
        (self.image[address as usize] & !mask) | (value & mask);
    }
    Ok(())
  }

  /// Field-by-field difference against another configuration of
  /// the same generation
  pub fn compare(&self, other : &Configuration)
    -> Result<BTreeMap<String, FieldDiff>, ConfigurationError> {
    if self.map.version != other.map.version {
      return Err(ConfigurationError::VersionMismatch {
        expected : self.map.version.config_class().to_string(),
        got      : other.map.version.config_class().to_string() });
    }
    Ok(self.diff(other))
  }

  /// Fields differing from the generation's power-on defaults
  pub fn get_nondefault_registers(&self) -> BTreeMap<String, FieldDiff> {
    self.diff(&Configuration::new(self.map.version))
  }

  fn diff(&self, other : &Configuration) -> BTreeMap<String, FieldDiff> {
    let mut diffs = BTreeMap::new();
    for field in self.map.fields.iter() {
      match field.shape {
        FieldShape::Scalar { .. } => {
          let value = read_field_scalar(field, &self.image);
          let their = read_field_scalar(field, &other.image);
          if value != their {
            diffs.insert(field.name.to_string(),
                         FieldDiff::Scalar { value, other : their });
          }
        }
        FieldShape::List { .. } => {
          let value = read_field_list(field, &self.image);
          let their = read_field_list(field, &other.image);
          let differing : Vec<ElementDiff> = value.iter().zip(their.iter()).enumerate()
            .filter(|(_, (mine, theirs))| mine != theirs)
            .map(|(index, (&mine, &theirs))| ElementDiff {
              index, value : mine, other : theirs })
            .collect();
          if differing.is_empty() {
            continue;
          }
          if differing.len() < SPARSE_DIFF_THRESHOLD {
            diffs.insert(field.name.to_string(), FieldDiff::Sparse(differing));
          } else {
            diffs.insert(field.name.to_string(),
                         FieldDiff::List { value, other : their });
          }
        }
      }
    }
    diffs
  }

  /// The configuration as a JSON document, the same layout the
  /// embedded default tables use
  pub fn to_json(&self) -> serde_json::Value {
    let mut values = serde_json::Map::new();
    for field in self.map.fields.iter() {
      match field.shape {
        FieldShape::Scalar { .. } => {
          values.insert(field.name.to_string(),
                        serde_json::json!(read_field_scalar(field, &self.image)));
        }
        FieldShape::List { .. } => {
          values.insert(field.name.to_string(),
                        serde_json::json!(read_field_list(field, &self.image)));
        }
      }
    }
    serde_json::json!({
      "_config_type"    : "chip",
      "class"           : self.map.version.config_class(),
      "register_values" : values,
    })
  }

  /// Decode a configuration document of the expected generation.
  /// Fields the document omits keep their defaults, unknown
  /// fields are an error.
  pub fn from_json(version  : AsicVersion,
                   document : &serde_json::Value) -> Result<Self, ConfigurationError> {
    check_class(version, document)?;
    let mut config = Configuration::new(version);
    let values = register_values(document)?;
    apply_register_values(config.map, &mut config.image, values)?;
    Ok(config)
  }

  pub fn load<P : AsRef<Path>>(version : AsicVersion,
                               path    : P) -> Result<Self, ConfigurationError> {
    let text = fs::read_to_string(path)
      .map_err(|err| ConfigurationError::BadConfigFile(err.to_string()))?;
    let document : serde_json::Value = serde_json::from_str(&text)
      .map_err(|err| ConfigurationError::BadConfigFile(err.to_string()))?;
    Self::from_json(version, &document)
  }

  pub fn write<P : AsRef<Path>>(&self, path : P) -> Result<(), ConfigurationError> {
    let text = serde_json::to_string_pretty(&self.to_json())
      .map_err(|err| ConfigurationError::BadConfigFile(err.to_string()))?;
    fs::write(path, text)
      .map_err(|err| ConfigurationError::BadConfigFile(err.to_string()))
  }
}

impl PartialEq for Configuration {
  fn eq(&self, other : &Self) -> bool {
    self.map.version == other.map.version && self.image == other.image
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<Configuration");
    repr += &(format!(" {}", self.map.version));
    repr += &(format!(" | {} registers", self.map.num_registers));
    repr += &(format!(" | {} fields off default", self.get_nondefault_registers().len()));
    write!(f, "{}>", repr)
  }
}

#[cfg(feature = "random")]
impl FromRandom for Configuration {
  fn from_random() -> Self {
    let mut rng    = rand::thread_rng();
    let version    = match rng.gen_range(0..4) {
      0 => AsicVersion::V1,
      1 => AsicVersion::V2,
      2 => AsicVersion::V2b,
      _ => AsicVersion::LightpixV1,
    };
    let mut config = Configuration::new(version);
    let pairs : Vec<(u8, u8)> = (0..config.map.num_registers)
      .map(|address| (address as u8, rng.gen::<u8>()))
      .collect();
    // addresses are in range by construction
    config.from_dict_registers(&pairs).unwrap();
    config
  }
}
