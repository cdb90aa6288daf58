// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use serde::{Deserialize, Serialize};
use std::num::TryFromIntError;

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_UNDEFINED: u16 = 7;
const TYPE_SSHORT: u16 = 8;
const TYPE_SLONG: u16 = 9;
const TYPE_FLOAT: u16 = 11;

/// Error when a value can not be converted into the requested scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueConvertError(pub(crate) ());

impl std::fmt::Display for ValueConvertError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("TIFF value conversion failed")
  }
}

impl std::error::Error for ValueConvertError {}

impl From<TryFromIntError> for ValueConvertError {
  fn from(_: TryFromIntError) -> Self {
    Self(())
  }
}

impl From<std::convert::Infallible> for ValueConvertError {
  fn from(value: std::convert::Infallible) -> Self {
    match value {}
  }
}

/// ASCII values, possibly multiple zero terminated strings in one entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TiffAscii {
  strings: Vec<String>,
}

impl TiffAscii {
  pub fn new(value: &str) -> Self {
    Self {
      strings: vec![value.to_string()],
    }
  }

  pub fn strings(&self) -> &[String] {
    &self.strings
  }

  pub fn first(&self) -> Option<&str> {
    self.strings.first().map(String::as_str)
  }
}

/// A TIFF entry value, trimmed to the scalar types the CR2 structure uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
  /// 8-bit unsigned integer
  Byte(Vec<u8>),
  /// 7-bit ASCII code, zero terminated
  Ascii(TiffAscii),
  /// 16-bit unsigned integer
  Short(Vec<u16>),
  /// 32-bit unsigned integer
  Long(Vec<u32>),
  /// 8-bit byte that may contain anything
  Undefined(Vec<u8>),
  /// 16-bit signed integer
  SShort(Vec<i16>),
  /// 32-bit signed integer
  SLong(Vec<i32>),
  /// 32-bit IEEE floating point
  Float(Vec<f32>),
}

macro_rules! get_int_accessor {
  ($get:ident, $force:ident, $t:ty) => {
    pub fn $get(&self, idx: usize) -> std::result::Result<Option<$t>, ValueConvertError> {
      Ok(match self {
        Value::Byte(v) => v.get(idx).copied().map(TryInto::try_into).transpose()?,
        Value::Short(v) => v.get(idx).copied().map(TryInto::try_into).transpose()?,
        Value::Long(v) => v.get(idx).copied().map(TryInto::try_into).transpose()?,
        Value::SShort(v) => v.get(idx).copied().map(TryInto::try_into).transpose()?,
        Value::SLong(v) => v.get(idx).copied().map(TryInto::try_into).transpose()?,
        Value::Float(v) => v.get(idx).copied().map(|x| x as $t),
        Value::Ascii(_) => return Err(ValueConvertError(())),
        Value::Undefined(_) => return Err(ValueConvertError(())),
      })
    }

    pub fn $force(&self, idx: usize) -> $t {
      match self.$get(idx) {
        Ok(Some(v)) => v,
        Ok(None) => {
          log::error!("TIFF value index out of range, index is {} but length is {}", idx, self.count());
          Default::default()
        }
        Err(_) => {
          log::error!("TIFF value cast error, forced to default value");
          Default::default()
        }
      }
    }
  };
}

impl Value {
  get_int_accessor!(get_usize, force_usize, usize);
  get_int_accessor!(get_u16, force_u16, u16);
  get_int_accessor!(get_u32, force_u32, u32);
  get_int_accessor!(get_u64, force_u64, u64);

  pub fn get_f32(&self, idx: usize) -> std::result::Result<Option<f32>, ValueConvertError> {
    Ok(match self {
      Value::Byte(v) => v.get(idx).copied().map(|x| x as f32),
      Value::Short(v) => v.get(idx).copied().map(|x| x as f32),
      Value::Long(v) => v.get(idx).copied().map(|x| x as f32),
      Value::SShort(v) => v.get(idx).copied().map(|x| x as f32),
      Value::SLong(v) => v.get(idx).copied().map(|x| x as f32),
      Value::Float(v) => v.get(idx).copied(),
      Value::Ascii(_) => return Err(ValueConvertError(())),
      Value::Undefined(_) => return Err(ValueConvertError(())),
    })
  }

  pub fn force_f32(&self, idx: usize) -> f32 {
    match self.get_f32(idx) {
      Ok(Some(v)) => v,
      Ok(None) => {
        log::error!("TIFF value index out of range, index is {} but length is {}", idx, self.count());
        Default::default()
      }
      Err(_) => {
        log::error!("TIFF value cast error, forced to default value");
        Default::default()
      }
    }
  }

  pub fn as_string(&self) -> Option<&str> {
    match self {
      Self::Ascii(v) => v.first(),
      _ => None,
    }
  }

  pub fn count(&self) -> usize {
    match self {
      Self::Byte(v) => v.len(),
      Self::Ascii(v) => v.strings().iter().map(|s| s.len() + 1).sum(),
      Self::Short(v) => v.len(),
      Self::Long(v) => v.len(),
      Self::Undefined(v) => v.len(),
      Self::SShort(v) => v.len(),
      Self::SLong(v) => v.len(),
      Self::Float(v) => v.len(),
    }
  }

  pub fn value_type(&self) -> u16 {
    match self {
      Self::Byte(_) => TYPE_BYTE,
      Self::Ascii(_) => TYPE_ASCII,
      Self::Short(_) => TYPE_SHORT,
      Self::Long(_) => TYPE_LONG,
      Self::Undefined(_) => TYPE_UNDEFINED,
      Self::SShort(_) => TYPE_SSHORT,
      Self::SLong(_) => TYPE_SLONG,
      Self::Float(_) => TYPE_FLOAT,
    }
  }
}
