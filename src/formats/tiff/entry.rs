// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use serde::{Deserialize, Serialize};

use crate::formats::tiff::Value;
use crate::tags::TiffTagEnum;

/// A tagged value inside an IFD. The entry does not own any backing bytes,
/// the value is fully materialized by the directory parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub tag: u16,
  pub value: Value,
}

impl Entry {
  pub fn new<T: TiffTagEnum>(tag: T, value: Value) -> Self {
    Self { tag: tag.into(), value }
  }

  pub fn value_type(&self) -> u16 {
    self.value.value_type()
  }

  pub fn count(&self) -> usize {
    self.value.count()
  }
}

impl std::ops::Deref for Entry {
  type Target = Value;

  fn deref(&self) -> &Self::Target {
    &self.value
  }
}
