// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::bits::Endian;
use crate::formats::tiff::Entry;
use crate::tags::TiffTagEnum;

/// A single image file directory: tagged entries plus sub directories
/// (EXIF pointer, makernote, ...) keyed by the tag that referenced them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IFD {
  pub entries: BTreeMap<u16, Entry>,
  pub sub: HashMap<u16, Vec<IFD>>,
  pub endian: Endian,
}

impl IFD {
  pub fn new(endian: Endian) -> Self {
    Self {
      entries: BTreeMap::new(),
      sub: HashMap::new(),
      endian,
    }
  }

  pub fn add_entry(&mut self, entry: Entry) {
    self.entries.insert(entry.tag, entry);
  }

  pub fn add_sub_ifd<T: TiffTagEnum>(&mut self, tag: T, ifd: IFD) {
    self.sub.entry(tag.into()).or_default().push(ifd);
  }

  pub fn entry_count(&self) -> usize {
    self.entries.len()
  }

  pub fn sub_ifds(&self) -> &HashMap<u16, Vec<IFD>> {
    &self.sub
  }

  pub fn get_entry<T: TiffTagEnum>(&self, tag: T) -> Option<&Entry> {
    self.entries.get(&tag.into())
  }

  pub fn has_entry<T: TiffTagEnum>(&self, tag: T) -> bool {
    self.get_entry(tag).is_some()
  }

  pub fn get_entry_recursive<T: TiffTagEnum>(&self, tag: T) -> Option<&Entry> {
    self.entry_recursive(tag.into())
  }

  fn entry_recursive(&self, tag: u16) -> Option<&Entry> {
    self
      .entries
      .get(&tag)
      .or_else(|| self.sub.values().flatten().find_map(|ifd| ifd.entry_recursive(tag)))
  }

  /// Collect this directory and every nested one owning `tag`, depth first.
  pub(crate) fn ifds_with_tag<'a>(&'a self, tag: u16, found: &mut Vec<&'a IFD>) {
    if self.entries.contains_key(&tag) {
      found.push(self);
    }
    for subs in self.sub.values() {
      for ifd in subs {
        ifd.ifds_with_tag(tag, found);
      }
    }
  }
}
