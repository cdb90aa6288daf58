// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io;

use crate::bits::Endian;
use crate::formats::tiff::{Entry, IFD};
use crate::tags::TiffTagEnum;

/// Read-only view over a CR2 file: the raw bytes plus the parsed top-level
/// directory chain. The view borrows the file buffer, so whoever owns the
/// buffer must outlive the decoder.
#[derive(Debug, Clone)]
pub struct Cr2Container<'a> {
  buf: &'a [u8],
  chain: Vec<IFD>,
}

impl<'a> Cr2Container<'a> {
  pub fn new(buf: &'a [u8], chain: Vec<IFD>) -> Self {
    Self { buf, chain }
  }

  pub fn endian(&self) -> Endian {
    self.chain.first().map(|ifd| ifd.endian).unwrap_or_default()
  }

  pub fn file_size(&self) -> usize {
    self.buf.len()
  }

  /// Check that a byte range lies fully inside the file.
  pub fn is_valid(&self, offset: u64, size: u64) -> bool {
    offset
      .checked_add(size)
      .map(|end| end <= self.buf.len() as u64)
      .unwrap_or(false)
  }

  pub fn subview(&self, offset: u64, size: u64) -> io::Result<&'a [u8]> {
    if self.is_valid(offset, size) {
      Ok(&self.buf[offset as usize..(offset + size) as usize])
    } else {
      Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("range {}+{} is beyond file end {}", offset, size, self.buf.len()),
      ))
    }
  }

  pub fn chain_count(&self) -> usize {
    self.chain.len()
  }

  pub fn chain_ifd(&self, index: usize) -> Option<&IFD> {
    self.chain.get(index)
  }

  pub fn chains(&self) -> &[IFD] {
    &self.chain
  }

  /// Find an entry matching `tag` anywhere in the directory tree.
  pub fn get_entry_recursive<T: TiffTagEnum>(&self, tag: T) -> Option<&Entry> {
    self.chain.iter().find_map(|ifd| ifd.get_entry_recursive(tag))
  }

  /// All directories owning `tag`, in chain order, depth first.
  pub fn find_ifds_with_tag<T: TiffTagEnum>(&self, tag: T) -> Vec<&IFD> {
    let mut found = Vec::new();
    for ifd in &self.chain {
      ifd.ifds_with_tag(tag.into(), &mut found);
    }
    found
  }

  /// First directory owning `tag`, if any.
  pub fn find_first_ifd<T: TiffTagEnum>(&self, tag: T) -> Option<&IFD> {
    self.find_ifds_with_tag(tag).into_iter().next()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::formats::tiff::Value;
  use crate::tags::TiffCommonTag;

  #[test]
  fn range_validity() {
    let buf = [0_u8; 16];
    let container = Cr2Container::new(&buf, Vec::new());
    assert!(container.is_valid(0, 16));
    assert!(container.is_valid(15, 1));
    assert!(!container.is_valid(15, 2));
    assert!(!container.is_valid(u64::MAX, 1));
    assert_eq!(container.file_size(), 16);
  }

  #[test]
  fn subview_checks_bounds() {
    let buf: Vec<u8> = (0..8).collect();
    let container = Cr2Container::new(&buf, Vec::new());
    assert_eq!(container.subview(2, 3).unwrap(), &[2, 3, 4]);
    assert!(container.subview(6, 3).is_err());
  }

  #[test]
  fn chain_lookup() {
    let mut ifd0 = IFD::new(Endian::Little);
    ifd0.add_entry(Entry::new(TiffCommonTag::ImageWidth, Value::Long(vec![100])));
    let ifd1 = IFD::new(Endian::Little);
    let buf = [0_u8; 4];
    let container = Cr2Container::new(&buf, vec![ifd0, ifd1]);
    assert_eq!(container.chain_count(), 2);
    assert!(container.chain_ifd(0).unwrap().has_entry(TiffCommonTag::ImageWidth));
    assert!(container.get_entry_recursive(TiffCommonTag::ImageWidth).is_some());
    assert_eq!(container.find_ifds_with_tag(TiffCommonTag::ImageWidth).len(), 1);
    assert!(container.find_first_ifd(TiffCommonTag::ImageLength).is_none());
  }
}
