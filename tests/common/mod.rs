#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use canonraw::bits::Endian;
use canonraw::decompressors::ljpeg::{LjpegDecompressor, LjpegError, LjpegResult, SofInfo};
use canonraw::formats::tiff::{Cr2Container, Entry, IFD};
use canonraw::rawimage::{Dim2, RawImage};

/// One recorded codec invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeCall {
  pub offset: u64,
  pub size: u64,
  pub dst_x: usize,
  pub dst_y: usize,
  pub slice_widths: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPattern {
  /// Leave the raster untouched
  None,
  /// Fill every sample with its buffer index
  Gradient,
  /// Fill every sample with a constant
  Constant(u16),
}

/// Scripted stand-in for the lossless JPEG codec. Frames are registered by
/// offset; decode calls are recorded for later inspection.
pub struct MockLjpeg {
  frames: HashMap<u64, SofInfo>,
  subsampling: Dim2,
  fill: FillPattern,
  decode_failures: Vec<u64>,
  io_failures: Vec<u64>,
  calls: RefCell<Vec<DecodeCall>>,
}

impl MockLjpeg {
  pub fn new() -> Self {
    Self {
      frames: HashMap::new(),
      subsampling: Dim2::new(1, 1),
      fill: FillPattern::None,
      decode_failures: Vec::new(),
      io_failures: Vec::new(),
      calls: RefCell::new(Vec::new()),
    }
  }

  pub fn with_frame(mut self, offset: u64, width: usize, height: usize, cps: usize) -> Self {
    self.frames.insert(
      offset,
      SofInfo {
        width,
        height,
        cps,
        precision: 14,
      },
    );
    self
  }

  pub fn with_subsampling(mut self, x: usize, y: usize) -> Self {
    self.subsampling = Dim2::new(x, y);
    self
  }

  pub fn with_fill(mut self, fill: FillPattern) -> Self {
    self.fill = fill;
    self
  }

  pub fn failing_at(mut self, offset: u64) -> Self {
    self.decode_failures.push(offset);
    self
  }

  pub fn io_failing_at(mut self, offset: u64) -> Self {
    self.io_failures.push(offset);
    self
  }

  pub fn calls(&self) -> Vec<DecodeCall> {
    self.calls.borrow().clone()
  }
}

impl LjpegDecompressor for MockLjpeg {
  fn sof(&self, offset: u64, _size: u64) -> LjpegResult<SofInfo> {
    self
      .frames
      .get(&offset)
      .copied()
      .ok_or_else(|| LjpegError::Decoder(format!("no SOI marker at offset {}", offset)))
  }

  fn decode(&self, offset: u64, size: u64, dst_x: usize, dst_y: usize, slice_widths: &[usize], img: &mut RawImage) -> LjpegResult<()> {
    self.calls.borrow_mut().push(DecodeCall {
      offset,
      size,
      dst_x,
      dst_y,
      slice_widths: slice_widths.to_vec(),
    });
    if self.io_failures.contains(&offset) {
      return Err(LjpegError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated bitstream")));
    }
    if self.decode_failures.contains(&offset) {
      return Err(LjpegError::Decoder("malformed bitstream".to_string()));
    }
    img.metadata.subsampling = self.subsampling;
    match self.fill {
      FillPattern::None => {}
      FillPattern::Constant(v) => img.pixels_mut().fill(v),
      FillPattern::Gradient => {
        for (i, p) in img.pixels_mut().iter_mut().enumerate() {
          *p = i as u16;
        }
      }
    }
    Ok(())
  }
}

/// An empty little endian directory.
pub fn blank_ifd() -> IFD {
  IFD::new(Endian::Little)
}

pub fn ifd_with(entries: Vec<Entry>) -> IFD {
  let mut ifd = blank_ifd();
  for entry in entries {
    ifd.add_entry(entry);
  }
  ifd
}

/// A new-format chain: IFD0 plus two preview directories plus the raw IFD.
pub fn cr2_chain(ifd0: IFD, raw_ifd: IFD) -> Vec<IFD> {
  vec![ifd0, blank_ifd(), blank_ifd(), raw_ifd]
}

pub fn container(buf: &[u8], chain: Vec<IFD>) -> Cr2Container<'_> {
  Cr2Container::new(buf, chain)
}
