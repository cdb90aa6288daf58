use thiserror::Error;

use crate::rawimage::RawImage;

/// Frame geometry reported by the SOF marker of a lossless JPEG bitstream.
///
/// All slices of one image share `cps` and `precision`; only the trailing
/// slice may differ in width when a slice table publishes a remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SofInfo {
  pub width: usize,
  pub height: usize,
  pub cps: usize,
  pub precision: usize,
}

/// Error variants of the lossless JPEG codec.
#[derive(Debug, Error)]
pub enum LjpegError {
  /// Truncated input data
  #[error("I/O error: {:?}", _0)]
  Io(#[from] std::io::Error),

  /// Malformed bitstream
  #[error("ljpeg: {}", _0)]
  Decoder(String),
}

pub type LjpegResult<T> = std::result::Result<T, LjpegError>;

/// Interface to the lossless JPEG codec.
///
/// The codec itself lives outside this crate. An implementation owns or
/// borrows the file data and decodes the bitstream found at a byte range
/// into a caller-owned raster of 16-bit samples.
pub trait LjpegDecompressor {
  /// Inspect the SOF marker at `(offset, size)` without consuming the stream.
  fn sof(&self, offset: u64, size: u64) -> LjpegResult<SofInfo>;

  /// Decode the bitstream at `(offset, size)` into `img` with its top-left
  /// corner at `(dst_x, dst_y)`.
  ///
  /// A non-empty `slice_widths` table describes how the frame is split into
  /// vertical stripes; placement of the stripes inside the destination is
  /// the codec's job. The codec records the frame's chroma subsampling
  /// factors into `img.metadata.subsampling`.
  fn decode(&self, offset: u64, size: u64, dst_x: usize, dst_y: usize, slice_widths: &[usize], img: &mut RawImage) -> LjpegResult<()>;
}
