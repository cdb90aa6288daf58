use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decompressors::ljpeg::LjpegError;
use crate::rawimage::RawImage;

pub mod cr2;

macro_rules! fetch_tiff_tag {
  ($ifd:expr, $tag:expr) => {
    $ifd
      .get_entry($tag)
      .ok_or_else(|| $crate::decoders::Cr2Error::MissingEntry(format!("couldn't find tag {}", stringify!($tag))))?
  };
}

pub(crate) use fetch_tiff_tag;

/// Error type for any reason for the decode to fail.
#[derive(Debug, Error)]
pub enum Cr2Error {
  /// Container shape is not recognisable as CR2
  #[error("unsupported format: {}", _0)]
  UnsupportedFormat(String),

  /// A required TIFF tag is absent
  #[error("missing entry: {}", _0)]
  MissingEntry(String),

  /// Slice widths disagree, or declared sizes don't add up
  #[error("geometry mismatch: {}", _0)]
  GeometryMismatch(String),

  /// The lossless JPEG codec failed
  #[error("decode failed: {}", _0)]
  DecodeFailed(String),

  /// Truncated or out-of-range byte access
  #[error("I/O error: {:?}", _0)]
  Io(#[from] std::io::Error),
}

impl From<LjpegError> for Cr2Error {
  fn from(err: LjpegError) -> Self {
    match err {
      LjpegError::Io(e) => Self::Io(e),
      LjpegError::Decoder(msg) => Self::DecodeFailed(msg),
    }
  }
}

pub type Result<T> = std::result::Result<T, Cr2Error>;

/// Per-call decode options.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct RawDecodeParams {
  /// Skip the linearisation step; the curve is still attached to the image
  /// so consumers may apply it later.
  pub uncorrected_raw_values: bool,
}

/// Camera specific decode options, typically sourced from a camera database.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct DecodeHints {
  /// Treat the file as old-format CR2 (TIF based models)
  pub old_format: bool,
  /// Old format stores two sensor lines in one double width ljpeg line
  pub double_line_ljpeg: bool,
  /// Byte offset of the active WB inside COLORDATA, default 126
  pub wb_offset: Option<usize>,
  /// Invert the outer sraw reconstruction coefficients
  pub invert_sraw_wb: bool,
  /// Use the first generation (40D) YUV matrix
  pub sraw_40d: bool,
  /// Use the revised (5D Mark III) YUV matrix
  pub sraw_new: bool,
  /// Disable the model based hue halving
  pub old_sraw_hue: bool,
  /// Force the hue halving regardless of model id
  pub force_new_sraw_hue: bool,
}

/// Camera support database, resolved by the embedding application.
pub trait CameraRegistry {
  fn is_supported(&self, make: &str, model: &str, mode: &str) -> bool;
}

pub trait Decoder {
  /// Decode the raw payload into a raster. Fatal problems fail the call;
  /// recoverable ones end up in the raster's error log.
  fn raw_image(&self, params: &RawDecodeParams, dummy: bool) -> Result<RawImage>;

  /// Check whether the camera that produced this file is supported.
  fn check_support(&self, cameras: &dyn CameraRegistry) -> Result<()>;

  /// Populate white balance, ISO, mode and CFA layout on a decoded raster.
  fn decode_metadata(&self, img: &mut RawImage) -> Result<()>;
}
