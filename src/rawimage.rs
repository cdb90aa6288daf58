use serde::{Deserialize, Serialize};

use crate::cfa::CFA;

/// Width and height pair, also used for subsampling factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dim2 {
  pub x: usize,
  pub y: usize,
}

impl Dim2 {
  pub fn new(x: usize, y: usize) -> Self {
    Self { x, y }
  }
}

/// Image properties collected during the decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
  /// whitebalance coefficients encoded in the file, NaN when unknown
  pub wb_coeffs: [f32; 4],
  pub iso_speed: u32,
  /// "sRaw1", "sRaw2" or empty for regular Bayer raws
  pub mode: String,
  /// chroma subsampling factors of the ljpeg frame
  pub subsampling: Dim2,
}

impl Default for ImageMetadata {
  fn default() -> Self {
    Self {
      wb_coeffs: [f32::NAN; 4],
      iso_speed: 0,
      mode: String::new(),
      subsampling: Dim2::new(1, 1),
    }
  }
}

/// A decoded raw image: the sample buffer plus everything needed to process
/// it further.
///
/// The buffer holds `dim.x * cpp` samples per row. For mosaic images `cpp`
/// is 1 and `is_cfa` is set; subsampled modes are rewritten in place to RGB
/// triplets with `cpp` 3.
#[derive(Debug, Clone)]
pub struct RawImage {
  pub dim: Dim2,
  /// number of components per pixel (1 for bayer, 3 for sRaw/mRaw)
  pub cpp: usize,
  pub is_cfa: bool,
  pub cfa: CFA,
  pub data: Vec<u16>,
  /// linearisation curve, present only when the file carries one
  pub linear_table: Option<Vec<u16>>,
  pub metadata: ImageMetadata,
  errors: Vec<String>,
}

impl RawImage {
  /// Allocate a zeroed image. With `dummy` the buffer stays empty, only
  /// geometry and metadata are tracked.
  pub fn alloc(dim: Dim2, cpp: usize, dummy: bool) -> Self {
    let data = if dummy { Vec::new() } else { vec![0_u16; dim.x * cpp * dim.y] };
    Self {
      dim,
      cpp,
      is_cfa: true,
      cfa: CFA::default(),
      data,
      linear_table: None,
      metadata: ImageMetadata::default(),
      errors: Vec::new(),
    }
  }

  /// Samples per row.
  #[inline]
  pub fn pitch(&self) -> usize {
    self.dim.x * self.cpp
  }

  pub fn pixels(&self) -> &[u16] {
    &self.data
  }

  pub fn pixels_mut(&mut self) -> &mut [u16] {
    &mut self.data
  }

  pub fn row(&self, y: usize) -> &[u16] {
    let pitch = self.pitch();
    &self.data[y * pitch..(y + 1) * pitch]
  }

  pub fn row_mut(&mut self, y: usize) -> &mut [u16] {
    let pitch = self.pitch();
    &mut self.data[y * pitch..(y + 1) * pitch]
  }

  /// Record a non-fatal decode problem.
  pub fn push_error(&mut self, msg: impl Into<String>) {
    let msg = msg.into();
    log::warn!("raw image error: {}", msg);
    self.errors.push(msg);
  }

  pub fn errors(&self) -> &[String] {
    &self.errors
  }

  pub fn copy_errors_from(&mut self, other: &RawImage) {
    self.errors.extend_from_slice(&other.errors);
  }

  pub fn set_linear_table(&mut self, table: Vec<u16>) {
    debug_assert_eq!(table.len(), 4096);
    self.linear_table = Some(table);
  }

  /// Run every sample through the installed linearisation table and detach
  /// it. Dimensions are unchanged. No-op without a table.
  pub fn apply_linear_table(&mut self) {
    if let Some(table) = self.linear_table.take() {
      for p in self.data.iter_mut() {
        *p = table[(*p & 0x0fff) as usize];
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn alloc_and_rows() {
    let img = RawImage::alloc(Dim2::new(4, 3), 3, false);
    assert_eq!(img.pitch(), 12);
    assert_eq!(img.pixels().len(), 36);
    assert_eq!(img.row(2).len(), 12);
    assert!(img.is_cfa);
  }

  #[test]
  fn dummy_alloc_is_empty() {
    let img = RawImage::alloc(Dim2::new(4000, 3000), 1, true);
    assert!(img.pixels().is_empty());
    assert_eq!(img.dim, Dim2::new(4000, 3000));
  }

  #[test]
  fn linear_table_application() {
    let mut img = RawImage::alloc(Dim2::new(2, 1), 1, false);
    img.pixels_mut().copy_from_slice(&[0x0005, 0xf005]);
    let mut table = vec![0_u16; 4096];
    table[5] = 1234;
    img.set_linear_table(table);
    img.apply_linear_table();
    // Only the low 12 bits index the table.
    assert_eq!(img.pixels(), &[1234, 1234]);
    assert!(img.linear_table.is_none());
  }

  #[test]
  fn error_log_is_append_only() {
    let mut img = RawImage::alloc(Dim2::new(1, 1), 1, false);
    img.push_error("first");
    img.push_error("second".to_string());
    assert_eq!(img.errors(), &["first".to_string(), "second".to_string()]);
  }
}
