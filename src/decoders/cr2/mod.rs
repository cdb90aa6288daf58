// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use log::debug;

use crate::bits::BEu16;
use crate::cfa::{CFAColor, CFA};
use crate::decompressors::ljpeg::{LjpegDecompressor, LjpegError};
use crate::formats::tiff::{Cr2Container, Entry, Value, IFD};
use crate::rawimage::{Dim2, RawImage};
use crate::tags::{Cr2Tag, TiffCommonTag};

use super::fetch_tiff_tag;
use super::CameraRegistry;
use super::Cr2Error;
use super::DecodeHints;
use super::Decoder;
use super::RawDecodeParams;
use super::Result;

mod sraw;

// for technical details about Cr2 mRAW/sRAW, see http://lclevy.free.fr/cr2/

/// Offset of the big-endian (height, width) record inside the old-format payload.
const OLD_FORMAT_DIM_OFFSET: u64 = 41;

/// Sample format value marking an sRaw/mRaw payload.
const SENSOR_FORMAT_SRAW: u16 = 4;

/// Per-index sub-offsets into the PowerShot G9 white balance entry.
/// Undocumented, taken over from the camera firmware as-is.
const G9_WB_OFFSETS: &[u8; 18] = b"012347800000005896";

#[derive(Debug, Clone, Copy)]
struct Cr2Slice {
  offset: u64,
  size: u64,
  w: usize,
  h: usize,
}

/// CR2 Decoder
///
/// Borrows the parsed container view and the lossless JPEG codec; both must
/// outlive the decoder.
pub struct Cr2Decoder<'a> {
  container: &'a Cr2Container<'a>,
  ljpeg: &'a dyn LjpegDecompressor,
  hints: DecodeHints,
}

impl<'a> Cr2Decoder<'a> {
  pub fn new(container: &'a Cr2Container<'a>, ljpeg: &'a dyn LjpegDecompressor, hints: DecodeHints) -> Self {
    Self { container, ljpeg, hints }
  }

  fn decode_new_format(&self, _params: &RawDecodeParams, dummy: bool) -> Result<RawImage> {
    let raw = self
      .container
      .chain_ifd(3)
      .ok_or_else(|| Cr2Error::UnsupportedFormat("no image data found".to_string()))?;

    let offsets = fetch_tiff_tag!(raw, TiffCommonTag::StripOffsets);
    let counts = fetch_tiff_tag!(raw, TiffCommonTag::StripByteCounts);

    let mut slices: Vec<Cr2Slice> = Vec::new();
    let mut complete_h = 0;
    for s in 0..offsets.count() {
      let offset = offsets.force_u64(s);
      let size = counts.force_u64(s);
      let mut sof = self.ljpeg.sof(offset, size)?;
      if sof.cps == 4 && sof.width > sof.height {
        // Some models (5Ds) publish the frame with doubled width and halved
        // height, ask Canon.
        sof.width /= 2;
        sof.height *= 2;
      }
      let slice = Cr2Slice {
        offset,
        size,
        w: sof.width * sof.cps,
        h: sof.height,
      };
      if let Some(first) = slices.first() {
        if first.w != slice.w {
          return Err(Cr2Error::GeometryMismatch("slice width does not match".to_string()));
        }
      }
      complete_h += slice.h;
      // Only decode slices the file actually contains
      if self.container.is_valid(offset, size) {
        slices.push(slice);
      }
    }

    if slices.is_empty() {
      return Err(Cr2Error::DecodeFailed("no slices found".to_string()));
    }

    let mut dim = Dim2::new(slices[0].w, complete_h);
    let mut cpp = 1;
    let mut is_cfa = true;

    if let Some(fmt) = raw.get_entry(Cr2Tag::SensorFormat) {
      if fmt.force_u16(0) == SENSOR_FORMAT_SRAW {
        dim.x /= 3;
        cpp = 3;
        is_cfa = false;

        // Some mRaw files (80D) disagree between the ljpeg frame size and
        // the published image size, but the pixel count must match.
        if raw.has_entry(TiffCommonTag::ImageWidth) && raw.has_entry(TiffCommonTag::ImageLength) {
          let w = fetch_tiff_tag!(raw, TiffCommonTag::ImageWidth).force_usize(0);
          let h = fetch_tiff_tag!(raw, TiffCommonTag::ImageLength).force_usize(0);
          if w * h != dim.x * dim.y {
            return Err(Cr2Error::GeometryMismatch("wrapped slices don't match image size".to_string()));
          }
          dim = Dim2::new(w, h);
        }
      }
      // The 6D mRaw writes flipped width and height for part of the image;
      // the larger value is always the width.
      if dim.x < dim.y {
        std::mem::swap(&mut dim.x, &mut dim.y);
      }
    }

    debug!("CR2 dimension: {}x{}, cpp: {}", dim.x, dim.y, cpp);

    let mut img = RawImage::alloc(dim, cpp, dummy);
    img.is_cfa = is_cfa;

    let slice_widths = Self::slice_widths(raw, &slices);
    debug!("CR2 slice widths: {:?}", slice_widths);

    if !dummy {
      let mut off_x = 0;
      for (i, slice) in slices.iter().enumerate() {
        match self.ljpeg.decode(slice.offset, slice.size, off_x, 0, &slice_widths, &mut img) {
          Ok(()) => {}
          Err(err) if i == 0 => return Err(err.into()),
          // These may just be single slice errors - store and move on
          Err(err) => img.push_error(err.to_string()),
        }
        off_x += slice.w;
      }

      if img.metadata.subsampling.x > 1 || img.metadata.subsampling.y > 1 {
        sraw::interpolate(self.container, &self.hints, &mut img)?;
      }
    }

    Ok(img)
  }

  /// The published slice width table, or the single full frame width.
  fn slice_widths(raw: &IFD, slices: &[Cr2Slice]) -> Vec<usize> {
    if let Some(canoncol) = raw.get_entry(Cr2Tag::SliceWidths) {
      let mut widths = Vec::new();
      for _ in 0..canoncol.force_usize(0) {
        widths.push(canoncol.force_usize(1));
      }
      widths.push(canoncol.force_usize(2));
      widths
    } else {
      vec![slices[0].w]
    }
  }

  fn decode_old_format(&self, params: &RawDecodeParams, dummy: bool) -> Result<RawImage> {
    let offset = if let Some(entry) = self.container.get_entry_recursive(Cr2Tag::OldRawOffset) {
      entry.force_u64(0)
    } else {
      let data = self.container.find_ifds_with_tag(TiffCommonTag::CFAPattern);
      let raw = data
        .first()
        .ok_or_else(|| Cr2Error::MissingEntry("couldn't find offset".to_string()))?;
      fetch_tiff_tag!(raw, TiffCommonTag::StripOffsets).force_u64(0)
    };

    // The geometry record is big endian even in little endian containers.
    let geom = self.container.subview(offset + OLD_FORMAT_DIM_OFFSET, 4)?;
    let mut height = BEu16(geom, 0) as usize;
    let mut width = BEu16(geom, 2) as usize;

    // Every two sensor lines can be stored as one double width ljpeg line,
    // keeping the RGGB sequence constant per line for better compression.
    let dim = if self.hints.double_line_ljpeg {
      height *= 2;
      Dim2::new(width * 2, height / 2)
    } else {
      width *= 2;
      Dim2::new(width, height)
    };

    debug!("CR2 old format dimension: {}x{}", dim.x, dim.y);

    let mut img = RawImage::alloc(dim, 1, dummy);

    if !dummy {
      let size = (self.container.file_size() as u64).saturating_sub(offset);
      match self.ljpeg.decode(offset, size, 0, 0, &[], &mut img) {
        Ok(()) => {}
        // Might be truncated data, keep what we got
        Err(LjpegError::Io(err)) => img.push_error(err.to_string()),
        Err(err) => return Err(err.into()),
      }
    }

    if self.hints.double_line_ljpeg {
      // Deinterlace into the normal layout: even output rows come from the
      // left half, odd rows from the right half of each source row.
      let mut out = RawImage::alloc(Dim2::new(width, height), 1, dummy);
      out.metadata = img.metadata.clone();
      out.copy_errors_from(&img);
      if !dummy {
        for y in 0..height {
          let src_x = if y % 2 == 0 { 0 } else { width };
          let src = &img.row(y / 2)[src_x..src_x + width];
          out.row_mut(y).copy_from_slice(src);
        }
      }
      img = out;
    }

    if let Some(curve) = self.container.get_entry_recursive(TiffCommonTag::GrayResponse) {
      if let Value::Short(table) = &curve.value {
        if table.len() == 4096 {
          img.set_linear_table(table.clone());
          if !params.uncorrected_raw_values && !dummy {
            img.apply_linear_table();
          }
        }
      }
    }

    Ok(img)
  }

  fn read_wb(&self) -> Result<[f32; 4]> {
    if let Some(wb) = self.container.get_entry_recursive(Cr2Tag::ColorData) {
      // This entry is a big table and cameras store the active WB in
      // different parts of it, the hint carries the per-model offset.
      let offset = self.hints.wb_offset.unwrap_or(126) / 2;
      Ok([
        entry_u16(wb, offset)? as f32,
        entry_u16(wb, offset + 1)? as f32,
        entry_u16(wb, offset + 3)? as f32,
        f32::NAN,
      ])
    } else if let (Some(shot_info), Some(g9_wb)) = (
      self.container.get_entry_recursive(Cr2Tag::ShotInfo),
      self.container.get_entry_recursive(Cr2Tag::PowerShotWB),
    ) {
      let wb_index = entry_u16(shot_info, 7)? as usize;
      let wb_offset = if wb_index < G9_WB_OFFSETS.len() {
        (G9_WB_OFFSETS[wb_index] - b'0') as usize
      } else {
        0
      };
      let wb_offset = wb_offset * 8 + 2;
      Ok([
        entry_u32(g9_wb, wb_offset + 1)? as f32,
        (entry_u32(g9_wb, wb_offset)? as f32 + entry_u32(g9_wb, wb_offset + 3)? as f32) / 2.0,
        entry_u32(g9_wb, wb_offset + 2)? as f32,
        f32::NAN,
      ])
    } else if let Some(wb) = self.container.get_entry_recursive(Cr2Tag::OldWhiteBalance) {
      // WB of the old 1D and 1DS
      if wb.count() >= 3 {
        Ok([entry_f32(wb, 0)?, entry_f32(wb, 1)?, entry_f32(wb, 2)?, f32::NAN])
      } else {
        Ok([f32::NAN; 4])
      }
    } else {
      // At least the D2000 has no WB
      Ok([f32::NAN; 4])
    }
  }
}

impl<'a> Decoder for Cr2Decoder<'a> {
  fn raw_image(&self, params: &RawDecodeParams, dummy: bool) -> Result<RawImage> {
    if self.hints.old_format {
      self.decode_old_format(params, dummy)
    } else {
      self.decode_new_format(params, dummy)
    }
  }

  fn check_support(&self, cameras: &dyn CameraRegistry) -> Result<()> {
    let data = self.container.find_ifds_with_tag(TiffCommonTag::Model);
    let ifd0 = data
      .first()
      .ok_or_else(|| Cr2Error::MissingEntry("model name not found".to_string()))?;
    let model = fetch_tiff_tag!(ifd0, TiffCommonTag::Model)
      .as_string()
      .ok_or_else(|| Cr2Error::MissingEntry("model name not found".to_string()))?;
    let make = ifd0
      .get_entry(TiffCommonTag::Make)
      .and_then(|e| e.as_string())
      .ok_or_else(|| Cr2Error::MissingEntry("make name not found".to_string()))?;

    let mode = self
      .container
      .find_first_ifd(Cr2Tag::FrameInfo)
      .and_then(|raw| raw.get_entry(Cr2Tag::SensorFormat))
      .filter(|fmt| fmt.force_u16(0) == SENSOR_FORMAT_SRAW)
      .map(|_| "sRaw1")
      .unwrap_or("");

    if cameras.is_supported(make, model, mode) {
      Ok(())
    } else {
      Err(Cr2Error::UnsupportedFormat(format!(
        "camera {} {} mode '{}' not supported",
        make, model, mode
      )))
    }
  }

  fn decode_metadata(&self, img: &mut RawImage) -> Result<()> {
    img.cfa = CFA::new_2x2([[CFAColor::RED, CFAColor::GREEN], [CFAColor::GREEN2, CFAColor::BLUE]]);

    if self.container.find_first_ifd(TiffCommonTag::Model).is_none() {
      return Err(Cr2Error::MissingEntry("model name not found".to_string()));
    }

    img.metadata.mode = match (img.metadata.subsampling.x, img.metadata.subsampling.y) {
      (2, 2) => "sRaw1".to_string(),
      (2, 1) => "sRaw2".to_string(),
      _ => String::new(),
    };

    if let Some(iso) = self.container.get_entry_recursive(TiffCommonTag::ISOSpeedRatings) {
      img.metadata.iso_speed = iso.force_u32(0);
    }

    // WB problems are never fatal, the raster is usable without it
    match self.read_wb() {
      Ok(wb) => {
        debug!("CR2 WB: {:?}", wb);
        img.metadata.wb_coeffs = wb;
      }
      Err(err) => img.push_error(err.to_string()),
    }

    Ok(())
  }
}

fn entry_u16(entry: &Entry, idx: usize) -> Result<u16> {
  entry
    .get_u16(idx)
    .map_err(|err| Cr2Error::DecodeFailed(err.to_string()))?
    .ok_or_else(|| Cr2Error::MissingEntry(format!("no value at index {} in tag {:#x}", idx, entry.tag)))
}

fn entry_u32(entry: &Entry, idx: usize) -> Result<u32> {
  entry
    .get_u32(idx)
    .map_err(|err| Cr2Error::DecodeFailed(err.to_string()))?
    .ok_or_else(|| Cr2Error::MissingEntry(format!("no value at index {} in tag {:#x}", idx, entry.tag)))
}

fn entry_f32(entry: &Entry, idx: usize) -> Result<f32> {
  entry
    .get_f32(idx)
    .map_err(|err| Cr2Error::DecodeFailed(err.to_string()))?
    .ok_or_else(|| Cr2Error::MissingEntry(format!("no value at index {} in tag {:#x}", idx, entry.tag)))
}
