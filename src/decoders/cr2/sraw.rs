// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Reconstruction of sRaw/mRaw images: upsample the subsampled chroma and
//! convert the Y/Cb/Cr triplets to linear RGB, in place.

use log::debug;
use rayon::prelude::*;

use crate::bits::clampbits;
use crate::decoders::{Cr2Error, DecodeHints, Result};
use crate::formats::tiff::Cr2Container;
use crate::rawimage::RawImage;
use crate::tags::Cr2Tag;

/// Offset of the sraw reconstruction coefficients inside COLORDATA.
const SRAW_WB_OFFSET: usize = 78;

/// First model id using the halved hue bias (5D Mark III era).
const MODEL_ID_NEW_HUE: u32 = 0x80000281;
/// The 5D Mark II got the halved bias as well.
const MODEL_ID_5D_MARK2: u32 = 0x80000218;

/// One YUV to RGB formula. Monomorphised into the interpolation loops so
/// the formula selection never happens per pixel.
trait YuvMatrix {
  fn to_rgb(coeffs: &[i32; 3], y: i32, cb: i32, cr: i32) -> (i32, i32, i32);
}

/// Matrix used by most sraw capable models.
struct Classic;

impl YuvMatrix for Classic {
  #[inline(always)]
  fn to_rgb(c: &[i32; 3], y: i32, cb: i32, cr: i32) -> (i32, i32, i32) {
    let r = c[0] * (y + ((50 * cb + 22929 * cr) >> 12));
    let g = c[1] * (y + ((-5640 * cb - 11751 * cr) >> 12));
    let b = c[2] * (y + ((29040 * cb - 101 * cr) >> 12));
    (r >> 8, g >> 8, b >> 8)
  }
}

/// First generation matrix (40D), with an extra luma offset of 512.
struct Old40d;

impl YuvMatrix for Old40d {
  #[inline(always)]
  fn to_rgb(c: &[i32; 3], y: i32, cb: i32, cr: i32) -> (i32, i32, i32) {
    let r = c[0] * (y + cr - 512);
    let g = c[1] * (y + ((-778 * cb - (cr << 11)) >> 12) - 512);
    let b = c[2] * (y + cb - 512);
    (r >> 8, g >> 8, b >> 8)
  }
}

/// Revised matrix found in the EOS 5D Mark III and later.
struct New5dMk3;

impl YuvMatrix for New5dMk3 {
  #[inline(always)]
  fn to_rgb(c: &[i32; 3], y: i32, cb: i32, cr: i32) -> (i32, i32, i32) {
    let r = c[0] * (y + cr);
    let g = c[1] * (y + ((-778 * cb - (cr << 11)) >> 12));
    let b = c[2] * (y + cb);
    (r >> 8, g >> 8, b >> 8)
  }
}

#[inline(always)]
fn store_rgb(out: &mut [u16], off: usize, rgb: (i32, i32, i32)) {
  out[off] = clampbits(rgb.0, 16);
  out[off + 1] = clampbits(rgb.1, 16);
  out[off + 2] = clampbits(rgb.2, 16);
}

/// Interpolate and convert sRaw data, rewriting the raster in place.
pub(super) fn interpolate(container: &Cr2Container<'_>, hints: &DecodeHints, img: &mut RawImage) -> Result<()> {
  let coeffs = sraw_coeffs(container, hints)?;
  let hue = hue_value(container, hints, img);
  debug!("CR2 sraw coeffs: {:?}, hue: {}", coeffs, hue);

  let sub = img.metadata.subsampling;
  match (sub.x, sub.y) {
    (2, 1) => {
      if hints.sraw_40d {
        interpolate_422::<Old40d>(img, &coeffs, hue, 0);
      } else if hints.sraw_new {
        interpolate_422::<New5dMk3>(img, &coeffs, hue, 0);
      } else {
        interpolate_422::<Classic>(img, &coeffs, hue, hue);
      }
    }
    (2, 2) => {
      if hints.sraw_new {
        interpolate_420::<New5dMk3>(img, &coeffs, hue);
      } else {
        interpolate_420::<Classic>(img, &coeffs, hue);
      }
    }
    _ => {
      return Err(Cr2Error::UnsupportedFormat(format!("unknown subsampling {}x{}", sub.x, sub.y)));
    }
  }
  Ok(())
}

/// The coefficients used to reconstruct uncorrected RGB data, always at
/// offset 78 of COLORDATA.
fn sraw_coeffs(container: &Cr2Container<'_>, hints: &DecodeHints) -> Result<[i32; 3]> {
  let wb = container
    .find_first_ifd(Cr2Tag::ColorData)
    .and_then(|ifd| ifd.get_entry(Cr2Tag::ColorData))
    .ok_or_else(|| Cr2Error::MissingEntry("unable to locate sraw white balance".to_string()))?;

  let c0 = wb.force_u16(SRAW_WB_OFFSET) as i32;
  let c1 = ((wb.force_u16(SRAW_WB_OFFSET + 1) as i32) + (wb.force_u16(SRAW_WB_OFFSET + 2) as i32) + 1) >> 1;
  let c2 = wb.force_u16(SRAW_WB_OFFSET + 3) as i32;

  if hints.invert_sraw_wb {
    Ok([invert_coeff(c0), c1, invert_coeff(c2)])
  } else {
    Ok([c0, c1, c2])
  }
}

fn invert_coeff(c: i32) -> i32 {
  (1024.0 * 1024.0 / c as f32).round() as i32
}

/// Hue correction, depending on camera generation. Seems to compensate
/// rounding during the in-camera chroma subsampling.
fn hue_value(container: &Cr2Container<'_>, hints: &DecodeHints, img: &RawImage) -> i32 {
  let base = (img.metadata.subsampling.x * img.metadata.subsampling.y) as i32;
  if hints.old_sraw_hue {
    return base;
  }
  let model_id = match container.get_entry_recursive(Cr2Tag::ModelId) {
    Some(entry) => entry.force_u32(0),
    None => return 0,
  };
  if model_id >= MODEL_ID_NEW_HUE || model_id == MODEL_ID_5D_MARK2 || hints.force_new_sraw_hue {
    (base - 1) >> 1
  } else {
    base
  }
}

/// 4:2:2 layout: one chroma pair per two pixels. Rows are independent, so
/// they are processed in parallel.
fn interpolate_422<M: YuvMatrix>(img: &mut RawImage, coeffs: &[i32; 3], hue: i32, tail_hue: i32) {
  let w = img.dim.x / 2;
  let pitch = img.pitch();
  let hue = 16384 - hue;
  let tail_hue = 16384 - tail_hue;
  let coeffs = *coeffs;

  img.pixels_mut().par_chunks_exact_mut(pitch).for_each(|line| {
    let mut off = 0;
    for _ in 1..w {
      let y = line[off] as i32;
      let cb = line[off + 1] as i32 - hue;
      let cr = line[off + 2] as i32 - hue;
      store_rgb(line, off, M::to_rgb(&coeffs, y, cb, cr));
      off += 3;

      // Second pixel averages with the chroma of the next pair
      let y = line[off] as i32;
      let cb2 = (cb + line[off + 1 + 3] as i32 - hue) >> 1;
      let cr2 = (cr + line[off + 2 + 3] as i32 - hue) >> 1;
      store_rgb(line, off, M::to_rgb(&coeffs, y, cb2, cr2));
      off += 3;
    }
    // The last two pixels have no next pair to average with
    let y = line[off] as i32;
    let cb = line[off + 1] as i32 - tail_hue;
    let cr = line[off + 2] as i32 - tail_hue;
    store_rgb(line, off, M::to_rgb(&coeffs, y, cb, cr));

    let y = line[off + 3] as i32;
    store_rgb(line, off + 3, M::to_rgb(&coeffs, y, cb, cr));
  });
}

/// 4:2:0 layout: one chroma pair per 2x2 pixel block. Writes a row pair
/// while reading chroma from the pair below, so this must stay a single
/// sequential writer, top to bottom.
fn interpolate_420<M: YuvMatrix>(img: &mut RawImage, coeffs: &[i32; 3], hue: i32) {
  let w = img.dim.x / 2 - 1;
  let h = img.dim.y / 2;
  let pitch = img.pitch();
  let hue = 16384 - hue;

  // The last row pair has no pair below it and is handled separately
  let end_h = h - 1;

  let data = img.pixels_mut();
  for y in 0..end_h {
    let c_line = y * 2 * pitch;
    let n_line = (y * 2 + 1) * pitch;
    let nn_line = (y * 2 + 2) * pitch;
    let mut off = 0;

    for _ in 0..w {
      let yv = data[c_line + off] as i32;
      let cb = data[c_line + off + 1] as i32 - hue;
      let cr = data[c_line + off + 2] as i32 - hue;
      store_rgb(data, c_line + off, M::to_rgb(coeffs, yv, cb, cr));

      let yv = data[c_line + off + 3] as i32;
      let cb2 = (cb + data[c_line + off + 1 + 6] as i32 - hue) >> 1;
      let cr2 = (cr + data[c_line + off + 2 + 6] as i32 - hue) >> 1;
      store_rgb(data, c_line + off + 3, M::to_rgb(coeffs, yv, cb2, cr2));

      let yv = data[n_line + off] as i32;
      let cb3 = (cb + data[nn_line + off + 1] as i32 - hue) >> 1;
      let cr3 = (cr + data[nn_line + off + 2] as i32 - hue) >> 1;
      store_rgb(data, n_line + off, M::to_rgb(coeffs, yv, cb3, cr3));

      // Left + above + right + below
      let yv = data[n_line + off + 3] as i32;
      let cb4 = (cb + cb2 + cb3 + data[nn_line + off + 1 + 6] as i32 - hue) >> 2;
      let cr4 = (cr + cr2 + cr3 + data[nn_line + off + 2 + 6] as i32 - hue) >> 2;
      store_rgb(data, n_line + off + 3, M::to_rgb(coeffs, yv, cb4, cr4));

      off += 6;
    }

    // Last column, no block to the right
    let yv = data[c_line + off] as i32;
    let cb = data[c_line + off + 1] as i32 - hue;
    let cr = data[c_line + off + 2] as i32 - hue;
    store_rgb(data, c_line + off, M::to_rgb(coeffs, yv, cb, cr));

    let yv = data[c_line + off + 3] as i32;
    store_rgb(data, c_line + off + 3, M::to_rgb(coeffs, yv, cb, cr));

    let yv = data[n_line + off] as i32;
    let cb = (cb + data[nn_line + off + 1] as i32 - hue) >> 1;
    let cr = (cr + data[nn_line + off + 2] as i32 - hue) >> 1;
    store_rgb(data, n_line + off, M::to_rgb(coeffs, yv, cb, cr));

    let yv = data[n_line + off + 3] as i32;
    store_rgb(data, n_line + off + 3, M::to_rgb(coeffs, yv, cb, cr));
  }

  // Bottom row pair: reuse the chroma of the current rows
  let c_line = end_h * 2 * pitch;
  let n_line = (end_h * 2 + 1) * pitch;
  let mut off = 0;
  for _ in 0..w {
    let yv = data[c_line + off] as i32;
    let cb = data[c_line + off + 1] as i32 - hue;
    let cr = data[c_line + off + 2] as i32 - hue;
    store_rgb(data, c_line + off, M::to_rgb(coeffs, yv, cb, cr));

    let yv = data[c_line + off + 3] as i32;
    store_rgb(data, c_line + off + 3, M::to_rgb(coeffs, yv, cb, cr));

    let yv = data[n_line + off] as i32;
    store_rgb(data, n_line + off, M::to_rgb(coeffs, yv, cb, cr));

    let yv = data[n_line + off + 3] as i32;
    store_rgb(data, n_line + off + 3, M::to_rgb(coeffs, yv, cb, cr));

    off += 6;
  }
}
