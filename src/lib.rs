//! Decoder core for Canon CR2 raw images.
//!
//! A CR2 file is a TIFF container whose payload is a lossless JPEG stream of
//! Bayer sensor samples, or subsampled Y/Cb/Cr components for the sRaw/mRaw
//! modes. This crate covers the CR2 specific pipeline: locating the payload
//! and its geometry in the directory graph, assembling the sliced bitstream
//! into one raster, reconstructing sRaw data to RGB and applying the
//! old-format linearisation curve.
//!
//! The generic TIFF reader, the lossless JPEG codec and the camera database
//! are collaborators: the caller parses the file into the
//! [`Cr2Container`] data model and provides implementations of
//! [`LjpegDecompressor`] and [`CameraRegistry`].
//!
//! # Example
//! ```rust,ignore
//! let container = Cr2Container::new(&buffer, chain);
//! let codec = MyLjpeg::new(&buffer);
//! let decoder = Cr2Decoder::new(&container, &codec, hints);
//! let mut image = decoder.raw_image(&RawDecodeParams::default(), false)?;
//! decoder.decode_metadata(&mut image)?;
//! ```

pub mod bits;
pub mod cfa;
pub mod decoders;
pub mod decompressors;
pub mod formats;
pub mod rawimage;
pub mod tags;

pub use cfa::{CFAColor, CFA};
pub use decoders::cr2::Cr2Decoder;
pub use decoders::{CameraRegistry, Cr2Error, DecodeHints, Decoder, RawDecodeParams, Result};
pub use decompressors::ljpeg::{LjpegDecompressor, LjpegError, SofInfo};
pub use formats::tiff::Cr2Container;
pub use rawimage::{Dim2, ImageMetadata, RawImage};
