// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Data model for a parsed TIFF directory graph.
//!
//! The byte-level directory reader lives outside this crate; whatever parses
//! the file populates these structures and hands the decoder a
//! [`Cr2Container`] borrowing the file buffer.

pub mod container;
pub mod entry;
pub mod ifd;
pub mod value;

pub use container::Cr2Container;
pub use entry::Entry;
pub use ifd::IFD;
pub use value::{TiffAscii, Value, ValueConvertError};
