use std::fmt::Debug;

/// Marker for enums which represent TIFF tag ids.
pub trait TiffTagEnum: Into<u16> + Copy + Clone + Debug {}

macro_rules! tiff_tag_enum {
  ($e:ty) => {
    impl $crate::tags::TiffTagEnum for $e {}

    impl From<$e> for u16 {
      fn from(v: $e) -> Self {
        v as u16
      }
    }

    impl std::convert::TryFrom<u16> for $e {
      type Error = String;

      fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        Self::n(value).ok_or(format!("Unable to convert tag: {}, not defined in enum", value))
      }
    }
  };
}

tiff_tag_enum!(TiffCommonTag);
tiff_tag_enum!(Cr2Tag);

/// Common TIFF tags used by the CR2 container structure.
#[derive(Debug, Copy, Clone, PartialEq, enumn::N)]
#[repr(u16)]
pub enum TiffCommonTag {
  ImageWidth = 0x0100,
  ImageLength = 0x0101,
  Make = 0x010F,
  Model = 0x0110,
  StripOffsets = 0x0111,
  StripByteCounts = 0x0117,
  GrayResponse = 0x0123,
  CFAPattern = 0x828E,
  ISOSpeedRatings = 0x8827,
}

/// Canon specific tags, found in the makernote and the raw IFD.
#[derive(Debug, Copy, Clone, PartialEq, enumn::N)]
#[repr(u16)]
pub enum Cr2Tag {
  ShotInfo = 0x0004,
  ModelId = 0x0010,
  PowerShotWB = 0x0029,
  OldRawOffset = 0x0081,
  OldWhiteBalance = 0x00A4,
  ColorData = 0x4001,
  FrameInfo = 0xC5D8,
  SliceWidths = 0xC640,
  SensorFormat = 0xC6C5,
}
