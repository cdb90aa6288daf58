use std::fmt;

use num_enum::TryFromPrimitive;

/// Colours of the filter array. Canon sensors carry two distinct green
/// photosites per 2x2 block, so green is split into GREEN and GREEN2.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, TryFromPrimitive)]
#[repr(usize)]
#[allow(non_camel_case_types)]
pub enum CFAColor {
  RED = 0,
  GREEN = 1,
  BLUE = 2,
  GREEN2 = 3,
  UNKNOWN = 255,
}

impl Default for CFAColor {
  fn default() -> Self {
    Self::UNKNOWN
  }
}

impl CFAColor {
  fn letter(&self) -> char {
    match self {
      Self::RED => 'R',
      Self::GREEN => 'G',
      Self::BLUE => 'B',
      Self::GREEN2 => 'g',
      Self::UNKNOWN => 'U',
    }
  }
}

/// Representation of the 2x2 colour filter array pattern.
///
/// The color_at() implementation is designed to be cheap so it can be called
/// inside the inner loop of demosaic or other colour-aware algorithms that
/// work on pre-demosaic data.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CFA {
  /// CFA pattern as a string, one letter per photosite
  pub name: String,
  /// Width of the repeating pattern
  pub width: usize,
  /// Height of the repeating pattern
  pub height: usize,

  pattern: [[CFAColor; 2]; 2],
}

impl CFA {
  pub fn new_2x2(pattern: [[CFAColor; 2]; 2]) -> CFA {
    let name = pattern.iter().flatten().map(CFAColor::letter).collect();
    CFA {
      name,
      width: 2,
      height: 2,
      pattern,
    }
  }

  #[inline(always)]
  pub fn color_at(&self, row: usize, col: usize) -> CFAColor {
    self.pattern[row % 2][col % 2]
  }

  pub fn is_valid(&self) -> bool {
    self.width != 0 && self.height != 0
  }
}

impl fmt::Display for CFA {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rggb_pattern() {
    let cfa = CFA::new_2x2([[CFAColor::RED, CFAColor::GREEN], [CFAColor::GREEN2, CFAColor::BLUE]]);
    assert_eq!(cfa.name, "RGgB");
    assert_eq!(cfa.color_at(0, 0), CFAColor::RED);
    assert_eq!(cfa.color_at(0, 1), CFAColor::GREEN);
    assert_eq!(cfa.color_at(1, 0), CFAColor::GREEN2);
    assert_eq!(cfa.color_at(1, 1), CFAColor::BLUE);
    // pattern repeats
    assert_eq!(cfa.color_at(2, 2), CFAColor::RED);
    assert_eq!(cfa.color_at(3, 3), CFAColor::BLUE);
    assert!(cfa.is_valid());
  }

  #[test]
  fn default_is_empty() {
    assert!(!CFA::default().is_valid());
  }
}
