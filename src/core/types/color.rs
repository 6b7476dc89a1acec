//! Fixed visualization color palette.

use nalgebra::Vector3;

use crate::error::{Error, Result};

/// Number of entries in the palette table.
pub const NUM_PALETTE_COLORS: u8 = 13;

/// An RGBA color with channels in `[0, 1]`.
///
/// The palette codes match the original marker palette: 0 = white,
/// 1 = black, 2 = gray, then the saturated hues. Codes 0 and 1 are reserved
/// for axes/text, so per-submap tinting cycles through codes `2..13` only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
    pub const fn gray() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }
    pub const fn red() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
    pub const fn green() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }
    pub const fn blue() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
    pub const fn yellow() -> Self {
        Self::new(1.0, 1.0, 0.0)
    }
    pub const fn orange() -> Self {
        Self::new(1.0, 0.5, 0.0)
    }
    pub const fn purple() -> Self {
        Self::new(0.5, 0.0, 1.0)
    }
    pub const fn chartreuse() -> Self {
        Self::new(0.5, 1.0, 0.0)
    }
    pub const fn teal() -> Self {
        Self::new(0.0, 1.0, 1.0)
    }
    pub const fn pink() -> Self {
        Self::new(1.0, 0.0, 0.5)
    }
    pub const fn magenta() -> Self {
        Self::new(1.0, 0.0, 1.0)
    }

    /// Look up a palette entry by code.
    ///
    /// An out-of-range code is a programming error at the call site, so it
    /// is surfaced as a hard failure instead of a fallback color.
    pub fn from_code(code: u8) -> Result<Self> {
        let color = match code {
            0 => Self::white(),
            1 => Self::black(),
            2 => Self::gray(),
            3 => Self::red(),
            4 => Self::green(),
            5 => Self::blue(),
            6 => Self::yellow(),
            7 => Self::orange(),
            8 => Self::purple(),
            9 => Self::chartreuse(),
            10 => Self::teal(),
            11 => Self::pink(),
            12 => Self::magenta(),
            _ => return Err(Error::UnknownColorCode(code)),
        };
        Ok(color)
    }

    /// Deterministic per-submap tint, cycling through codes `2..13`.
    pub fn for_submap(index: usize) -> Self {
        let code = (index % (NUM_PALETTE_COLORS as usize - 2) + 2) as u8;
        // Always in range by construction
        Self::from_code(code).unwrap_or_else(|_| Self::gray())
    }

    /// RGB channels as a vector.
    pub fn rgb(&self) -> Vector3<f64> {
        Vector3::new(self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_palette_codes_resolve() {
        for code in 0..NUM_PALETTE_COLORS {
            assert!(Color::from_code(code).is_ok(), "code {} missing", code);
        }
    }

    #[test]
    fn test_out_of_range_code_is_an_error() {
        assert!(matches!(
            Color::from_code(NUM_PALETTE_COLORS),
            Err(Error::UnknownColorCode(_))
        ));
        assert!(Color::from_code(255).is_err());
    }

    #[test]
    fn test_submap_tint_skips_white_and_black() {
        for i in 0..40 {
            let c = Color::for_submap(i);
            assert_ne!(c, Color::white());
            assert_ne!(c, Color::black());
        }
        // Cycle length is the palette minus the two reserved codes
        assert_eq!(Color::for_submap(0), Color::for_submap(11));
    }
}
