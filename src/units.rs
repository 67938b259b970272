//! # Geometry & Units
//!
//! Conversions between the units the canvases speak:
//!
//! | Canvas | Native unit | Converted to |
//! |--------|-------------|--------------|
//! | page | millimeter | screen pixels (preview) |
//! | label | millimeter | printer dots (203/300/600 DPI) |
//! | receipt, text | grid cell | millimeter (preview scaling) |
//!
//! ## Calculations
//!
//! ```text
//! dots_per_mm = dpi / 25.4
//!
//! For a 203 DPI label printer:
//!   dots_per_mm = 203 / 25.4 ≈ 7.99
//!   50mm = 399.6 dots
//! ```
//!
//! Every conversion here is a total function over `f64`. Pairs are inverse
//! of each other up to floating-point rounding.

use serde::{Deserialize, Serialize};

/// Millimeters in one inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Pixel density assumed for on-screen previews (CSS reference pixel).
pub const SCREEN_DPI: f64 = 96.0;

/// Convert millimeters to pixels at `dpi`, multiplied by a zoom `scale`.
pub fn mm_to_pixels(mm: f64, dpi: f64, scale: f64) -> f64 {
    mm / MM_PER_INCH * dpi * scale
}

/// Inverse of [`mm_to_pixels`].
pub fn pixels_to_mm(px: f64, dpi: f64, scale: f64) -> f64 {
    px / scale / dpi * MM_PER_INCH
}

/// Convert millimeters to printer dots at a label density.
///
/// The result is not rounded; compilers round at the point of emission.
pub fn mm_to_dots(mm: f64, dpi: Dpi) -> f64 {
    mm * dpi.dots_per_mm()
}

/// Inverse of [`mm_to_dots`].
pub fn dots_to_mm(dots: f64, dpi: Dpi) -> f64 {
    dots / dpi.dots_per_mm()
}

/// Millimeter length of `cells` grid cells of size `cell_mm`.
pub fn cells_to_mm(cells: f64, cell_mm: f64) -> f64 {
    cells * cell_mm
}

/// Grid cells covered by `mm` millimeters at cell size `cell_mm`.
pub fn mm_to_cells(mm: f64, cell_mm: f64) -> f64 {
    mm / cell_mm
}

/// Label printer density.
///
/// Serialized as the plain number (`203`, `300`, `600`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Dpi {
    /// 8 dots/mm
    #[default]
    Dpi203,
    /// 12 dots/mm
    Dpi300,
    /// 24 dots/mm
    Dpi600,
}

impl Dpi {
    /// All supported densities.
    pub const ALL: [Dpi; 3] = [Dpi::Dpi203, Dpi::Dpi300, Dpi::Dpi600];

    /// Dots per inch.
    pub fn value(self) -> u32 {
        match self {
            Dpi::Dpi203 => 203,
            Dpi::Dpi300 => 300,
            Dpi::Dpi600 => 600,
        }
    }

    pub fn dots_per_mm(self) -> f64 {
        f64::from(self.value()) / MM_PER_INCH
    }
}

impl TryFrom<u32> for Dpi {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            203 => Ok(Dpi::Dpi203),
            300 => Ok(Dpi::Dpi300),
            600 => Ok(Dpi::Dpi600),
            other => Err(format!("unsupported dpi {}, expected 203, 300 or 600", other)),
        }
    }
}

impl From<Dpi> for u32 {
    fn from(dpi: Dpi) -> Self {
        dpi.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_inch_is_screen_dpi_pixels() {
        assert!((mm_to_pixels(25.4, SCREEN_DPI, 1.0) - 96.0).abs() < EPS);
        assert!((mm_to_pixels(25.4, SCREEN_DPI, 2.0) - 192.0).abs() < EPS);
    }

    #[test]
    fn test_pixels_round_trip() {
        for mm in [0.0, 0.1, 12.5, 210.0, 297.0, 1234.567] {
            for scale in [0.25, 1.0, 3.0] {
                let px = mm_to_pixels(mm, SCREEN_DPI, scale);
                assert!((pixels_to_mm(px, SCREEN_DPI, scale) - mm).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_dots_round_trip() {
        for dpi in Dpi::ALL {
            for mm in [0.0, 1.0, 50.0, 101.6] {
                let dots = mm_to_dots(mm, dpi);
                assert!((dots_to_mm(dots, dpi) - mm).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_four_inch_label_at_203() {
        assert!((mm_to_dots(101.6, Dpi::Dpi203) - 812.0).abs() < EPS);
    }

    #[test]
    fn test_cells_round_trip() {
        let cell = 1.875;
        assert!((cells_to_mm(48.0, cell) - 90.0).abs() < EPS);
        assert!((mm_to_cells(cells_to_mm(17.0, cell), cell) - 17.0).abs() < EPS);
    }

    #[test]
    fn test_dpi_serde() {
        let dpi: Dpi = serde_json::from_str("300").unwrap();
        assert_eq!(dpi, Dpi::Dpi300);
        assert_eq!(serde_json::to_string(&Dpi::Dpi600).unwrap(), "600");
        assert!(serde_json::from_str::<Dpi>("150").is_err());
    }
}
