//! Canvas configuration, one variant per print technology.
//!
//! ```text
//! page     A4 portrait, margins      → absolute mm, HTML
//! label    50×30mm @ 203 DPI         → dots, ZPL
//! receipt  48 columns, auto-grow     → character grid, ESC/POS
//! text     80 columns                → character grid, plain text
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::units::{self, Dpi};

/// The print technology family a document targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasKind {
    Page,
    Label,
    Receipt,
    Text,
}

impl CanvasKind {
    pub const ALL: [CanvasKind; 4] = [
        CanvasKind::Page,
        CanvasKind::Label,
        CanvasKind::Receipt,
        CanvasKind::Text,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanvasKind::Page => "page",
            CanvasKind::Label => "label",
            CanvasKind::Receipt => "receipt",
            CanvasKind::Text => "text",
        }
    }
}

impl fmt::Display for CanvasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanvasKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanvasKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LayoutError::UnknownKind(s.to_string()))
    }
}

/// Canvas configuration, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CanvasConfig {
    Page(PageCanvas),
    Label(LabelCanvas),
    Receipt(ReceiptCanvas),
    Text(TextCanvas),
}

impl CanvasConfig {
    pub fn kind(&self) -> CanvasKind {
        match self {
            CanvasConfig::Page(_) => CanvasKind::Page,
            CanvasConfig::Label(_) => CanvasKind::Label,
            CanvasConfig::Receipt(_) => CanvasKind::Receipt,
            CanvasConfig::Text(_) => CanvasKind::Text,
        }
    }

    /// Default configuration for a kind.
    pub fn default_for(kind: CanvasKind) -> Self {
        match kind {
            CanvasKind::Page => CanvasConfig::Page(PageCanvas::default()),
            CanvasKind::Label => CanvasConfig::Label(LabelCanvas::default()),
            CanvasKind::Receipt => CanvasConfig::Receipt(ReceiptCanvas::default()),
            CanvasKind::Text => CanvasConfig::Text(TextCanvas::default()),
        }
    }
}

// ============================================================================
// PAGE
// ============================================================================

/// Paper presets. `Custom` reads `widthMm`/`heightMm` from the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    #[serde(rename = "custom")]
    Custom,
}

impl PaperSize {
    /// Portrait (width, height) in millimeters; `None` for custom.
    pub fn portrait_mm(self) -> Option<(f64, f64)> {
        match self {
            PaperSize::A3 => Some((297.0, 420.0)),
            PaperSize::A4 => Some((210.0, 297.0)),
            PaperSize::A5 => Some((148.0, 210.0)),
            PaperSize::Letter => Some((215.9, 279.4)),
            PaperSize::Legal => Some((215.9, 355.6)),
            PaperSize::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(mm: f64) -> Self {
        Self {
            top: mm,
            right: mm,
            bottom: mm,
            left: mm,
        }
    }
}

/// Paged document canvas, absolute millimeter coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageCanvas {
    pub paper: PaperSize,
    pub orientation: Orientation,
    /// Used when `paper` is custom.
    pub width_mm: Option<f64>,
    /// Used when `paper` is custom.
    pub height_mm: Option<f64>,
    pub margins_mm: Margins,
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            width_mm: None,
            height_mm: None,
            margins_mm: Margins::uniform(10.0),
        }
    }
}

impl PageCanvas {
    /// Custom-size page.
    pub fn custom(width_mm: f64, height_mm: f64) -> Self {
        Self {
            paper: PaperSize::Custom,
            width_mm: Some(width_mm),
            height_mm: Some(height_mm),
            ..Default::default()
        }
    }

    /// Effective (width, height) in millimeters after orientation.
    ///
    /// A custom paper missing a dimension falls back to A4 for that axis.
    pub fn size_mm(&self) -> (f64, f64) {
        let (a4_w, a4_h) = (210.0, 297.0);
        let (w, h) = self.paper.portrait_mm().unwrap_or((
            self.width_mm.unwrap_or(a4_w),
            self.height_mm.unwrap_or(a4_h),
        ));
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

// ============================================================================
// LABEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointMm {
    pub x: f64,
    pub y: f64,
}

/// Dot-addressed label canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelCanvas {
    pub dpi: Dpi,
    pub width_mm: f64,
    pub height_mm: f64,
    /// Print origin offset (ZPL `^LH`).
    pub origin_mm: Option<PointMm>,
}

impl Default for LabelCanvas {
    fn default() -> Self {
        Self {
            dpi: Dpi::Dpi203,
            width_mm: 50.0,
            height_mm: 30.0,
            origin_mm: None,
        }
    }
}

impl LabelCanvas {
    pub fn width_dots(&self) -> u32 {
        dots(self.width_mm, self.dpi)
    }

    pub fn height_dots(&self) -> u32 {
        dots(self.height_mm, self.dpi)
    }

    /// Millimeters to whole dots at this label's density.
    pub fn to_dots(&self, mm: f64) -> u32 {
        dots(mm, self.dpi)
    }
}

fn dots(mm: f64, dpi: Dpi) -> u32 {
    units::mm_to_dots(mm, dpi).round().max(0.0) as u32
}

// ============================================================================
// CHARACTER GRID (RECEIPT, TEXT)
// ============================================================================

/// Size of one grid cell, for preview scaling only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

/// Character encoding the device writer should use for receipt output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Gbk,
    Cp437,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Gbk => "gbk",
            Encoding::Cp437 => "cp437",
        }
    }
}

/// Paper cut after a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutMode {
    None,
    #[default]
    Partial,
    Full,
}

/// Character-grid geometry shared by receipt and text canvases.
pub trait GridCanvas {
    fn columns(&self) -> u32;
    fn min_rows(&self) -> u32;
    fn auto_grow_rows(&self) -> bool;
    fn cell_mm(&self) -> Option<CellSize>;

    /// Preview size in millimeters for `rows` rows, if a cell size is set.
    fn preview_size_mm(&self, rows: u32) -> Option<(f64, f64)> {
        self.cell_mm().map(|cell| {
            (
                units::cells_to_mm(f64::from(self.columns()), cell.width),
                units::cells_to_mm(f64::from(rows), cell.height),
            )
        })
    }
}

/// Thermal receipt canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceiptCanvas {
    pub columns: u32,
    pub min_rows: u32,
    pub auto_grow_rows: bool,
    pub cell_mm: Option<CellSize>,
    pub encoding: Encoding,
    pub cut: CutMode,
    /// Lines fed before the cut.
    pub feed_lines: u8,
}

impl Default for ReceiptCanvas {
    fn default() -> Self {
        Self {
            columns: 48,
            min_rows: 1,
            auto_grow_rows: true,
            cell_mm: None,
            encoding: Encoding::Utf8,
            cut: CutMode::Partial,
            feed_lines: 3,
        }
    }
}

impl GridCanvas for ReceiptCanvas {
    fn columns(&self) -> u32 {
        self.columns
    }
    fn min_rows(&self) -> u32 {
        self.min_rows
    }
    fn auto_grow_rows(&self) -> bool {
        self.auto_grow_rows
    }
    fn cell_mm(&self) -> Option<CellSize> {
        self.cell_mm
    }
}

/// Plain text canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextCanvas {
    pub columns: u32,
    pub min_rows: u32,
    pub auto_grow_rows: bool,
    pub cell_mm: Option<CellSize>,
}

impl Default for TextCanvas {
    fn default() -> Self {
        Self {
            columns: 80,
            min_rows: 1,
            auto_grow_rows: true,
            cell_mm: None,
        }
    }
}

impl GridCanvas for TextCanvas {
    fn columns(&self) -> u32 {
        self.columns
    }
    fn min_rows(&self) -> u32 {
        self.min_rows
    }
    fn auto_grow_rows(&self) -> bool {
        self.auto_grow_rows
    }
    fn cell_mm(&self) -> Option<CellSize> {
        self.cell_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_sizes() {
        assert_eq!(PageCanvas::default().size_mm(), (210.0, 297.0));
        let landscape = PageCanvas {
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        assert_eq!(landscape.size_mm(), (297.0, 210.0));
        assert_eq!(PageCanvas::custom(80.0, 200.0).size_mm(), (80.0, 200.0));
    }

    #[test]
    fn test_canvas_json_tagged_by_kind() {
        let json = r#"{"kind": "label", "dpi": 300, "widthMm": 100, "heightMm": 50}"#;
        let canvas: CanvasConfig = serde_json::from_str(json).unwrap();
        assert_eq!(canvas.kind(), CanvasKind::Label);
        let CanvasConfig::Label(label) = canvas else {
            panic!("expected label canvas");
        };
        assert_eq!(label.width_dots(), 1181);
        assert_eq!(label.height_dots(), 591);
        assert!(label.origin_mm.is_none());
    }

    #[test]
    fn test_page_json_paper_names() {
        let json = r#"{"kind": "page", "paper": "Letter", "orientation": "landscape"}"#;
        let CanvasConfig::Page(page) = serde_json::from_str(json).unwrap() else {
            panic!("expected page canvas");
        };
        assert_eq!(page.size_mm(), (279.4, 215.9));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Receipt".parse::<CanvasKind>().unwrap(), CanvasKind::Receipt);
        assert!("poster".parse::<CanvasKind>().is_err());
    }

    #[test]
    fn test_receipt_defaults() {
        let canvas: ReceiptCanvas = serde_json::from_str("{}").unwrap();
        assert_eq!(canvas.columns, 48);
        assert_eq!(canvas.cut, CutMode::Partial);
        assert_eq!(canvas.preview_size_mm(10), None);
        let with_cell = ReceiptCanvas {
            cell_mm: Some(CellSize {
                width: 1.5,
                height: 3.0,
            }),
            ..Default::default()
        };
        assert_eq!(with_cell.preview_size_mm(10), Some((72.0, 30.0)));
    }
}
