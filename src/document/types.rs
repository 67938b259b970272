//! Element types for the document model.
//!
//! All types derive `Serialize + Deserialize` so the same values travel
//! between the editor front end, storage and the compilers.
//!
//! Elements are generic over their body (the kind's tagged element enum) and
//! their geometry (millimeter or grid rectangle). A page document can only
//! hold [`PageShape`] bodies, a text document only [`TextShape`] bodies, and
//! so on: an element type that does not exist for a kind cannot be built.

use serde::{Deserialize, Serialize};

// ============================================================================
// GEOMETRY
// ============================================================================

/// Layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Rectangle in the canvas's native unit, as seen by the editing engine.
///
/// Positions and extents are exposed as `f64` so alignment and distribution
/// are written once for both unit systems. Grid rectangles round on write.
pub trait Geometry: Clone + PartialEq {
    /// Near edge along `axis` (x or y, column or row).
    fn position(&self, axis: Axis) -> f64;
    /// Size along `axis`.
    fn extent(&self, axis: Axis) -> f64;
    /// Move the near edge along `axis`, size unchanged.
    fn set_position(&mut self, axis: Axis, value: f64);

    /// Far edge along `axis`.
    fn end(&self, axis: Axis) -> f64 {
        self.position(axis) + self.extent(axis)
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        let x = self.position(Axis::Horizontal) + dx;
        let y = self.position(Axis::Vertical) + dy;
        self.set_position(Axis::Horizontal, x);
        self.set_position(Axis::Vertical, y);
    }
}

/// Absolute rectangle in millimeters (page and label canvases).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MmRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl MmRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

impl Geometry for MmRect {
    fn position(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    fn set_position(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Horizontal => self.x = value,
            Axis::Vertical => self.y = value,
        }
    }
}

fn default_span() -> u32 {
    1
}

/// Character-grid rectangle (receipt and text canvases).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRect {
    pub col: u32,
    pub row: u32,
    #[serde(default = "default_span")]
    pub col_span: u32,
    #[serde(default = "default_span")]
    pub row_span: u32,
}

impl Default for GridRect {
    fn default() -> Self {
        Self {
            col: 0,
            row: 0,
            col_span: 1,
            row_span: 1,
        }
    }
}

impl GridRect {
    pub fn new(col: u32, row: u32, col_span: u32, row_span: u32) -> Self {
        Self {
            col,
            row,
            col_span,
            row_span,
        }
    }
}

impl Geometry for GridRect {
    fn position(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => f64::from(self.col),
            Axis::Vertical => f64::from(self.row),
        }
    }

    fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => f64::from(self.col_span),
            Axis::Vertical => f64::from(self.row_span),
        }
    }

    fn set_position(&mut self, axis: Axis, value: f64) {
        // Cells are whole and never negative.
        let cell = value.round().max(0.0) as u32;
        match axis {
            Axis::Horizontal => self.col = cell,
            Axis::Vertical => self.row = cell,
        }
    }
}

// ============================================================================
// CONTENT
// ============================================================================

/// One piece of a mixed content sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPart {
    Literal {
        value: String,
    },
    Expression {
        expr: String,
        #[serde(default)]
        raw: bool,
    },
}

/// Text content of a text-bearing element.
///
/// In JSON either a bare string (static literal) or a tagged object:
///
/// ```json
/// "Thank you"
/// {"kind": "expression", "expr": "order.id"}
/// {"kind": "mixed", "parts": [{"kind": "literal", "value": "Order "},
///                              {"kind": "expression", "expr": "order.id"}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    /// Literal text. May itself contain `{{…}}` written by hand; those
    /// survive compilation like any other expression.
    Static { value: String },
    /// A single expression, stored without braces.
    Expression {
        expr: String,
        /// `true` renders as `{{{expr}}}` (unescaped substitution).
        #[serde(default)]
        raw: bool,
    },
    Mixed { parts: Vec<ContentPart> },
}

impl Default for Content {
    fn default() -> Self {
        Content::Static {
            value: String::new(),
        }
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Static {
            value: value.to_string(),
        }
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Static { value }
    }
}

fn expression_source(expr: &str, raw: bool) -> String {
    let expr = expr.trim();
    if raw {
        format!("{{{{{{{}}}}}}}", expr)
    } else {
        format!("{{{{{}}}}}", expr)
    }
}

impl Content {
    /// Single expression content.
    pub fn expression(expr: impl Into<String>) -> Self {
        Content::Expression {
            expr: expr.into(),
            raw: false,
        }
    }

    /// Template source for this content, expressions in brace form.
    pub fn to_template(&self) -> String {
        match self {
            Content::Static { value } => value.clone(),
            Content::Expression { expr, raw } => expression_source(expr, *raw),
            Content::Mixed { parts } => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Literal { value } => value.clone(),
                    ContentPart::Expression { expr, raw } => expression_source(expr, *raw),
                })
                .collect(),
        }
    }
}

/// Deserialize [`Content`] from a bare string or the tagged object form.
pub(crate) fn deserialize_content<'de, D>(deserializer: D) -> Result<Content, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ContentValue {
        Shorthand(String),
        Full(Content),
    }

    match ContentValue::deserialize(deserializer)? {
        ContentValue::Shorthand(value) => Ok(Content::Static { value }),
        ContentValue::Full(content) => Ok(content),
    }
}

// ============================================================================
// ELEMENT
// ============================================================================

/// A positioned, styled unit of content on a canvas.
///
/// `B` is the kind's tagged body enum (its `type` field is flattened into
/// the element object), `G` the kind's rectangle type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element<B, G> {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Paint and emission order. Not necessarily an integer.
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
    /// Render-time visibility expression, without braces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<String>,
    pub rect: G,
    #[serde(flatten)]
    pub body: B,
}

/// Behaviour shared by every kind's element body enum.
pub trait ElementBody: Clone + PartialEq {
    /// The `type` tags this kind accepts.
    const TYPES: &'static [&'static str];

    /// The `type` tag of this body.
    fn type_name(&self) -> &'static str;
}

pub type PageElement = Element<PageShape, MmRect>;
pub type LabelElement = Element<LabelShape, MmRect>;
pub type ReceiptElement = Element<ReceiptShape, GridRect>;
pub type TextElement = Element<TextShape, GridRect>;

// ============================================================================
// SHARED STYLE VOCABULARY
// ============================================================================

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Stroke pattern for page lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// How an image fills its box on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    #[default]
    Contain,
    Cover,
    Fill,
    None,
}

/// 1D barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    #[default]
    Code128,
    Code39,
    Ean13,
    Upca,
}

impl Symbology {
    pub fn as_str(self) -> &'static str {
        match self {
            Symbology::Code128 => "code128",
            Symbology::Code39 => "code39",
            Symbology::Ean13 => "ean13",
            Symbology::Upca => "upca",
        }
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrErrorLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl QrErrorLevel {
    pub fn as_char(self) -> char {
        match self {
            QrErrorLevel::L => 'L',
            QrErrorLevel::M => 'M',
            QrErrorLevel::Q => 'Q',
            QrErrorLevel::H => 'H',
        }
    }
}

// ============================================================================
// PAGE ELEMENTS
// ============================================================================

/// Text style on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageTextStyle {
    pub font_family: String,
    pub font_size_pt: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: String,
    pub align: TextAlign,
    pub line_height: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
}

impl Default for PageTextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".into(),
            font_size_pt: 10.0,
            bold: false,
            italic: false,
            underline: false,
            color: "#000000".into(),
            align: TextAlign::Left,
            line_height: 1.2,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageRectStyle {
    pub stroke_width_mm: f64,
    pub stroke_color: String,
    pub fill: Option<String>,
    pub corner_radius_mm: f64,
    pub rotation: f64,
}

impl Default for PageRectStyle {
    fn default() -> Self {
        Self {
            stroke_width_mm: 0.3,
            stroke_color: "#000000".into(),
            fill: None,
            corner_radius_mm: 0.0,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageLineStyle {
    pub stroke_width_mm: f64,
    pub color: String,
    pub dash: LineDash,
    pub rotation: f64,
}

impl Default for PageLineStyle {
    fn default() -> Self {
        Self {
            stroke_width_mm: 0.3,
            color: "#000000".into(),
            dash: LineDash::Solid,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageImageStyle {
    pub fit: ImageFit,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarcodeStyle {
    pub symbology: Symbology,
    pub show_text: bool,
    pub rotation: f64,
}

impl Default for BarcodeStyle {
    fn default() -> Self {
        Self {
            symbology: Symbology::Code128,
            show_text: true,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QrStyle {
    pub error_level: QrErrorLevel,
    pub rotation: f64,
}

/// Element types of a page canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageShape {
    Text {
        #[serde(deserialize_with = "deserialize_content")]
        content: Content,
        #[serde(default)]
        style: PageTextStyle,
    },
    Rect {
        #[serde(default)]
        style: PageRectStyle,
    },
    Line {
        #[serde(default)]
        style: PageLineStyle,
    },
    Image {
        #[serde(default)]
        src: String,
        #[serde(default)]
        style: PageImageStyle,
    },
    Barcode {
        #[serde(deserialize_with = "deserialize_content")]
        data: Content,
        #[serde(default)]
        style: BarcodeStyle,
    },
    #[serde(rename = "qrcode")]
    QrCode {
        #[serde(deserialize_with = "deserialize_content")]
        data: Content,
        #[serde(default)]
        style: QrStyle,
    },
}

impl ElementBody for PageShape {
    const TYPES: &'static [&'static str] = &["text", "rect", "line", "image", "barcode", "qrcode"];

    fn type_name(&self) -> &'static str {
        match self {
            PageShape::Text { .. } => "text",
            PageShape::Rect { .. } => "rect",
            PageShape::Line { .. } => "line",
            PageShape::Image { .. } => "image",
            PageShape::Barcode { .. } => "barcode",
            PageShape::QrCode { .. } => "qrcode",
        }
    }
}

impl PageShape {
    pub fn text(content: impl Into<Content>) -> Self {
        PageShape::Text {
            content: content.into(),
            style: PageTextStyle::default(),
        }
    }
}

// ============================================================================
// LABEL ELEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelTextStyle {
    pub font_height_dots: u32,
    /// 0 scales proportionally to the height.
    pub font_width_dots: u32,
    pub align: TextAlign,
    pub max_lines: u32,
    pub rotation: f64,
}

impl Default for LabelTextStyle {
    fn default() -> Self {
        Self {
            font_height_dots: 30,
            font_width_dots: 0,
            align: TextAlign::Left,
            max_lines: 1,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelBoxStyle {
    pub thickness_dots: u32,
    /// ZPL corner rounding, 0 to 8.
    pub corner_rounding: u8,
    pub fill: bool,
}

impl Default for LabelBoxStyle {
    fn default() -> Self {
        Self {
            thickness_dots: 2,
            corner_rounding: 0,
            fill: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelLineStyle {
    pub thickness_dots: u32,
}

impl Default for LabelLineStyle {
    fn default() -> Self {
        Self { thickness_dots: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelBarcodeStyle {
    pub symbology: Symbology,
    pub module_width_dots: u32,
    pub height_dots: u32,
    pub show_text: bool,
    pub rotation: f64,
}

impl Default for LabelBarcodeStyle {
    fn default() -> Self {
        Self {
            symbology: Symbology::Code128,
            module_width_dots: 2,
            height_dots: 80,
            show_text: true,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelQrStyle {
    pub error_level: QrErrorLevel,
    pub magnification: u32,
}

impl Default for LabelQrStyle {
    fn default() -> Self {
        Self {
            error_level: QrErrorLevel::M,
            magnification: 4,
        }
    }
}

/// Element types of a label canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LabelShape {
    Text {
        #[serde(deserialize_with = "deserialize_content")]
        content: Content,
        #[serde(default)]
        style: LabelTextStyle,
    },
    Box {
        #[serde(default)]
        style: LabelBoxStyle,
    },
    Line {
        #[serde(default)]
        style: LabelLineStyle,
    },
    Image {
        #[serde(default)]
        src: String,
    },
    Barcode {
        #[serde(deserialize_with = "deserialize_content")]
        data: Content,
        #[serde(default)]
        style: LabelBarcodeStyle,
    },
    #[serde(rename = "qrcode")]
    QrCode {
        #[serde(deserialize_with = "deserialize_content")]
        data: Content,
        #[serde(default)]
        style: LabelQrStyle,
    },
}

impl ElementBody for LabelShape {
    const TYPES: &'static [&'static str] = &["text", "box", "line", "image", "barcode", "qrcode"];

    fn type_name(&self) -> &'static str {
        match self {
            LabelShape::Text { .. } => "text",
            LabelShape::Box { .. } => "box",
            LabelShape::Line { .. } => "line",
            LabelShape::Image { .. } => "image",
            LabelShape::Barcode { .. } => "barcode",
            LabelShape::QrCode { .. } => "qrcode",
        }
    }
}

// ============================================================================
// RECEIPT ELEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceiptTextStyle {
    pub align: TextAlign,
    pub bold: bool,
    pub underline: bool,
    pub double_width: bool,
    pub double_height: bool,
    /// White on black.
    pub invert: bool,
}

/// Horizontal rule drawn with a repeated character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleStyle {
    pub ch: char,
}

impl Default for RuleStyle {
    fn default() -> Self {
        Self { ch: '-' }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceiptBarcodeStyle {
    pub symbology: Symbology,
    pub height_dots: u8,
    /// Module width, 2 to 6.
    pub module_width: u8,
    pub show_text: bool,
}

impl Default for ReceiptBarcodeStyle {
    fn default() -> Self {
        Self {
            symbology: Symbology::Code128,
            height_dots: 80,
            module_width: 2,
            show_text: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReceiptQrStyle {
    pub error_level: QrErrorLevel,
    /// Module size in dots, 1 to 16.
    pub module_size: u8,
}

impl Default for ReceiptQrStyle {
    fn default() -> Self {
        Self {
            error_level: QrErrorLevel::M,
            module_size: 4,
        }
    }
}

/// Element types of a receipt canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReceiptShape {
    Text {
        #[serde(deserialize_with = "deserialize_content")]
        content: Content,
        #[serde(default)]
        style: ReceiptTextStyle,
    },
    #[serde(rename = "hline")]
    HLine {
        #[serde(default)]
        style: RuleStyle,
    },
    Barcode {
        #[serde(deserialize_with = "deserialize_content")]
        data: Content,
        #[serde(default)]
        style: ReceiptBarcodeStyle,
    },
    #[serde(rename = "qrcode")]
    QrCode {
        #[serde(deserialize_with = "deserialize_content")]
        data: Content,
        #[serde(default)]
        style: ReceiptQrStyle,
    },
    Image {
        #[serde(default)]
        src: String,
    },
}

impl ElementBody for ReceiptShape {
    const TYPES: &'static [&'static str] = &["text", "hline", "barcode", "qrcode", "image"];

    fn type_name(&self) -> &'static str {
        match self {
            ReceiptShape::Text { .. } => "text",
            ReceiptShape::HLine { .. } => "hline",
            ReceiptShape::Barcode { .. } => "barcode",
            ReceiptShape::QrCode { .. } => "qrcode",
            ReceiptShape::Image { .. } => "image",
        }
    }
}

impl ReceiptShape {
    pub fn text(content: impl Into<Content>) -> Self {
        ReceiptShape::Text {
            content: content.into(),
            style: ReceiptTextStyle::default(),
        }
    }
}

// ============================================================================
// TEXT ELEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlainTextStyle {
    pub align: TextAlign,
}

/// Element types of a plain-text canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextShape {
    Text {
        #[serde(deserialize_with = "deserialize_content")]
        content: Content,
        #[serde(default)]
        style: PlainTextStyle,
    },
    #[serde(rename = "hline")]
    HLine {
        #[serde(default)]
        style: RuleStyle,
    },
}

impl ElementBody for TextShape {
    const TYPES: &'static [&'static str] = &["text", "hline"];

    fn type_name(&self) -> &'static str {
        match self {
            TextShape::Text { .. } => "text",
            TextShape::HLine { .. } => "hline",
        }
    }
}

impl TextShape {
    pub fn text(content: impl Into<Content>) -> Self {
        TextShape::Text {
            content: content.into(),
            style: PlainTextStyle::default(),
        }
    }
}
