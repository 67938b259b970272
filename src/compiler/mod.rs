//! # Compilers
//!
//! Turn a document snapshot into a printer-ready template string. One
//! compiler per canvas kind:
//!
//! | Kind      | Output                                  |
//! |-----------|-----------------------------------------|
//! | `page`    | absolutely positioned HTML in mm        |
//! | `label`   | ZPL                                     |
//! | `receipt` | ESC/POS command stream                  |
//! | `text`    | plain text rows                         |
//!
//! Every compiler follows the same pipeline: drop hidden elements, order by
//! z (stable), emit one fragment per element, wrap fragments carrying a
//! `visibleIf` in `{{#if …}}…{{/if}}`, and escape literal text for the
//! output format while leaving `{{…}}` expressions untouched.
//!
//! Compilers are pure functions of their inputs. Problems that still leave a
//! usable output (a placeholder barcode, an element off the label) become
//! [`CompileWarning`]s instead of errors.

pub(crate) mod escpos;
pub(crate) mod grid;
pub mod label;
pub mod page;
pub mod receipt;
pub mod text;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::document::{
    CanvasConfig, CanvasKind, DocWire, Element, ElementBody, LabelShape, PageShape, ReceiptShape,
    TextShape,
};
use crate::error::Result;
use crate::template;

// ============================================================================
// OUTPUT
// ============================================================================

/// Result of compiling one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub kind: CanvasKind,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_hint: Option<PrintHint>,
    #[serde(default)]
    pub warnings: Vec<CompileWarning>,
}

impl CompileOutput {
    /// Whether any warning with `code` was raised.
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// Hints for the print pipeline that are not part of the template itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintHint {
    /// `"<W>mm <H>mm"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// Non-fatal compile diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    UnknownElementType,
    EmptyImageSrc,
    BarcodePlaceholder,
    QrcodePlaceholder,
    ImagePlaceholder,
    OutOfBounds,
    GridOverlap,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCode::UnknownElementType => "UNKNOWN_ELEMENT_TYPE",
            WarningCode::EmptyImageSrc => "EMPTY_IMAGE_SRC",
            WarningCode::BarcodePlaceholder => "BARCODE_PLACEHOLDER",
            WarningCode::QrcodePlaceholder => "QRCODE_PLACEHOLDER",
            WarningCode::ImagePlaceholder => "IMAGE_PLACEHOLDER",
            WarningCode::OutOfBounds => "OUT_OF_BOUNDS",
            WarningCode::GridOverlap => "GRID_OVERLAP",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

// ============================================================================
// EMIT CONTEXT
// ============================================================================

/// Output buffer and warning list threaded through one compile.
pub(crate) struct EmitContext {
    pub out: String,
    pub warnings: Vec<CompileWarning>,
}

impl EmitContext {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            warnings: Vec::new(),
        }
    }

    /// Append `s` followed by a newline.
    pub fn line(&mut self, s: &str) {
        self.out.push_str(s);
        self.out.push('\n');
    }

    pub fn warn(&mut self, code: WarningCode, element_id: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        warn!(%code, element_id, "{}", message);
        self.warnings.push(CompileWarning {
            code,
            message,
            element_id: element_id.map(str::to_owned),
        });
    }

    /// Record an element the lenient path could not parse for this kind.
    pub fn unknown(&mut self, unknown: &UnknownElement, kind: CanvasKind) {
        let message = format!(
            "element {} of type {:?} is not valid for a {} canvas: {}",
            unknown.index,
            unknown.type_name.as_deref().unwrap_or("?"),
            kind,
            unknown.message
        );
        self.warn(WarningCode::UnknownElementType, unknown.id.as_deref(), message);
    }

    pub fn finish(self, kind: CanvasKind, print_hint: Option<PrintHint>) -> CompileOutput {
        debug!(
            %kind,
            bytes = self.out.len(),
            warnings = self.warnings.len(),
            "compiled"
        );
        CompileOutput {
            kind,
            output: self.out,
            print_hint,
            warnings: self.warnings,
        }
    }
}

/// Apply an element's `visibleIf` to its compiled fragment.
pub(crate) fn conditional<B, G>(element: &Element<B, G>, fragment: String) -> String {
    match element.visible_if.as_deref().map(str::trim) {
        Some(condition) if !condition.is_empty() => template::wrap_conditional(condition, &fragment),
        _ => fragment,
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// An element that failed to parse for the document's kind on the lenient
/// path. Keeps enough of the raw JSON to order it and name it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnknownElement {
    pub index: usize,
    pub id: Option<String>,
    pub type_name: Option<String>,
    pub z: f64,
    pub hidden: bool,
    pub message: String,
}

impl UnknownElement {
    fn from_value(index: usize, value: &Value, message: String) -> Self {
        Self {
            index,
            id: value.get("id").and_then(Value::as_str).map(str::to_owned),
            type_name: value.get("type").and_then(Value::as_str).map(str::to_owned),
            z: value.get("z").and_then(Value::as_f64).unwrap_or(0.0),
            hidden: value.get("hidden").and_then(Value::as_bool).unwrap_or(false),
            message,
        }
    }
}

/// One entry of a compile, in emission order.
pub(crate) enum Item<'a, B, G> {
    Element(&'a Element<B, G>),
    Unknown(&'a UnknownElement),
}

impl<B, G> Item<'_, B, G> {
    fn z(&self) -> f64 {
        match self {
            Item::Element(e) => e.z,
            Item::Unknown(u) => u.z,
        }
    }

    fn hidden(&self) -> bool {
        match self {
            Item::Element(e) => e.hidden,
            Item::Unknown(u) => u.hidden,
        }
    }
}

/// Drop hidden entries and sort the rest by ascending z. Equal z keeps the
/// input order.
pub(crate) fn prepare<'a, B, G>(items: impl IntoIterator<Item = Item<'a, B, G>>) -> Vec<Item<'a, B, G>> {
    let mut items: Vec<_> = items.into_iter().filter(|item| !item.hidden()).collect();
    items.sort_by(|a, b| a.z().total_cmp(&b.z()));
    items
}

/// Owned element or parse failure, produced by the lenient path.
pub(crate) enum Entry<B, G> {
    Element(Element<B, G>),
    Unknown(UnknownElement),
}

impl<B, G> Entry<B, G> {
    pub fn item(&self) -> Item<'_, B, G> {
        match self {
            Entry::Element(e) => Item::Element(e),
            Entry::Unknown(u) => Item::Unknown(u),
        }
    }
}

fn parse_lenient<B, G>(values: &[Value]) -> Vec<Entry<B, G>>
where
    Element<B, G>: DeserializeOwned,
{
    values
        .iter()
        .enumerate()
        .map(|(index, value)| match Element::<B, G>::deserialize(value) {
            Ok(element) => Entry::Element(element),
            Err(e) => Entry::Unknown(UnknownElement::from_value(index, value, e.to_string())),
        })
        .collect()
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Compile a document given as raw JSON, tolerating bad elements.
///
/// The header (schema, version, kind agreement) must be valid. Elements are
/// parsed one at a time; one that does not fit the kind becomes an
/// `UNKNOWN_ELEMENT_TYPE` warning and an inert comment where the format has
/// one, and the rest still compile.
#[instrument(skip_all)]
pub fn compile_value(value: &Value) -> Result<CompileOutput> {
    let wire = DocWire::deserialize(value)?;
    wire.check_header()?;

    let output = match &wire.canvas {
        CanvasConfig::Page(canvas) => {
            let entries = parse_lenient::<PageShape, _>(&wire.elements);
            page::compile_items(entries.iter().map(Entry::item), canvas)
        }
        CanvasConfig::Label(canvas) => {
            let entries = parse_lenient::<LabelShape, _>(&wire.elements);
            label::compile_items(entries.iter().map(Entry::item), canvas)
        }
        CanvasConfig::Receipt(canvas) => {
            let entries = parse_lenient::<ReceiptShape, _>(&wire.elements);
            receipt::compile_items(entries.iter().map(Entry::item), canvas)
        }
        CanvasConfig::Text(canvas) => {
            let entries = parse_lenient::<TextShape, _>(&wire.elements);
            text::compile_items(entries.iter().map(Entry::item), canvas)
        }
    };
    Ok(output)
}

/// [`compile_value`] over a JSON string.
pub fn compile_str(json: &str) -> Result<CompileOutput> {
    let value: Value = serde_json::from_str(json)?;
    compile_value(&value)
}

/// Element `type` tags a canvas kind accepts.
pub fn element_types(kind: CanvasKind) -> &'static [&'static str] {
    match kind {
        CanvasKind::Page => PageShape::TYPES,
        CanvasKind::Label => LabelShape::TYPES,
        CanvasKind::Receipt => ReceiptShape::TYPES,
        CanvasKind::Text => TextShape::TYPES,
    }
}

/// `"<W>mm <H>mm"`, trailing zeros dropped.
pub(crate) fn paper_size(width_mm: f64, height_mm: f64) -> String {
    format!("{}mm {}mm", width_mm, height_mm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(kind: &str, elements: Value) -> Value {
        json!({
            "schema": "rprint.template",
            "version": 1,
            "meta": {"kind": kind, "name": "t"},
            "canvas": {"kind": kind},
            "elements": elements,
        })
    }

    #[test]
    fn test_warning_codes_serialize_screaming() {
        let json = serde_json::to_string(&WarningCode::QrcodePlaceholder).unwrap();
        assert_eq!(json, "\"QRCODE_PLACEHOLDER\"");
        for code in [
            WarningCode::UnknownElementType,
            WarningCode::EmptyImageSrc,
            WarningCode::BarcodePlaceholder,
            WarningCode::ImagePlaceholder,
            WarningCode::OutOfBounds,
            WarningCode::GridOverlap,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
    }

    #[test]
    fn test_output_shape() {
        let out = compile_value(&doc("page", json!([]))).unwrap();
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["kind"], "page");
        assert_eq!(value["printHint"]["paperSize"], "210mm 297mm");
        assert!(value["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_lenient_page_keeps_good_elements() {
        let elements = json!([
            {"id": "bad", "type": "hline", "rect": {"x": 0, "y": 0, "width": 1, "height": 1}},
            {"id": "ok", "type": "text", "content": "hi", "rect": {"x": 0, "y": 0, "width": 10, "height": 5}}
        ]);
        let out = compile_value(&doc("page", elements)).unwrap();
        assert!(out.output.contains(">hi</div>"));
        assert!(out.output.contains("<!--"));
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].code, WarningCode::UnknownElementType);
        assert_eq!(out.warnings[0].element_id.as_deref(), Some("bad"));
    }

    #[test]
    fn test_lenient_label_comment() {
        let elements = json!([{"id": "r", "type": "rect", "rect": {"x": 0, "y": 0, "width": 1, "height": 1}}]);
        let out = compile_value(&doc("label", elements)).unwrap();
        assert!(out.output.contains("^FX"));
        assert!(out.has_warning(WarningCode::UnknownElementType));
    }

    #[test]
    fn test_lenient_grid_kinds_emit_nothing() {
        let elements = json!([{"id": "i", "type": "image", "src": "x.png", "rect": {"col": 0, "row": 0}}]);
        let out = compile_value(&doc("text", elements)).unwrap();
        assert_eq!(out.output, "");
        assert!(out.has_warning(WarningCode::UnknownElementType));
    }

    #[test]
    fn test_hidden_unknown_is_skipped() {
        let elements = json!([{"id": "x", "type": "bogus", "hidden": true}]);
        let out = compile_value(&doc("receipt", elements)).unwrap();
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_grid_row_at_u32_max_is_dropped() {
        for kind in ["text", "receipt"] {
            for (auto_grow, min_rows) in [(true, 1), (false, 2)] {
                let mut value = doc(
                    kind,
                    json!([{"id": "far", "type": "text", "content": "x",
                            "rect": {"col": 0, "row": u32::MAX}}]),
                );
                value["canvas"]["autoGrowRows"] = json!(auto_grow);
                value["canvas"]["minRows"] = json!(min_rows);
                let out = compile_value(&value).unwrap();
                assert!(!out.output.contains('x'));
                assert_eq!(out.warnings.len(), 1);
                assert_eq!(out.warnings[0].code, WarningCode::OutOfBounds);
            }
        }
    }

    #[test]
    fn test_grid_row_span_is_bounded() {
        let elements = json!([{"id": "rule", "type": "hline",
                               "rect": {"col": 0, "row": 0, "rowSpan": 3_000_000}}]);
        let out = compile_value(&doc("text", elements)).unwrap();
        assert_eq!(out.output.lines().count(), grid::MAX_GRID_ROWS as usize);
        assert!(out.has_warning(WarningCode::OutOfBounds));
    }

    #[test]
    fn test_header_still_strict() {
        let mut value = doc("page", json!([]));
        value["canvas"]["kind"] = json!("label");
        assert!(compile_value(&value).is_err());
        value["canvas"]["kind"] = json!("page");
        value["schema"] = json!("other");
        assert!(compile_value(&value).is_err());
    }

    #[test]
    fn test_element_types() {
        assert_eq!(element_types(CanvasKind::Text), ["text", "hline"]);
        assert!(element_types(CanvasKind::Label).contains(&"box"));
        assert!(!element_types(CanvasKind::Page).contains(&"box"));
    }

    #[test]
    fn test_prepare_stable_by_z() {
        let elements = json!([
            {"id": "a", "type": "text", "content": "A", "z": 1, "rect": {"col": 0, "row": 0}},
            {"id": "b", "type": "text", "content": "B", "z": 0, "rect": {"col": 0, "row": 0}},
            {"id": "c", "type": "text", "content": "C", "z": 1, "rect": {"col": 0, "row": 0}},
            {"id": "d", "type": "text", "content": "D", "z": 0, "hidden": true, "rect": {"col": 0, "row": 0}}
        ]);
        let entries = parse_lenient::<TextShape, crate::document::GridRect>(
            elements.as_array().unwrap(),
        );
        let ordered: Vec<&str> = prepare(entries.iter().map(Entry::item))
            .into_iter()
            .map(|item| match item {
                Item::Element(e) => e.id.as_str(),
                Item::Unknown(_) => "?",
            })
            .collect();
        assert_eq!(ordered, ["b", "a", "c"]);
    }

    #[test]
    fn test_paper_size_format() {
        assert_eq!(paper_size(215.9, 279.4), "215.9mm 279.4mm");
        assert_eq!(paper_size(50.0, 30.0), "50mm 30mm");
    }
}
