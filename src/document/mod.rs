//! # Document Model
//!
//! A [`TemplateDoc`] is one print layout: metadata, editor view state, a
//! canvas configuration and the elements placed on it.
//!
//! ```
//! use rprint_layout::document::TemplateDoc;
//!
//! let json = r#"{
//!     "schema": "rprint.template",
//!     "version": 1,
//!     "meta": {"kind": "page", "name": "Invoice"},
//!     "canvas": {"kind": "page", "paper": "A4"},
//!     "elements": [
//!         {"id": "t1", "type": "text", "content": "Order {{id}}",
//!          "rect": {"x": 0, "y": 0, "width": 50, "height": 10}}
//!     ]
//! }"#;
//!
//! let doc = TemplateDoc::from_json(json).unwrap();
//! let compiled = doc.compile();
//! assert!(compiled.output.contains("Order {{id}}"));
//! ```
//!
//! ## Kind consistency
//!
//! On the wire `meta.kind`, `canvas.kind` and each element's `type` are
//! independent fields. Loading checks that they agree and builds a
//! [`DocBody`] variant that owns both the canvas and the elements of one
//! kind, so a disagreeing document cannot exist in memory.

pub mod canvas;
pub mod types;

pub use canvas::*;
pub use types::*;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::compiler::{self, CompileOutput};
use crate::error::{LayoutError, Result};

/// Value of the `schema` field.
pub const SCHEMA_NAME: &str = "rprint.template";

/// Newest schema version this crate reads and the one it writes.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// METADATA
// ============================================================================

/// Descriptive document metadata. The kind lives in [`DocBody`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_zoom() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_grid_size() -> f64 {
    1.0
}

/// Editor view state saved with the document. The compilers ignore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default)]
    pub snap_to_grid: bool,
    #[serde(default = "default_grid_size")]
    pub grid_size_mm: f64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            show_grid: true,
            snap_to_grid: false,
            grid_size_mm: 1.0,
        }
    }
}

// ============================================================================
// BODY
// ============================================================================

/// Canvas and elements of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DocBody {
    Page {
        canvas: PageCanvas,
        elements: Vec<PageElement>,
    },
    Label {
        canvas: LabelCanvas,
        elements: Vec<LabelElement>,
    },
    Receipt {
        canvas: ReceiptCanvas,
        elements: Vec<ReceiptElement>,
    },
    Text {
        canvas: TextCanvas,
        elements: Vec<TextElement>,
    },
}

impl DocBody {
    /// Empty body for a canvas.
    pub fn empty(canvas: CanvasConfig) -> Self {
        match canvas {
            CanvasConfig::Page(canvas) => DocBody::Page {
                canvas,
                elements: Vec::new(),
            },
            CanvasConfig::Label(canvas) => DocBody::Label {
                canvas,
                elements: Vec::new(),
            },
            CanvasConfig::Receipt(canvas) => DocBody::Receipt {
                canvas,
                elements: Vec::new(),
            },
            CanvasConfig::Text(canvas) => DocBody::Text {
                canvas,
                elements: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> CanvasKind {
        match self {
            DocBody::Page { .. } => CanvasKind::Page,
            DocBody::Label { .. } => CanvasKind::Label,
            DocBody::Receipt { .. } => CanvasKind::Receipt,
            DocBody::Text { .. } => CanvasKind::Text,
        }
    }

    /// Canvas as the tagged config.
    pub fn canvas(&self) -> CanvasConfig {
        match self {
            DocBody::Page { canvas, .. } => CanvasConfig::Page(canvas.clone()),
            DocBody::Label { canvas, .. } => CanvasConfig::Label(canvas.clone()),
            DocBody::Receipt { canvas, .. } => CanvasConfig::Receipt(canvas.clone()),
            DocBody::Text { canvas, .. } => CanvasConfig::Text(canvas.clone()),
        }
    }

    pub fn element_count(&self) -> usize {
        match self {
            DocBody::Page { elements, .. } => elements.len(),
            DocBody::Label { elements, .. } => elements.len(),
            DocBody::Receipt { elements, .. } => elements.len(),
            DocBody::Text { elements, .. } => elements.len(),
        }
    }

    /// Element ids in storage order.
    pub fn element_ids(&self) -> Vec<&str> {
        fn ids<B, G>(elements: &[Element<B, G>]) -> Vec<&str> {
            elements.iter().map(|e| e.id.as_str()).collect()
        }
        match self {
            DocBody::Page { elements, .. } => ids(elements),
            DocBody::Label { elements, .. } => ids(elements),
            DocBody::Receipt { elements, .. } => ids(elements),
            DocBody::Text { elements, .. } => ids(elements),
        }
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// A print layout document.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDoc {
    pub version: u32,
    pub meta: DocMeta,
    pub editor_state: EditorState,
    pub body: DocBody,
}

impl TemplateDoc {
    /// Create an empty document for a canvas.
    pub fn new(name: impl Into<String>, canvas: CanvasConfig) -> Self {
        let now = Utc::now();
        Self {
            version: SCHEMA_VERSION,
            meta: DocMeta {
                name: name.into(),
                description: None,
                created_at: Some(now),
                updated_at: Some(now),
            },
            editor_state: EditorState::default(),
            body: DocBody::empty(canvas),
        }
    }

    pub fn kind(&self) -> CanvasKind {
        self.body.kind()
    }

    /// Replace the canvas configuration.
    ///
    /// Switching to another kind is only allowed while the document has no
    /// elements; otherwise the existing elements would belong to the wrong
    /// kind.
    pub fn set_canvas(&mut self, canvas: CanvasConfig) -> Result<()> {
        let current = self.kind();
        match (&mut self.body, canvas) {
            (DocBody::Page { canvas: c, .. }, CanvasConfig::Page(new)) => *c = new,
            (DocBody::Label { canvas: c, .. }, CanvasConfig::Label(new)) => *c = new,
            (DocBody::Receipt { canvas: c, .. }, CanvasConfig::Receipt(new)) => *c = new,
            (DocBody::Text { canvas: c, .. }, CanvasConfig::Text(new)) => *c = new,
            (body, new) => {
                if body.element_count() > 0 {
                    return Err(LayoutError::KindMismatch {
                        expected: current,
                        found: new.kind(),
                    });
                }
                *body = DocBody::empty(new);
            }
        }
        self.touch();
        Ok(())
    }

    /// Stamp `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.meta.updated_at = Some(Utc::now());
    }

    /// Parse and validate a document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let wire: DocWire = serde_json::from_str(json)?;
        Self::try_from(wire)
    }

    /// [`TemplateDoc::from_json`] for an already-parsed value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let wire: DocWire = serde_json::from_value(value)?;
        Self::try_from(wire)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compile with the compiler matching this document's kind.
    pub fn compile(&self) -> CompileOutput {
        match &self.body {
            DocBody::Page { canvas, elements } => compiler::page::compile(elements, canvas),
            DocBody::Label { canvas, elements } => compiler::label::compile(elements, canvas),
            DocBody::Receipt { canvas, elements } => compiler::receipt::compile(elements, canvas),
            DocBody::Text { canvas, elements } => compiler::text::compile(elements, canvas),
        }
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MetaWire {
    pub kind: CanvasKind,
    #[serde(flatten)]
    pub meta: DocMeta,
}

/// The JSON shape of a document before kind validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocWire {
    pub schema: String,
    pub version: u32,
    pub meta: MetaWire,
    #[serde(default)]
    pub editor_state: EditorState,
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
}

impl DocWire {
    /// Check schema name, version and kind agreement.
    pub(crate) fn check_header(&self) -> Result<()> {
        if self.schema != SCHEMA_NAME {
            return Err(LayoutError::UnsupportedSchema(self.schema.clone()));
        }
        if self.version > SCHEMA_VERSION {
            return Err(LayoutError::UnsupportedVersion {
                found: self.version,
                supported: SCHEMA_VERSION,
            });
        }
        if self.meta.kind != self.canvas.kind() {
            return Err(LayoutError::KindMismatch {
                expected: self.meta.kind,
                found: self.canvas.kind(),
            });
        }
        Ok(())
    }
}

/// Parse every element as one kind, rejecting the first that does not fit.
fn parse_elements<B, G>(values: Vec<serde_json::Value>) -> Result<Vec<Element<B, G>>>
where
    Element<B, G>: DeserializeOwned,
{
    let elements: Vec<Element<B, G>> = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| LayoutError::InvalidElement {
                index,
                message: e.to_string(),
            })
        })
        .collect::<Result<_>>()?;

    let mut seen = HashSet::new();
    for element in &elements {
        if !seen.insert(element.id.as_str()) {
            return Err(LayoutError::DuplicateId(element.id.clone()));
        }
    }
    Ok(elements)
}

impl TryFrom<DocWire> for TemplateDoc {
    type Error = LayoutError;

    fn try_from(wire: DocWire) -> Result<Self> {
        wire.check_header()?;
        let body = match wire.canvas {
            CanvasConfig::Page(canvas) => DocBody::Page {
                canvas,
                elements: parse_elements(wire.elements)?,
            },
            CanvasConfig::Label(canvas) => DocBody::Label {
                canvas,
                elements: parse_elements(wire.elements)?,
            },
            CanvasConfig::Receipt(canvas) => DocBody::Receipt {
                canvas,
                elements: parse_elements(wire.elements)?,
            },
            CanvasConfig::Text(canvas) => DocBody::Text {
                canvas,
                elements: parse_elements(wire.elements)?,
            },
        };
        Ok(Self {
            version: wire.version,
            meta: wire.meta.meta,
            editor_state: wire.editor_state,
            body,
        })
    }
}

impl<'de> Deserialize<'de> for TemplateDoc {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = DocWire::deserialize(deserializer)?;
        TemplateDoc::try_from(wire).map_err(serde::de::Error::custom)
    }
}

impl Serialize for TemplateDoc {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum ElementsRef<'a> {
            Page(&'a [PageElement]),
            Label(&'a [LabelElement]),
            Receipt(&'a [ReceiptElement]),
            Text(&'a [TextElement]),
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct MetaRef<'a> {
            kind: CanvasKind,
            #[serde(flatten)]
            meta: &'a DocMeta,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            schema: &'static str,
            version: u32,
            meta: MetaRef<'a>,
            editor_state: &'a EditorState,
            canvas: CanvasConfig,
            elements: ElementsRef<'a>,
        }

        let elements = match &self.body {
            DocBody::Page { elements, .. } => ElementsRef::Page(elements),
            DocBody::Label { elements, .. } => ElementsRef::Label(elements),
            DocBody::Receipt { elements, .. } => ElementsRef::Receipt(elements),
            DocBody::Text { elements, .. } => ElementsRef::Text(elements),
        };

        Wire {
            schema: SCHEMA_NAME,
            version: self.version,
            meta: MetaRef {
                kind: self.kind(),
                meta: &self.meta,
            },
            editor_state: &self.editor_state,
            canvas: self.body.canvas(),
            elements,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_json(meta_kind: &str, canvas_kind: &str, elements: &str) -> String {
        format!(
            r#"{{"schema": "rprint.template", "version": 1,
                "meta": {{"kind": "{}", "name": "t"}},
                "canvas": {{"kind": "{}"}},
                "elements": {}}}"#,
            meta_kind, canvas_kind, elements
        )
    }

    #[test]
    fn test_minimal_document() {
        let doc = TemplateDoc::from_json(&doc_json("text", "text", "[]")).unwrap();
        assert_eq!(doc.kind(), CanvasKind::Text);
        assert_eq!(doc.body.element_count(), 0);
        assert_eq!(doc.editor_state, EditorState::default());
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let err = TemplateDoc::from_json(&doc_json("page", "label", "[]")).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::KindMismatch {
                expected: CanvasKind::Page,
                found: CanvasKind::Label
            }
        ));
    }

    #[test]
    fn test_element_of_wrong_kind_rejected_with_index() {
        let elements = r#"[
            {"id": "a", "type": "text", "content": "ok", "rect": {"col": 0, "row": 0}},
            {"id": "b", "type": "barcode", "data": "1", "rect": {"col": 0, "row": 1}}
        ]"#;
        let err = TemplateDoc::from_json(&doc_json("text", "text", elements)).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidElement { index: 1, .. }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let elements = r#"[
            {"id": "a", "type": "hline", "rect": {"col": 0, "row": 0}},
            {"id": "a", "type": "hline", "rect": {"col": 0, "row": 1}}
        ]"#;
        let err = TemplateDoc::from_json(&doc_json("receipt", "receipt", elements)).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_schema_checks() {
        let json = doc_json("page", "page", "[]").replace("rprint.template", "other");
        assert!(matches!(
            TemplateDoc::from_json(&json).unwrap_err(),
            LayoutError::UnsupportedSchema(_)
        ));
        let json = doc_json("page", "page", "[]").replace("\"version\": 1", "\"version\": 9");
        assert!(matches!(
            TemplateDoc::from_json(&json).unwrap_err(),
            LayoutError::UnsupportedVersion { found: 9, .. }
        ));
    }

    #[test]
    fn test_serialize_round_trip() {
        let elements = r#"[
            {"id": "a", "type": "text", "content": "Hi {{name}}", "z": 2,
             "visibleIf": "show", "rect": {"x": 1, "y": 2, "width": 30, "height": 8}},
            {"id": "b", "type": "box", "rect": {"x": 0, "y": 0, "width": 50, "height": 30}}
        ]"#;
        let doc = TemplateDoc::from_json(&doc_json("label", "label", elements)).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["schema"], SCHEMA_NAME);
        assert_eq!(value["meta"]["kind"], "label");
        assert_eq!(value["canvas"]["kind"], "label");
        assert_eq!(value["elements"][1]["type"], "box");
        let back: TemplateDoc = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_set_canvas_kind_rules() {
        let mut doc = TemplateDoc::new("r", CanvasConfig::default_for(CanvasKind::Receipt));
        // Empty document may switch kinds.
        doc.set_canvas(CanvasConfig::default_for(CanvasKind::Text)).unwrap();
        assert_eq!(doc.kind(), CanvasKind::Text);

        if let DocBody::Text { elements, .. } = &mut doc.body {
            elements.push(TextElement {
                id: "x".into(),
                name: None,
                z: 0.0,
                locked: false,
                hidden: false,
                visible_if: None,
                rect: GridRect::default(),
                body: TextShape::text("hello"),
            });
        }
        let err = doc
            .set_canvas(CanvasConfig::default_for(CanvasKind::Page))
            .unwrap_err();
        assert!(matches!(err, LayoutError::KindMismatch { .. }));

        // Same kind with elements present is fine.
        let wide = CanvasConfig::Text(TextCanvas {
            columns: 132,
            ..Default::default()
        });
        doc.set_canvas(wide).unwrap();
        assert!(matches!(&doc.body, DocBody::Text { canvas, .. } if canvas.columns == 132));
    }
}
