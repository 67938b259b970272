//! # rprint-layout - Print Layout Templates
//!
//! A document model, editing engine and compilers for visually designed
//! print layouts. One document targets one of four canvas kinds:
//!
//! - **page**: A-series / Letter / custom sheets, compiled to positioned HTML
//! - **label**: thermal labels in mm at 203/300/600 dpi, compiled to ZPL
//! - **receipt**: character-grid receipts, compiled to ESC/POS
//! - **text**: character-grid plain text
//!
//! Compiled output is a template: `{{…}}` and `{{{…}}}` expressions are kept
//! verbatim for a later render step to fill with job data.
//!
//! ## Quick Start
//!
//! ```
//! use rprint_layout::{
//!     CanvasConfig, CanvasKind, TemplateDoc,
//!     document::{DocBody, MmRect, PageShape},
//!     editor::{NewElement, PageEditor},
//! };
//!
//! let mut editor = PageEditor::new();
//! editor.add_element(NewElement::new(
//!     MmRect::new(10.0, 10.0, 80.0, 8.0),
//!     PageShape::text("Invoice {{invoice.number}}"),
//! ));
//!
//! let mut doc = TemplateDoc::new("Invoice", CanvasConfig::default_for(CanvasKind::Page));
//! if let DocBody::Page { elements, .. } = &mut doc.body {
//!     *elements = editor.into_elements();
//! }
//!
//! let compiled = doc.compile();
//! assert!(compiled.output.contains("Invoice {{invoice.number}}"));
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Document, canvas and element types |
//! | [`editor`] | Editing engine with undo/redo |
//! | [`compiler`] | Per-kind compilers and warnings |
//! | [`template`] | Expression-preserving escaping |
//! | [`units`] | mm / px / dot / cell conversions |
//! | [`server`] | HTTP compile service |
//! | [`error`] | Error types |

pub mod compiler;
pub mod document;
pub mod editor;
pub mod error;
pub mod server;
pub mod template;
pub mod units;

// Re-exports for convenience
pub use compiler::{CompileOutput, CompileWarning, WarningCode};
pub use document::{CanvasConfig, CanvasKind, TemplateDoc};
pub use error::LayoutError;
