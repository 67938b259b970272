//! # Error Types
//!
//! Errors raised when a document breaks a structural rule. Recoverable
//! problems inside a single element never reach this type; the compilers
//! report those as warnings next to a usable output.

use thiserror::Error;

use crate::document::CanvasKind;

/// Main error type for rprint-layout operations
#[derive(Debug, Error)]
pub enum LayoutError {
    /// `meta.kind` and `canvas.kind` disagree, or a canvas change would
    /// orphan existing elements.
    #[error("Kind mismatch: document is {expected}, got {found}")]
    KindMismatch {
        expected: CanvasKind,
        found: CanvasKind,
    },

    /// The `schema` field names something other than a template document.
    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// The document was written by a newer schema version.
    #[error("Unsupported schema version {found} (max {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// An element could not be read as one of its kind's element types.
    #[error("elements[{index}]: {message}")]
    InvalidElement { index: usize, message: String },

    /// Two elements share an id.
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),

    /// A kind name that is not page, label, receipt or text.
    #[error("Unknown canvas kind: {0}")]
    UnknownKind(String),

    /// JSON parse error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP service failure (bind, serve)
    #[error("Server error: {0}")]
    Server(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LayoutError>;
