//! Canvas kind metadata.

use axum::{Json, extract::Path, http::StatusCode};

use crate::compiler;
use crate::document::CanvasKind;

/// Handle GET /api/kinds/:kind/types - element types a kind accepts.
pub async fn element_types(Path(kind): Path<String>) -> Result<Json<Vec<&'static str>>, (StatusCode, String)> {
    let kind: CanvasKind = kind
        .parse()
        .map_err(|e: crate::error::LayoutError| (StatusCode::NOT_FOUND, e.to_string()))?;
    Ok(Json(compiler::element_types(kind).to_vec()))
}
