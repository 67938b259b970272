//! Compile and validate handlers.
//!
//! Both take the document JSON as the request body.

use axum::{Json, http::StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::compiler::{self, CompileOutput};
use crate::document::{CanvasKind, TemplateDoc};

/// Handle POST /api/compile - compile a document, degrading bad elements to
/// warnings.
pub async fn compile(Json(doc): Json<Value>) -> Result<Json<CompileOutput>, (StatusCode, String)> {
    compiler::compile_value(&doc)
        .map(Json)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CanvasKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handle POST /api/validate - strict load of a document.
pub async fn validate(Json(doc): Json<Value>) -> (StatusCode, Json<ValidateResponse>) {
    match TemplateDoc::from_value(doc) {
        Ok(doc) => (
            StatusCode::OK,
            Json(ValidateResponse {
                valid: true,
                kind: Some(doc.kind()),
                elements: Some(doc.body.element_count()),
                error: None,
            }),
        ),
        Err(e) => {
            debug!(error = %e, "document rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(ValidateResponse {
                    valid: false,
                    kind: None,
                    elements: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
