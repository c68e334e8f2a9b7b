#![deny(missing_docs)]

//! # Dialect Transformers
//!
//! Each transformer turns a parsed (and, for OpenAPI, reference-resolved)
//! document into an ordered map of folder items.
//!
//! - **openapi_v3**: OpenAPI 3.0.x.
//! - **openapi_v2**: Swagger 2.0.
//! - **postman**: Postman Collection v2.1.

pub(crate) mod common;
pub mod openapi_v2;
pub mod openapi_v3;
pub mod postman;

pub use common::{FolderMap, DEFAULT_FOLDER, FALLBACK_BASE_URL};

use crate::error::AppResult;
use crate::model::AuditStamp;
use crate::oas::Dialect;
use serde_json::Value;

/// Runs the transformer matching `dialect`.
pub fn transform(document: &Value, dialect: Dialect, stamp: &AuditStamp) -> AppResult<FolderMap> {
    match dialect {
        Dialect::OpenApi3 => openapi_v3::transform(document, stamp),
        Dialect::OpenApi2 => openapi_v2::transform(document, stamp),
        Dialect::Postman => postman::transform(document, stamp),
    }
}
