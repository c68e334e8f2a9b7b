#![deny(missing_docs)]

//! # apisync Core
//!
//! Imports OpenAPI 2.0, OpenAPI 3.0 and Postman v2.1 documents into a tree of
//! collection items, and re-syncs previously imported trees without losing
//! user edits.

/// Shared error types.
pub mod error;

/// Collection, branch and item data model.
pub mod model;

/// Document parsing, `$ref` resolution and example synthesis.
pub mod oas;

/// Per-dialect document transformers.
pub mod transform;

/// Tree reconciliation for active sync.
pub mod reconcile;

/// Persistence collaborator interface.
pub mod store;

/// Import orchestration.
pub mod import;

pub use error::{AppError, AppResult};
pub use import::{convert, Converted, ImportOptions, ImportOutcome, Importer, DEFAULT_BRANCH};
pub use model::{
    count_requests, AuditStamp, Branch, BranchRef, Collection, CollectionItem, ItemSource,
    ItemType,
};
pub use oas::{detect_dialect, parse_document, Dialect, RefDiagnostic};
pub use reconcile::{merge, ItemKey, SyncReport};
pub use store::{CollectionStore, MemoryStore};
pub use transform::FolderMap;
