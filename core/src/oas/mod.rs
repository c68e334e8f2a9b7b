#![deny(missing_docs)]

//! # OpenAPI Document Handling
//!
//! - **document**: raw text parsing and dialect detection.
//! - **resolver**: cycle-safe `$ref` inlining.
//! - **example**: example-value synthesis from schema nodes.
//! - **ref_utils**: JSON Pointer helpers.

pub mod document;
pub mod example;
pub(crate) mod ref_utils;
pub mod resolver;

pub use document::{detect_dialect, document_description, document_title, parse_document, Dialect};
pub use example::{flatten_properties, synthesize};
pub use resolver::{resolve_refs, RefDiagnostic, RefFailure, ResolvedDocument};
