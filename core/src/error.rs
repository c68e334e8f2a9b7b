//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// Unresolvable `$ref` targets and missing optional fields are never errors;
/// only the failures below abort an import.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// The document is neither OpenAPI 2, OpenAPI 3 nor a Postman v2.1 collection.
    #[from(ignore)]
    #[display("Invalid specification: {_0}")]
    InvalidSpecification(String),

    /// A collection or branch expected by an active sync does not exist.
    #[from(ignore)]
    #[display("Not found: {_0}")]
    NotFound(String),

    /// A tree node cannot produce a reconciliation key.
    #[from(ignore)]
    #[display("Invalid item identity: {_0}")]
    InvalidIdentity(String),

    /// Raw text could not be parsed as JSON or YAML.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
