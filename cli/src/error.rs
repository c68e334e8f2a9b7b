#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use apisync_core::AppError;
use derive_more::{Display, From};

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Import, transform or merge failure.
    #[display("{}", _0)]
    Core(AppError),

    /// Input or output JSON could not be (de)serialized.
    #[display("JSON Error: {}", _0)]
    Json(serde_json::Error),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
