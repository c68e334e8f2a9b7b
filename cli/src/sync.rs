#![deny(missing_docs)]

//! # Sync Command
//!
//! Re-imports a document against a previously exported item tree:
//!
//! 1. **Load**: the existing tree, either a bare item array or any object
//!    with an `items` array (an exported collection or branch).
//! 2. **Convert**: parse, resolve and transform the fresh document.
//! 3. **Reconcile**: merge the fresh tree into the existing one.
//! 4. **Emit**: the merged items, their request count and the sync report.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use apisync_core::{convert, count_requests, merge, parse_document, AuditStamp, CollectionItem, SyncReport};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{CliError, CliResult};

/// Arguments for the sync command.
#[derive(clap::Args, Debug, Clone)]
pub struct SyncArgs {
    /// Previously exported items (JSON).
    pub existing: PathBuf,

    /// Path to the fresh JSON or YAML document.
    pub file: PathBuf,

    /// Write the JSON here instead of stdout.
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncOutput {
    items: Vec<CollectionItem>,
    total_requests: usize,
    report: SyncReport,
}

/// Executes the sync.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `user` - Name stamped into audit fields.
/// * `out` - Destination when `--output` is not given.
pub fn execute(args: &SyncArgs, user: &str, out: &mut impl Write) -> CliResult<()> {
    let existing = load_items(&args.existing)?;
    let document = parse_document(&fs::read_to_string(&args.file)?)?;

    let stamp = AuditStamp::now(user);
    let converted = convert(&document, &stamp)?;
    let (items, report) = merge(existing, converted.into_items(), &stamp)?;
    info!(%report, "Sync finished");

    let rendered = serde_json::to_string_pretty(&SyncOutput {
        total_requests: count_requests(&items),
        items,
        report,
    })?;
    crate::write_output(args.output.as_deref(), &rendered, out)
}

fn load_items(path: &Path) -> CliResult<Vec<CollectionItem>> {
    let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    let items = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => object.remove("items").ok_or_else(|| {
            CliError::General(format!("{} has no `items` array", path.display()))
        })?,
        _ => {
            return Err(CliError::General(format!(
                "{} is neither an item array nor an object with items",
                path.display()
            )))
        }
    };
    Ok(serde_json::from_value(items)?)
}
