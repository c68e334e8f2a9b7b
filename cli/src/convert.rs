#![deny(missing_docs)]

//! # Convert Command
//!
//! Reads an OpenAPI or Postman document and prints the resulting collection
//! (and, with `--active-sync`, its first branch) as JSON.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use apisync_core::{parse_document, Branch, Collection, ImportOptions, Importer, MemoryStore};
use serde::Serialize;
use tracing::info;

use crate::error::CliResult;

/// Arguments for the convert command.
#[derive(clap::Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Path to the JSON or YAML document.
    pub file: PathBuf,

    /// Workspace the collection is created in.
    #[clap(long, env = "APISYNC_WORKSPACE", default_value = "default")]
    pub workspace: String,

    /// Create the collection as an active-sync collection with a first branch.
    #[clap(long)]
    pub active_sync: bool,

    /// Upstream location recorded on an active-sync collection.
    #[clap(long, env = "APISYNC_SYNC_URL")]
    pub sync_url: Option<String>,

    /// Branch name for active sync.
    #[clap(long, env = "APISYNC_BRANCH", default_value = apisync_core::DEFAULT_BRANCH)]
    pub branch: String,

    /// Write the JSON here instead of stdout.
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ConvertOutput {
    collection: Collection,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<Branch>,
}

/// Executes the conversion.
///
/// # Arguments
///
/// * `args` - Command arguments.
/// * `user` - Name stamped into audit fields.
/// * `out` - Destination when `--output` is not given.
pub fn execute(args: &ConvertArgs, user: &str, out: &mut impl Write) -> CliResult<()> {
    let text = fs::read_to_string(&args.file)?;
    let document = parse_document(&text)?;

    let mut options = ImportOptions::new(&args.workspace, user).with_branch(&args.branch);
    if args.active_sync {
        let url = args
            .sync_url
            .clone()
            .or_else(|| Some(args.file.display().to_string()));
        options = options.with_active_sync(url);
    }

    let mut importer = Importer::new(MemoryStore::new());
    let outcome = importer.import(&document, &options)?;
    for diagnostic in &outcome.diagnostics {
        info!(%diagnostic, "Unresolved reference left in place");
    }

    let rendered = serde_json::to_string_pretty(&ConvertOutput {
        collection: outcome.collection,
        branch: outcome.branch,
    })?;
    crate::write_output(args.output.as_deref(), &rendered, out)
}
