#![deny(missing_docs)]

//! # apisync CLI
//!
//! Command Line Interface for importing API descriptions into collections.
//!
//! Supported Commands:
//! - `convert`: OpenAPI 2/3 or Postman document -> collection JSON.
//! - `sync`: re-import a document against a previously exported item tree.

use std::fs;
use std::io::Write;
use std::path::Path;

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod convert;
mod error;
mod sync;
mod telemetry;

#[derive(Parser, Debug)]
#[clap(author, version, about = "API collection import and sync")]
struct Cli {
    /// Name recorded in created/updated audit fields.
    #[clap(long, global = true, env = "APISYNC_USER", default_value = "apisync")]
    user: String,

    /// Emit logs as JSON lines.
    #[clap(long, global = true, env = "APISYNC_LOG_JSON")]
    log_json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a document into a collection.
    Convert(convert::ConvertArgs),
    /// Merge a fresh document into previously exported items.
    Sync(sync::SyncArgs),
}

/// Writes `rendered` to `path` when given, else to `out`.
pub(crate) fn write_output(path: Option<&Path>, rendered: &str, out: &mut impl Write) -> CliResult<()> {
    match path {
        Some(path) => fs::write(path, rendered)?,
        None => writeln!(out, "{}", rendered)?,
    }
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_json)?;

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Commands::Convert(args) => convert::execute(args, &cli.user, &mut stdout)?,
        Commands::Sync(args) => sync::execute(args, &cli.user, &mut stdout)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_user_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["apisync", "convert", "spec.yaml", "--user", "dana"]).unwrap();
        assert_eq!(cli.user, "dana");
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.branch, "main");
                assert!(!args.active_sync);
            }
            Commands::Sync(_) => panic!("expected convert"),
        }
    }

    #[test]
    fn test_sync_takes_two_paths() {
        let cli = Cli::try_parse_from(["apisync", "sync", "old.json", "new.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::Sync(_)));
        assert!(Cli::try_parse_from(["apisync", "sync", "old.json"]).is_err());
    }
}
