//! Core library entry for the `pmf-artwork` CLI.
//!
//! When a packaging change request (PMF) is approved for artwork work, every
//! artwork document linked to it needs a draft version that carries the PMF.
//! The [`reconcile`] engine decides per artwork whether to create that draft,
//! attach a draft someone already made, or leave the document alone, and
//! [`redline`] manages the annotated companion documents reviewers mark up.
//! The vault is reached only through the [`ports`], so runs can go against
//! the live REST API, an in-memory fixture, or recorded cassettes.

pub mod adapters;
pub mod batch;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod names;
pub mod ports;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod redline;
pub mod schema;
pub mod version;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
