//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `pmf-artwork`.
#[derive(Debug, Parser)]
#[command(
    name = "pmf-artwork",
    version,
    about = "Reconcile artwork document versions for packaging change requests"
)]
pub struct Cli {
    /// Where the vault lives and how to talk to it.
    #[command(flatten)]
    pub source: SourceArgs,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options selecting the configuration and the adapters a run uses.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Configuration file (defaults to `PMF_ARTWORK_CONFIG`, then `pmf-artwork.yaml`).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run against an in-memory vault seeded from a YAML fixture.
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "replay")]
    pub fixture: Option<PathBuf>,

    /// Replay per-port cassettes from a recording directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub replay: Option<PathBuf>,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring every artwork of a PMF to a draft carrying the PMF.
    Reconcile {
        /// PMF record id.
        #[arg(long)]
        pmf: String,
    },
    /// Create or re-grant the redline companion of one artwork link.
    AttachRedline {
        /// Artwork link record id.
        #[arg(long)]
        link: String,
    },
    /// Lock every redline document of a PMF.
    LockRedlines {
        /// PMF record id.
        #[arg(long)]
        pmf: String,
    },
    /// Reopen every locked redline document of a PMF.
    UnlockRedlines {
        /// PMF record id.
        #[arg(long)]
        pmf: String,
    },
    /// Validate the configuration and the artwork field schema.
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_reconcile_subcommand() {
        let cli = Cli::parse_from(["pmf-artwork", "reconcile", "--pmf", "PMF-1"]);
        assert!(matches!(cli.command, Command::Reconcile { ref pmf } if pmf == "PMF-1"));
        assert!(cli.source.fixture.is_none());
    }

    #[test]
    fn global_options_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "pmf-artwork",
            "lock-redlines",
            "--pmf",
            "PMF-1",
            "--fixture",
            "vault.yaml",
        ]);
        assert!(matches!(cli.command, Command::LockRedlines { .. }));
        assert_eq!(cli.source.fixture.as_deref(), Some(std::path::Path::new("vault.yaml")));
    }

    #[test]
    fn fixture_and_replay_are_exclusive() {
        let result = Cli::try_parse_from([
            "pmf-artwork",
            "--fixture",
            "a.yaml",
            "--replay",
            "dir",
            "check-config",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn reconcile_requires_a_pmf() {
        assert!(Cli::try_parse_from(["pmf-artwork", "reconcile"]).is_err());
    }
}
