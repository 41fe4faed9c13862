//! CLI for the vtbatch lookup and download engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vtbatch_core::config::{self, VtConfig};

use commands::{run_checksum, run_download, run_report, run_search};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vtbatch")]
#[command(about = "Batch hash lookups, searches and verified sample downloads", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/vtbatch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Look up reports for one or more hashes.
    Report {
        /// Hashes to look up.
        #[arg(required_unless_present = "file")]
        ids: Vec<String>,
        /// Read hashes from a file, one per line.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Request the short report instead of all available info.
        #[arg(long)]
        no_allinfo: bool,
    },

    /// Search for hashes matching a query.
    Search {
        query: String,
        /// Stop after this many results.
        #[arg(long, value_name = "N")]
        max: Option<usize>,
        /// Use the intelligence search endpoint.
        #[arg(long)]
        intelligence: bool,
    },

    /// Download samples and verify them against their SHA-256.
    Download {
        /// Hashes to download.
        #[arg(required_unless_present = "file")]
        ids: Vec<String>,
        /// Read hashes from a file, one per line.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Directory to store samples in (overrides config).
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },

    /// Compute SHA-256 of a local file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match &cli.command {
            CliCommand::Report {
                ids,
                file,
                no_allinfo,
            } => run_report(cli.load_config()?, ids, file.as_deref(), !no_allinfo),
            CliCommand::Search {
                query,
                max,
                intelligence,
            } => run_search(cli.load_config()?, query, *max, *intelligence),
            CliCommand::Download { ids, file, dir } => {
                run_download(cli.load_config()?, ids, file.as_deref(), dir.as_deref())
            }
            CliCommand::Checksum { path } => run_checksum(path),
        }
    }

    /// Network commands only; `checksum` never touches the config file.
    fn load_config(&self) -> Result<VtConfig> {
        let cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!(
            workers = cfg.workers,
            chunk_size = cfg.chunk_size,
            download_dir = %cfg.download_dir.display(),
            "loaded config"
        );
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests;
