//! CLI for the atcdl archive downloader.

mod commands;
mod console;
mod instant;

use anyhow::Result;
use atcdl_core::config;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{run_completions, run_download, run_man, run_search};

/// Top-level CLI for atcdl.
#[derive(Debug, Parser)]
#[command(name = "atcdl")]
#[command(about = "atcdl: concurrent downloader for archived ATC audio", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Search stations for an airport ICAO code.
    Search {
        /// ICAO code, e.g. KPDX.
        icao: String,
        /// Print the records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Download every 30-minute recording in a time range.
    Download(DownloadArgs),

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page to stdout.
    Man,
}

/// Arguments of `atcdl download`.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Station identifier, e.g. kpdx_zse (see `atcdl search`).
    #[arg(long, short = 's')]
    pub station: String,

    /// First interval start (UTC): RFC 3339, "YYYY-MM-DD HH:MM" or "Oct-01-2021 0000Z".
    #[arg(long, value_parser = instant::parse_instant)]
    pub start: DateTime<Utc>,

    /// Last interval start (UTC), same formats as --start.
    #[arg(long, value_parser = instant::parse_instant)]
    pub end: DateTime<Utc>,

    /// Destination directory (default: config output_dir, else the current directory).
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Concurrent downloads, 1-100 (default from config).
    #[arg(long, short = 'n', value_name = "N")]
    pub concurrency: Option<usize>,

    /// Stagger delay budget in seconds, spread across workers (default from config).
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Automatically retry failed units this many times after completion.
    #[arg(long, default_value = "0", value_name = "R")]
    pub retry_rounds: usize,
}

impl CliCommand {
    /// Runs the parsed command. `Ok(false)` means the command ran but some work failed.
    pub async fn run_from_args() -> Result<bool> {
        let cli = Cli::parse();
        match cli.command {
            CliCommand::Completions { shell } => {
                run_completions(shell);
                return Ok(true);
            }
            CliCommand::Man => {
                run_man()?;
                return Ok(true);
            }
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Search { icao, json } => {
                run_search(&cfg, &icao, json).await?;
                Ok(true)
            }
            CliCommand::Download(args) => run_download(&cfg, args).await,
            CliCommand::Completions { .. } | CliCommand::Man => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests;
