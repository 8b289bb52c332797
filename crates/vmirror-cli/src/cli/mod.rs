//! CLI for the vmirror catalogue mirror.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vmirror_core::config;
use vmirror_core::control::StopSignal;
use vmirror_core::manifest::StatePaths;

use commands::{run_crawl_cmd, run_fetch_cmd, run_resolve_cmd, run_status};

/// Top-level CLI for vmirror.
#[derive(Debug, Parser)]
#[command(name = "vmirror")]
#[command(about = "vmirror: crawl, resolve and download a members-only video catalogue", long_about = None)]
pub struct Cli {
    /// Directory holding crawled.json, extracted.json and fetched.json.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub state_dir: PathBuf,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Login and browser options shared by the stages that drive a browser.
#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    /// Account email.
    #[arg(long, env = "VMIRROR_EMAIL")]
    pub email: String,

    /// Account password.
    #[arg(long, env = "VMIRROR_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Run the browser without a window (overrides config).
    #[arg(long)]
    pub headless: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Walk the catalogue menu and record every item in crawled.json.
    Crawl {
        #[command(flatten)]
        login: LoginArgs,
    },

    /// Resolve crawled detail pages to media URLs in extracted.json.
    Resolve {
        #[command(flatten)]
        login: LoginArgs,
    },

    /// Download resolved media with the external downloader.
    Fetch {
        /// Destination directory; output paths are created below it.
        #[arg(long, alias = "output", value_name = "DIR")]
        path: PathBuf,

        /// Resolution manifest to read (default: <state-dir>/extracted.json).
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Download again even when the ledger or an existing file says done.
        #[arg(long)]
        force: bool,

        /// Run up to N downloads concurrently (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Show how far each stage has progressed.
    Status,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let paths = StatePaths::new(&cli.state_dir);

        let stop = StopSignal::new();
        stop.listen_for_ctrl_c();

        match cli.command {
            CliCommand::Crawl { login } => {
                cfg.browser.headless |= login.headless;
                run_crawl_cmd(&cfg, &paths, &login, &stop).await?;
            }
            CliCommand::Resolve { login } => {
                cfg.browser.headless |= login.headless;
                run_resolve_cmd(&cfg, &paths, &login, &stop).await?;
            }
            CliCommand::Fetch {
                path,
                input,
                force,
                jobs,
            } => {
                run_fetch_cmd(&cfg, &paths, path, input, force, jobs, &stop).await?;
            }
            CliCommand::Status => run_status(&paths)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
