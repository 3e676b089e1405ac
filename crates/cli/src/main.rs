//! Cellar CLI - cellar command

use anyhow::{Context, Result};
use cellar::{cmd, util};
use cellar_core::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cellar - Git-tracked encrypted snapshots of a private directory
#[derive(Parser)]
#[command(name = "cellar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project root (default: nearest directory with cellar.toml)
    #[arg(long, global = true, env = "CELLAR_ROOT")]
    root: Option<PathBuf>,

    /// Log external tool calls and other diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List archives, or the files inside one archive
    Ls {
        /// Archive path (/<ref>/<glob>); omit to list every archive
        path: Option<String>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Show at most N archives
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print files from an archive
    Cat {
        /// Archive path (/<ref>/<glob>)
        path: String,
    },
    /// Copy files out of an archive
    Cp {
        /// Archive path (/<ref>/<glob>)
        path: String,
        /// Destination file or directory
        dest: PathBuf,
    },
    /// View files from an archive in the pager
    Less {
        /// Archive path (/<ref>/<glob>)
        path: String,
    },
    /// Check that archives decrypt and match their commits
    Verify {
        /// Archive reference (default: every archive)
        reference: Option<String>,
        /// Emit JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Replace the private directory with an archive's contents
    Restore {
        /// Archive reference (default: newest committed archive)
        reference: Option<String>,
        /// Emit JSON instead of a summary
        #[arg(long)]
        json: bool,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Snapshot the private directory into a new archive
    Pack {
        /// Create an archive even when nothing changed
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Delete archives that git does not track
    Clean {
        /// Only list what would be removed
        #[arg(long, short = 'n')]
        dry_run: bool,
    },
    /// Print the effective configuration
    Config,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries file contents and JSON
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = util::find_project_root(cli.root)?;
    let config = Config::load(&root)
        .with_context(|| format!("Failed to load configuration for {}", root.display()))?;

    match cli.command {
        Commands::Ls { path, json, limit } => cmd::ls::run(&config, path.as_deref(), json, limit).await,
        Commands::Cat { path } => cmd::cat::run(&config, &path).await,
        Commands::Cp { path, dest } => cmd::cp::run(&config, &path, &dest).await,
        Commands::Less { path } => cmd::less::run(&config, &path).await,
        Commands::Verify { reference, json } => cmd::verify::run(&config, reference.as_deref(), json).await,
        Commands::Restore { reference, json, yes } => {
            cmd::restore::run(&config, reference.as_deref(), json, yes).await
        }
        Commands::Pack { force } => cmd::pack::run(&config, force).await,
        Commands::Clean { dry_run } => cmd::clean::run(&config, dry_run).await,
        Commands::Config => cmd::config::run(&config),
    }
}
