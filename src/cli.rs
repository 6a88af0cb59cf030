//! Command line surface.

use std::path::PathBuf;

use clap::Parser;

/// Mirror a local directory tree to a remote host over SSH.
///
/// Files are compared by modification time: anything missing on the
/// remote side or strictly newer locally is pushed. With `--pull` the
/// reverse sets are fetched as well.
#[derive(Parser, Debug, Default)]
#[command(name = "sshmirror", version, about)]
pub struct Cli {
    /// Local directory to mirror from.
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Remote directory to mirror into.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Remote host, optionally with a port (`host` or `host:port`).
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// SSH user name.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Private key file for public key authentication.
    #[arg(short, long)]
    pub key: Option<PathBuf>,

    /// JSON settings file; command line flags take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also fetch files that are missing locally or newer remotely.
    #[arg(long)]
    pub pull: bool,

    /// Compute and print the plan without transferring anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Log filter (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,
}
