//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use linkcard_core::{IconFetchPolicy, ResolutionOrder};

/// Default number of URLs resolved at once.
pub const DEFAULT_CONCURRENCY: u8 = 4;

/// Resolve links into reading-list cards.
///
/// Prints one JSON record (url, title, publisher, icon_url, created_at) per
/// input URL, in input order.
#[derive(Parser, Debug)]
#[command(name = "linkcard")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to resolve (reads newline-separated URLs from stdin when omitted)
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent resolutions (1-64) [default: 4]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub concurrency: Option<u8>,

    /// Strategy order: standard, doi-before-scrape or scrape-first
    #[arg(long)]
    pub order: Option<ResolutionOrder>,

    /// Icon-only fetch after an oEmbed hit: always, unless-unscrapable or never
    #[arg(long)]
    pub icon_policy: Option<IconFetchPolicy>,

    /// Timeout for each page, manifest, oEmbed and registry request in milliseconds (1-30000)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=30_000))]
    pub timeout_ms: Option<u64>,

    /// Contact email sent to Crossref for polite-pool access
    #[arg(long)]
    pub mailto: Option<String>,

    /// Config file (defaults to $XDG_CONFIG_HOME/linkcard/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
