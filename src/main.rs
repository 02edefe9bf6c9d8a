//! CLI entry point for the linkcard tool.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};
use clap::Parser;
use futures_util::StreamExt;
use futures_util::stream;
use linkcard_core::{JsonLinesSink, MetadataResolver, RecordSink, ResolverConfig, prepare};
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use cli::{Args, DEFAULT_CONCURRENCY};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries records only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "loaded config file");
    }
    let concurrency = args
        .concurrency
        .or(loaded.config.concurrency)
        .unwrap_or(DEFAULT_CONCURRENCY);
    let config = apply_overrides(loaded.config.resolver, &args);
    config.validate().context("Invalid resolver configuration")?;

    let input_text = if !args.urls.is_empty() {
        args.urls.join("\n")
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        info!("No input provided. Pipe URLs via stdin or pass as arguments.");
        info!("Example: echo 'https://example.com/story' | linkcard");
        return Ok(());
    };

    let urls: Vec<&str> = input_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    if urls.is_empty() {
        info!("No URLs found in input");
        return Ok(());
    }
    info!(urls = urls.len(), concurrency, order = %config.order, "Resolving");

    let resolver = MetadataResolver::new(config)?;
    let sink = JsonLinesSink::new(io::stdout());

    let mut records = stream::iter(urls)
        .map(|url| prepare(&resolver, url))
        .buffered(usize::from(concurrency));

    let mut stored = 0_usize;
    while let Some(outcome) = records.next().await {
        match outcome {
            Ok(record) => {
                sink.store(&record).await?;
                stored += 1;
            }
            Err(error) => warn!(%error, "Skipped input"),
        }
    }

    info!(stored, "Done");
    Ok(())
}

/// Applies CLI flags on top of file configuration.
fn apply_overrides(mut config: ResolverConfig, args: &Args) -> ResolverConfig {
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_uniform_timeout(timeout_ms);
    }
    if let Some(order) = args.order {
        config.order = order;
    }
    if let Some(policy) = args.icon_policy {
        config.icon_policy = policy;
    }
    if let Some(mailto) = &args.mailto {
        config.crossref_mailto = Some(mailto.clone());
    }
    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use linkcard_core::{IconFetchPolicy, ResolutionOrder};

    #[test]
    fn test_apply_overrides_cli_wins_over_file() {
        let file = ResolverConfig {
            order: ResolutionOrder::DoiBeforeScrape,
            page_timeout_ms: 5_000,
            ..ResolverConfig::default()
        };
        let args = Args::try_parse_from([
            "linkcard",
            "--order",
            "scrape-first",
            "--timeout-ms",
            "900",
            "--icon-policy",
            "always",
            "--mailto",
            "me@example.com",
        ])
        .unwrap();

        let config = apply_overrides(file, &args);
        assert_eq!(config.order, ResolutionOrder::ScrapeFirst);
        assert_eq!(config.page_timeout_ms, 900);
        assert_eq!(config.registry_timeout_ms, 900);
        assert_eq!(config.icon_policy, IconFetchPolicy::Always);
        assert_eq!(config.crossref_mailto.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_apply_overrides_keeps_file_values_without_flags() {
        let file = ResolverConfig {
            order: ResolutionOrder::DoiBeforeScrape,
            ..ResolverConfig::default()
        };
        let args = Args::try_parse_from(["linkcard"]).unwrap();
        assert_eq!(apply_overrides(file.clone(), &args), file);
    }
}
