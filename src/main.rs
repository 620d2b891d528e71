//! Club-Harvest main entry point
//!
//! This is the command-line interface for the Club-Harvest directory extractor.

use anyhow::Context;
use clap::Parser;
use club_harvest::config::{load_config_with_hash, Config};
use club_harvest::crawler::{harvest, run_details, run_listing};
use club_harvest::logging::init_logging;
use std::path::{Path, PathBuf};

/// Club-Harvest: a two-stage sports-club directory extractor
///
/// The listing phase drives the club search page in a headless browser and
/// writes the seed table. The detail phase visits every seed's detail page and
/// writes the enriched table, with partial snapshots along the way.
#[derive(Parser, Debug)]
#[command(name = "club-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A two-stage sports-club directory extractor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only run the listing phase
    #[arg(long, conflicts_with_all = ["details_only", "dry_run"])]
    listing_only: bool,

    /// Only run the detail phase, reading an existing listing table
    #[arg(long, conflicts_with_all = ["listing_only", "dry_run"])]
    details_only: bool,

    /// Validate config and show the resolved settings without extracting anything
    #[arg(long, conflicts_with_all = ["listing_only", "details_only"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The log file location lives in the config, so it is loaded before logging starts
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    init_logging(cli.verbose, cli.quiet, Path::new(&config.output.log_path))
        .with_context(|| format!("Failed to open log file {}", config.output.log_path))?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    let result = if cli.listing_only {
        run_listing(&config).await.map(|_| ())
    } else if cli.details_only {
        run_details(&config).await.map(|_| ())
    } else {
        harvest(&config).await.map(|_| ())
    };

    match result {
        Ok(()) => {
            tracing::info!("Run completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Club-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Search URL: {}", config.site.search_url);

    println!("\nOutput:");
    println!("  Listing table: {}", config.output.listing_path);
    println!("  Details table: {}", config.output.details_path);
    println!("  Partial snapshot: {}", config.output.partial_path);
    println!("  Log file: {}", config.output.log_path);
    println!(
        "  Partial snapshot every: {} clubs",
        config.output.partial_save_every
    );
    println!("  Delimiter: '{}'", config.output.delimiter);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    println!(
        "  Window: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    println!("  Wait timeout: {}s", config.browser.wait_timeout_secs);
    for (label, delay) in [
        ("Settle delay", config.browser.settle_delay),
        ("Installation delay", config.browser.installation_delay),
        ("Committee delay", config.browser.committee_delay),
    ] {
        println!("  {}: {}-{}ms", label, delay.min_ms, delay.max_ms);
    }
    println!(
        "  Dismiss overlay on every club: {}",
        config.browser.dismiss_overlay_every_entity
    );

    println!("\nSelectors:");
    let selectors = &config.selectors;
    for (label, locator) in [
        ("Popup", &selectors.popup),
        ("Search toggle", &selectors.search_toggle),
        ("Expanded search panel", &selectors.expanded_search_panel),
        ("Submit button", &selectors.submit_button),
        ("Results", &selectors.results),
        ("Name link", &selectors.name_link),
        ("Installation tab", &selectors.installation_tab),
        ("Installation panel", &selectors.installation_panel),
        ("Committee tab", &selectors.committee_tab),
        ("President panel", &selectors.president_panel),
    ] {
        println!("  {}: {}", label, locator);
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}
