//! Elan-Harvest main entry point
//!
//! This is the command-line interface for the Elan-Harvest listing scraper.

use anyhow::Context;
use clap::Parser;
use elan_harvest::config::load_config_with_hash;
use elan_harvest::crawler::Harvester;
use elan_harvest::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Elan-Harvest: a resilient listing harvester
///
/// Elan-Harvest walks paginated listing-index pages, follows each listing to
/// its detail page, and appends one record per listing to a CSV sink.
/// Progress is persisted so an interrupted run resumes without duplicates.
#[derive(Parser, Debug)]
#[command(name = "elan-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient listing harvester", long_about = None)]
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

    /// Ignore previous progress and failure state
    #[arg(long)]
    fresh: bool,

    /// Re-attempt only the URLs in the persisted failure log, then exit
    #[arg(long, conflicts_with_all = ["fresh", "dry_run"])]
    retry_failed: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with = "retry_failed")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let harvester =
        Harvester::new(config, cli.fresh).context("failed to initialize harvester")?;

    let summary = if cli.retry_failed {
        harvester.run_retry_only().await?
    } else {
        harvester.run().await?
    };

    print_summary(&summary);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("elan_harvest=info,warn"),
            1 => EnvFilter::new("elan_harvest=debug,info"),
            2 => EnvFilter::new("elan_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &elan_harvest::config::Config) {
    println!("=== Elan-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Index template: {}", config.site.index_path_template);
    println!(
        "  Page range: {}..={} ({} pages)",
        config.site.start_page,
        config.site.end_page,
        config.site.end_page - config.site.start_page + 1
    );

    println!("\nHarvester:");
    println!(
        "  Max concurrent fetches: {}",
        config.harvester.max_concurrent_fetches
    );
    println!(
        "  Max fetches per host: {}",
        config.harvester.max_fetches_per_host
    );
    println!("  Max retry attempts: {}", config.harvester.max_retry_attempts);
    println!(
        "  Retry base delay: {}ms",
        config.harvester.retry_base_delay_ms
    );
    println!("  Page delay: {}ms", config.harvester.page_delay_ms);
    println!("  Persist every: {} records", config.harvester.persist_every);

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Progress: {}", config.output.progress_path);
    println!("  Failed URLs: {}", config.output.failed_path);

    println!("\n✓ Configuration is valid");
}
