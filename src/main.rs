//! Plover main entry point
//!
//! This is the command-line interface for the plover feed collector.

use anyhow::Context;
use clap::{Parser, Subcommand};
use plover::api::NeighborMode;
use plover::config::{load_config_with_hash, Config};
use plover::crawler::{run_network, run_search, run_stream};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Plover: a rate-limit-aware social feed collector
///
/// Plover collects posts and user-network data from a quota-limited polling
/// API, pacing itself under a sliding-window request budget and writing
/// batches into a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "plover")]
#[command(version = "1.0.0")]
#[command(about = "A rate-limit-aware social feed collector", long_about = None)]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one backward search crawl and exit
    Search {
        /// Resume below this id, overriding the configured max-id
        #[arg(long, value_name = "ID")]
        max_id: Option<u64>,

        /// Only collect above this id, overriding the configured since-id
        #[arg(long, value_name = "ID")]
        since_id: Option<u64>,
    },

    /// Poll the search continuously, advancing the id boundary each round
    Stream,

    /// Collect the accounts each configured account follows
    Friends,

    /// Collect the followers of each configured account
    Followers,

    /// Validate the config and show what would be crawled, without crawling
    DryRun,

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    // Setup logging based on CLI verbosity; [session] verbose guarantees
    // progress feedback even under --quiet.
    setup_logging(cli.verbose, cli.quiet, config.session.verbose);
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    match cli.command {
        Commands::Search { max_id, since_id } => {
            let outcome = run_search(&config, max_id, since_id).await?;
            println!(
                "Collected {} posts (resume: --max-id {}, follow up: --since-id {})",
                outcome.collected,
                outcome
                    .final_max_id
                    .map_or_else(|| "n/a".to_string(), |id| id.to_string()),
                outcome
                    .latest_id
                    .map_or_else(|| "n/a".to_string(), |id| id.to_string()),
            );
        }
        Commands::Stream => {
            let collected = run_stream(&config).await?;
            println!("Stream ended after collecting {} posts", collected);
        }
        Commands::Friends => {
            let outcome = run_network(&config, NeighborMode::Friends).await?;
            println!(
                "Collected {} friend edges across {} completed accounts",
                outcome.edges_collected, outcome.accounts_completed
            );
        }
        Commands::Followers => {
            let outcome = run_network(&config, NeighborMode::Followers).await?;
            println!(
                "Collected {} follower edges across {} completed accounts",
                outcome.edges_collected, outcome.accounts_completed
            );
        }
        Commands::DryRun => handle_dry_run(&config),
        Commands::Stats => handle_stats(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, session_verbose: bool) {
    let filter = if quiet {
        if session_verbose {
            EnvFilter::new("plover=info,error")
        } else {
            EnvFilter::new("error")
        }
    } else {
        match verbose {
            0 => EnvFilter::new("plover=info,warn"),
            1 => EnvFilter::new("plover=debug,info"),
            2 => EnvFilter::new("plover=trace,debug"),
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

/// Handles the dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Plover Dry Run ===\n");

    println!("Quota:");
    println!(
        "  {} requests per {}s window (sync margin {}s)",
        config.quota.max_requests, config.quota.window_seconds, config.quota.sync_time
    );

    println!("\nSession:");
    match config.session.limit {
        Some(limit) => println!("  Request cap: {}", limit),
        None => println!("  Request cap: unbounded"),
    }
    println!("  Page pause: {}s", config.session.wait_for);
    println!("  Feedback cadence: {}s", config.session.feedback_time);

    println!("\nAPI:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Credentials: {}", config.api.credentials_path);

    if let Some(search) = &config.search {
        println!("\nSearch:");
        println!("  Query: {}", search.query);
        println!("  Page size: {}", search.count);
        if let Some(result_type) = &search.result_type {
            println!("  Result type: {}", result_type);
        }
        if let Some(max_id) = search.max_id {
            println!("  Initial max-id: {}", max_id);
        }
        if let Some(since_id) = search.since_id {
            println!("  Lower bound since-id: {}", since_id);
        }
        if let Some(stop_below_id) = search.stop_below_id {
            println!("  Stop below id: {}", stop_below_id);
        }
        if let Some(stop_before) = &search.stop_before {
            println!("  Stop before: {}", stop_before);
        }
        println!(
            "\nStream cadence: {}s mean, dev-ratio {}",
            config.stream.delta_seconds, config.stream.dev_ratio
        );
    }

    if let Some(network) = &config.network {
        println!("\nNetwork accounts ({}):", network.accounts.len());
        for account in &network.accounts {
            println!("  - {}", account);
        }
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use plover::sink::SqliteSink;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let sink = SqliteSink::new(Path::new(&config.output.database_path))?;

    println!("Posts: {}", sink.count_posts()?);
    println!("Edges: {}", sink.count_edges(None)?);
    match sink.latest_post_id()? {
        Some(id) => println!("Latest post id: {} (use as --since-id to continue)", id),
        None => println!("Latest post id: none"),
    }

    Ok(())
}
