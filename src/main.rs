//! Product Scout main entry point
//!
//! This is the command-line interface for the Product Scout crawler.

use anyhow::Context;
use clap::Parser;
use product_scout::config::{load_config_with_overrides, Config, ConfigOverrides};
use product_scout::output::print_statistics;
use product_scout::Crawler;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Product Scout: a polite product-page discovery crawler
///
/// Product Scout crawls e-commerce sites from a list of seed URLs while
/// respecting robots.txt and crawl delays, and records every page it
/// classifies as a product detail page.
#[derive(Parser, Debug)]
#[command(name = "product-scout")]
#[command(version = "1.0.0")]
#[command(about = "A polite product-page discovery crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the output file path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the number of workers
    #[arg(long)]
    workers: Option<u32>,

    /// Override the maximum crawl depth
    #[arg(long)]
    max_depth: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let overrides = ConfigOverrides {
        output: cli.output.clone(),
        workers: cli.workers,
        max_depth: cli.max_depth,
    };
    let loaded = load_config_with_overrides(&cli.config, &overrides)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", loaded.hash);
    let config = loaded.config;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("product_scout=info,warn"),
            1 => EnvFilter::new("product_scout=debug,info"),
            2 => EnvFilter::new("product_scout=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Product Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Crawl delay: {}ms", config.crawler.crawl_delay_ms);
    println!("  Task timeout: {}s", config.crawler.task_timeout_secs);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Queue capacity: {}", config.crawler.queue_capacity);
    println!("  Stop when idle: {}", config.crawler.stop_when_idle);
    match config.crawler.max_runtime_secs {
        Some(secs) => println!("  Max runtime: {}s", secs),
        None => println!("  Max runtime: unlimited"),
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  {}", config.output.path);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("Total seed URLs: {}", config.seeds.len());

    let crawler = Crawler::new(config).context("failed to initialize crawler")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, draining in-flight pages");
            on_signal.cancel();
        }
    });

    let result = crawler.start(cancel).await;
    print_statistics(&crawler.statistics());

    match result {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
