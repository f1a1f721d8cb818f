//! Chart-Harvest main entry point
//!
//! This is the command-line interface for the Chart-Harvest movie scraper.

use anyhow::Context;
use chart_harvest::config::{load_config_with_hash, validate, Config, StrategyKind};
use chart_harvest::crawler::harvest;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Chart-Harvest: a resilient top-chart movie scraper
///
/// Chart-Harvest reads a ranked movie chart, enriches every title from its
/// detail page, and saves the records to CSV, SQLite and MySQL.
#[derive(Parser, Debug)]
#[command(name = "chart-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient top-chart movie scraper", long_about = None)]
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

    /// Fetch strategy to use instead of the configured one
    #[arg(long, value_name = "NAME")]
    strategy: Option<String>,

    /// Maximum number of movies to take from the chart
    #[arg(long, value_name = "N")]
    max_movies: Option<usize>,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the SQLite database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    apply_overrides(&mut config, &cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("chart_harvest=info,warn"),
            1 => EnvFilter::new("chart_harvest=debug,info"),
            2 => EnvFilter::new("chart_harvest=trace,debug"),
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

/// Applies command-line overrides and re-validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(name) = &cli.strategy {
        config.scraper.strategy = name.parse::<StrategyKind>()?;
        tracing::info!("Strategy overridden: {}", config.scraper.strategy);
    }

    if let Some(max_movies) = cli.max_movies {
        config.scraper.max_movies = max_movies;
        tracing::info!("Max movies overridden: {}", max_movies);
    }

    validate(config).context("Invalid configuration after command-line overrides")?;
    Ok(())
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    let scraper = &config.scraper;

    println!("=== Chart-Harvest Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Target URL: {}", scraper.target_url);
    println!("  Base URL: {}", scraper.base_url);
    println!("  Strategy: {}", scraper.strategy);
    println!("  Max movies: {}", scraper.max_movies);
    println!("  Max actors: {}", scraper.max_actors);
    println!("  Retries: {}", scraper.retries);
    println!("  Timeout: {}s", scraper.timeout_seconds);
    println!("  Delay: {}s - {}s", scraper.delay_min, scraper.delay_max);
    println!("  Markup fallback: {}", scraper.markup_fallback);

    if !scraper.proxies.is_empty() {
        println!("\nProxies ({}):", scraper.proxies.len());
        for proxy in &scraper.proxies {
            println!("  - {}", proxy);
        }
    }

    println!("\nCookies ({}):", config.cookies.len());
    for name in config.cookies.keys() {
        println!("  - {}", name);
    }

    println!("\nOutput:");
    let output = &config.output;
    println!("  CSV: {}", output.csv_path.as_deref().unwrap_or("(disabled)"));
    println!(
        "  SQLite: {}",
        output.sqlite_path.as_deref().unwrap_or("(disabled)")
    );
    println!(
        "  MySQL: {}",
        if output.mysql_url.is_some() {
            "enabled"
        } else {
            "(disabled)"
        }
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the SQLite database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use chart_harvest::output::{load_statistics, print_statistics, SqliteSink};

    let path = config
        .output
        .sqlite_path
        .as_deref()
        .context("No sqlite-path configured in [output]")?;
    println!("Database: {}\n", path);

    let sink = SqliteSink::open(Path::new(path))
        .with_context(|| format!("Failed to open database {}", path))?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting harvest: strategy {}, up to {} movies",
        config.scraper.strategy,
        config.scraper.max_movies
    );

    let report = harvest(config)
        .await
        .context("Failed to initialize the harvester")?;

    println!("Movies harvested: {}", report.movies.len());
    for outcome in &report.sinks {
        match &outcome.error {
            None => println!("  {}: saved", outcome.sink),
            Some(error) => println!("  {}: failed ({})", outcome.sink, error),
        }
    }

    Ok(())
}
