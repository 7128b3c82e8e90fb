//! Site-Harvester main entry point
//!
//! This is the command-line interface for the Site-Harvester crawler.

use clap::Parser;
use site_harvester::config::{load_config_with_hash, Config};
use site_harvester::crawler::{run_crawl, CrawlRequest, CrawlSummary};
use site_harvester::output::{CrawlSummaryResponse, ErrorResponse};
use site_harvester::storage::{open_records, MemoryRecordStore};
use site_harvester::HarvestError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Harvester: a bounded single-domain web harvester
///
/// Site-Harvester crawls one site breadth-first from a seed URL, saves the
/// visible text and images of every page it visits and prints a JSON summary.
#[derive(Parser, Debug)]
#[command(name = "site-harvester")]
#[command(version)]
#[command(about = "A bounded single-domain web harvester", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "SEED", required_unless_present = "stats")]
    seed: Option<String>,

    /// Maximum number of pages to visit (1-100)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    max_pages: Option<i64>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Keep page records in memory instead of the database
    #[arg(long)]
    no_db: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the request and config without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "no_db"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the JSON response
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => return report_failure(&e),
    };

    let result = if cli.stats {
        handle_stats(&config)
    } else if cli.dry_run {
        handle_dry_run(&cli, &config)
    } else {
        handle_crawl(&cli, &config, &config_hash).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvester=info,warn"),
            1 => EnvFilter::new("site_harvester=debug,info"),
            2 => EnvFilter::new("site_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<(Config, String), HarvestError> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok((Config::default(), String::from("defaults")));
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok((config, hash))
}

fn request(cli: &Cli, config: &Config) -> Result<CrawlRequest, HarvestError> {
    let seed = cli.seed.as_deref().unwrap_or_default();
    CrawlRequest::with_default(seed, cli.max_pages, config.crawler.default_max_pages)
}

/// Handles the --dry-run mode: validates input and shows what would be crawled
fn handle_dry_run(cli: &Cli, config: &Config) -> Result<(), HarvestError> {
    let request = request(cli, config)?;

    println!("=== Site-Harvester Dry Run ===\n");

    println!("Request:");
    println!("  Seed: {}", request.seed());
    println!("  Max pages: {}", request.max_pages());

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max redirects: {}", config.fetcher.max_redirects);
    println!("  Retries: {}", config.fetcher.retries);

    println!("\nCrawler:");
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages
    );
    println!(
        "  Max concurrent images: {}",
        config.crawler.max_concurrent_images
    );
    if let Some(secs) = config.crawler.crawl_timeout_secs {
        println!("  Crawl timeout: {}s", secs);
    }

    println!("\nOutput:");
    println!("  Content directory: {}", config.output.content_dir);
    if cli.no_db {
        println!("  Database: disabled");
    } else {
        println!("  Database: {}", config.output.database_path);
    }

    println!("\n✓ Request and configuration are valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), HarvestError> {
    use site_harvester::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.output.database_path);

    let records = open_records(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&records)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(cli: &Cli, config: &Config, config_hash: &str) -> Result<(), HarvestError> {
    let request = request(cli, config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight pages");
            ctrl_c.cancel();
        }
    });

    let summary = if cli.no_db {
        run_crawl(config, config_hash, &request, MemoryRecordStore::new(), cancel).await?
    } else {
        let records = open_records(Path::new(&config.output.database_path))?;
        run_crawl(config, config_hash, &request, records, cancel).await?
    };

    print_summary(&summary)
}

fn print_summary(summary: &CrawlSummary) -> Result<(), HarvestError> {
    let response = CrawlSummaryResponse::from(summary);
    let json = serde_json::to_string_pretty(&response).map_err(std::io::Error::from)?;
    println!("{}", json);
    Ok(())
}

/// Prints the invocation-level error body and returns a failing exit code
fn report_failure(error: &HarvestError) -> ExitCode {
    tracing::error!("Scraping failed: {}", error);
    let response = ErrorResponse::scraping_failed(error.to_string());
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(_) => println!("{{\"error\": \"Scraping failed\"}}"),
    }
    ExitCode::FAILURE
}
