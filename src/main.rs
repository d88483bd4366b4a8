//! Warta main entry point
//!
//! This is the command-line interface for the Warta news-index crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use warta::config::{load_config_with_hash, Config};
use warta::crawler::{CategorySelector, Coordinator, CrawlRequest};
use warta::output::{default_export_path, print_statistics, write_session_json};
use warta::Site;

/// Warta: a polite news-index crawler
///
/// Warta walks the daily index pages of Indonesian news sites, fetches every
/// article listed for the chosen date and categories, and exports the
/// extracted articles together with a record of everything that failed.
#[derive(Parser, Debug)]
#[command(name = "warta")]
#[command(version)]
#[command(about = "A polite news-index crawler", long_about = None)]
struct Cli {
    /// Site to crawl: bisnis, detik, kompas, cnbc, cnn
    #[arg(value_name = "SITE")]
    site: Site,

    /// Date filter in the site's own format (see --list-categories output)
    #[arg(short, long, required_unless_present = "list_categories")]
    date: Option<String>,

    /// Category to crawl, by id, slug or name; repeat for several (default: all)
    #[arg(short, long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop each category after this many listing pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Fetch at most this many articles per category
    #[arg(long, value_name = "N")]
    max_articles: Option<usize>,

    /// Cancel the session after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Output JSON file (default: {output.directory}/{site}_{date}.json)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Crawl a mirror or test server instead of the live site
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Print the site's categories and exit
    #[arg(long)]
    list_categories: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_configuration(cli.config.as_deref())?;

    let adapter = cli
        .site
        .adapter(cli.base_url.as_deref())
        .with_context(|| format!("Cannot build adapter for {}", cli.site))?;
    let mut coordinator = Coordinator::new(config.clone(), adapter)?;
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    if cli.list_categories {
        return handle_list_categories(cli.site, &coordinator).await;
    }

    let date = cli
        .date
        .clone()
        .context("--date is required unless --list-categories is given")?;
    handle_crawl(&cli, &config, coordinator, date).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warta=info,warn"),
            1 => EnvFilter::new("warta=debug,info"),
            2 => EnvFilter::new("warta=trace,debug"),
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

/// Loads the config file when given, otherwise the built-in defaults
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Config, Option<String>)> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok((Config::default(), None));
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok((config, Some(hash)))
}

/// Handles the --list-categories mode
async fn handle_list_categories(site: Site, coordinator: &Coordinator) -> anyhow::Result<()> {
    let categories = coordinator.discover().await?;

    println!("=== {} categories ===\n", site);
    if categories.is_empty() {
        println!("  (none listed)");
    }
    for category in &categories {
        println!("  {:<24} id: {:<12} slug: {}", category.name, category.id, category.slug);
    }
    println!("\nDate format: {}", site.date_format());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    cli: &Cli,
    config: &Config,
    coordinator: Coordinator,
    date: String,
) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} for {} (expected format {})",
        cli.site,
        date,
        cli.site.date_format()
    );

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            cancel.cancel();
        }
    });

    let request = CrawlRequest::new(date)
        .with_categories(CategorySelector::from_tokens(cli.categories.clone()))
        .with_max_pages(cli.max_pages)
        .with_max_articles(cli.max_articles)
        .with_timeout(cli.timeout.map(Duration::from_secs));

    let snapshot = coordinator.run(request).await?;

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_export_path(Path::new(&config.output.directory), &snapshot));
    write_session_json(&snapshot, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    print_statistics(&snapshot);
    println!("\n✓ Session exported to: {}", path.display());

    Ok(())
}
