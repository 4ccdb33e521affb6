//! Event Harvester main entry point
//!
//! This is the command-line interface for the event harvester.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use event_harvester::config::{load_config_with_hash, validate_run, Action, HarvestConfig, RunConfig};
use event_harvester::crawler::{run_harvest, CrawlExecutor, CrawlPolicy};
use event_harvester::output::{print_report, write_outputs, OutputBatch};
use event_harvester::sites::{known_hosts, resolve_site, Site};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Event Harvester: crawl-and-extract for event listing sites
///
/// `scrape` extracts a single event page. `crawl` walks a paginated listing
/// or calendar and extracts every event page it links to.
#[derive(Parser, Debug)]
#[command(name = "event-harvester")]
#[command(version)]
#[command(about = "Crawl event listings and extract event records", long_about = None)]
struct Cli {
    /// Entry URL (event page for scrape, listing page for crawl)
    #[arg(value_name = "URL")]
    url: String,

    /// What to do with the URL
    #[arg(value_enum, value_name = "ACTION")]
    action: ActionArg,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render pages without a visible browser window (default)
    #[arg(long, overrides_with = "no_headless")]
    headless: bool,

    /// Render pages in a visible browser window
    #[arg(long, overrides_with = "headless")]
    no_headless: bool,

    /// Minimum delay between requests, in seconds
    #[arg(long, value_name = "SECONDS")]
    min_delay: Option<f64>,

    /// Maximum delay between requests, in seconds
    #[arg(long, value_name = "SECONDS")]
    max_delay: Option<f64>,

    /// Retries per URL after the first attempt
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Detail pages extracted at once (1 = sequential)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Maximum listing pages visited by a crawl
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Extract detail pages while paginating instead of after
    #[arg(long)]
    eager: bool,

    /// Directory for result files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Resolve the site and show the effective configuration without fetching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ActionArg {
    Scrape,
    Crawl,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Scrape => Action::Scrape,
            ActionArg::Crawl => Action::Crawl,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let run = build_run_config(&cli)?;

    if cli.dry_run {
        let site = resolve_site(&run.entry_url)
            .with_context(|| format!("Cannot handle {}", run.entry_url))?;
        handle_dry_run(&run, site.as_ref());
        return Ok(());
    }

    handle_harvest(&run)
        .await
        .with_context(|| format!("Harvest of {} failed", run.entry_url))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("event_harvester=info,warn"),
            1 => EnvFilter::new("event_harvester=debug,info"),
            2 => EnvFilter::new("event_harvester=trace,debug"),
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

/// Layers command-line arguments over the file configuration
fn build_run_config(cli: &Cli) -> anyhow::Result<RunConfig> {
    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (HarvestConfig::default(), None),
    };

    let entry_url = Url::parse(cli.url.trim())
        .with_context(|| format!("Invalid URL: {}", cli.url))?;

    let mut run = RunConfig::from_config(cli.action.into(), entry_url, &config);
    run.config_hash = config_hash;
    run.headless = cli.headless || !cli.no_headless;
    if let Some(min_delay) = cli.min_delay {
        run.min_delay = min_delay;
    }
    if let Some(max_delay) = cli.max_delay {
        run.max_delay = max_delay;
    }
    if let Some(max_retries) = cli.max_retries {
        run.max_retries = max_retries;
    }
    if let Some(concurrency) = cli.concurrency {
        run.concurrency = concurrency;
    }
    if let Some(max_pages) = cli.max_pages {
        run.max_pages = max_pages;
    }
    if let Some(output_dir) = &cli.output_dir {
        run.output_dir = output_dir.clone();
    }
    run.eager |= cli.eager;

    validate_run(&run).context("Invalid run configuration")?;
    Ok(run)
}

/// Handles the --dry-run mode: shows the site and effective configuration
fn handle_dry_run(run: &RunConfig, site: &dyn Site) {
    println!("=== Event Harvester Dry Run ===\n");

    println!("Run:");
    println!("  Action: {}", run.action);
    println!("  Entry URL: {}", run.entry_url);
    println!("  Site: {}", site.name());
    println!("  Detail prefix: {}", site.classifier().detail_prefix());
    println!("  Detail fetch: {}", site.detail_fetch().mode);
    if run.action == Action::Crawl {
        println!("  Listing fetch: {}", site.crawl_entry().fetch_mode);
        println!("  Max pages: {}", run.max_pages);
        println!("  Eager: {}", run.eager);
    }

    println!("\nPolicy:");
    println!("  Delay: {:.2}s - {:.2}s", run.min_delay, run.max_delay);
    println!("  Max retries: {}", run.max_retries);
    println!("  Concurrency: {}", run.concurrency);
    println!("  Request timeout: {}s", run.request_timeout);
    println!("  Backoff base: {:.2}s", run.backoff_base);
    println!("  Headless: {}", run.headless);

    println!("\nUser Agent:");
    println!("  Pool size: {}", run.user_agent.agents.len());
    println!("  Rotate after: {} requests", run.user_agent.rotate_after);

    println!("\nOutput:");
    println!("  Directory: {}", run.output_dir.display());
    println!("  Formats: {:?}", run.formats);
    if let Some(hash) = &run.config_hash {
        println!("  Config hash: {}", hash);
    }

    println!(
        "\nSupported sites: {}",
        known_hosts().collect::<Vec<_>>().join(", ")
    );
    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(run: &RunConfig) -> event_harvester::Result<()> {
    let executor = CrawlExecutor::new(CrawlPolicy::from_run(run));
    let abort = executor.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing in-flight pages");
            abort.abort();
        }
    });

    let outcome = run_harvest(&executor, run).await?;

    let batch = OutputBatch {
        records: &outcome.records,
        source_url: &run.entry_url,
        action: run.action,
        report: &outcome.report,
        generated_at: Utc::now(),
    };
    let written = write_outputs(&batch, &run.output_dir, &run.formats)?;

    for path in &written {
        println!("Wrote {}", path.display());
    }

    print_report(&outcome.report);
    Ok(())
}
