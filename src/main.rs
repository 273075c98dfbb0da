//! Awesome-Metrics main entry point
//!
//! This is the command-line interface for scraping awesome lists and
//! analyzing the collected repository metrics.

use anyhow::Context;
use awesome_metrics::analyze::{analyze_file, AnalysisQuery, Bounds, Metric, MetricFilter, SortOrder};
use awesome_metrics::config::{load_config, validate, Config};
use awesome_metrics::crawler::{
    run_scrape, Coordinator, NoToken, ResolverChain, ScrapeOptions, SessionOutcome, TokenResolver,
};
use awesome_metrics::output::{format_markdown_report, print_report, render, OutputFormat};
use awesome_metrics::url::parse_source_url;
use awesome_metrics::MetricsRecord;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Awesome-Metrics: popularity metrics for awesome lists
///
/// Scrapes a curated list page for GitHub repository links, collects star,
/// fork and watcher counts for each repository, and sorts or filters the
/// resulting dataset.
#[derive(Parser, Debug)]
#[command(name = "awesome-metrics")]
#[command(version)]
#[command(about = "Popularity metrics for awesome lists", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect metrics for every repository linked from a page
    Scrape(ScrapeArgs),

    /// Sort and filter a collected dataset
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Page to extract repository links from
    #[arg(value_name = "SOURCE_URL")]
    source_url: String,

    /// Dataset path (default: derived from the source URL)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Abort after this many consecutive failed fetches
    #[arg(long, value_name = "N")]
    max_failures: Option<u32>,

    /// API token (default: GITHUB_TOKEN, then the GitHub CLI)
    #[arg(long, value_name = "TOKEN", conflicts_with = "no_auth")]
    token: Option<String>,

    /// Send unauthenticated requests
    #[arg(long)]
    no_auth: bool,

    /// Keep records from an existing dataset and skip their repositories
    #[arg(long)]
    resume: bool,

    /// List the repositories that would be fetched without calling the API
    #[arg(long)]
    dry_run: bool,

    /// Pause between API requests
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Longest rate-limit reset to wait for before retrying (0 disables)
    #[arg(long, value_name = "SECS")]
    rate_limit_wait: Option<u64>,

    /// API base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Also write a markdown summary of the session
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Dataset written by `scrape`
    #[arg(value_name = "DATASET")]
    dataset: PathBuf,

    /// Metric to sort by: stars, forks or watchers
    #[arg(long, default_value = "stars")]
    sort_by: Metric,

    /// Sort ascending instead of descending
    #[arg(long)]
    ascending: bool,

    #[arg(long, value_name = "N")]
    min_stars: Option<u64>,

    #[arg(long, value_name = "N")]
    max_stars: Option<u64>,

    #[arg(long, value_name = "N")]
    min_forks: Option<u64>,

    #[arg(long, value_name = "N")]
    max_forks: Option<u64>,

    #[arg(long, value_name = "N")]
    min_watchers: Option<u64>,

    #[arg(long, value_name = "N")]
    max_watchers: Option<u64>,

    /// Show at most N repositories
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Output format: table, json or markdown
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

impl AnalyzeArgs {
    fn query(&self) -> AnalysisQuery {
        AnalysisQuery {
            sort_by: self.sort_by,
            order: if self.ascending {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            },
            filter: MetricFilter {
                stars: Bounds::new(self.min_stars, self.max_stars),
                forks: Bounds::new(self.min_forks, self.max_forks),
                watchers: Bounds::new(self.min_watchers, self.max_watchers),
            },
            limit: self.limit,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Scrape(args) => handle_scrape(cli.config, args).await,
        Command::Analyze(args) => handle_analyze(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("awesome_metrics=info,warn"),
            1 => EnvFilter::new("awesome_metrics=debug,info"),
            2 => EnvFilter::new("awesome_metrics=trace,debug"),
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

/// Loads the configuration file (if any) and layers command-line overrides on top
fn load_scrape_config(path: Option<PathBuf>, args: &ScrapeArgs) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(max_failures) = args.max_failures {
        config.scraper.max_failures = max_failures;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.scraper.request_delay_ms = delay_ms;
    }
    if let Some(wait) = args.rate_limit_wait {
        config.scraper.rate_limit_max_wait_secs = wait;
    }
    if let Some(api_url) = &args.api_url {
        config.api.base_url = api_url.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Exit status for a finished session: 0 complete, 2 failure threshold,
/// 3 fatal API error
fn exit_status(outcome: &SessionOutcome) -> u8 {
    match outcome {
        SessionOutcome::Completed => 0,
        SessionOutcome::AbortedFailures { .. } => 2,
        SessionOutcome::AbortedFatal { .. } => 3,
    }
}

/// Handles the scrape subcommand
async fn handle_scrape(config_path: Option<PathBuf>, args: ScrapeArgs) -> anyhow::Result<ExitCode> {
    let config = load_scrape_config(config_path, &args)?;
    let source_url = parse_source_url(&args.source_url)
        .with_context(|| format!("Invalid source URL '{}'", args.source_url))?;

    let options = ScrapeOptions {
        source_url,
        output: args.output.clone(),
        resume: args.resume,
    };

    if args.dry_run {
        return handle_dry_run(&config, &options).await;
    }

    let resolver: Box<dyn TokenResolver> = if args.no_auth {
        Box::new(NoToken)
    } else {
        Box::new(ResolverChain::standard(args.token.as_deref()))
    };

    let report = run_scrape(&config, &options, resolver.as_ref())
        .await
        .with_context(|| format!("Scrape of {} failed", options.source_url))?;

    print_report(&report);

    if let Some(path) = &args.summary {
        std::fs::write(path, format_markdown_report(&report))
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to {}", path.display());
    }

    Ok(ExitCode::from(exit_status(&report.outcome)))
}

/// Handles --dry-run: lists extracted repositories without calling the API
async fn handle_dry_run(config: &Config, options: &ScrapeOptions) -> anyhow::Result<ExitCode> {
    println!("=== Awesome-Metrics Dry Run ===\n");

    let output_path = options.output_path()?;
    println!("Source: {}", options.source_url);
    println!("Output: {}", output_path.display());
    println!("API: {}", config.api.base_url);
    println!("Max consecutive failures: {}", config.scraper.max_failures);

    let coordinator = Coordinator::new(config, None)?;
    let references = coordinator.discover(&options.source_url).await?;

    println!("\nRepositories ({}):", references.len());
    for reference in &references {
        println!("  - {}", reference);
    }

    println!(
        "\n✓ Would fetch metrics for {} repositories",
        references.len()
    );

    Ok(ExitCode::SUCCESS)
}

/// Handles the analyze subcommand
fn handle_analyze(args: AnalyzeArgs) -> anyhow::Result<ExitCode> {
    let query = args.query();
    let view = analyze_file(&args.dataset, &query)
        .with_context(|| format!("Failed to analyze {}", args.dataset.display()))?;

    let records: Vec<&MetricsRecord> = view.iter().collect();
    print!("{}", render(&records, args.format)?);

    Ok(ExitCode::SUCCESS)
}
