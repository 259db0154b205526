//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use orgscout_core::{EnrichRequest, Enricher, ProgressReporter};
use orgscout_shared::{AppConfig, CompanyRecord, init_config, load_config, load_config_from};
use orgscout_storage::{MemoryCache, Storage, WebsiteCache};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// OrgScout: find job-application emails and company facts.
#[derive(Parser)]
#[command(
    name = "orgscout",
    version,
    about = "Find job-application emails, website and social profiles for a company.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.orgscout/orgscout.toml).
    #[arg(long, env = "ORGSCOUT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich one company.
    Enrich {
        /// Company name as it appears in the job listing.
        name: String,

        /// Free-text location, e.g. "München - Schwabing".
        #[arg(short, long)]
        location: Option<String>,

        /// Three-letter country code, e.g. DEU.
        #[arg(long)]
        locale: Option<String>,

        /// Print the record as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Keep fetched pages in memory only.
        #[arg(long)]
        no_cache: bool,
    },

    /// Website cache maintenance.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Remove websites whose time to live has elapsed.
    Prune,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

const LOG_TARGETS: &[&str] = &[
    "orgscout",
    "orgscout_core",
    "orgscout_search",
    "orgscout_crawler",
    "orgscout_matching",
    "orgscout_storage",
    "orgscout_shared",
];

/// Initialize tracing based on CLI flags. Logs go to stderr so that
/// `--json` output on stdout stays parseable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Enrich {
            name,
            location,
            locale,
            json,
            no_cache,
        } => {
            let config = resolve_config(config_path.as_deref())?;
            let request = EnrichRequest {
                name,
                location,
                locale: locale.map(|l| l.to_uppercase()),
            };
            cmd_enrich(&config, &request, json, no_cache).await
        }
        Command::Cache { action } => match action {
            CacheAction::Prune => cmd_cache_prune(&resolve_config(config_path.as_deref())?).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn open_cache(config: &AppConfig) -> Result<Storage> {
    let path = config.cache.resolved_path()?;
    let ttl = chrono::Duration::days(i64::from(config.cache.ttl_days));
    Ok(Storage::open(&path, ttl).await?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_enrich(config: &AppConfig, request: &EnrichRequest, json: bool, no_cache: bool) -> Result<()> {
    let cache: Arc<dyn WebsiteCache> = if no_cache {
        let ttl = chrono::Duration::days(i64::from(config.cache.ttl_days));
        Arc::new(MemoryCache::new(ttl))
    } else {
        Arc::new(open_cache(config).await?)
    };

    let enricher = Enricher::from_config(config, cache)?;

    info!(
        name = %request.name,
        location = request.location.as_deref().unwrap_or_default(),
        locale = request.locale.as_deref().unwrap_or_default(),
        "enriching company"
    );

    let reporter = CliProgress::new();
    let record = match enricher.enrich(request, &reporter).await {
        Ok(record) => record,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(eyre!(e));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_summary(&record);
    }
    Ok(())
}

fn print_summary(record: &CompanyRecord) {
    let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();

    println!();
    println!("  {}", record.name);
    println!("  Website:   {}", or_dash(record.website.as_deref()));
    println!("  Apply to:  {}", joined(&record.job_application_emails));
    println!("  Emails:    {}", joined(&record.emails));
    println!("  LinkedIn:  {}", or_dash(record.social.linkedin.as_deref()));
    println!("  Twitter:   {}", or_dash(record.social.twitter.as_deref()));
    println!("  Facebook:  {}", or_dash(record.social.facebook.as_deref()));
    if !record.industries.is_empty() {
        println!("  Industry:  {}", record.industries.join(", "));
    }
    if let Some(year) = record.founded_year {
        println!("  Founded:   {year}");
    }
    if let Some(employees) = &record.employees {
        println!("  Employees: {employees}");
    }
    println!();
}

fn joined(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

async fn cmd_cache_prune(config: &AppConfig) -> Result<()> {
    let storage = open_cache(config).await?;
    match storage.remove_expired().await {
        Ok(removed) => {
            println!("Removed {removed} expired website(s) from the cache.");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "could not remove expired websites");
            Err(eyre!("cache prune failed: {e}"))
        }
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&std::path::Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _record: &CompanyRecord) {
        self.spinner.finish_and_clear();
    }
}
