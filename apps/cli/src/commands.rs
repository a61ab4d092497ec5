//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use arxivdigest_core::pipeline::{ProcessConfig, ProcessResult, ProgressReporter};
use arxivdigest_document::SectionLabels;
use arxivdigest_enrichment::{EnrichOptions, LlmOptions};
use arxivdigest_listing::{ListingOptions, ListingSnapshot, fetch_snapshot};
use arxivdigest_shared::{
    AppConfig, CategoryRules, EnrichedRecord, init_config, load_config, validate_api_key,
};
use arxivdigest_storage::{DocumentStore, FileDateLedger, ProcessedDateLedger};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "arxivdigest",
    version,
    about = "Turn daily arXiv listings into enriched weekly Markdown digests.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Process a daily listing and merge it into the weekly digest.
    Run {
        /// Read saved listing HTML from a file instead of fetching.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Digest date (YYYY-MM-DD). Defaults to the date announced on the page.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Reprocess the date even if the ledger already has it.
        #[arg(long)]
        force: bool,

        /// Output directory for weekly documents (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Render a date section from saved records and merge it into the digest.
    Assemble {
        /// JSON file holding an array of enriched records.
        #[arg(long)]
        records: PathBuf,

        /// Date the section is keyed by (YYYY-MM-DD).
        #[arg(long)]
        date: NaiveDate,

        /// Output directory for weekly documents (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "arxivdigest=info",
        1 => "arxivdigest=debug",
        _ => "arxivdigest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            snapshot,
            date,
            force,
            out,
        } => cmd_run(snapshot.as_deref(), date, force, out.as_deref()).await,
        Command::Assemble { records, date, out } => {
            cmd_assemble(&records, date, out.as_deref()).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(
    snapshot_path: Option<&Path>,
    date_override: Option<NaiveDate>,
    force: bool,
    out: Option<&str>,
) -> Result<()> {
    // Validate API key before doing anything
    let config = load_config()?;
    validate_api_key(&config)?;

    // Acquire the snapshot: saved HTML replays through the same parse path
    let snapshot = match snapshot_path {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .map_err(|e| eyre!("cannot read snapshot '{}': {e}", path.display()))?;
            ListingSnapshot::from_html(html, path.display().to_string())
        }
        None => {
            Url::parse(&config.listing.url)
                .map_err(|e| eyre!("invalid listing URL '{}': {e}", config.listing.url))?;
            fetch_snapshot(&ListingOptions {
                url: config.listing.url.clone(),
                timeout_secs: config.listing.timeout_secs,
            })
            .await?
        }
    };

    // Date priority: explicit flag, then the page header, then today
    let date = date_override
        .or_else(|| snapshot.listing_date())
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut ledger = FileDateLedger::new(&config.output.ledger_file);
    if !force && ledger.contains(date)? {
        println!(
            "{date} already processed (ledger: {}). Use --force to rerun.",
            ledger.path().display()
        );
        return Ok(());
    }

    let process_config = ProcessConfig {
        date,
        rules: CategoryRules::from(&config),
        enrich: enrich_options(&config),
    };

    let store = DocumentStore::new(out.unwrap_or(&config.output.daily_dir));

    info!(
        date = %date,
        source = %snapshot.source,
        force,
        "processing daily listing"
    );

    // Set up progress reporting
    let reporter = CliProgress::new();

    let result =
        arxivdigest_core::pipeline::process_snapshot(&process_config, &snapshot, &store, &reporter)
            .await?;

    ledger.add(date)?;

    // Print summary
    println!();
    println!("  Daily digest updated!");
    println!("  Date:      {}", result.date);
    println!("  Week:      {}", result.week);
    println!("  Parsed:    {}", result.records_parsed);
    println!("  Retained:  {}", result.records_retained);
    println!("  Primary:   {}", result.primary_count);
    println!("  Enriched:  {}", result.enrich.enriched);
    println!("  Document:  {}", result.document_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// Build enrichment pool options from the loaded config.
fn enrich_options(config: &AppConfig) -> EnrichOptions {
    // Key presence checked by validate_api_key at startup
    let api_key = std::env::var(&config.deepseek.api_key_env).unwrap_or_default();

    EnrichOptions {
        workers: config.enrichment.workers,
        max_first_page_chars: config.enrichment.max_first_page_chars,
        temp_dir: PathBuf::from(&config.enrichment.temp_dir),
        timeout_secs: config.enrichment.timeout_secs,
        llm: LlmOptions {
            base_url: config.deepseek.base_url.clone(),
            api_key,
            model: config.deepseek.model.clone(),
            timeout_secs: config.enrichment.timeout_secs,
        },
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
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
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_enriched(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}] {detail}"));
    }

    fn done(&self, _result: &ProcessResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// assemble
// ---------------------------------------------------------------------------

async fn cmd_assemble(records_path: &Path, date: NaiveDate, out: Option<&str>) -> Result<()> {
    let config = load_config()?;

    let content = std::fs::read_to_string(records_path)
        .map_err(|e| eyre!("cannot read records '{}': {e}", records_path.display()))?;
    let records: Vec<EnrichedRecord> = serde_json::from_str(&content)
        .map_err(|e| eyre!("invalid records JSON '{}': {e}", records_path.display()))?;

    let rules = CategoryRules::from(&config);
    let labels = SectionLabels::from_rules(&rules);
    let store = DocumentStore::new(out.unwrap_or(&config.output.daily_dir));

    info!(date = %date, records = records.len(), "assembling date section");

    let path = arxivdigest_core::pipeline::write_date_section(&store, date, &records, &labels)?;

    println!("Section for {date} written to: {}", path.display());

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
