//! End-to-end digest pipeline: snapshot → parse → classify → enrich → weekly document.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, instrument};

use arxivdigest_classify::classify;
use arxivdigest_document::{SectionLabels, WeeklyDocument, render_date_section};
use arxivdigest_enrichment::{EnrichOptions, EnrichStats, Enricher, EnrichmentProgress};
use arxivdigest_listing::{ListingSnapshot, parse_snapshot};
use arxivdigest_shared::{CategoryRules, EnrichedRecord, Result, WeekRange};
use arxivdigest_storage::DocumentStore;

/// Configuration for one digest run.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Date the section is keyed by.
    pub date: NaiveDate,
    /// Category and keyword rules.
    pub rules: CategoryRules,
    /// Enrichment pool settings.
    pub enrich: EnrichOptions,
}

/// Result of one digest run.
#[derive(Debug)]
pub struct ProcessResult {
    pub date: NaiveDate,
    pub week: WeekRange,
    /// Entries extracted from the snapshot.
    pub records_parsed: usize,
    /// Records surviving classification.
    pub records_retained: usize,
    pub primary_count: usize,
    pub rl_count: usize,
    pub accelerat_count: usize,
    /// Records dropped by classification (revisions, duplicates, filters).
    pub records_dropped: usize,
    /// Enrichment counters.
    pub enrich: EnrichStats,
    /// Weekly document the section was written to.
    pub document_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each record resolves during enrichment.
    fn record_enriched(&self, current: usize, total: usize, detail: &str);
    /// Called when the run completes.
    fn done(&self, result: &ProcessResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_enriched(&self, _current: usize, _total: usize, _detail: &str) {}
    fn done(&self, _result: &ProcessResult) {}
}

/// Run the full digest pipeline for one snapshot.
///
/// 1. Parse the listing snapshot into records
/// 2. Classify (revision filter, dedup, category and keyword rules)
/// 3. Enrich primary records through the worker pool
/// 4. Render the date section and merge it into the weekly document
#[instrument(skip_all, fields(date = %config.date, source = %snapshot.source))]
pub async fn process_snapshot(
    config: &ProcessConfig,
    snapshot: &ListingSnapshot,
    store: &DocumentStore,
    progress: &dyn ProgressReporter,
) -> Result<ProcessResult> {
    let start = Instant::now();
    let week = WeekRange::for_date(config.date);

    info!(
        date = %config.date,
        week = %week,
        hash = %snapshot.content_hash,
        "starting digest run"
    );

    // --- Phase 1: Parse ---
    progress.phase("Parsing listing snapshot");
    let parsed = parse_snapshot(&snapshot.html);
    let records_parsed = parsed.len();

    // --- Phase 2: Classify ---
    progress.phase("Classifying records");
    let classification = classify(parsed, &config.rules);
    let records_retained = classification.records.len();
    let primary_count = classification.primary_count();
    let rl_count = classification.rl_count();
    let accelerat_count = classification.accelerat_count();
    let records_dropped = classification.total_dropped();

    // --- Phase 3: Enrich ---
    progress.phase("Enriching primary records");
    let enricher = Enricher::new(config.enrich.clone())?;
    let enrich_progress = PipelineEnrichmentProgress { inner: progress };
    let (enriched, enrich_stats) = enricher
        .enrich_records(classification.records, &enrich_progress)
        .await;

    // --- Phase 4: Render and merge ---
    progress.phase("Updating weekly document");
    let labels = SectionLabels::from_rules(&config.rules);
    let document_path = write_date_section(store, config.date, &enriched, &labels)?;

    let result = ProcessResult {
        date: config.date,
        week,
        records_parsed,
        records_retained,
        primary_count,
        rl_count,
        accelerat_count,
        records_dropped,
        enrich: enrich_stats,
        document_path,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        date = %result.date,
        parsed = result.records_parsed,
        retained = result.records_retained,
        enriched = result.enrich.enriched,
        path = %result.document_path.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "digest run complete"
    );

    Ok(result)
}

/// Render one day's section and merge it into the owning weekly document.
///
/// Re-running a date replaces its section in place; new dates insert in
/// chronological order. The save is atomic, so an interrupted run leaves
/// the previous document intact.
pub fn write_date_section(
    store: &DocumentStore,
    date: NaiveDate,
    records: &[EnrichedRecord],
    labels: &SectionLabels,
) -> Result<PathBuf> {
    let week = WeekRange::for_date(date);
    let section = render_date_section(records, date, labels);

    let mut document = match store.load(week)? {
        Some(content) => WeeklyDocument::parse(week, &content)?,
        None => WeeklyDocument::new(week),
    };
    document.upsert_section(section);
    store.save(week, &document.render())
}

// ---------------------------------------------------------------------------
// Enrichment progress adapter
// ---------------------------------------------------------------------------

/// Adapts a `ProgressReporter` to the enrichment progress interface.
struct PipelineEnrichmentProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl EnrichmentProgress for PipelineEnrichmentProgress<'_> {
    fn task_progress(&self, current: usize, total: usize, detail: &str) {
        self.inner.record_enriched(current, total, detail);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
