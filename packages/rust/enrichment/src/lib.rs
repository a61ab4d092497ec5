//! Record enrichment: transient PDF downloads plus DeepSeek summarization.
//!
//! Only primary-tier records go through the full treatment (download the
//! PDF, extract first-page text, call the chat API, parse the labeled
//! reply). Secondary records pass through untouched. Every failure is
//! per-record: the fields stay empty and the batch continues.

mod client;
mod pdf;
mod reply;

pub use client::{LlmClient, LlmOptions};
pub use reply::parse_reply;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arxivdigest_shared::{ClassifiedRecord, DigestError, EnrichedRecord, Enrichment, Result};
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub(crate) const USER_AGENT: &str = concat!("arxivdigest/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Settings for an enrichment pass.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Concurrent enrichment workers.
    pub workers: u32,
    /// Bound on first-page text passed to the model, in characters.
    pub max_first_page_chars: usize,
    /// Directory for transient PDF downloads.
    pub temp_dir: PathBuf,
    /// PDF download timeout in seconds.
    pub timeout_secs: u64,
    /// Chat-completions settings.
    pub llm: LlmOptions,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Per-record progress callback for enrichment passes.
pub trait EnrichmentProgress: Send + Sync {
    /// Called after each record completes, in output order.
    fn task_progress(&self, current: usize, total: usize, detail: &str);
}

/// No-op progress reporter for headless use.
pub struct SilentEnrichmentProgress;

impl EnrichmentProgress for SilentEnrichmentProgress {
    fn task_progress(&self, _current: usize, _total: usize, _detail: &str) {}
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Summary counters for a completed enrichment pass.
#[derive(Debug, Clone, Default)]
pub struct EnrichStats {
    /// Primary records sent to a worker.
    pub attempted: usize,
    /// Attempts that produced populated fields.
    pub enriched: usize,
    /// Primary records with no usable PDF link.
    pub skipped_no_pdf: usize,
    /// Attempts that ended with empty fields (download, extraction, or API).
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// A unit of output: either finished inline or waiting on a worker.
/// The classified fallback restores the record if the task dies.
enum Slot {
    Ready(EnrichedRecord),
    Pending(JoinHandle<EnrichedRecord>, ClassifiedRecord),
}

/// Runs the enrichment pool over a classified record set.
pub struct Enricher {
    http: Client,
    llm: Arc<LlmClient>,
    opts: EnrichOptions,
}

impl Enricher {
    pub fn new(opts: EnrichOptions) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| DigestError::Network(format!("failed to build HTTP client: {e}")))?;
        let llm = Arc::new(LlmClient::new(opts.llm.clone())?);
        Ok(Self { http, llm, opts })
    }

    /// Enrich primary records concurrently; secondary records pass through.
    ///
    /// Output order always equals input order, whatever order the workers
    /// finish in.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn enrich_records(
        &self,
        records: Vec<ClassifiedRecord>,
        progress: &dyn EnrichmentProgress,
    ) -> (Vec<EnrichedRecord>, EnrichStats) {
        let total = records.len();
        let workers = self.opts.workers.max(1) as usize;
        let semaphore = Arc::new(Semaphore::new(workers));

        info!(
            total,
            primary = records.iter().filter(|r| r.is_primary()).count(),
            workers,
            "starting enrichment"
        );

        let mut slots = Vec::with_capacity(total);
        for record in records {
            if !record.is_primary() {
                slots.push(Slot::Ready(EnrichedRecord::unenriched(record)));
                continue;
            }

            let semaphore = semaphore.clone();
            let http = self.http.clone();
            let llm = self.llm.clone();
            let temp_dir = self.opts.temp_dir.clone();
            let max_chars = self.opts.max_first_page_chars;
            let fallback = record.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                enrich_one(&http, &llm, record, &temp_dir, max_chars).await
            });
            slots.push(Slot::Pending(handle, fallback));
        }

        let mut enriched = Vec::with_capacity(total);
        let mut stats = EnrichStats::default();
        for (idx, slot) in slots.into_iter().enumerate() {
            let record = match slot {
                Slot::Ready(record) => record,
                Slot::Pending(handle, fallback) => {
                    stats.attempted += 1;
                    match handle.await {
                        Ok(record) => record,
                        Err(e) => {
                            warn!(id = %fallback.paper.id, error = %e, "enrichment task failed");
                            EnrichedRecord::unenriched(fallback)
                        }
                    }
                }
            };

            if record.is_primary() {
                if !record.enrichment.is_empty() {
                    stats.enriched += 1;
                } else if record.paper().pdf_link.is_none() {
                    stats.skipped_no_pdf += 1;
                } else {
                    stats.failed += 1;
                }
            }

            progress.task_progress(idx + 1, total, &record.paper().title);
            enriched.push(record);
        }

        info!(
            attempted = stats.attempted,
            enriched = stats.enriched,
            skipped_no_pdf = stats.skipped_no_pdf,
            failed = stats.failed,
            "enrichment complete"
        );
        (enriched, stats)
    }
}

/// Full treatment for one primary record. Never propagates: any problem
/// logs a warning and leaves the enrichment fields empty.
async fn enrich_one(
    http: &Client,
    llm: &LlmClient,
    record: ClassifiedRecord,
    temp_dir: &std::path::Path,
    max_chars: usize,
) -> EnrichedRecord {
    let Some(pdf_link) = record.paper.pdf_link.clone() else {
        debug!(id = %record.paper.id, "no pdf link, skipping enrichment");
        return EnrichedRecord::unenriched(record);
    };

    let pdf_path =
        match pdf::download_pdf(http, &pdf_link, temp_dir, &record.paper.arxiv_id).await {
            Ok(path) => path,
            Err(e) => {
                warn!(id = %record.paper.id, error = %e, "pdf download failed");
                return EnrichedRecord::unenriched(record);
            }
        };

    let first_page = pdf::first_page_text(&pdf_path, max_chars);

    let enrichment = match llm
        .summarize(&record.paper.title, &record.paper.summary, &first_page)
        .await
    {
        Ok(raw) => reply::parse_reply(&raw),
        Err(e) => {
            warn!(id = %record.paper.id, error = %e, "summarization failed");
            Enrichment::default()
        }
    };

    pdf::cleanup_artifact(&pdf_path);

    EnrichedRecord {
        classified: record,
        enrichment,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use arxivdigest_shared::{ParsedRecord, Tier};
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_record(arxiv_id: &str, tier: Tier, pdf_link: Option<String>) -> ClassifiedRecord {
        ClassifiedRecord {
            paper: ParsedRecord {
                id: format!("http://arxiv.org/abs/{arxiv_id}"),
                arxiv_id: arxiv_id.to_string(),
                title: format!("Paper {arxiv_id}"),
                authors: vec!["Ada Lovelace".into()],
                categories: vec!["cs.DC".into()],
                summary: "An abstract.".into(),
                pdf_link,
                published: None,
                updated: None,
                replaced: false,
            },
            tier,
            rl_match: false,
            accelerat_match: false,
        }
    }

    fn make_options(base_url: String, temp_dir: PathBuf) -> EnrichOptions {
        EnrichOptions {
            workers: 4,
            max_first_page_chars: 4096,
            temp_dir,
            timeout_secs: 5,
            llm: LlmOptions {
                base_url,
                api_key: "test-key".to_string(),
                model: "deepseek-chat".to_string(),
                timeout_secs: 5,
            },
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("arxivdigest-test-{}", Uuid::now_v7()))
    }

    #[tokio::test]
    async fn secondary_records_pass_through_untouched() {
        let enricher = Enricher::new(make_options(
            "http://localhost:9".to_string(),
            temp_dir(),
        ))
        .unwrap();

        let records = vec![
            make_record("2511.00001", Tier::Secondary, None),
            make_record("2511.00002", Tier::Secondary, Some("http://localhost:9/x".into())),
        ];
        let (enriched, stats) = enricher
            .enrich_records(records, &SilentEnrichmentProgress)
            .await;

        assert_eq!(enriched.len(), 2);
        assert!(enriched.iter().all(|r| r.enrichment.is_empty()));
        assert_eq!(stats.attempted, 0);
    }

    #[tokio::test]
    async fn pdf_less_primaries_are_skipped_and_order_is_preserved() {
        let enricher = Enricher::new(make_options(
            "http://localhost:9".to_string(),
            temp_dir(),
        ))
        .unwrap();

        let records = vec![
            make_record("2511.00001", Tier::Primary, None),
            make_record("2511.00002", Tier::Secondary, None),
            make_record("2511.00003", Tier::Primary, None),
        ];
        let (enriched, stats) = enricher
            .enrich_records(records, &SilentEnrichmentProgress)
            .await;

        let ids: Vec<&str> = enriched
            .iter()
            .map(|r| r.paper().arxiv_id.as_str())
            .collect();
        assert_eq!(ids, vec!["2511.00001", "2511.00002", "2511.00003"]);
        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.skipped_no_pdf, 2);
        assert_eq!(stats.enriched, 0);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn primary_record_gets_fields_from_the_model() {
        let server = MockServer::start().await;
        // The download succeeds but the body is not a real PDF; extraction
        // falls back to its sentinel and the record still reaches the model.
        Mock::given(method("GET"))
            .and(path("/pdf/2511.00001"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a pdf".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content":
                    "tag1: mlsys\ntag2: fault-tolerance\ntag3: checkpointing, replication\ninstitution: Example University\nllm_summary: Recovers fast. Loses nothing."
                } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = temp_dir();
        let enricher = Enricher::new(make_options(server.uri(), dir.clone())).unwrap();

        let records = vec![make_record(
            "2511.00001",
            Tier::Primary,
            Some(format!("{}/pdf/2511.00001", server.uri())),
        )];
        let (enriched, stats) = enricher
            .enrich_records(records, &SilentEnrichmentProgress)
            .await;

        assert_eq!(stats.enriched, 1);
        assert_eq!(stats.failed, 0);
        let record = &enriched[0];
        assert_eq!(record.enrichment.tag1, "mlsys");
        assert_eq!(record.enrichment.tag2, "fault-tolerance");
        assert_eq!(record.enrichment.tag3, vec!["checkpointing", "replication"]);
        assert_eq!(record.enrichment.institution, "Example University");
        assert_eq!(record.enrichment.llm_summary, "Recovers fast. Loses nothing.");

        // Transient download removed after the call.
        assert!(!dir.join("2511.00001.pdf").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn api_failure_leaves_record_unenriched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pdf/2511.00001"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a pdf".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = temp_dir();
        let enricher = Enricher::new(make_options(server.uri(), dir.clone())).unwrap();

        let records = vec![make_record(
            "2511.00001",
            Tier::Primary,
            Some(format!("{}/pdf/2511.00001", server.uri())),
        )];
        let (enriched, stats) = enricher
            .enrich_records(records, &SilentEnrichmentProgress)
            .await;

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.enriched, 0);
        assert!(enriched[0].enrichment.is_empty());
        assert!(!dir.join("2511.00001.pdf").exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
