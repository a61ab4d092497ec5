//! Daily listing snapshot acquisition and parsing.
//!
//! Every run starts from one snapshot of the arXiv "new listings" page.
//! This crate fetches (or wraps) that snapshot and turns it into structured
//! [`ParsedRecord`]s. All HTML structure knowledge lives behind
//! [`parse_snapshot`]; downstream stages never see markup.
//!
//! [`ParsedRecord`]: arxivdigest_shared::ParsedRecord

mod parser;

use arxivdigest_shared::{DigestError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

pub use parser::{extract_listing_date, parse_snapshot};

/// Maximum number of redirects to follow when fetching the listing.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for the snapshot fetch.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for listing requests.
const USER_AGENT: &str = concat!("arxivdigest/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// ListingSnapshot
// ---------------------------------------------------------------------------

/// One acquired copy of the daily listing page.
#[derive(Debug, Clone)]
pub struct ListingSnapshot {
    /// Raw page HTML.
    pub html: String,
    /// Where the snapshot came from (URL or file path).
    pub source: String,
    /// SHA-256 hex digest of the HTML, for run diagnostics.
    pub content_hash: String,
    /// When the snapshot was taken.
    pub fetched_at: DateTime<Utc>,
}

impl ListingSnapshot {
    /// Wrap already-acquired HTML. Offline runs load a saved page through
    /// the same parse path as a live fetch.
    pub fn from_html(html: impl Into<String>, source: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            content_hash: compute_hash(&html),
            html,
            source: source.into(),
            fetched_at: Utc::now(),
        }
    }

    /// The listing date announced in the page header, if present.
    pub fn listing_date(&self) -> Option<NaiveDate> {
        parser::extract_listing_date(&self.html)
    }
}

// ---------------------------------------------------------------------------
// Listing options
// ---------------------------------------------------------------------------

/// Configuration for the snapshot fetch.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Listing page URL.
    pub url: String,
    /// Timeout for the HTTP request in seconds.
    pub timeout_secs: u64,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            url: "https://arxiv.org/list/cs/new".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Fetch one snapshot of the daily listing page.
#[instrument(skip_all, fields(url = %opts.url))]
pub async fn fetch_snapshot(opts: &ListingOptions) -> Result<ListingSnapshot> {
    let client = build_client(opts)?;

    info!(url = %opts.url, "fetching daily listing");

    let response = client
        .get(&opts.url)
        .send()
        .await
        .map_err(|e| DigestError::Network(format!("{}: {e}", opts.url)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DigestError::Network(format!("{}: HTTP {status}", opts.url)));
    }

    let html = response
        .text()
        .await
        .map_err(|e| DigestError::Network(format!("{}: failed to read body: {e}", opts.url)))?;

    let snapshot = ListingSnapshot {
        content_hash: compute_hash(&html),
        html,
        source: opts.url.clone(),
        fetched_at: Utc::now(),
    };

    debug!(
        bytes = snapshot.html.len(),
        hash = %snapshot.content_hash,
        "listing snapshot fetched"
    );

    Ok(snapshot)
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &ListingOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(std::time::Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| DigestError::Network(format!("failed to build HTTP client: {e}")))
}

/// SHA-256 hex digest of snapshot content.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
