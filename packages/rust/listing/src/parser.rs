//! Listing page parser.
//!
//! The daily listing is a definition list: each paper is a `<dt>` (links,
//! revision marker) paired with the next `<dd>` sibling (title, authors,
//! subjects, abstract). Extraction is per-entry fail-soft: an entry that
//! cannot yield an identifier is dropped, everything else degrades to
//! documented fallbacks.

use std::sync::LazyLock;

use arxivdigest_shared::ParsedRecord;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

// ---------------------------------------------------------------------------
// Selectors and regex patterns (compiled once)
// ---------------------------------------------------------------------------

static DT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt").expect("dt selector"));

static H3_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3").expect("h3 selector"));

static ABS_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/abs/"]"#).expect("abs link selector"));

static PDF_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/pdf/"]"#).expect("pdf link selector"));

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.list-title").expect("title selector"));

static AUTHORS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.list-authors").expect("authors selector"));

static SUBJECTS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.list-subjects").expect("subjects selector"));

static SUMMARY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.mathjax").expect("summary selector"));

static ANCHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("anchor selector"));

/// Matches the `query=` parameter of a subject-search href.
static QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"query=([^&]+)").expect("query regex"));

/// Matches parenthesized taxonomy codes in subjects text.
static PAREN_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("paren code regex"));

/// Matches the `YYMM.` prefix of a modern identifier.
static ARXIV_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})\.(\d+)").expect("arxiv id regex"));

/// Matches `Weekday, D Month YYYY` in the listing header.
static LISTING_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday),\s+(\d{1,2})\s+(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{4})",
    )
    .expect("listing date regex")
});

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse every dt/dd entry of a listing snapshot, in document order.
///
/// Entries without an abstract link (or without a dd) are skipped; no
/// deduplication happens here.
pub fn parse_snapshot(html: &str) -> Vec<ParsedRecord> {
    let doc = Html::parse_document(html);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for dt in doc.select(&DT_SEL) {
        let Some(dd) = next_dd(&dt) else {
            skipped += 1;
            continue;
        };
        match parse_entry(dt, dd) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    debug!(parsed = records.len(), skipped, "listing snapshot parsed");
    records
}

/// The listing date announced in the `Showing new listings for …` header.
pub fn extract_listing_date(html: &str) -> Option<NaiveDate> {
    let doc = Html::parse_document(html);
    for h3 in doc.select(&H3_SEL) {
        let text = collect_text(&h3);
        if !text.contains("Showing new listings for") {
            continue;
        }
        if let Some(date) = parse_listing_date(&text) {
            return Some(date);
        }
    }
    None
}

/// Extract one record from a dt/dd pair.
fn parse_entry(dt: ElementRef<'_>, dd: ElementRef<'_>) -> Option<ParsedRecord> {
    let abs_link = dt.select(&ABS_LINK_SEL).next()?;
    let href = abs_link.value().attr("href")?;

    let arxiv_id = href.trim_end_matches('/').rsplit('/').next()?.to_string();
    if arxiv_id.is_empty() {
        return None;
    }
    let id = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("http://arxiv.org/abs/{arxiv_id}")
    };

    let replaced = collect_text(&dt).contains("(replaced)");

    let pdf_link = dt
        .select(&PDF_LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| {
            if href.starts_with('/') {
                format!("https://arxiv.org{href}")
            } else {
                href.to_string()
            }
        });

    let title = dd
        .select(&TITLE_SEL)
        .next()
        .map(|el| strip_title_label(&collect_text(&el)))
        .unwrap_or_else(|| "N/A".to_string());

    let authors = dd
        .select(&AUTHORS_SEL)
        .next()
        .map(|el| {
            el.select(&ANCHOR_SEL)
                .map(|a| collect_text(&a))
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let categories = dd
        .select(&SUBJECTS_SEL)
        .next()
        .map(|el| extract_categories(&el))
        .unwrap_or_default();

    let summary = dd
        .select(&SUMMARY_SEL)
        .next()
        .map(|el| collect_text(&el))
        .unwrap_or_else(|| "N/A".to_string());

    let published = infer_timestamp(&arxiv_id);

    Some(ParsedRecord {
        id,
        arxiv_id,
        title,
        authors,
        categories,
        summary,
        pdf_link,
        published,
        updated: published,
        replaced,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First following sibling that is a `<dd>` element.
fn next_dd<'a>(dt: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    dt.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
}

/// Element text with whitespace runs collapsed to single spaces.
fn collect_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop the `Title:` descriptor the listing prepends.
fn strip_title_label(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.strip_prefix("Title:") {
        Some(rest) => rest.trim_start().to_string(),
        None => trimmed.to_string(),
    }
}

/// Taxonomy codes from the subjects block.
///
/// Subject-search links carry the code in their `query=` parameter; pages
/// without links fall back to parenthesized codes in the text, filtered to
/// the `cs.` taxonomy.
fn extract_categories(subjects: &ElementRef<'_>) -> Vec<String> {
    let mut categories = Vec::new();

    for link in subjects.select(&ANCHOR_SEL) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains("searchtype=subject") {
            continue;
        }
        if let Some(caps) = QUERY_RE.captures(href) {
            categories.push(caps[1].to_string());
        }
    }

    if categories.is_empty() {
        let text = collect_text(subjects);
        for caps in PAREN_CODE_RE.captures_iter(&text) {
            let code = caps[1].trim();
            if code.starts_with("cs.") {
                categories.push(code.to_string());
            }
        }
    }

    categories
}

/// Best-effort submission time from the id prefix: `YYMM.NNNNN` maps to the
/// first of that month, century 20.
fn infer_timestamp(arxiv_id: &str) -> Option<DateTime<Utc>> {
    let caps = ARXIV_ID_RE.captures(arxiv_id)?;
    let year = 2000 + caps[1].parse::<i32>().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    let caps = LISTING_DATE_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    match name {
        "January" => Some(1),
        "February" => Some(2),
        "March" => Some(3),
        "April" => Some(4),
        "May" => Some(5),
        "June" => Some(6),
        "July" => Some(7),
        "August" => Some(8),
        "September" => Some(9),
        "October" => Some(10),
        "November" => Some(11),
        "December" => Some(12),
        _ => None,
    }
}
