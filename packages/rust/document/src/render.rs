//! Section rendering: group count headers and per-record entry formats.

use arxivdigest_classify::{ACCEL_RULE, RL_RULE};
use arxivdigest_shared::{CategoryRules, EnrichedRecord};
use chrono::NaiveDate;
use tracing::debug;

use crate::document::DateSection;

/// Line closing the section body when a date retains no records at all.
const NO_PAPERS_PLACEHOLDER: &str = "No papers today";

/// Labels shown in the group count headers.
#[derive(Debug, Clone)]
pub struct SectionLabels {
    /// Primary group label (the primary category code).
    pub primary: String,
    /// Keyword-gated pool label, category codes joined with `/`.
    pub keyword_pool: String,
}

impl SectionLabels {
    pub fn from_rules(rules: &CategoryRules) -> Self {
        Self {
            primary: rules.primary.clone(),
            keyword_pool: rules.keyword_gated.join("/"),
        }
    }
}

/// Render the section for `date` from the day's enriched records.
///
/// Groups render in a fixed order: the primary group with detailed entries,
/// then one simplified group per keyword predicate. A record matching both
/// predicates appears in both keyword groups. Count headers render even at
/// zero; a day with no records at all closes with the placeholder line.
pub fn render_date_section(
    records: &[EnrichedRecord],
    date: NaiveDate,
    labels: &SectionLabels,
) -> DateSection {
    let prefix = arxiv_prefix(date);
    let primary: Vec<&EnrichedRecord> = records.iter().filter(|r| r.is_primary()).collect();
    let rl: Vec<&EnrichedRecord> = records
        .iter()
        .filter(|r| !r.is_primary() && r.classified.rl_match)
        .collect();
    let accel: Vec<&EnrichedRecord> = records
        .iter()
        .filter(|r| !r.is_primary() && r.classified.accelerat_match)
        .collect();

    debug!(
        primary = primary.len(),
        rl = rl.len(),
        accelerat = accel.len(),
        "rendering date section"
    );

    let mut groups = vec![
        render_primary_group(&primary, &prefix, labels),
        render_keyword_group(&rl, &prefix, labels, RL_RULE.label),
        render_keyword_group(&accel, &prefix, labels, ACCEL_RULE.label),
    ];
    if records.is_empty() {
        groups.push(NO_PAPERS_PLACEHOLDER.to_string());
    }

    DateSection {
        date,
        body: groups.join("\n\n"),
    }
}

/// Dated tag like `[arXiv251103]`.
pub fn arxiv_prefix(date: NaiveDate) -> String {
    format!("[arXiv{}]", date.format("%y%m%d"))
}

/// Escape characters an MDX renderer would treat as markup.
pub fn escape_summary(summary: &str) -> String {
    summary
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('{', "\\{")
        .replace('}', "\\}")
}

/// Detailed entry used for primary records.
pub fn render_full_entry(record: &EnrichedRecord, prefix: &str) -> String {
    let paper = record.paper();
    let enrichment = &record.enrichment;

    let mut tags: Vec<String> = Vec::new();
    if !enrichment.tag1.is_empty() {
        tags.push(format!("[{}]", enrichment.tag1));
    }
    if !enrichment.tag2.is_empty() {
        tags.push(format!("[{}]", enrichment.tag2));
    }
    if !enrichment.tag3.is_empty() {
        tags.push(format!("[{}]", enrichment.tag3.join(", ")));
    }
    let tags_str = if tags.is_empty() {
        "TBD".to_string()
    } else {
        tags.join(", ")
    };

    let institution = if enrichment.institution.is_empty() {
        "TBD"
    } else {
        enrichment.institution.as_str()
    };
    let link = paper.pdf_link.as_deref().unwrap_or("N/A");

    let mut entry = format!(
        "- **{prefix} {title}**\n  - **tags:** {tags_str}\n  - **authors:** {authors}\n  - **institution:** {institution}\n  - **link:** {link}",
        title = paper.title,
        authors = paper.authors.join(", "),
    );

    let summary = enrichment.llm_summary.trim();
    if !summary.is_empty() {
        entry.push_str("\n  - **Simple LLM Summary:** ");
        entry.push_str(&escape_summary(summary));
    }
    entry
}

/// Compact one-line entry used for secondary records. Links to the PDF when
/// the listing gave one, otherwise to the abstract page.
pub fn render_simple_entry(record: &EnrichedRecord, prefix: &str) -> String {
    let paper = record.paper();
    let link = match paper.pdf_link.as_deref() {
        Some(link) if !link.is_empty() && link != "N/A" => link,
        _ => paper.id.as_str(),
    };
    format!("- {prefix} {} [link]({link})", paper.title)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn render_primary_group(
    records: &[&EnrichedRecord],
    prefix: &str,
    labels: &SectionLabels,
) -> String {
    let header = format!("**{} total: {}**", labels.primary, records.len());
    if records.is_empty() {
        return header;
    }
    let blocks: Vec<String> = records
        .iter()
        .map(|r| render_full_entry(r, prefix))
        .collect();
    format!("{header}\n\n{}", blocks.join("\n\n"))
}

fn render_keyword_group(
    records: &[&EnrichedRecord],
    prefix: &str,
    labels: &SectionLabels,
    keyword: &str,
) -> String {
    let header = format!(
        "**{} contains \"{keyword}\" total: {}**",
        labels.keyword_pool,
        records.len()
    );
    if records.is_empty() {
        return header;
    }
    let lines: Vec<String> = records
        .iter()
        .map(|r| render_simple_entry(r, prefix))
        .collect();
    format!("{header}\n{}", lines.join("\n"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
