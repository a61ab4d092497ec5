//! Core domain types for the arxivdigest pipeline.
//!
//! Records are immutable per stage: the listing parser emits
//! [`ParsedRecord`], classification wraps it into [`ClassifiedRecord`],
//! and enrichment wraps that into [`EnrichedRecord`]. Later stages never
//! mutate earlier ones.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Presentation tier assigned during classification.
///
/// Primary records get full enrichment and the detailed entry format;
/// secondary records render in the simplified one-line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    Secondary,
}

// ---------------------------------------------------------------------------
// ParsedRecord
// ---------------------------------------------------------------------------

/// One paper entry extracted from the daily listing page, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedRecord {
    /// Canonical abstract-page URL (`http://arxiv.org/abs/<arxiv_id>`).
    /// Unique within a snapshot after dedup.
    pub id: String,
    /// Bare identifier (`YYMM.NNNNN`), used for artifact naming and
    /// timestamp inference.
    pub arxiv_id: String,
    /// Paper title, `"N/A"` when the listing omits it.
    pub title: String,
    /// Author names in listing order.
    pub authors: Vec<String>,
    /// Taxonomy codes (e.g. `cs.DC`). Membership drives classification.
    pub categories: Vec<String>,
    /// Abstract text, `"N/A"` when the listing omits it.
    pub summary: String,
    /// Absolute PDF download URL, when the entry links one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_link: Option<String>,
    /// Submission time inferred from the id prefix (first of the month).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    /// Last-update time; same inference as `published`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Entry carried a `(replaced)` marker on the listing page.
    #[serde(default)]
    pub replaced: bool,
}

impl ParsedRecord {
    /// Whether the record carries the given taxonomy code.
    pub fn has_category(&self, code: &str) -> bool {
        self.categories.iter().any(|c| c == code)
    }
}

// ---------------------------------------------------------------------------
// ClassifiedRecord
// ---------------------------------------------------------------------------

/// A retained record with its tier and keyword flags.
///
/// Only records that pass the category filters become `ClassifiedRecord`s;
/// replaced entries and duplicates never reach this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub paper: ParsedRecord,
    pub tier: Tier,
    /// Lowercased summary contains "reinforcement learning".
    #[serde(default)]
    pub rl_match: bool,
    /// Lowercased summary contains "accelerat".
    #[serde(default)]
    pub accelerat_match: bool,
}

impl ClassifiedRecord {
    pub fn is_primary(&self) -> bool {
        self.tier == Tier::Primary
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Fields produced by the summarization service. All default to empty;
/// an empty value renders as a `TBD` placeholder downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Coarse area tag (`ai`, `sys`, or `mlsys`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag1: String,
    /// Sub-area tag, populated for `mlsys` papers.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag2: String,
    /// Key techniques, split on commas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag3: Vec<String>,
    /// Inferred author institution.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub institution: String,
    /// Two-to-three sentence plain-language summary.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub llm_summary: String,
}

impl Enrichment {
    /// True when no field was populated (enrichment skipped or failed).
    pub fn is_empty(&self) -> bool {
        self.tag1.is_empty()
            && self.tag2.is_empty()
            && self.tag3.is_empty()
            && self.institution.is_empty()
            && self.llm_summary.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EnrichedRecord
// ---------------------------------------------------------------------------

/// The final per-record shape consumed by the document assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub classified: ClassifiedRecord,
    #[serde(default)]
    pub enrichment: Enrichment,
}

impl EnrichedRecord {
    /// Wrap a classified record with empty enrichment.
    pub fn unenriched(classified: ClassifiedRecord) -> Self {
        Self {
            classified,
            enrichment: Enrichment::default(),
        }
    }

    pub fn paper(&self) -> &ParsedRecord {
        &self.classified.paper
    }

    pub fn is_primary(&self) -> bool {
        self.classified.is_primary()
    }
}

// ---------------------------------------------------------------------------
// WeekRange
// ---------------------------------------------------------------------------

/// Monday-through-Sunday span containing a date. Weekly documents are
/// keyed by this range, formatted `YYYYMMDD-YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    pub monday: NaiveDate,
    pub sunday: NaiveDate,
}

impl WeekRange {
    /// The week containing `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        Self {
            monday,
            sunday: monday + Duration::days(6),
        }
    }

    /// Whether `date` falls inside this range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.monday <= date && date <= self.sunday
    }
}

impl std::fmt::Display for WeekRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.monday.format("%Y%m%d"),
            self.sunday.format("%Y%m%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_paper(id_suffix: &str, categories: &[&str]) -> ParsedRecord {
        ParsedRecord {
            id: format!("http://arxiv.org/abs/{id_suffix}"),
            arxiv_id: id_suffix.to_string(),
            title: "Sample Paper".into(),
            authors: vec!["Ada Lovelace".into(), "Alan Turing".into()],
            categories: categories.iter().map(|c| c.to_string()).collect(),
            summary: "A short abstract.".into(),
            pdf_link: Some(format!("https://arxiv.org/pdf/{id_suffix}")),
            published: None,
            updated: None,
            replaced: false,
        }
    }

    #[test]
    fn week_range_spans_monday_to_sunday() {
        // 2025-11-05 is a Wednesday.
        let week = WeekRange::for_date(NaiveDate::from_ymd_opt(2025, 11, 5).expect("date"));
        assert_eq!(week.monday, NaiveDate::from_ymd_opt(2025, 11, 3).expect("date"));
        assert_eq!(week.sunday, NaiveDate::from_ymd_opt(2025, 11, 9).expect("date"));
        assert_eq!(week.to_string(), "20251103-20251109");
    }

    #[test]
    fn week_range_boundaries_map_to_same_week() {
        let monday = NaiveDate::from_ymd_opt(2025, 11, 3).expect("date");
        let sunday = NaiveDate::from_ymd_opt(2025, 11, 9).expect("date");
        assert_eq!(WeekRange::for_date(monday), WeekRange::for_date(sunday));
        assert!(WeekRange::for_date(monday).contains(sunday));
    }

    #[test]
    fn enrichment_default_is_empty() {
        assert!(Enrichment::default().is_empty());

        let enrichment = Enrichment {
            tag1: "mlsys".into(),
            ..Enrichment::default()
        };
        assert!(!enrichment.is_empty());
    }

    #[test]
    fn record_json_roundtrip() {
        let record = EnrichedRecord {
            classified: ClassifiedRecord {
                paper: make_paper("2511.00123", &["cs.DC", "cs.LG"]),
                tier: Tier::Primary,
                rl_match: false,
                accelerat_match: false,
            },
            enrichment: Enrichment {
                tag1: "mlsys".into(),
                tag2: "llm training".into(),
                tag3: vec!["tensor parallelism".into(), "quantization".into()],
                institution: "Example University".into(),
                llm_summary: "Trains things faster.".into(),
            },
        };

        let json = serde_json::to_string_pretty(&record).expect("serialize");
        let parsed: EnrichedRecord = serde_json::from_str(&json).expect("deserialize");
        assert!(parsed.is_primary());
        assert_eq!(parsed.paper().arxiv_id, "2511.00123");
        assert_eq!(parsed.enrichment.tag3.len(), 2);
    }

    #[test]
    fn records_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/records.fixture.json")
            .expect("read fixture");
        let parsed: Vec<EnrichedRecord> =
            serde_json::from_str(&fixture).expect("deserialize fixture records");
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_primary());
        assert_eq!(parsed[0].enrichment.tag1, "mlsys");
        assert_eq!(parsed[1].classified.tier, Tier::Secondary);
        assert!(parsed[1].classified.rl_match);
    }
}
