//! Weekly document model: parse, replace-or-insert, canonical serialization.
//!
//! A document is held as a typed list of dated sections and serialized in
//! one pass. Merging mutates the list, never the text, so re-running a date
//! can never duplicate a section or corrupt a boundary.

use arxivdigest_shared::{DigestError, Result, WeekRange};
use chrono::NaiveDate;

/// One dated section of a weekly document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSection {
    pub date: NaiveDate,
    /// Text below the marker line, without leading or trailing blank lines.
    pub body: String,
}

/// An in-memory weekly digest document.
#[derive(Debug, Clone)]
pub struct WeeklyDocument {
    pub week: WeekRange,
    pub sections: Vec<DateSection>,
}

impl WeeklyDocument {
    /// New empty document for a week.
    pub fn new(week: WeekRange) -> Self {
        Self {
            week,
            sections: Vec::new(),
        }
    }

    /// Parse existing document text.
    ///
    /// Section markers are `## ` lines; each must carry a `YYYY-MM-DD` date
    /// and no date may appear twice. Anything before the first marker is
    /// title preamble, regenerated on render. A malformed marker fails the
    /// whole parse so a damaged document is never silently rewritten.
    pub fn parse(week: WeekRange, content: &str) -> Result<Self> {
        let mut sections: Vec<DateSection> = Vec::new();
        let mut current: Option<(NaiveDate, Vec<&str>)> = None;

        for line in content.lines() {
            match marker_date(line) {
                Some(date) => {
                    let date = date?;
                    if let Some((prev_date, body)) = current.take() {
                        sections.push(DateSection {
                            date: prev_date,
                            body: join_body(&body),
                        });
                    }
                    if sections.iter().any(|s| s.date == date) {
                        return Err(DigestError::document(format!(
                            "duplicate section for {date}"
                        )));
                    }
                    current = Some((date, Vec::new()));
                }
                None => {
                    // Lines before the first marker are preamble.
                    if let Some((_, body)) = current.as_mut() {
                        body.push(line);
                    }
                }
            }
        }
        if let Some((date, body)) = current.take() {
            sections.push(DateSection {
                date,
                body: join_body(&body),
            });
        }

        Ok(Self { week, sections })
    }

    /// Replace the section for its date, or insert keeping ascending
    /// date order.
    pub fn upsert_section(&mut self, section: DateSection) {
        if let Some(existing) = self.sections.iter_mut().find(|s| s.date == section.date) {
            *existing = section;
            return;
        }
        let insert_at = self
            .sections
            .iter()
            .position(|s| s.date > section.date)
            .unwrap_or(self.sections.len());
        self.sections.insert(insert_at, section);
    }

    /// Serialize to canonical text: title header, one blank line between
    /// sections, one trailing newline.
    pub fn render(&self) -> String {
        let mut out = format!("# {}\n", self.week);
        for section in &self.sections {
            out.push_str(&format!(
                "\n## {}\n\n{}\n",
                section.date.format("%Y-%m-%d"),
                section.body
            ));
        }
        out
    }
}

/// `Some(date)` when `line` is a section marker. A line that opens like a
/// marker but carries no valid date yields `Some(Err)`.
fn marker_date(line: &str) -> Option<Result<NaiveDate>> {
    let rest = line.strip_prefix("##")?;
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        // Deeper heading such as `###`, or plain text.
        return None;
    }
    let token = rest.trim();
    Some(
        NaiveDate::parse_from_str(token, "%Y-%m-%d").map_err(|_| {
            DigestError::document(format!("section marker is not a date: {line:?}"))
        }),
    )
}

/// Join body lines, dropping leading and trailing blank lines only.
fn join_body(lines: &[&str]) -> String {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
