//! Parsing of the model's labeled five-line reply.

use arxivdigest_shared::Enrichment;

/// Parse a model reply into structured fields.
///
/// The reply is expected to carry `tag1:`, `tag2:`, `tag3:`, `institution:`
/// and `llm_summary:` lines. Labels match case-insensitively. Unlabeled lines
/// after `llm_summary:` are treated as summary continuation; a labeled line
/// still updates its field and leaves continuation mode on. Anything the
/// reply does not provide stays empty.
pub fn parse_reply(raw: &str) -> Enrichment {
    let mut tag1 = String::new();
    let mut tag2 = String::new();
    let mut tag3_raw = String::new();
    let mut institution = String::new();
    let mut summary_parts: Vec<String> = Vec::new();
    let mut reading_summary = false;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(value) = labeled_value(line, "tag1:") {
            tag1 = value;
        } else if let Some(value) = labeled_value(line, "tag2:") {
            tag2 = value;
        } else if let Some(value) = labeled_value(line, "tag3:") {
            tag3_raw = value;
        } else if let Some(value) = labeled_value(line, "institution:") {
            institution = value;
        } else if let Some(value) = labeled_value(line, "llm_summary:") {
            reading_summary = true;
            if !value.is_empty() {
                summary_parts.push(value);
            }
        } else if reading_summary {
            summary_parts.push(line.to_string());
        }
    }

    let tag3 = tag3_raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    Enrichment {
        tag1,
        tag2,
        tag3,
        institution,
        llm_summary: summary_parts.join(" "),
    }
}

/// Value after `label` when `line` starts with it, ignoring ASCII case.
fn labeled_value(line: &str, label: &str) -> Option<String> {
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    Some(line[label.len()..].trim().to_string())
}
