//! Category and keyword classification rules.
//!
//! Pure and network-free: given parsed records and the configured rules,
//! decide retention, tier, and keyword flags. Records are processed in
//! listing order; revisions drop first, then duplicates of already-retained
//! ids, then the category rules.

use std::collections::HashSet;

use arxivdigest_shared::{CategoryRules, ClassifiedRecord, ParsedRecord, Tier};
use tracing::debug;

// ---------------------------------------------------------------------------
// Keyword rules
// ---------------------------------------------------------------------------

/// A fixed keyword predicate over the lowercased summary.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    /// Substring searched for in the lowercased summary.
    pub needle: &'static str,
    /// Label used in rendered group headers.
    pub label: &'static str,
}

impl KeywordRule {
    pub fn matches(&self, lowercased_summary: &str) -> bool {
        lowercased_summary.contains(self.needle)
    }
}

/// Reinforcement-learning predicate.
pub const RL_RULE: KeywordRule = KeywordRule {
    needle: "reinforcement learning",
    label: "reinforcement learning",
};

/// Acceleration predicate. The needle is a stem, so "accelerate",
/// "accelerating", and "accelerator" all match.
pub const ACCEL_RULE: KeywordRule = KeywordRule {
    needle: "accelerat",
    label: "accelerate",
};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Outcome of classifying one snapshot's records.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Retained records, listing order preserved.
    pub records: Vec<ClassifiedRecord>,
    /// Dropped: entry was a revision.
    pub dropped_replaced: usize,
    /// Dropped: id already retained earlier in the listing.
    pub dropped_duplicate: usize,
    /// Dropped: no category rule matched.
    pub dropped_unmatched: usize,
    /// Dropped: keyword gate did not fire.
    pub dropped_keyword: usize,
}

impl Classification {
    /// Retained records in the primary tier.
    pub fn primary_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_primary()).count()
    }

    /// Secondary records matching the reinforcement-learning predicate.
    pub fn rl_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.is_primary() && r.rl_match)
            .count()
    }

    /// Secondary records matching the acceleration predicate.
    pub fn accelerat_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.is_primary() && r.accelerat_match)
            .count()
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped_replaced + self.dropped_duplicate + self.dropped_unmatched
            + self.dropped_keyword
    }
}

/// What the category rules decided for one record.
enum RuleOutcome {
    Retain {
        tier: Tier,
        rl_match: bool,
        accelerat_match: bool,
    },
    DropUnmatched,
    DropKeyword,
}

/// Apply the category and keyword rules to a parsed snapshot.
pub fn classify(records: Vec<ParsedRecord>, rules: &CategoryRules) -> Classification {
    let mut result = Classification::default();
    let mut retained_ids: HashSet<String> = HashSet::new();

    for paper in records {
        if paper.replaced {
            result.dropped_replaced += 1;
            continue;
        }
        if retained_ids.contains(&paper.id) {
            result.dropped_duplicate += 1;
            continue;
        }

        match apply_rules(&paper, rules) {
            RuleOutcome::Retain {
                tier,
                rl_match,
                accelerat_match,
            } => {
                retained_ids.insert(paper.id.clone());
                result.records.push(ClassifiedRecord {
                    paper,
                    tier,
                    rl_match,
                    accelerat_match,
                });
            }
            RuleOutcome::DropUnmatched => result.dropped_unmatched += 1,
            RuleOutcome::DropKeyword => result.dropped_keyword += 1,
        }
    }

    debug!(
        retained = result.records.len(),
        primary = result.primary_count(),
        dropped = result.total_dropped(),
        "classification complete"
    );
    result
}

fn apply_rules(paper: &ParsedRecord, rules: &CategoryRules) -> RuleOutcome {
    if paper.has_category(&rules.primary) {
        return RuleOutcome::Retain {
            tier: Tier::Primary,
            rl_match: false,
            accelerat_match: false,
        };
    }

    let in_secondary = paper
        .categories
        .iter()
        .any(|c| rules.secondary.contains(c));
    if !in_secondary {
        return RuleOutcome::DropUnmatched;
    }

    let keyword_gated = paper
        .categories
        .iter()
        .any(|c| rules.keyword_gated.contains(c));
    if !keyword_gated {
        return RuleOutcome::Retain {
            tier: Tier::Secondary,
            rl_match: false,
            accelerat_match: false,
        };
    }

    let summary = paper.summary.to_lowercase();
    let rl_match = RL_RULE.matches(&summary);
    let accelerat_match = ACCEL_RULE.matches(&summary);
    if rl_match || accelerat_match {
        RuleOutcome::Retain {
            tier: Tier::Secondary,
            rl_match,
            accelerat_match,
        }
    } else {
        RuleOutcome::DropKeyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_paper(suffix: &str, categories: &[&str], summary: &str) -> ParsedRecord {
        ParsedRecord {
            id: format!("http://arxiv.org/abs/{suffix}"),
            arxiv_id: suffix.to_string(),
            title: format!("Paper {suffix}"),
            authors: vec!["A. Author".into()],
            categories: categories.iter().map(|c| c.to_string()).collect(),
            summary: summary.into(),
            pdf_link: None,
            published: None,
            updated: None,
            replaced: false,
        }
    }

    fn default_rules() -> CategoryRules {
        CategoryRules {
            primary: "cs.DC".into(),
            secondary: vec!["cs.AI".into(), "cs.LG".into()],
            keyword_gated: vec!["cs.AI".into(), "cs.LG".into()],
        }
    }

    #[test]
    fn primary_category_always_retained() {
        let papers = vec![
            make_paper("1", &["cs.DC"], "nothing keyword-like here"),
            make_paper("2", &["cs.DC", "cs.LG"], "also no match"),
        ];
        let result = classify(papers, &default_rules());

        assert_eq!(result.records.len(), 2);
        assert!(result.records.iter().all(|r| r.tier == Tier::Primary));
        assert_eq!(result.primary_count(), 2);
        assert_eq!(result.dropped_keyword, 0);
    }

    #[test]
    fn gated_secondary_requires_keyword() {
        let papers = vec![
            make_paper("1", &["cs.LG"], "deep reinforcement learning for games"),
            make_paper("2", &["cs.AI"], "we accelerate inference by pruning"),
            make_paper("3", &["cs.LG"], "a survey of graph neural networks"),
        ];
        let result = classify(papers, &default_rules());

        assert_eq!(result.records.len(), 2);
        assert!(result.records[0].rl_match);
        assert!(!result.records[0].accelerat_match);
        assert!(result.records[1].accelerat_match);
        assert_eq!(result.dropped_keyword, 1);
    }

    #[test]
    fn accelerate_needle_is_a_stem() {
        let papers = vec![
            make_paper("1", &["cs.LG"], "Accelerating sparse kernels"),
            make_paper("2", &["cs.LG"], "a hardware accelerator for attention"),
        ];
        let result = classify(papers, &default_rules());

        assert_eq!(result.records.len(), 2);
        assert!(result.records.iter().all(|r| r.accelerat_match));
    }

    #[test]
    fn both_flags_can_be_true() {
        let papers = vec![make_paper(
            "1",
            &["cs.AI"],
            "reinforcement learning to accelerate compilers",
        )];
        let result = classify(papers, &default_rules());

        assert_eq!(result.records.len(), 1);
        assert!(result.records[0].rl_match);
        assert!(result.records[0].accelerat_match);
        assert_eq!(result.rl_count(), 1);
        assert_eq!(result.accelerat_count(), 1);
    }

    #[test]
    fn unlisted_categories_dropped() {
        let papers = vec![
            make_paper("1", &["cs.CL"], "reinforcement learning everywhere"),
            make_paper("2", &[], "no categories at all"),
        ];
        let result = classify(papers, &default_rules());

        assert!(result.records.is_empty());
        assert_eq!(result.dropped_unmatched, 2);
    }

    #[test]
    fn replaced_records_never_retained() {
        let mut primary = make_paper("1", &["cs.DC"], "important");
        primary.replaced = true;
        let mut secondary = make_paper("2", &["cs.LG"], "reinforcement learning");
        secondary.replaced = true;

        let result = classify(vec![primary, secondary], &default_rules());

        assert!(result.records.is_empty());
        assert_eq!(result.dropped_replaced, 2);
    }

    #[test]
    fn duplicate_ids_first_wins() {
        let first = make_paper("1", &["cs.DC"], "first occurrence");
        let mut second = make_paper("1", &["cs.LG"], "reinforcement learning duplicate");
        second.title = "Different Title".into();

        let result = classify(vec![first, second], &default_rules());

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].paper.summary, "first occurrence");
        assert_eq!(result.records[0].tier, Tier::Primary);
        assert_eq!(result.dropped_duplicate, 1);
    }

    #[test]
    fn duplicate_of_dropped_record_is_evaluated_fresh() {
        // The first occurrence fails the rules, so its id is never retained
        // and the second occurrence gets its own evaluation.
        let dropped = make_paper("1", &["cs.CL"], "off-topic");
        let kept = make_paper("1", &["cs.DC"], "on-topic this time");

        let result = classify(vec![dropped, kept], &default_rules());

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].paper.summary, "on-topic this time");
        assert_eq!(result.dropped_unmatched, 1);
        assert_eq!(result.dropped_duplicate, 0);
    }

    #[test]
    fn ungated_secondary_retained_without_keywords() {
        let rules = CategoryRules {
            primary: "cs.DC".into(),
            secondary: vec!["cs.AI".into(), "cs.LG".into()],
            keyword_gated: vec!["cs.AI".into()],
        };
        let papers = vec![make_paper("1", &["cs.LG"], "no keywords at all")];
        let result = classify(papers, &rules);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].tier, Tier::Secondary);
        assert!(!result.records[0].rl_match);
        assert!(!result.records[0].accelerat_match);
    }

    #[test]
    fn listing_order_preserved() {
        let papers = vec![
            make_paper("1", &["cs.DC"], "a"),
            make_paper("2", &["cs.CL"], "dropped"),
            make_paper("3", &["cs.LG"], "reinforcement learning"),
            make_paper("4", &["cs.DC"], "b"),
        ];
        let result = classify(papers, &default_rules());

        let ids: Vec<&str> = result
            .records
            .iter()
            .map(|r| r.paper.arxiv_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
    }

    #[test]
    fn group_counts_exclude_primary_records() {
        // A primary paper whose summary mentions reinforcement learning
        // still counts only toward the primary group.
        let papers = vec![
            make_paper("1", &["cs.DC"], "reinforcement learning for schedulers"),
            make_paper("2", &["cs.LG"], "reinforcement learning for games"),
        ];
        let result = classify(papers, &default_rules());

        assert_eq!(result.primary_count(), 1);
        assert_eq!(result.rl_count(), 1);
        assert_eq!(result.accelerat_count(), 0);
    }
}
