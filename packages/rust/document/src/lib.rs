//! Weekly digest documents.
//!
//! Rendering turns one day's enriched records into a [`DateSection`];
//! [`WeeklyDocument`] merges sections idempotently and serializes the
//! canonical Markdown written to disk.

mod document;
mod render;

pub use document::{DateSection, WeeklyDocument};
pub use render::{
    SectionLabels, arxiv_prefix, escape_summary, render_date_section, render_full_entry,
    render_simple_entry,
};
