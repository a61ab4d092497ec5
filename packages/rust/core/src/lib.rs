//! Digest pipeline orchestration.
//!
//! Ties the listing, classification, enrichment, document, and storage
//! crates into one end-to-end run (`process_snapshot`) and reports
//! progress back to the caller.

pub mod pipeline;
