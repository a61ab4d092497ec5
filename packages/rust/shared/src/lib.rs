//! Shared types, error model, and configuration for arxivdigest.
//!
//! This crate is the foundation depended on by all other arxivdigest crates.
//! It provides:
//! - [`DigestError`] — the unified error type
//! - Domain types ([`ParsedRecord`], [`ClassifiedRecord`], [`EnrichedRecord`], [`WeekRange`])
//! - Configuration ([`AppConfig`], [`CategoryRules`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CategoryRules, DeepSeekConfig, EnrichmentConfig, ListingConfig, OutputConfig,
    RulesConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_api_key,
};
pub use error::{DigestError, Result};
pub use types::{ClassifiedRecord, EnrichedRecord, Enrichment, ParsedRecord, Tier, WeekRange};
