//! Shared types, error model, and configuration for LeadScout.
//!
//! This crate is the foundation depended on by all other LeadScout crates.
//! It provides:
//! - [`LeadScoutError`]: the unified error type
//! - Domain types ([`LeadRecord`], [`RunId`])
//! - Configuration ([`AppConfig`], [`SearchConfig`], config loading)
//! - Response-shape strategies ([`shape`]) for tolerant JSON payload handling

pub mod config;
pub mod error;
pub mod shape;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EnrichmentConfig, SearchConfig, SheetsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, optional_api_key, require_api_key,
};
pub use error::{LeadScoutError, Result};
pub use types::{LEAD_FIELDS, LeadRecord, RunId};
