//! Lead pipeline orchestration for LeadScout.
//!
//! Ties profile search and extraction, model-based cleanup, and spreadsheet
//! export into one run (`run_leads`).

pub mod enrichment;
pub mod gemini;
pub mod pipeline;
