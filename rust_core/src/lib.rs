//! Unifier Core - cross-platform prediction market unification.
//!
//! This library provides:
//! - Listing collection from Polymarket, Kalshi and PredictIt
//! - LLM-assisted product matching with a lexical fallback
//! - Per-product price statistics and confidence scoring
//! - CSV report emission with summary statistics

pub mod aggregate;
pub mod clients;
pub mod collector;
pub mod config;
pub mod llm;
pub mod matching;
pub mod price;
pub mod report;
pub mod types;

pub use aggregate::aggregate;
pub use collector::collect_listings;
pub use config::PipelineConfig;
pub use matching::{MatcherConfig, ProductMatcher};
pub use report::{write_report, ReportSummary};
pub use types::{MatchedGroup, Platform, RawListing, UnifiedProduct};
