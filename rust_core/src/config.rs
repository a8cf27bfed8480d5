//! Pipeline configuration.
//!
//! Everything is sourced from the environment; the binary loads `.env` first.
//! There is no global state: the config is built once and passed down.

use crate::matching::MatcherConfig;
use std::env;
use std::path::PathBuf;

/// Runtime settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the Ollama-compatible inference endpoint
    pub ollama_base_url: String,

    /// Model name passed to the inference endpoint
    pub model_name: String,

    /// Output path of the unified report
    pub output_csv: PathBuf,

    /// Groups under this confidence are demoted to singletons (0-100)
    pub min_confidence: f64,

    /// Confidence assigned to listings no other platform quotes (0-100)
    pub single_source_confidence: f64,

    /// Per-request timeout for platform fetches, seconds
    pub request_timeout_secs: u64,

    /// Timeout for the inference call, seconds
    pub llm_timeout_secs: u64,

    /// Cap on listings fetched per platform
    pub max_listings_per_site: usize,

    /// When false the matcher goes straight to the lexical fallback
    pub llm_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2".to_string(),
            output_csv: PathBuf::from("unified_prediction_markets.csv"),
            min_confidence: 50.0,
            single_source_confidence: 100.0,
            request_timeout_secs: 30,
            llm_timeout_secs: 120,
            max_listings_per_site: 100,
            llm_enabled: true,
        }
    }
}

impl PipelineConfig {
    /// Build the configuration from environment variables, falling back to
    /// the defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ollama_base_url: env::var("OLLAMA_API_BASE").unwrap_or(defaults.ollama_base_url),
            model_name: env::var("MODEL_NAME").unwrap_or(defaults.model_name),
            output_csv: env::var("OUTPUT_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_csv),
            min_confidence: parse_env("MIN_CONFIDENCE_THRESHOLD", defaults.min_confidence),
            single_source_confidence: parse_env(
                "UNMATCHED_CONFIDENCE",
                defaults.single_source_confidence,
            ),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs),
            max_listings_per_site: parse_env(
                "MAX_LISTINGS_PER_SITE",
                defaults.max_listings_per_site,
            ),
            llm_enabled: !env::var("LLM_DISABLED")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Matcher view of this configuration.
    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            min_confidence: self.min_confidence,
            single_source_confidence: self.single_source_confidence,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
