//! Shared data model for the unification pipeline.

use serde::{Deserialize, Serialize};

/// Platform identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Polymarket,
    Kalshi,
    PredictIt,
}

impl Platform {
    /// Human-readable name used in the report output
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Polymarket => "Polymarket",
            Platform::Kalshi => "Kalshi",
            Platform::PredictIt => "PredictIt",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single market listing as fetched from one platform.
///
/// Created by the collector and immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    /// Platform the listing came from
    pub source: Platform,

    /// Free-text product label (market question or title)
    pub name: String,

    /// Price exactly as the platform presented it ("57.5%", "$0.62", "62¢")
    pub raw_price: String,

    /// Implied probability in percent, when the platform exposes one
    pub probability: Option<f64>,
}

impl RawListing {
    pub fn new(source: Platform, name: impl Into<String>, raw_price: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            raw_price: raw_price.into(),
            probability: None,
        }
    }
}

/// Matcher output: listings judged to describe the same real-world product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedGroup {
    /// Canonical label chosen for the group
    pub unified_name: String,

    /// Member listings, at most one per platform
    pub members: Vec<RawListing>,

    /// Matching certainty, 0-100
    pub confidence: f64,

    /// Category assigned by the matcher, if any
    #[serde(default)]
    pub category: Option<String>,
}

/// Aggregator output, one row of the unified report.
///
/// Written once and never mutated after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedProduct {
    /// Canonical label for the unified product
    pub unified_name: String,

    /// Member listings the statistics were computed from
    pub members: Vec<RawListing>,

    /// Mean of the members' parsed prices
    pub average_price: f64,

    /// Sample standard deviation of the members' parsed prices
    pub price_variance: f64,

    /// Matching certainty, 0-100 (not price agreement)
    pub confidence_level: f64,

    /// Number of distinct platforms represented
    pub source_count: usize,

    /// Product category ("uncategorized" when nothing applies)
    pub category: String,

    /// Lowest parsed member price
    pub min_price: f64,

    /// Highest parsed member price
    pub max_price: f64,
}

impl UnifiedProduct {
    /// Distinct platforms represented, in member order.
    pub fn sources(&self) -> Vec<Platform> {
        let mut sources = Vec::new();
        for member in &self.members {
            if !sources.contains(&member.source) {
                sources.push(member.source);
            }
        }
        sources
    }

    /// Member listing names, in member order.
    pub fn source_products(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }
}
