//! Product matching across platforms.
//!
//! The primary strategy asks an LLM to group listings that describe the same
//! real-world event; the lexical fallback keeps the pipeline alive when the
//! model is unreachable or returns junk. Both strategies feed the same
//! finalization step, which enforces the partition invariants.

pub mod lexical;
pub mod llm;

use crate::llm::Inference;
use crate::types::{MatchedGroup, RawListing};
use log::{debug, info, warn};
use std::sync::Arc;

/// Matcher tuning knobs.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Groups under this confidence are demoted to singletons (0-100).
    pub min_confidence: f64,

    /// Confidence assigned to listings no other platform quotes (0-100).
    /// A lone listing is the authoritative quote for its product, so the
    /// default treats it as certain; the value stays configurable.
    pub single_source_confidence: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_confidence: 50.0,
            single_source_confidence: 100.0,
        }
    }
}

/// Groups raw listings into unified products.
pub struct ProductMatcher {
    llm: Option<Arc<dyn Inference>>,
    config: MatcherConfig,
}

impl ProductMatcher {
    pub fn new(llm: Option<Arc<dyn Inference>>, config: MatcherConfig) -> Self {
        Self { llm, config }
    }

    /// Partition listings into groups of same-product quotes.
    ///
    /// Every listing lands in exactly one group and a group holds at most
    /// one listing per platform, whichever strategy produced it.
    pub async fn partition(&self, listings: &[RawListing]) -> Vec<MatchedGroup> {
        if listings.is_empty() {
            return Vec::new();
        }

        let groups = match &self.llm {
            Some(llm) => match llm::group_with_llm(llm.as_ref(), listings).await {
                Ok(groups) => {
                    info!("LLM matcher produced {} groups", groups.len());
                    groups
                }
                Err(e) => {
                    warn!("LLM matching unavailable ({}), using lexical fallback", e);
                    lexical::group_listings(listings)
                }
            },
            None => {
                debug!("LLM disabled, using lexical matcher");
                lexical::group_listings(listings)
            }
        };

        self.finalize(groups)
    }

    /// Enforce the partition invariants on whatever a strategy returned:
    /// one listing per platform per group, low-confidence merges demoted,
    /// singleton confidence normalized, confidence clamped to [0, 100].
    fn finalize(&self, groups: Vec<MatchedGroup>) -> Vec<MatchedGroup> {
        let single_confidence = self.config.single_source_confidence.clamp(0.0, 100.0);
        let mut out = Vec::new();
        let mut spill: Vec<(RawListing, Option<String>)> = Vec::new();

        for group in groups {
            let category = group.category.clone();

            let mut kept: Vec<RawListing> = Vec::new();
            for listing in group.members {
                if kept.iter().any(|k| k.source == listing.source) {
                    spill.push((listing, category.clone()));
                } else {
                    kept.push(listing);
                }
            }
            if kept.is_empty() {
                continue;
            }

            let confidence = group.confidence.clamp(0.0, 100.0);
            if kept.len() > 1 && confidence < self.config.min_confidence {
                // Low-confidence merge: keep the listings, not the grouping.
                debug!(
                    "demoting group '{}' (confidence {:.1} < {:.1})",
                    group.unified_name, confidence, self.config.min_confidence
                );
                for listing in kept {
                    spill.push((listing, category.clone()));
                }
                continue;
            }

            let unified_name = if group.unified_name.trim().is_empty() {
                most_descriptive_name(&kept)
            } else {
                group.unified_name
            };

            let confidence = if kept.len() == 1 {
                single_confidence
            } else {
                confidence
            };

            out.push(MatchedGroup {
                unified_name,
                members: kept,
                confidence,
                category,
            });
        }

        for (listing, category) in spill {
            out.push(MatchedGroup {
                unified_name: listing.name.clone(),
                members: vec![listing],
                confidence: single_confidence,
                category,
            });
        }

        out
    }
}

/// The longest member name, as the most descriptive label for a group.
pub(crate) fn most_descriptive_name(members: &[RawListing]) -> String {
    members
        .iter()
        .map(|m| m.name.as_str())
        .max_by_key(|name| name.chars().count())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Platform;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct StubInference {
        completion: Option<String>,
    }

    #[async_trait]
    impl Inference for StubInference {
        async fn infer(&self, _prompt: &str) -> Result<String> {
            match &self.completion {
                Some(text) => Ok(text.clone()),
                None => Err(anyhow!("connection refused")),
            }
        }
    }

    fn sample_listings() -> Vec<RawListing> {
        vec![
            RawListing::new(Platform::Polymarket, "Trump Victory Market", "57.5%"),
            RawListing::new(Platform::Kalshi, "Biden Win Probability", "67.5%"),
            RawListing::new(Platform::PredictIt, "Will BTC hit $100k?", "$0.31"),
        ]
    }

    fn assert_valid_partition(listings: &[RawListing], groups: &[MatchedGroup]) {
        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total, listings.len(), "partition dropped or duplicated listings");

        let mut seen = HashSet::new();
        for group in groups {
            assert!((0.0..=100.0).contains(&group.confidence));

            let mut platforms = HashSet::new();
            for member in &group.members {
                assert!(platforms.insert(member.source), "platform repeated in group");
                assert!(seen.insert(member.name.clone()), "listing in two groups");
            }
        }
    }

    #[tokio::test]
    async fn test_partition_with_llm_grouping() {
        let listings = sample_listings();
        let stub = StubInference {
            completion: Some(
                r#"{"groups": [
                    {"unified_name": "US Presidential Election Winner",
                     "listings": [0, 1], "confidence": 87.5, "category": "politics"},
                    {"unified_name": "Bitcoin above $100k",
                     "listings": [2], "confidence": 95.0}
                ]}"#
                    .to_string(),
            ),
        };

        let matcher = ProductMatcher::new(Some(Arc::new(stub)), MatcherConfig::default());
        let groups = matcher.partition(&listings).await;

        assert_valid_partition(&listings, &groups);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].unified_name, "US Presidential Election Winner");
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].confidence, 87.5);
        assert_eq!(groups[0].category.as_deref(), Some("politics"));
        // singleton gets the configured single-source confidence
        assert_eq!(groups[1].confidence, 100.0);
    }

    #[tokio::test]
    async fn test_partition_falls_back_when_llm_unreachable() {
        let listings = sample_listings();
        let stub = StubInference { completion: None };

        let matcher = ProductMatcher::new(Some(Arc::new(stub)), MatcherConfig::default());
        let groups = matcher.partition(&listings).await;

        assert_valid_partition(&listings, &groups);
    }

    #[tokio::test]
    async fn test_partition_falls_back_on_garbage_completion() {
        let listings = sample_listings();
        let stub = StubInference {
            completion: Some("I could not find any groups, sorry!".to_string()),
        };

        let matcher = ProductMatcher::new(Some(Arc::new(stub)), MatcherConfig::default());
        let groups = matcher.partition(&listings).await;

        assert_valid_partition(&listings, &groups);
    }

    #[tokio::test]
    async fn test_partition_without_llm() {
        let listings = sample_listings();
        let matcher = ProductMatcher::new(None, MatcherConfig::default());
        let groups = matcher.partition(&listings).await;

        assert_valid_partition(&listings, &groups);
    }

    #[tokio::test]
    async fn test_low_confidence_groups_are_demoted() {
        let listings = sample_listings();
        let stub = StubInference {
            completion: Some(
                r#"{"groups": [
                    {"unified_name": "Weak merge", "listings": [0, 1, 2], "confidence": 32.0}
                ]}"#
                    .to_string(),
            ),
        };

        let matcher = ProductMatcher::new(Some(Arc::new(stub)), MatcherConfig::default());
        let groups = matcher.partition(&listings).await;

        assert_valid_partition(&listings, &groups);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.members.len() == 1));
        assert!(groups.iter().all(|g| g.confidence == 100.0));
    }

    #[tokio::test]
    async fn test_platform_duplicates_are_split() {
        let listings = vec![
            RawListing::new(Platform::Kalshi, "Fed cut in March", "41¢"),
            RawListing::new(Platform::Kalshi, "Fed cut by June", "72¢"),
        ];
        let stub = StubInference {
            completion: Some(
                r#"{"groups": [
                    {"unified_name": "Fed rate cut", "listings": [0, 1], "confidence": 91.0}
                ]}"#
                    .to_string(),
            ),
        };

        let matcher = ProductMatcher::new(Some(Arc::new(stub)), MatcherConfig::default());
        let groups = matcher.partition(&listings).await;

        assert_valid_partition(&listings, &groups);
        assert_eq!(groups.len(), 2);
    }

    #[tokio::test]
    async fn test_single_source_confidence_is_configurable() {
        let listings = vec![RawListing::new(Platform::Polymarket, "Lone market", "0.5")];
        let matcher = ProductMatcher::new(
            None,
            MatcherConfig {
                single_source_confidence: 25.0,
                ..MatcherConfig::default()
            },
        );

        let groups = matcher.partition(&listings).await;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].confidence, 25.0);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let matcher = ProductMatcher::new(None, MatcherConfig::default());
        assert!(matcher.partition(&[]).await.is_empty());
    }

    #[test]
    fn test_most_descriptive_name() {
        let members = vec![
            RawListing::new(Platform::Kalshi, "Fed cut", "41¢"),
            RawListing::new(Platform::Polymarket, "Will the Fed cut rates in March?", "0.41"),
        ];
        assert_eq!(
            most_descriptive_name(&members),
            "Will the Fed cut rates in March?"
        );
    }
}
