//! Rule-based fallback matcher.
//!
//! Pure lexical similarity: token overlap blended with Jaro-Winkler distance
//! over normalized names. Deliberately conservative; a missed merge costs one
//! duplicate row, a false merge corrupts the unified price.

use crate::types::{MatchedGroup, RawListing};
use std::collections::HashSet;
use strsim::jaro_winkler;

/// Similarity two names must reach before their listings are merged.
const MATCH_THRESHOLD: f64 = 0.55;

/// Words too generic to signal that two markets describe the same event.
const STOPWORDS: &[&str] = &[
    "will", "the", "a", "an", "to", "of", "in", "on", "by", "at", "for",
    "be", "is", "who", "what", "win", "wins", "winner", "victory", "market",
    "probability", "chance", "odds", "yes", "no",
];

/// Normalize a string for comparison
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokenize into significant words
fn tokenize(s: &str) -> HashSet<String> {
    normalize(s)
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

/// Blend of token overlap and whole-string distance, in [0, 1].
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    let ta = tokenize(a);
    let tb = tokenize(b);

    let overlap = if ta.is_empty() || tb.is_empty() {
        0.0
    } else {
        let intersection = ta.intersection(&tb).count() as f64;
        let union = ta.union(&tb).count() as f64;
        intersection / union
    };

    let distance = jaro_winkler(&normalize(a), &normalize(b));

    0.6 * overlap + 0.4 * distance
}

/// Greedy grouping by best lexical match.
///
/// Each listing joins the most similar existing group that has no listing
/// from its platform yet, or starts a new group. Every listing is placed;
/// nothing is ever dropped.
pub fn group_listings(listings: &[RawListing]) -> Vec<MatchedGroup> {
    let mut groups: Vec<MatchedGroup> = Vec::new();

    for listing in listings {
        let mut best: Option<(usize, f64)> = None;

        for (gi, group) in groups.iter().enumerate() {
            if group.members.iter().any(|m| m.source == listing.source) {
                continue;
            }

            let score = group
                .members
                .iter()
                .map(|m| similarity(&m.name, &listing.name))
                .fold(0.0, f64::max);

            if score >= MATCH_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
                best = Some((gi, score));
            }
        }

        match best {
            Some((gi, score)) => {
                let group = &mut groups[gi];
                group.members.push(listing.clone());

                // group confidence tracks the weakest accepted merge
                let merged = score * 100.0;
                group.confidence = if group.members.len() == 2 {
                    merged
                } else {
                    group.confidence.min(merged)
                };
                group.unified_name = super::most_descriptive_name(&group.members);
            }
            None => groups.push(MatchedGroup {
                unified_name: listing.name.clone(),
                members: vec![listing.clone()],
                confidence: 100.0,
                category: None,
            }),
        }
    }

    groups
}
