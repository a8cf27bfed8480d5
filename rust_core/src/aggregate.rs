//! Per-group price statistics.

use crate::price::parse_price;
use crate::types::{MatchedGroup, RawListing, UnifiedProduct};
use std::cmp::Ordering;

/// Keyword table applied when the matcher supplied no category.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "financial",
        &[
            "bitcoin", "ethereum", "solana", "crypto", "financial", "fed", "rate",
            "inflation", "recession", "s&p",
        ],
    ),
    (
        "politics",
        &[
            "election", "president", "presidential", "senate", "congress",
            "governor", "politics", "impeach",
        ],
    ),
    (
        "sports",
        &[
            "world cup", "super bowl", "world series", "uefa", "champions", "f1",
            "nfl", "nba", "nhl", "sports",
        ],
    ),
    ("awards", &["nobel", "oscar", "grammy", "emmy"]),
];

/// Category derived from a product name, if any keyword applies.
pub fn categorize(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return Some(category);
        }
    }
    None
}

/// Price used for statistics: the parsed raw price, or the listing's own
/// probability when the platform quoted no price text.
fn listing_price(listing: &RawListing) -> f64 {
    if listing.raw_price.trim().is_empty() {
        if let Some(p) = listing.probability {
            return (p / 100.0).clamp(0.0, 1.0);
        }
    }
    parse_price(&listing.raw_price)
}

/// Sample standard deviation (n - 1 denominator); 0.0 below two samples.
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Compute per-group statistics and order the result by confidence, then by
/// source count, both descending.
pub fn aggregate(groups: Vec<MatchedGroup>) -> Vec<UnifiedProduct> {
    let mut products: Vec<UnifiedProduct> = groups
        .into_iter()
        .filter(|g| !g.members.is_empty())
        .map(build_product)
        .collect();

    products.sort_by(|a, b| {
        b.confidence_level
            .partial_cmp(&a.confidence_level)
            .unwrap_or(Ordering::Equal)
            .then(b.source_count.cmp(&a.source_count))
    });

    products
}

fn build_product(group: MatchedGroup) -> UnifiedProduct {
    let prices: Vec<f64> = group.members.iter().map(listing_price).collect();

    let average_price = prices.iter().sum::<f64>() / prices.len() as f64;
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let price_variance = sample_std_dev(&prices);

    let mut platforms = Vec::new();
    for member in &group.members {
        if !platforms.contains(&member.source) {
            platforms.push(member.source);
        }
    }

    let category = group
        .category
        .clone()
        .filter(|c| !c.trim().is_empty())
        .or_else(|| categorize(&group.unified_name).map(String::from))
        .unwrap_or_else(|| "uncategorized".to_string());

    UnifiedProduct {
        unified_name: group.unified_name,
        members: group.members,
        average_price,
        price_variance,
        confidence_level: group.confidence.clamp(0.0, 100.0),
        source_count: platforms.len(),
        category,
        min_price,
        max_price,
    }
}
