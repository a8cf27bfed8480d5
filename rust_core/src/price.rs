//! Price text normalization.
//!
//! Platforms quote the same probability as "57.5%", "$0.575" or "57¢"; the
//! aggregator only works with fractions in [0, 1].

use regex::Regex;
use std::sync::OnceLock;

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid price regex"))
}

/// Parse a textual price into a fraction in [0, 1].
///
/// Percent quotes ("57.5%"), cent quotes ("57¢") and any bare value above 1
/// are treated as per-hundred. Unparseable input yields 0.0; a bad price must
/// never abort the pipeline.
pub fn parse_price(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let value = match number_re()
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<f64>().ok())
    {
        Some(v) => v,
        None => return 0.0,
    };

    let value = if trimmed.contains('%') || trimmed.contains('¢') || value > 1.0 {
        value / 100.0
    } else {
        value
    };

    value.clamp(0.0, 1.0)
}
