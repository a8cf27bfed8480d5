//! LLM grouping strategy.
//!
//! The completion is validated against a typed schema before anything is
//! trusted; every failure mode maps to a `MatchResponseError` so the caller
//! can fall back instead of silently accepting malformed data.

use crate::llm::Inference;
use crate::types::{MatchedGroup, RawListing};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Why an LLM response could not be used. Any variant sends the matcher to
/// the lexical fallback.
#[derive(Debug, Error)]
pub enum MatchResponseError {
    #[error("inference call failed: {0}")]
    Unavailable(String),

    #[error("no JSON object in completion")]
    MissingJson,

    #[error("completion failed schema validation: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("grouping referenced invalid data: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct GroupingResponse {
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    unified_name: String,
    listings: Vec<usize>,
    confidence: f64,
    #[serde(default)]
    category: Option<String>,
}

/// Group listings by asking the model, then validating what it said.
pub async fn group_with_llm(
    llm: &dyn Inference,
    listings: &[RawListing],
) -> Result<Vec<MatchedGroup>, MatchResponseError> {
    let prompt = build_prompt(listings);
    let completion = llm
        .infer(&prompt)
        .await
        .map_err(|e| MatchResponseError::Unavailable(e.to_string()))?;

    debug!("completion: {} chars", completion.len());

    let json = extract_json(&completion).ok_or(MatchResponseError::MissingJson)?;
    let parsed: GroupingResponse = serde_json::from_str(json)?;
    validate(parsed, listings)
}

pub(crate) fn build_prompt(listings: &[RawListing]) -> String {
    let mut prompt = String::from(
        "You are analyzing prediction-market listings from multiple platforms. \
         Group listings that refer to the same real-world event or product.\n\nListings:\n",
    );

    for (i, listing) in listings.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] {}: \"{}\" (price: {})\n",
            i, listing.source, listing.name, listing.raw_price
        ));
    }

    prompt.push_str(
        "\nRules:\n\
         - Every listing index appears in exactly one group.\n\
         - A group never contains two listings from the same platform.\n\
         - confidence per group: 90-100 identical markets, 70-89 very similar, \
         50-69 somewhat similar, below 50 different. Be conservative to avoid \
         false positives.\n\
         - unified_name: the most descriptive name for the group.\n\
         - category: one of financial, politics, sports, awards; omit if unsure.\n\n\
         Return ONLY a JSON object in this exact shape:\n\
         {\"groups\": [{\"unified_name\": \"...\", \"listings\": [0, 3], \
         \"confidence\": 87.5, \"category\": \"politics\"}]}\n",
    );

    prompt
}

/// Pull the first balanced JSON object out of a completion. Models tend to
/// wrap the object in prose or code fences.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Turn a validated response into groups. Out-of-range indices reject the
/// whole response; duplicate indices keep their first group; listings the
/// model dropped become singleton groups so the partition stays complete.
fn validate(
    response: GroupingResponse,
    listings: &[RawListing],
) -> Result<Vec<MatchedGroup>, MatchResponseError> {
    let mut taken = vec![false; listings.len()];
    let mut groups = Vec::new();

    for entry in response.groups {
        let mut members = Vec::new();
        for idx in entry.listings {
            if idx >= listings.len() {
                return Err(MatchResponseError::Invalid(format!(
                    "listing index {} out of range ({} listings)",
                    idx,
                    listings.len()
                )));
            }
            if taken[idx] {
                continue;
            }
            taken[idx] = true;
            members.push(listings[idx].clone());
        }
        if members.is_empty() {
            continue;
        }

        let unified_name = if entry.unified_name.trim().is_empty() {
            super::most_descriptive_name(&members)
        } else {
            entry.unified_name
        };

        groups.push(MatchedGroup {
            unified_name,
            members,
            confidence: entry.confidence.clamp(0.0, 100.0),
            category: entry.category.filter(|c| !c.trim().is_empty()),
        });
    }

    for (idx, assigned) in taken.iter().enumerate() {
        if !assigned {
            let listing = listings[idx].clone();
            groups.push(MatchedGroup {
                unified_name: listing.name.clone(),
                members: vec![listing],
                confidence: 100.0,
                category: None,
            });
        }
    }

    Ok(groups)
}
