//! Prompt templates for the filter and match stages.
//!
//! Pure functions of typed inputs; parsing of the responses lives in
//! [`crate::codec`].

use marketmind_core::{Product, TrendRecord};

use crate::codec::encode_records;
use crate::error::MatchmakerError;

/// Content categories the filter stage must remove.
pub const SENSITIVE_CATEGORIES: [&str; 9] = [
    "violent",
    "sexual",
    "hateful",
    "discriminatory",
    "racist",
    "politically sensitive",
    "religiously sensitive",
    "culturally sensitive",
    "otherwise inappropriate",
];

/// Build the sensitive-content filter prompt.
///
/// # Errors
///
/// Returns [`MatchmakerError::Encode`] if the trends cannot be serialized.
pub fn filter_prompt(trends: &[TrendRecord]) -> Result<String, MatchmakerError> {
    let dataset = encode_records("trends", trends)?;

    let mut prompt = String::from(
        "You are a content filter for a marketing team. You receive a JSON array of \
         news and trend records.\n\
         Delete every record whose subject could be considered:\n",
    );
    for category in SENSITIVE_CATEGORIES {
        prompt.push_str("- ");
        prompt.push_str(category);
        prompt.push('\n');
    }
    prompt.push_str(
        "Keep every other record exactly as given: do not edit, reorder, merge, or add \
         records, and do not change any field value.\n",
    );
    prompt.push_str("Records:\n");
    prompt.push_str(&dataset);
    prompt.push_str(
        "\nIMPORTANT: Return only the filtered JSON array, nothing else. No explanations, \
         no markdown, no code fences. Return [] if every record is removed.",
    );
    Ok(prompt)
}

/// Build the product–trend matching prompt.
///
/// # Errors
///
/// Returns [`MatchmakerError::Encode`] if products or trends cannot be serialized.
pub fn match_prompt(
    products: &[Product],
    trends: &[TrendRecord],
    max_matches: usize,
) -> Result<String, MatchmakerError> {
    let products_json = encode_records("products", products)?;
    let trends_json = encode_records("trends", trends)?;

    Ok(format!(
        "You are a witty content strategist. Find creative, funny, and compelling \
         connections between products and trending news items.\n\
         Critically evaluate each possible pairing. Only create a match when there is a \
         clear, logical, relevant, and funny connection between the product and the trend. \
         Avoid forced or nonsensical matches.\n\
         For each match, provide:\n\
         - product_name: copied exactly from the products\n\
         - trend_title: copied exactly from the trends\n\
         - trend_description: copied exactly from the same trend\n\
         - similarity_description: a clear, interesting, and humorous angle that mentions \
         both the product and the trend and inspires content creators\n\
         Products:\n{products_json}\n\
         Trends:\n{trends_json}\n\
         IMPORTANT:\n\
         - Return only the JSON array of matches, nothing else. No markdown, no code fences.\n\
         - Only use the data provided; never invent products or trends.\n\
         - Do not make more than {max_matches} matches.\n\
         - If no good matches exist, return an empty array []."
    ))
}
