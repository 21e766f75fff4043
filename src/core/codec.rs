//! One-record-per-line JSON codec for the durable cache.
//!
//! Unknown keys are ignored; every required key must be present. Zero
//! metrics mean "unknown" on the wire. Caches written by the earlier
//! tool used source-specific key names, which decode as aliases.

use serde::Deserialize;
use serde_json::json;

use crate::core::record::{Metrics, MovieRecord};

#[derive(Debug, thiserror::Error)]
pub enum CodecError
{
    #[error("malformed cache record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Wire shape of a cache line. No `Option` fields: a missing key is an error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheLine
{
    title: String,
    year: i32,
    #[serde(alias = "IMDBrating")]
    primary_rating: f64,
    #[serde(alias = "IMDBvotes")]
    primary_vote_count: u64,
    #[serde(alias = "RTrating")]
    secondary_rating: u32,
    #[serde(alias = "RTreviews")]
    secondary_review_count: u64,
    genres: Vec<String>,
}

/// Encode a record as a single JSON object (no trailing newline).
pub fn encode(record: &MovieRecord) -> String
{
    let m = record.metrics();
    json!({
        "title": record.title(),
        "year": record.year(),
        "primaryRating": m.primary_rating().unwrap_or(0.0),
        "primaryVoteCount": m.primary_vote_count().unwrap_or(0),
        "secondaryRating": m.secondary_rating().unwrap_or(0),
        "secondaryReviewCount": m.secondary_review_count().unwrap_or(0),
        "genres": m.genres(),
    })
    .to_string()
}

/// Decode one cache line.
pub fn decode(line: &str) -> Result<MovieRecord, CodecError>
{
    let wire: CacheLine = serde_json::from_str(line.trim())?;

    let metrics = Metrics::from_raw(
        wire.primary_rating,
        wire.primary_vote_count,
        wire.secondary_rating,
        wire.secondary_review_count,
        wire.genres,
    );

    Ok(MovieRecord::with_metrics(wire.title, wire.year, metrics))
}
