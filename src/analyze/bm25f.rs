// src/analyze/bm25f.rs
//! BM25F-style credibility formula.
//!
//! Term frequency becomes "how many records reference this target", and the
//! length normalization becomes the target author's posts-per-follower ratio:
//!
//! ```text
//! weight = (occurrences * BOOST) / ((1 - B) + B * posts / followers)
//! idf    = ln((n + r + 0.5) / (r + 0.5))
//! score  = weight / (K1 + weight) * idf
//! ```

use crate::error::CredibilityError;
use crate::ingest::types::{AudienceMetrics, AudienceSource, DiscussionRecord};

pub const BOOST: f64 = 3.55;
pub const B: f64 = 0.6;
pub const K1: f64 = 1.5;

/// Number of records in `collection` referencing `target_id`.
pub fn occurrences(target_id: &str, collection: &[DiscussionRecord]) -> usize {
    collection
        .iter()
        .filter(|r| r.target_id() == target_id)
        .count()
}

/// First record referencing `target_id`; all matches share the same target author.
pub fn representative<'a>(
    target_id: &str,
    collection: &'a [DiscussionRecord],
) -> Option<&'a DiscussionRecord> {
    collection.iter().find(|r| r.target_id() == target_id)
}

/// Length-normalization denominator `(1 - B) + B * ratio`.
///
/// Accounts with zero followers have no defined ratio. The whole term is then
/// forced to 1, so the weight reduces to `occurrences * BOOST`.
pub fn audience_norm(metrics: &AudienceMetrics) -> f64 {
    match metrics.ratio() {
        Some(ratio) => (1.0 - B) + B * ratio,
        None => 1.0,
    }
}

/// Weight for a target referenced `occurrences` times by an author with `metrics`.
pub fn weight_for(occurrences: usize, metrics: &AudienceMetrics) -> f64 {
    (occurrences as f64 * BOOST) / audience_norm(metrics)
}

/// `ln((n + r + 0.5) / (r + 0.5))` for a collection of `n` records, `r` of them matching.
pub fn inverse_frequency_counts(n: usize, r: usize) -> f64 {
    let (n, r) = (n as f64, r as f64);
    ((n + r + 0.5) / (r + 0.5)).ln()
}

pub fn inverse_frequency(target_id: &str, collection: &[DiscussionRecord]) -> f64 {
    inverse_frequency_counts(collection.len(), occurrences(target_id, collection))
}

/// Saturation `w / (K1 + w)`, in `[0, 1)` for non-negative `w`.
pub fn saturate(weight: f64) -> f64 {
    weight / (K1 + weight)
}

pub fn combine(weight: f64, inverse_frequency: f64) -> f64 {
    saturate(weight) * inverse_frequency
}

/// Weight of `target_id`, fetching its author's audience metrics.
pub async fn weight(
    target_id: &str,
    collection: &[DiscussionRecord],
    audience: &dyn AudienceSource,
) -> Result<f64, CredibilityError> {
    let rep = representative(target_id, collection)
        .ok_or_else(|| CredibilityError::NotFound(target_id.to_string()))?;
    let metrics = audience
        .fetch_audience(rep.target_author_id())
        .await
        .map_err(CredibilityError::from_collaborator)?;
    Ok(weight_for(occurrences(target_id, collection), &metrics))
}

/// Full score of `target_id` against `collection`.
pub async fn score(
    target_id: &str,
    collection: &[DiscussionRecord],
    audience: &dyn AudienceSource,
) -> Result<f64, CredibilityError> {
    let w = weight(target_id, collection, audience).await?;
    Ok(combine(w, inverse_frequency(target_id, collection)))
}
