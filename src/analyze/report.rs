// src/analyze/report.rs
//! Credible / not-credible split around the collection average.

use serde::Serialize;

use crate::analyze::evaluate::{CollectionScoreResult, ScoredItem};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredibilityReport {
    pub average_score: f64,
    /// Items scoring at or above the average.
    pub credible: Vec<ScoredItem>,
    pub not_credible: Vec<ScoredItem>,
}

impl CredibilityReport {
    pub fn from_result(result: CollectionScoreResult) -> Self {
        let average_score = result.average_score;
        let (credible, not_credible) = result
            .items
            .into_iter()
            .partition(|item| item.score >= average_score);
        Self {
            average_score,
            credible,
            not_credible,
        }
    }
}
