// src/analyze/mod.rs
//! Credibility analysis: BM25F formula, collection evaluation, reporting.

pub mod bm25f;
pub mod evaluate;
pub mod report;

// Re-export convenient types.
pub use crate::analyze::evaluate::{
    evaluate_collection, score_collection, score_for_target, select_target, CollectionScoreResult,
    CredibilityEngine, EvaluateOptions, ScoredItem, TargetOutcome, TargetScore,
};
pub use crate::analyze::report::CredibilityReport;
