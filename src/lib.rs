// src/lib.rs
//! Retweet credibility scoring.
//!
//! A BM25F-style formula scores how endorsed a referenced post is within a
//! topic's quote/retweet collection, discounted by the reach of its author.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{
    CollectionScoreResult, CredibilityEngine, CredibilityReport, EvaluateOptions, ScoredItem,
    TargetOutcome, TargetScore,
};
pub use crate::api::router;
pub use crate::error::CredibilityError;
pub use crate::ingest::types::{
    AudienceMetrics, AudienceSource, DiscussionRecord, DiscussionSource, ReferenceKind,
    ReferencedItem,
};
