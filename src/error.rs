// src/error.rs
//! Error taxonomy for credibility evaluation.

/// Failure kinds surfaced by the scoring engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CredibilityError {
    /// Upstream collaborator failed or returned unparseable data.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A discussion record lacks its single required reference.
    #[error("malformed record `{record_id}`: {reason}")]
    MalformedRecord { record_id: String, reason: String },

    /// No records for the requested topic, so the average is undefined.
    #[error("no discussion records found for topic `{0}`")]
    EmptyCollection(String),

    /// Target id absent from an otherwise valid collection.
    #[error("referenced target id not found in collection: {0}")]
    NotFound(String),
}

impl CredibilityError {
    /// Map a collaborator error into the taxonomy.
    /// Typed errors raised by providers (e.g. `MalformedRecord`) pass through untouched.
    pub fn from_collaborator(err: anyhow::Error) -> Self {
        match err.downcast::<CredibilityError>() {
            Ok(typed) => typed,
            Err(other) => CredibilityError::Fetch(format!("{other:#}")),
        }
    }

    /// Short, stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CredibilityError::Fetch(_) => "fetch",
            CredibilityError::MalformedRecord { .. } => "malformed_record",
            CredibilityError::EmptyCollection(_) => "empty_collection",
            CredibilityError::NotFound(_) => "not_found",
        }
    }
}
