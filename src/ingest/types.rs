// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::CredibilityError;

/// How the quoting post references its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Quoted,
    Retweeted,
    RepliedTo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedItem {
    pub kind: ReferenceKind,
    pub target_id: String,        // original post being referenced
    pub target_author_id: String, // author of the original post
}

/// One quote/retweet event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionRecord {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub referenced_item: ReferencedItem,
}

impl DiscussionRecord {
    /// Build a record from the raw reference list a provider returned.
    ///
    /// Zero references is rejected as `MalformedRecord`. Only the first
    /// reference is kept when a post carries several.
    pub fn from_references(
        id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
        references: Vec<ReferencedItem>,
    ) -> std::result::Result<Self, CredibilityError> {
        let id = id.into();
        let Some(referenced_item) = references.into_iter().next() else {
            return Err(CredibilityError::MalformedRecord {
                record_id: id,
                reason: "record carries no referenced item".into(),
            });
        };
        Ok(Self {
            id,
            author_id: author_id.into(),
            text: text.into(),
            referenced_item,
        })
    }

    pub fn target_id(&self) -> &str {
        &self.referenced_item.target_id
    }

    pub fn target_author_id(&self) -> &str {
        &self.referenced_item.target_author_id
    }
}

/// Per-account audience snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceMetrics {
    pub account_id: String,
    pub follower_count: u64,
    pub post_count: u64,
}

impl AudienceMetrics {
    /// Posts per follower. `None` when the account has no followers.
    pub fn ratio(&self) -> Option<f64> {
        if self.follower_count == 0 {
            return None;
        }
        Some(self.post_count as f64 / self.follower_count as f64)
    }
}

/// Fetches the quote/retweet collection for a topic tag.
#[async_trait::async_trait]
pub trait DiscussionSource: Send + Sync {
    async fn fetch_collection(&self, topic_tag: &str) -> Result<Vec<DiscussionRecord>>;
    fn name(&self) -> &'static str;
}

/// Looks up follower and post counts for an account.
#[async_trait::async_trait]
pub trait AudienceSource: Send + Sync {
    async fn fetch_audience(&self, account_id: &str) -> Result<AudienceMetrics>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(target: &str) -> ReferencedItem {
        ReferencedItem {
            kind: ReferenceKind::Retweeted,
            target_id: target.into(),
            target_author_id: "A".into(),
        }
    }

    #[test]
    fn record_without_references_is_rejected() {
        let err = DiscussionRecord::from_references("1", "u", "hi", vec![]).unwrap_err();
        assert_eq!(err.kind(), "malformed_record");
    }

    #[test]
    fn first_reference_wins() {
        let rec =
            DiscussionRecord::from_references("1", "u", "hi", vec![reference("T1"), reference("T2")])
                .unwrap();
        assert_eq!(rec.target_id(), "T1");
    }

    #[test]
    fn ratio_is_undefined_without_followers() {
        let m = AudienceMetrics {
            account_id: "A".into(),
            follower_count: 0,
            post_count: 10,
        };
        assert_eq!(m.ratio(), None);

        let m = AudienceMetrics {
            account_id: "A".into(),
            follower_count: 1000,
            post_count: 500,
        };
        assert_eq!(m.ratio(), Some(0.5));
    }
}
