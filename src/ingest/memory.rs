// src/ingest/memory.rs
//! In-memory collaborators: serve pre-built collections and audience snapshots.
//! Used by tests and local demos where the social API is not reachable.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ingest::types::{AudienceMetrics, AudienceSource, DiscussionRecord, DiscussionSource};

#[derive(Debug, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<DiscussionRecord>>,
    audiences: HashMap<String, AudienceMetrics>,
    lookups: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, topic_tag: &str, records: Vec<DiscussionRecord>) -> Self {
        self.collections.insert(topic_tag.to_string(), records);
        self
    }

    pub fn with_audience(mut self, account_id: &str, followers: u64, posts: u64) -> Self {
        self.audiences.insert(
            account_id.to_string(),
            AudienceMetrics {
                account_id: account_id.to_string(),
                follower_count: followers,
                post_count: posts,
            },
        );
        self
    }

    /// Number of audience lookups served so far.
    pub fn audience_lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DiscussionSource for MemorySource {
    async fn fetch_collection(&self, topic_tag: &str) -> Result<Vec<DiscussionRecord>> {
        Ok(self.collections.get(topic_tag).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl AudienceSource for MemorySource {
    async fn fetch_audience(&self, account_id: &str) -> Result<AudienceMetrics> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.audiences
            .get(account_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown account `{account_id}`"))
    }
}
