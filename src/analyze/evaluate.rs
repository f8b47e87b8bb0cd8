// src/analyze/evaluate.rs
//! Collection evaluation and target selection.
//!
//! Every record is scored by its own target against the full collection. Records
//! sharing a target share a score, so audience lookups fan out once per distinct
//! target author, bounded by `EvaluateOptions::concurrency`. Nothing is cached
//! between evaluations.

use futures::stream::{self, StreamExt, TryStreamExt};
use metrics::{counter, histogram};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::analyze::bm25f::{combine, inverse_frequency_counts, weight_for};
use crate::analyze::report::CredibilityReport;
use crate::config::credibility::DEFAULT_CONCURRENCY;
use crate::error::CredibilityError;
use crate::ingest::types::{AudienceMetrics, AudienceSource, DiscussionRecord, DiscussionSource};

#[derive(Debug, Clone, Copy)]
pub struct EvaluateOptions {
    /// Max in-flight audience lookups.
    pub concurrency: usize,
    /// Wall-clock limit for one evaluation; in-flight lookups are dropped when it fires.
    pub deadline: Option<Duration>,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub source_record: DiscussionRecord,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionScoreResult {
    pub average_score: f64,
    /// Same order as the fetched collection.
    pub items: Vec<ScoredItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetScore {
    pub average_score: f64,
    pub target_score: f64,
}

/// Result of looking up one target. Not-found is a normal outcome and keeps the average.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    Found(TargetScore),
    NotFound { target_id: String, average_score: f64 },
}

impl TargetOutcome {
    pub fn average_score(&self) -> f64 {
        match self {
            TargetOutcome::Found(s) => s.average_score,
            TargetOutcome::NotFound { average_score, .. } => *average_score,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, TargetOutcome::Found(_))
    }

    /// Collapse into a single error channel, turning not-found into `CredibilityError::NotFound`.
    pub fn into_result(self) -> Result<TargetScore, CredibilityError> {
        match self {
            TargetOutcome::Found(s) => Ok(s),
            TargetOutcome::NotFound { target_id, .. } => Err(CredibilityError::NotFound(target_id)),
        }
    }
}

/// Score an already-fetched collection.
pub async fn score_collection(
    topic_tag: &str,
    collection: Vec<DiscussionRecord>,
    audience: &dyn AudienceSource,
    opts: EvaluateOptions,
) -> Result<CollectionScoreResult, CredibilityError> {
    if collection.is_empty() {
        return Err(CredibilityError::EmptyCollection(topic_tag.to_string()));
    }

    // Occurrence counts and the first-seen author per target, in one pass.
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut target_authors: Vec<(String, String)> = Vec::new();
    for rec in &collection {
        let slot = counts.entry(rec.target_id().to_string()).or_insert(0);
        if *slot == 0 {
            target_authors.push((rec.target_id().to_string(), rec.target_author_id().to_string()));
        }
        *slot += 1;
    }

    let authors: Vec<String> = {
        let mut seen = HashSet::new();
        target_authors
            .iter()
            .map(|(_, author)| author.as_str())
            .filter(|author| seen.insert(*author))
            .map(str::to_owned)
            .collect()
    };

    let audiences: HashMap<String, AudienceMetrics> = stream::iter(authors)
        .map(|author| async move {
            counter!("audience_lookups_total").increment(1);
            audience
                .fetch_audience(&author)
                .await
                .map(|m| (author, m))
        })
        .buffered(opts.concurrency.max(1))
        .map_err(|e| {
            warn!(target: "credibility", error = %e, "audience lookup failed");
            CredibilityError::from_collaborator(e)
        })
        .try_collect()
        .await?;

    let n = collection.len();
    let mut scores: HashMap<String, f64> = HashMap::with_capacity(target_authors.len());
    for (target_id, author_id) in &target_authors {
        let metrics = audiences.get(author_id).ok_or_else(|| {
            CredibilityError::Fetch(format!("no audience metrics returned for `{author_id}`"))
        })?;
        let r = counts[target_id];
        let w = weight_for(r, metrics);
        let idf = inverse_frequency_counts(n, r);
        let score = combine(w, idf);
        debug!(
            target: "credibility",
            target_id = %target_id,
            author_id = %author_id,
            occurrences = r,
            followers = metrics.follower_count,
            posts = metrics.post_count,
            weight = w,
            idf,
            score,
            "scored target"
        );
        scores.insert(target_id.clone(), score);
    }

    let items: Vec<ScoredItem> = collection
        .into_iter()
        .map(|rec| {
            let score = scores[rec.target_id()];
            ScoredItem {
                source_record: rec,
                score,
            }
        })
        .collect();

    let average_score = items.iter().map(|i| i.score).sum::<f64>() / items.len() as f64;

    Ok(CollectionScoreResult {
        average_score,
        items,
    })
}

/// Fetch the collection for `topic_tag` and score every record.
pub async fn evaluate_collection(
    discussions: &dyn DiscussionSource,
    audience: &dyn AudienceSource,
    topic_tag: &str,
    opts: EvaluateOptions,
) -> Result<CollectionScoreResult, CredibilityError> {
    let t0 = Instant::now();
    let run = async {
        let collection = discussions
            .fetch_collection(topic_tag)
            .await
            .map_err(|e| {
                warn!(target: "credibility", error = ?e, provider = discussions.name(), "collection fetch failed");
                CredibilityError::from_collaborator(e)
            })?;
        score_collection(topic_tag, collection, audience, opts).await
    };

    let res = match opts.deadline {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(res) => res,
            Err(_) => Err(CredibilityError::Fetch(format!(
                "evaluation of `{topic_tag}` exceeded {}ms",
                limit.as_millis()
            ))),
        },
        None => run.await,
    };

    histogram!("credibility_evaluation_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    match &res {
        Ok(r) => {
            counter!("credibility_evaluations_total", "outcome" => "ok").increment(1);
            info!(
                target: "credibility",
                topic = topic_tag,
                records = r.items.len(),
                average = r.average_score,
                "collection evaluated"
            );
        }
        Err(e) => {
            counter!("credibility_evaluations_total", "outcome" => e.kind()).increment(1);
            if matches!(e, CredibilityError::Fetch(_) | CredibilityError::MalformedRecord { .. }) {
                counter!("credibility_fetch_errors_total").increment(1);
            }
        }
    }
    res
}

/// Locate the first scored record referencing `target_id`.
pub fn select_target(result: &CollectionScoreResult, target_id: &str) -> TargetOutcome {
    match result
        .items
        .iter()
        .find(|i| i.source_record.target_id() == target_id)
    {
        Some(item) => TargetOutcome::Found(TargetScore {
            average_score: result.average_score,
            target_score: item.score,
        }),
        None => {
            counter!("credibility_not_found_total").increment(1);
            TargetOutcome::NotFound {
                target_id: target_id.to_string(),
                average_score: result.average_score,
            }
        }
    }
}

pub async fn score_for_target(
    discussions: &dyn DiscussionSource,
    audience: &dyn AudienceSource,
    topic_tag: &str,
    target_id: &str,
    opts: EvaluateOptions,
) -> Result<TargetOutcome, CredibilityError> {
    let result = evaluate_collection(discussions, audience, topic_tag, opts).await?;
    Ok(select_target(&result, target_id))
}

/// Collaborators plus options, shared by request handlers.
#[derive(Clone)]
pub struct CredibilityEngine {
    discussions: Arc<dyn DiscussionSource>,
    audience: Arc<dyn AudienceSource>,
    options: EvaluateOptions,
}

impl CredibilityEngine {
    pub fn new(
        discussions: Arc<dyn DiscussionSource>,
        audience: Arc<dyn AudienceSource>,
        options: EvaluateOptions,
    ) -> Self {
        Self {
            discussions,
            audience,
            options,
        }
    }

    /// Use one provider for both collaborator roles.
    pub fn from_provider<P>(provider: Arc<P>, options: EvaluateOptions) -> Self
    where
        P: DiscussionSource + AudienceSource + 'static,
    {
        Self::new(provider.clone(), provider, options)
    }

    pub fn options(&self) -> EvaluateOptions {
        self.options
    }

    pub async fn evaluate(&self, topic_tag: &str) -> Result<CollectionScoreResult, CredibilityError> {
        evaluate_collection(
            self.discussions.as_ref(),
            self.audience.as_ref(),
            topic_tag,
            self.options,
        )
        .await
    }

    pub async fn score_for_target(
        &self,
        topic_tag: &str,
        target_id: &str,
    ) -> Result<TargetOutcome, CredibilityError> {
        let result = self.evaluate(topic_tag).await?;
        Ok(select_target(&result, target_id))
    }

    pub async fn report(&self, topic_tag: &str) -> Result<CredibilityReport, CredibilityError> {
        Ok(CredibilityReport::from_result(self.evaluate(topic_tag).await?))
    }
}
