// src/ingest/providers/twitter.rs
//! Twitter API v2 provider: recent quote/retweet search and user public metrics.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::TwitterSection;
use crate::error::CredibilityError;
use crate::ingest::normalize_text;
use crate::ingest::types::{
    AudienceMetrics, AudienceSource, DiscussionRecord, DiscussionSource, ReferenceKind,
    ReferencedItem,
};

const SEARCH_ROUTE: &str = "/2/tweets/search/recent";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RawTweet>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    id: String,
    #[serde(default)]
    author_id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    referenced_tweets: Vec<RawReference>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    #[serde(rename = "type")]
    kind: ReferenceKind,
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    tweets: Vec<IncludedTweet>,
}

#[derive(Debug, Deserialize)]
struct IncludedTweet {
    id: String,
    author_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<RawUser>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    public_metrics: PublicMetrics,
}

#[derive(Debug, Deserialize)]
struct PublicMetrics {
    followers_count: u64,
    tweet_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    title: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    fn describe(errors: &[ApiError]) -> String {
        errors
            .iter()
            .map(|e| {
                e.detail
                    .as_deref()
                    .or(e.title.as_deref())
                    .unwrap_or("unknown error")
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub struct TwitterProvider {
    mode: Mode,
}

enum Mode {
    Fixture {
        search: String,
        users: HashMap<String, String>,
    },
    Http {
        client: reqwest::Client,
        api_host: String,
        bearer_token: String,
        max_results: u32,
    },
}

impl TwitterProvider {
    /// Serve a canned search payload; user payloads are registered with `with_user_fixture`.
    pub fn from_fixture(search_json: &str) -> Self {
        Self {
            mode: Mode::Fixture {
                search: search_json.to_string(),
                users: HashMap::new(),
            },
        }
    }

    pub fn with_user_fixture(mut self, account_id: &str, user_json: &str) -> Self {
        if let Mode::Fixture { users, .. } = &mut self.mode {
            users.insert(account_id.to_string(), user_json.to_string());
        }
        self
    }

    pub fn from_config(cfg: &TwitterSection) -> Result<Self> {
        let Some(token) = cfg.bearer_token.clone() else {
            bail!("TWITTER_API_TOKEN is not set");
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building twitter http client")?;
        Ok(Self {
            mode: Mode::Http {
                client,
                api_host: cfg.api_host.clone(),
                bearer_token: token,
                max_results: cfg.max_results,
            },
        })
    }

    /// Parse a recent-search payload into discussion records.
    ///
    /// The referenced post's author comes from `includes.tweets`; a record whose
    /// reference cannot be resolved there fails the whole batch.
    pub fn parse_collection(body: &str) -> Result<Vec<DiscussionRecord>> {
        let t0 = std::time::Instant::now();
        let resp: SearchResponse =
            serde_json::from_str(body).context("parsing twitter search json")?;

        if resp.data.is_empty() && !resp.errors.is_empty() {
            bail!("twitter search error: {}", ApiError::describe(&resp.errors));
        }

        let authors: HashMap<&str, &str> = resp
            .includes
            .tweets
            .iter()
            .filter_map(|t| t.author_id.as_deref().map(|a| (t.id.as_str(), a)))
            .collect();

        let mut out = Vec::with_capacity(resp.data.len());
        for tweet in resp.data {
            let mut references = Vec::with_capacity(1);
            if let Some(first) = tweet.referenced_tweets.into_iter().next() {
                let Some(author) = authors.get(first.id.as_str()) else {
                    return Err(CredibilityError::MalformedRecord {
                        record_id: tweet.id,
                        reason: format!("referenced post `{}` missing from includes", first.id),
                    }
                    .into());
                };
                references.push(ReferencedItem {
                    kind: first.kind,
                    target_id: first.id,
                    target_author_id: author.to_string(),
                });
            }
            let record = DiscussionRecord::from_references(
                tweet.id,
                tweet.author_id,
                normalize_text(&tweet.text),
                references,
            )?;
            out.push(record);
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("discussion_parse_ms").record(ms);
        counter!("discussion_records_total").increment(out.len() as u64);
        Ok(out)
    }

    /// Parse a user lookup payload with `public_metrics`.
    pub fn parse_user(body: &str) -> Result<AudienceMetrics> {
        let resp: UserResponse = serde_json::from_str(body).context("parsing twitter user json")?;
        let user = resp.data.ok_or_else(|| {
            anyhow!(
                "twitter user lookup returned no data: {}",
                ApiError::describe(&resp.errors)
            )
        })?;
        Ok(AudienceMetrics {
            account_id: user.id,
            follower_count: user.public_metrics.followers_count,
            post_count: user.public_metrics.tweet_count,
        })
    }

    async fn get(
        client: &reqwest::Client,
        url: &str,
        bearer_token: &str,
        params: &[(&str, String)],
    ) -> Result<String> {
        let resp = match client
            .get(url)
            .bearer_auth(bearer_token)
            .query(params)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = ?e, provider = "twitter", url, "provider http error");
                return Err(e).context("twitter http get()");
            }
        };
        let resp = resp
            .error_for_status()
            .with_context(|| format!("twitter http status for {url}"))?;
        resp.text().await.context("twitter http .text()")
    }
}

#[async_trait]
impl DiscussionSource for TwitterProvider {
    async fn fetch_collection(&self, topic_tag: &str) -> Result<Vec<DiscussionRecord>> {
        match &self.mode {
            Mode::Fixture { search, .. } => Self::parse_collection(search),
            Mode::Http {
                client,
                api_host,
                bearer_token,
                max_results,
            } => {
                let url = format!("{api_host}{SEARCH_ROUTE}");
                let params = [
                    ("query", format!("{topic_tag} is:quote is:retweet")),
                    ("expansions", "referenced_tweets.id.author_id".to_string()),
                    ("max_results", max_results.to_string()),
                    ("tweet.fields", "referenced_tweets,author_id".to_string()),
                ];
                let body = Self::get(client, &url, bearer_token, &params).await?;
                Self::parse_collection(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}

#[async_trait]
impl AudienceSource for TwitterProvider {
    async fn fetch_audience(&self, account_id: &str) -> Result<AudienceMetrics> {
        match &self.mode {
            Mode::Fixture { users, .. } => {
                let body = users
                    .get(account_id)
                    .ok_or_else(|| anyhow!("no user fixture for `{account_id}`"))?;
                Self::parse_user(body)
            }
            Mode::Http {
                client,
                api_host,
                bearer_token,
                ..
            } => {
                let url = format!("{api_host}/2/users/{account_id}");
                let params = [("user.fields", "public_metrics".to_string())];
                let body = Self::get(client, &url, bearer_token, &params).await?;
                Self::parse_user(&body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_payload_is_empty_collection() {
        let out = TwitterProvider::parse_collection(r#"{"meta":{"result_count":0}}"#).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn search_error_payload_is_an_error() {
        let body = r#"{"errors":[{"title":"Invalid Request","detail":"bad query"}]}"#;
        let err = TwitterProvider::parse_collection(body).unwrap_err();
        assert!(format!("{err:#}").contains("bad query"));
    }

    #[test]
    fn user_without_data_is_an_error() {
        let body = r#"{"errors":[{"title":"Not Found Error","detail":"Could not find user"}]}"#;
        assert!(TwitterProvider::parse_user(body).is_err());
    }

    #[test]
    fn missing_token_is_rejected() {
        let cfg = TwitterSection::default();
        assert!(TwitterProvider::from_config(&cfg).is_err());
    }
}
