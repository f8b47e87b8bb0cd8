// tests/providers_twitter_http.rs
//
// TwitterProvider in HTTP mode against a local axum stand-in for the v2 API.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};

use retweet_credibility::analyze::score_for_target;
use retweet_credibility::config::TwitterSection;
use retweet_credibility::ingest::providers::twitter::TwitterProvider;
use retweet_credibility::ingest::types::{AudienceSource, DiscussionSource};
use retweet_credibility::{CredibilityError, EvaluateOptions, TargetOutcome};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|_| panic!("missing tests/fixtures/{name}"))
}

#[derive(Debug, Clone)]
struct Seen {
    path: String,
    query: HashMap<String, String>,
    authorization: Option<String>,
}

#[derive(Clone)]
struct Stub {
    seen: Arc<Mutex<Vec<Seen>>>,
    failing: Arc<HashSet<String>>,
}

impl Stub {
    fn record(&self, path: String, query: HashMap<String, String>, headers: &HeaderMap) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.seen.lock().expect("seen lock").push(Seen {
            path,
            query,
            authorization,
        });
    }
}

async fn search(
    State(stub): State<Stub>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    stub.record("/2/tweets/search/recent".into(), query, &headers);
    (StatusCode::OK, fixture("search_recent.json"))
}

async fn user(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    stub.record(format!("/2/users/{id}"), query, &headers);
    if stub.failing.contains(&id) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"title":"Too Many Requests"}"#.to_string(),
        );
    }
    (StatusCode::OK, fixture(&format!("user_{id}.json")))
}

/// Serve the stand-in API on an ephemeral port; returns its base URL and the request log.
async fn spawn_api(failing: &[&str]) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let stub = Stub {
        seen: Arc::new(Mutex::new(Vec::new())),
        failing: Arc::new(failing.iter().map(|s| s.to_string()).collect()),
    };
    let seen = stub.seen.clone();
    let app = Router::new()
        .route("/2/tweets/search/recent", get(search))
        .route("/2/users/{id}", get(user))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    (format!("http://{addr}"), seen)
}

fn http_provider(api_host: String) -> TwitterProvider {
    let cfg = TwitterSection {
        api_host,
        max_results: 50,
        timeout_secs: 5,
        bearer_token: Some("test-token".into()),
    };
    TwitterProvider::from_config(&cfg).expect("http provider")
}

#[tokio::test]
async fn search_request_carries_query_fields_and_token() {
    let (host, seen) = spawn_api(&[]).await;
    let provider = http_provider(host);

    let records = provider.fetch_collection("#rust").await.expect("search ok");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].target_author_id(), "A");

    let seen = seen.lock().expect("seen lock").clone();
    assert_eq!(seen.len(), 1);
    let req = &seen[0];
    assert_eq!(req.path, "/2/tweets/search/recent");
    assert_eq!(req.authorization.as_deref(), Some("Bearer test-token"));
    assert_eq!(req.query["query"], "#rust is:quote is:retweet");
    assert_eq!(req.query["expansions"], "referenced_tweets.id.author_id");
    assert_eq!(req.query["max_results"], "50");
    assert_eq!(req.query["tweet.fields"], "referenced_tweets,author_id");
}

#[tokio::test]
async fn user_request_asks_for_public_metrics() {
    let (host, seen) = spawn_api(&[]).await;
    let provider = http_provider(host);

    let m = provider.fetch_audience("A").await.expect("user ok");
    assert_eq!(m.account_id, "A");
    assert_eq!(m.follower_count, 1000);
    assert_eq!(m.post_count, 500);

    let seen = seen.lock().expect("seen lock").clone();
    assert_eq!(seen[0].path, "/2/users/A");
    assert_eq!(seen[0].query["user.fields"], "public_metrics");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer test-token"));
}

#[tokio::test]
async fn evaluation_over_http_scores_target() {
    let (host, seen) = spawn_api(&[]).await;
    let provider = http_provider(host);

    let outcome = score_for_target(&provider, &provider, "#rust", "T1", EvaluateOptions::default())
        .await
        .expect("evaluation ok");
    let TargetOutcome::Found(score) = outcome else {
        panic!("T1 should be found");
    };
    assert!(score.target_score > 0.0);

    // One search plus one lookup per distinct target author.
    let seen = seen.lock().expect("seen lock");
    let user_paths: Vec<&str> = seen
        .iter()
        .map(|s| s.path.as_str())
        .filter(|p| p.starts_with("/2/users/"))
        .collect();
    assert_eq!(seen.len(), 3);
    assert_eq!(user_paths.len(), 2);
}

#[tokio::test]
async fn non_success_status_maps_to_fetch_error() {
    let (host, _) = spawn_api(&["B"]).await;
    let provider = http_provider(host);

    let err = provider.fetch_audience("B").await.unwrap_err();
    assert!(format!("{err:#}").contains("429"), "{err:#}");

    let err = score_for_target(&provider, &provider, "#rust", "T1", EvaluateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CredibilityError::Fetch(_)), "{err:?}");
    assert_eq!(err.kind(), "fetch");
}
