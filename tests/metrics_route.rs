// tests/metrics_route.rs
//
// The Prometheus recorder is process-global, so this lives in its own test binary.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt as _;

use retweet_credibility::config::TwitterSection;
use retweet_credibility::ingest::memory::MemorySource;
use retweet_credibility::ingest::providers::twitter::TwitterProvider;
use retweet_credibility::metrics::Metrics;
use retweet_credibility::{
    CredibilityEngine, CredibilityError, DiscussionRecord, EvaluateOptions, ReferenceKind,
    ReferencedItem,
};

fn record(id: &str, target: &str, target_author: &str) -> DiscussionRecord {
    DiscussionRecord {
        id: id.into(),
        author_id: format!("u{id}"),
        text: format!("post {id}"),
        referenced_item: ReferencedItem {
            kind: ReferenceKind::Retweeted,
            target_id: target.into(),
            target_author_id: target_author.into(),
        },
    }
}

#[tokio::test]
async fn metrics_route_exposes_evaluation_counters() {
    let metrics = Metrics::init().expect("install recorder");

    let src = MemorySource::new()
        .with_collection("#rust", vec![record("1", "T1", "A"), record("2", "T2", "B")])
        .with_audience("A", 1000, 500)
        .with_audience("B", 2000, 4000);
    let engine = CredibilityEngine::from_provider(Arc::new(src), EvaluateOptions::default());
    engine.evaluate("#rust").await.expect("evaluate ok");
    let outcome = engine.score_for_target("#rust", "T9").await.expect("lookup ok");
    assert!(!outcome.is_found());

    // A refused connection is one failed evaluation and one fetch error.
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = closed.local_addr().expect("addr");
    drop(closed);
    let unreachable = TwitterProvider::from_config(&TwitterSection {
        api_host: format!("http://{addr}"),
        max_results: 10,
        timeout_secs: 2,
        bearer_token: Some("test-token".into()),
    })
    .expect("http provider");
    let engine = CredibilityEngine::from_provider(Arc::new(unreachable), EvaluateOptions::default());
    let err = engine.evaluate("#rust").await.unwrap_err();
    assert!(matches!(err, CredibilityError::Fetch(_)), "{err:?}");

    let req = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .expect("build GET /metrics");
    let resp = metrics.router().oneshot(req).await.expect("oneshot /metrics");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(text.contains("credibility_evaluations_total"), "{text}");
    assert!(text.contains("outcome=\"ok\""), "{text}");
    assert!(text.contains("audience_lookups_total"), "{text}");
    assert!(text.contains("credibility_not_found_total"), "{text}");
    assert!(text.contains("credibility_fetch_errors_total 1\n"), "{text}");
}
