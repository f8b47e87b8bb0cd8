// src/metrics.rs
use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "credibility_evaluations_total",
            "Collection evaluations, labelled by outcome."
        );
        describe_counter!(
            "credibility_not_found_total",
            "Target lookups that matched no record."
        );
        describe_counter!(
            "credibility_fetch_errors_total",
            "Collaborator fetch/parse failures."
        );
        describe_counter!("audience_lookups_total", "Audience metric lookups issued.");
        describe_counter!("discussion_records_total", "Records parsed from search payloads.");
        describe_histogram!(
            "credibility_evaluation_ms",
            "Wall time of one collection evaluation in milliseconds."
        );
        describe_histogram!("discussion_parse_ms", "Search payload parse time in milliseconds.");
    });
}

impl Metrics {
    /// Install the Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
