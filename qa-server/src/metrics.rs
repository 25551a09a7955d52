//! Prometheus metrics, matching the teacher's `init_metrics`/`record_*`
//! exported-function idiom rather than a struct of counters passed around.

use std::time::Duration;

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install the Prometheus recorder")
}

pub fn record_query_total(query_type: &str, success: bool) {
    metrics::counter!("qa_queries_total", "query_type" => query_type.to_string(), "success" => success.to_string())
        .increment(1);
}

pub fn record_query_latency(duration: Duration) {
    metrics::histogram!("qa_query_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_fallback(level: &str) {
    metrics::counter!("qa_fallback_total", "level" => level.to_string()).increment(1);
}

pub fn record_cache_hit(hit: bool) {
    metrics::counter!("qa_cache_lookups_total", "hit" => hit.to_string()).increment(1);
}

pub async fn metrics_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
) -> impl IntoResponse {
    state.metrics_handle.render()
}
