//! HTTP endpoints: `POST /query`, `GET /health`, `GET /metrics` (spec.md §6
//! inbound/outbound contract).

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use qa_core::{Query, Response};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::{metrics_handler, record_cache_hit, record_fallback, record_query_latency, record_query_total};
use crate::state::AppState;

pub fn create_router(state: AppState, cors_origins: &[String], cors_enabled: bool) -> Router {
    let cors_layer = build_cors_layer(cors_origins, cors_enabled);

    Router::new()
        .route("/query", post(query))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins (development only)");
        return CorsLayer::permissive();
    }
    if origins.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to permissive GET/POST");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST]);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin, "invalid CORS origin, dropping");
                None
            })
        })
        .collect();
    if parsed.is_empty() {
        tracing::error!("all configured CORS origins were invalid, falling back to permissive");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST]);
    }
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
}

/// `{ query, session_id?, top_k?, language_hint? }` of spec.md §6.
#[derive(Debug, serde::Deserialize)]
struct QueryRequest {
    query: String,
    session_id: Option<String>,
    top_k: Option<usize>,
    language_hint: Option<String>,
}

async fn query(State(state): State<AppState>, Json(request): Json<QueryRequest>) -> Json<Response> {
    let mut q = Query::new(request.query);
    if let Some(session_id) = request.session_id {
        q = q.with_session_id(session_id);
    }
    if let Some(top_k) = request.top_k {
        q = q.with_top_k(top_k);
    }
    if let Some(hint) = request.language_hint {
        q = q.with_language_hint(hint);
    }

    let started = Instant::now();
    let response = state.orchestrator.run(q).await;
    record_request_metrics(&response, started.elapsed());

    Json(response)
}

fn record_request_metrics(response: &Response, elapsed: Duration) {
    record_query_total(
        response.error.as_ref().map(|e| e.kind.to_string()).as_deref().unwrap_or("ok"),
        response.success,
    );
    record_query_latency(elapsed);
    record_cache_hit(response.from_cache);
    if let Some(level) = response.fallback_used {
        record_fallback(level.as_str());
    }
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
    use once_cell::sync::OnceCell;
    use qa_cache::{InMemoryFailureLog, InMemoryResponseCache};
    use qa_config::LlmConfig;
    use qa_llm::LlmClient;
    use qa_retrieval::vector_index::InMemoryVectorIndex;
    use qa_retrieval::HashEmbedder;
    use qa_translation::{FallbackChainProvider, PassthroughProvider};
    use std::sync::Arc;
    use tower::ServiceExt;

    // The Prometheus recorder can only be installed globally once per
    // process; tests share a single installation instead of each trying
    // (and failing) to install their own.
    static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

    fn test_metrics_handle() -> PrometheusHandle {
        METRICS_HANDLE
            .get_or_init(|| PrometheusBuilder::new().install_recorder().expect("install recorder"))
            .clone()
    }

    fn unreachable_llm() -> Arc<LlmClient> {
        let mut config = LlmConfig::default();
        config.endpoint = "http://127.0.0.1:1".to_string();
        config.max_retries = 0;
        config.timeout_secs = 1;
        Arc::new(LlmClient::new(config).unwrap())
    }

    async fn test_state() -> AppState {
        let orchestrator = qa_orchestrator::Orchestrator::new(
            qa_config::ReasoningConfig::default(),
            qa_config::RetrievalConfig::default(),
            qa_config::OrchestratorConfig::default(),
            qa_config::ArtifactConfig::default(),
            qa_config::CacheConfig::default(),
            unreachable_llm(),
            Arc::new(InMemoryFailureLog::new()),
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(HashEmbedder::new(32)),
            Arc::new(FallbackChainProvider::new(vec![Box::new(PassthroughProvider)])),
            Arc::new(InMemoryResponseCache::new()),
        );
        AppState::new(Arc::new(orchestrator), test_metrics_handle())
    }

    #[tokio::test]
    async fn health_endpoint_reports_healthy() {
        let state = test_state().await;
        let app = create_router(state, &[], true);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn query_endpoint_returns_a_no_documents_failure_on_an_empty_index() {
        let state = test_state().await;
        let app = create_router(state, &[], true);
        let body = serde_json::to_vec(&serde_json::json!({ "query": "what is the refund policy" })).unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: Response = serde_json::from_slice(&bytes).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.unwrap().kind, qa_core::ErrorKind::NoDocuments);
    }
}
