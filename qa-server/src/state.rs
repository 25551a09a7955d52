//! Application state shared across every handler: the orchestrator plus
//! whatever the health/metrics endpoints need to report on.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use qa_cache::{JsonLinesFailureLog, SqliteResponseCache};
use qa_config::Settings;
use qa_llm::LlmClient;
use qa_orchestrator::Orchestrator;
use qa_retrieval::vector_index::InMemoryVectorIndex;
use qa_retrieval::{CandleEmbedder, CandleEmbeddingConfig, Embedder, QdrantVectorIndex, QdrantVectorIndexConfig};
use qa_translation::{FallbackChainProvider, PassthroughProvider};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, metrics_handle: PrometheusHandle) -> Self {
        Self {
            orchestrator,
            metrics_handle,
        }
    }

    /// Wires every collaborator named in spec.md §6 from `settings`,
    /// falling back to in-memory/passthrough implementations where no
    /// external dependency (Qdrant, a translation API key) is configured —
    /// this is what lets `qa-server` stand up for local development without
    /// any of those services running.
    pub async fn build(settings: Settings, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        let llm = Arc::new(LlmClient::new(settings.llm.clone())?);

        let failure_log = Arc::new(JsonLinesFailureLog::new(settings.cache.failure_log_path.clone()));

        let cache = Arc::new(SqliteResponseCache::open(&settings.cache.sqlite_path)?);

        let vector_index: Arc<dyn qa_core::VectorIndex> = if settings.vector_index.in_memory {
            Arc::new(InMemoryVectorIndex::new())
        } else {
            let qdrant_config = QdrantVectorIndexConfig {
                endpoint: settings.vector_index.endpoint.clone(),
                collection: settings.vector_index.collection.clone(),
                vector_dim: settings.vector_index.vector_dim,
                api_key: settings.vector_index.api_key.clone(),
            };
            let index = QdrantVectorIndex::connect(qdrant_config).await?;
            index.ensure_collection().await?;
            Arc::new(index)
        };

        let embedder: Arc<dyn Embedder> = {
            let embedding_config = CandleEmbeddingConfig {
                model_repo: settings.embedding.model_repo.clone(),
                revision: settings.embedding.revision.clone(),
                cache_dir: settings.embedding.cache_dir.clone().map(Into::into),
                max_sequence_length: settings.embedding.max_sequence_length,
            };
            Arc::new(CandleEmbedder::load(&embedding_config)?)
        };

        // spec.md §6: "the core accepts any provider satisfying this
        // contract; none is bundled" — the passthrough terminal link is
        // the only one shipped, so a single-link chain is the honest
        // default until a real translation API is configured.
        let translation: Arc<dyn qa_core::TranslationProvider> =
            Arc::new(FallbackChainProvider::new(vec![Box::new(PassthroughProvider)]));

        let orchestrator = Orchestrator::new(
            settings.reasoning.clone(),
            settings.retrieval.clone(),
            settings.orchestrator.clone(),
            settings.artifact.clone(),
            settings.cache.clone(),
            llm,
            failure_log,
            vector_index,
            embedder,
            translation,
            cache,
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            metrics_handle,
        })
    }
}
