//! The pipeline state machine (spec.md §4.1): cache lookup, translation,
//! the four cognitive agents in strict order, the refinement loop, the
//! artifact decision, and Response assembly.
//!
//! No runtime plug-in registry and no hidden state machine library — this
//! is a straight-line `async fn run` over the states named in `state`,
//! matching the teacher's "no runtime plug-in registry... straight-line
//! orchestrator" design note.

pub mod artifact;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use qa_agents::{QueryUnderstandingAgent, ReasoningAgent, VerificationAgent};
use qa_cache::{cache_key, knowledge_base_fingerprint, normalize};
use qa_config::{ArtifactConfig, CacheConfig, OrchestratorConfig, ReasoningConfig, RetrievalConfig};
use qa_core::context::QueryType;
use qa_core::traits::{Agent, FailureLog, ResponseCache, TranslationProvider, VectorIndex};
use qa_core::{Error, ErrorKind, ExecutionContext, Query, Response};
use qa_llm::LlmClient;
use qa_retrieval::{Embedder, HybridRetrievalAgent};
use tokio_util::sync::CancellationToken;

pub use state::PipelineState;

const CASUAL_REDIRECT: &str = "Hi! I'm a document question-answering assistant — ask me something about the documents you've uploaded and I'll look for an answer with citations.";

pub struct Orchestrator {
    understanding: QueryUnderstandingAgent,
    retrieval: HybridRetrievalAgent,
    verification: VerificationAgent,
    llm: Arc<LlmClient>,
    failure_log: Arc<dyn FailureLog>,
    reasoning_config: ReasoningConfig,
    retrieval_config: RetrievalConfig,
    translation: Arc<dyn TranslationProvider>,
    cache: Arc<dyn ResponseCache>,
    vector_index: Arc<dyn VectorIndex>,
    orchestrator_config: OrchestratorConfig,
    artifact_config: ArtifactConfig,
    cache_config: CacheConfig,
}

impl Orchestrator {
    pub fn new(
        reasoning_config: ReasoningConfig,
        retrieval_config: RetrievalConfig,
        orchestrator_config: OrchestratorConfig,
        artifact_config: ArtifactConfig,
        cache_config: CacheConfig,
        llm: Arc<LlmClient>,
        failure_log: Arc<dyn FailureLog>,
        vector_index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        translation: Arc<dyn TranslationProvider>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        let retrieval = HybridRetrievalAgent::new(retrieval_config.clone(), embedder, vector_index.clone());
        let verification = VerificationAgent::new(llm.clone());
        Self {
            understanding: QueryUnderstandingAgent::new(),
            retrieval,
            verification,
            llm,
            failure_log,
            reasoning_config,
            retrieval_config,
            translation,
            cache,
            vector_index,
            orchestrator_config,
            artifact_config,
            cache_config,
        }
    }

    /// Runs one query to completion. Never cancelled externally; a fresh
    /// `CancellationToken` is used purely to drive the soft-deadline race.
    pub async fn run(&self, query: Query) -> Response {
        self.run_cancellable(query, CancellationToken::new())
            .await
            .expect("a freshly-constructed cancellation token is never already cancelled")
    }

    /// Runs one query, cooperatively cancellable at whichever suspension
    /// point it currently sits on. Returns `None` if `cancel` fires first —
    /// the caller must not persist anything for a cancelled query (spec.md
    /// §5): dropping the in-flight future here means no cache write, no
    /// failure-log append, and no vector-index access happens after the
    /// point the future was abandoned.
    pub async fn run_cancellable(&self, query: Query, cancel: CancellationToken) -> Option<Response> {
        let deadline = Duration::from_secs(self.orchestrator_config.soft_deadline_secs);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            outcome = tokio::time::timeout(deadline, self.run_inner(query)) => {
                Some(outcome.unwrap_or_else(|_| {
                    tracing::warn!("query exceeded the soft deadline, short-circuiting");
                    Response::failure(
                        ErrorKind::Internal,
                        "The request took longer than the processing deadline allows. Please try again or narrow the question.",
                        "en",
                    )
                }))
            }
        }
    }

    async fn run_inner(&self, query: Query) -> Response {
        if query.is_empty() {
            return Response::failure(ErrorKind::EmptyQuery, "Please enter a question.", "en");
        }

        let fingerprint = match self.compute_fingerprint().await {
            Ok(fp) => fp,
            Err(e) => return Response::failure(e.kind, e.message, "en"),
        };
        let key = cache_key(&query.text, &fingerprint);

        match self.cache.get(&key).await {
            Ok(Some(mut cached)) => {
                cached.from_cache = true;
                return cached;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "cache read failed, proceeding without it"),
        }

        let indexed_count = match self.vector_index.count().await {
            Ok(n) => n,
            Err(e) => {
                return Response::failure(ErrorKind::Internal, format!("vector index unavailable: {e}"), "en");
            }
        };
        if indexed_count == 0 {
            return Response::failure(ErrorKind::NoDocuments, "No documents are indexed yet. Upload some documents before asking a question.", "en");
        }

        let mut context = ExecutionContext::new(&query);
        self.translate_if_needed(&mut context, &query).await;

        context = match self.understanding.execute(context).await {
            Ok(c) => c,
            Err(e) => return Response::failure(e.kind, e.message, context_language(&context)),
        };

        if matches!(context.query_type, Some(QueryType::Casual)) {
            let response = self.casual_response(&context);
            self.maybe_cache(&key, &response).await;
            return response;
        }

        context.top_k = Some(
            query
                .top_k_override
                .unwrap_or_else(|| self.retrieval_config.top_k_for(context.user_query.split_whitespace().count())),
        );

        context = match self.retrieval.execute(context).await {
            Ok(c) => c,
            Err(e) => return Response::failure(e.kind, e.message, context_language(&context)),
        };

        let evidence_len = context.retrieved.as_ref().map(|e| e.len()).unwrap_or(0);
        if evidence_len == 0 {
            return Response::failure(
                ErrorKind::NoEvidence,
                "No relevant evidence was found in the documents for this question. Try rephrasing or asking about a different topic.",
                context_language(&context),
            );
        }

        context = self.run_reasoning(context, &self.reasoning_config).await;
        context = match self.verification.execute(context).await {
            Ok(c) => c,
            Err(e) => return Response::failure(e.kind, e.message, context_language(&context)),
        };

        let mut refinements = 0;
        while context.confidence.unwrap_or(0.0) < self.orchestrator_config.confidence_threshold
            && refinements < self.orchestrator_config.max_refinement_attempts
            && evidence_len > context.evidence_used
        {
            refinements += 1;
            let mut widened = self.reasoning_config.clone();
            widened.context_window_tokens = widened.context_window_tokens + widened.context_window_tokens / 2;
            context = self.run_reasoning(context, &widened).await;
            context = match self.verification.execute(context).await {
                Ok(c) => c,
                Err(e) => return Response::failure(e.kind, e.message, context_language(&context)),
            };
        }

        let response = self.finalize(&context);
        self.maybe_cache(&key, &response).await;
        response
    }

    async fn run_reasoning(&self, context: ExecutionContext, config: &ReasoningConfig) -> ExecutionContext {
        let reasoning = ReasoningAgent::new(config.clone(), self.llm.clone(), self.failure_log.clone());
        match reasoning.execute(context).await {
            Ok(c) => c,
            // ReasoningAgent's own fallback ladder never returns Err in
            // practice (level 3 always produces an answer); this arm only
            // exists because the shared Agent trait is fallible.
            Err(_) => unreachable!("reasoning agent always resolves through its fallback ladder"),
        }
    }

    async fn translate_if_needed(&self, context: &mut ExecutionContext, query: &Query) {
        if !qa_translation::needs_translation(&query.text) {
            context.language = Some(query.language_hint.clone().unwrap_or_else(|| "en".to_string()));
            return;
        }
        match self.translation.translate(&query.text, query.language_hint.as_deref(), "en").await {
            Ok((translated, detected_src)) => {
                context.user_query = translated;
                context.language = Some(detected_src);
            }
            Err(e) => {
                tracing::warn!(error = %e, "translation failed even after the fallback chain, using the query verbatim");
                context.language = Some(query.language_hint.clone().unwrap_or_else(|| "und".to_string()));
            }
        }
    }

    async fn compute_fingerprint(&self) -> Result<String, Error> {
        let documents = self.vector_index.documents().await?;
        let distinct_files: std::collections::HashSet<&str> =
            documents.iter().map(|d| d.metadata.filename.as_str()).collect();
        Ok(knowledge_base_fingerprint(distinct_files.len() as u64, documents.len() as u64, 0))
    }

    fn casual_response(&self, context: &ExecutionContext) -> Response {
        Response {
            success: true,
            answer: CASUAL_REDIRECT.to_string(),
            confidence: 1.0,
            verified: true,
            sources: Vec::new(),
            images: Vec::new(),
            artifact: None,
            language: context_language(context),
            fallback_used: None,
            from_cache: false,
            error: None,
        }
    }

    fn finalize(&self, context: &ExecutionContext) -> Response {
        let answer = context.answer.clone().unwrap_or_default();
        let confidence = context.confidence.unwrap_or(0.0);
        let verified = context.verified.unwrap_or(false);
        let artifact = artifact::decide(context, &self.artifact_config);

        Response {
            success: answer.chars().count() >= 20,
            answer,
            confidence,
            verified,
            sources: context.sources.clone(),
            images: context.images.clone(),
            artifact,
            language: context_language(context),
            fallback_used: context.fallback_used,
            from_cache: false,
            error: None,
        }
    }

    async fn maybe_cache(&self, key: &str, response: &Response) {
        if response.success && response.confidence >= self.orchestrator_config.confidence_threshold {
            if let Err(e) = self.cache.put(key, response, self.cache_config.default_ttl_seconds).await {
                tracing::warn!(error = %e, "cache write failed (non-fatal, spec.md cache_io)");
            }
        }
    }
}

fn context_language(context: &ExecutionContext) -> String {
    context.language.clone().unwrap_or_else(|| "en".to_string())
}

/// Normalizes a query string the same way the cache key does, exposed for
/// callers (e.g. `qa-server`) that want to log or display the normalized
/// form without recomputing the key.
pub fn normalized_query(query: &str) -> String {
    normalize(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_cache::{InMemoryFailureLog, InMemoryResponseCache};
    use qa_config::LlmConfig;
    use qa_core::search::{ChunkMetadata, ChunkType};
    use qa_retrieval::vector_index::InMemoryVectorIndex;
    use qa_retrieval::HashEmbedder;
    use qa_translation::{FallbackChainProvider, PassthroughProvider};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn meta(filename: &str, page: u32, chunk_type: ChunkType) -> ChunkMetadata {
        ChunkMetadata {
            filename: filename.to_string(),
            page,
            chunk_index: 0,
            chunk_type,
            section: Some("definitions".to_string()),
            image_path: None,
            has_image: false,
        }
    }

    fn unreachable_llm() -> Arc<LlmClient> {
        let mut config = LlmConfig::default();
        config.endpoint = "http://127.0.0.1:1".to_string();
        config.max_retries = 0;
        config.timeout_secs = 1;
        Arc::new(LlmClient::new(config).unwrap())
    }

    fn translation() -> Arc<dyn TranslationProvider> {
        Arc::new(FallbackChainProvider::new(vec![Box::new(PassthroughProvider)]))
    }

    async fn build_orchestrator(
        llm: Arc<LlmClient>,
        index: Arc<dyn VectorIndex>,
    ) -> Orchestrator {
        Orchestrator::new(
            ReasoningConfig::default(),
            RetrievalConfig::default(),
            OrchestratorConfig::default(),
            ArtifactConfig::default(),
            CacheConfig::default(),
            llm,
            Arc::new(InMemoryFailureLog::new()),
            index,
            Arc::new(HashEmbedder::new(32)),
            translation(),
            Arc::new(InMemoryResponseCache::new()),
        )
    }

    #[tokio::test]
    async fn casual_greeting_never_touches_retrieval_or_the_model() {
        let index = InMemoryVectorIndex::new();
        let embedder = HashEmbedder::new(32);
        let embedding = embedder.embed("design justification file purpose").await.unwrap();
        index.insert("1", "design justification file purpose", embedding, meta("dj.pdf", 0, ChunkType::Text));
        let orchestrator = build_orchestrator(unreachable_llm(), Arc::new(index)).await;

        let response = orchestrator.run(Query::new("Hi there")).await;
        assert!(response.success);
        assert!(response.answer.contains("document question-answering"));
        assert!(response.sources.is_empty());
        assert!(response.images.is_empty());
        assert_eq!(response.fallback_used, None);
    }

    #[tokio::test]
    async fn empty_index_fails_fast_with_no_documents() {
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
        let orchestrator = build_orchestrator(unreachable_llm(), index).await;

        let response = orchestrator.run(Query::new("what is the annual revenue")).await;
        assert!(!response.success);
        assert_eq!(response.error.unwrap().kind, ErrorKind::NoDocuments);
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn model_down_degrades_to_direct_extraction() {
        let index = InMemoryVectorIndex::new();
        let embedder = HashEmbedder::new(32);
        let text = "The annual revenue figure grew substantially this fiscal year according to the filing.";
        let embedding = embedder.embed(text).await.unwrap();
        index.insert("1", text, embedding, meta("report.pdf", 4, ChunkType::Text));
        let orchestrator = build_orchestrator(unreachable_llm(), Arc::new(index)).await;

        let response = orchestrator.run(Query::new("what is the annual revenue figure")).await;
        assert!(response.success);
        assert!(!response.verified);
        assert!(response.confidence <= 0.7);
        assert!(matches!(
            response.fallback_used,
            Some(qa_core::FallbackLevel::DirectExtraction) | Some(qa_core::FallbackLevel::Graceful)
        ));
    }

    #[tokio::test]
    async fn single_source_factual_query_is_verified_via_a_live_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": "The Design Justification File records the rationale behind every design decision made for the subsystem, per Page 43 of dj.pdf."
            })))
            .mount(&server)
            .await;

        let mut llm_config = LlmConfig::default();
        llm_config.endpoint = server.uri();
        let llm = Arc::new(LlmClient::new(llm_config).unwrap());

        let index = InMemoryVectorIndex::new();
        let embedder = HashEmbedder::new(32);
        let text = "The Design Justification File records the rationale behind every design decision made for the subsystem.";
        let embedding = embedder.embed(text).await.unwrap();
        index.insert("1", text, embedding, meta("dj.pdf", 42, ChunkType::Text));
        let orchestrator = build_orchestrator(llm, Arc::new(index)).await;

        let response = orchestrator
            .run(Query::new("What is the purpose of the Design Justification File?"))
            .await;

        assert!(response.success);
        assert_eq!(response.fallback_used, None);
        assert!(response.sources.iter().any(|c| c.filename == "dj.pdf" && c.page == 43));
    }

    #[tokio::test]
    async fn weak_initial_answer_falls_back_to_simplified_reasoning() {
        let server = MockServer::start().await;
        // Level 0's full prompt is rejected (short/invalid output); level 1's
        // minimal prompt succeeds — both hit the same endpoint, so the mock
        // is keyed only on the method/path, same as the real server would see.
        let call_count = std::sync::atomic::AtomicUsize::new(0);
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(move |_: &wiremock::Request| {
                let n = call_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                if n == 1 {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"content": "no"}))
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "content": "The subsystem's justification file exists to document every rationale behind its design choices for later audit."
                    }))
                }
            })
            .mount(&server)
            .await;

        let mut llm_config = LlmConfig::default();
        llm_config.endpoint = server.uri();
        let llm = Arc::new(LlmClient::new(llm_config).unwrap());

        let index = InMemoryVectorIndex::new();
        let embedder = HashEmbedder::new(32);
        let text = "The subsystem's justification file exists to document every rationale behind its design choices.";
        let embedding = embedder.embed(text).await.unwrap();
        index.insert("1", text, embedding, meta("dj.pdf", 1, ChunkType::Text));
        let orchestrator = build_orchestrator(llm, Arc::new(index)).await;

        let response = orchestrator.run(Query::new("why does the justification file exist")).await;
        assert!(response.success);
        assert_eq!(response.fallback_used, Some(qa_core::FallbackLevel::SimplifiedReasoning));
    }

    #[tokio::test]
    async fn report_intent_query_attaches_an_artifact() {
        let index = InMemoryVectorIndex::new();
        let embedder = HashEmbedder::new(32);
        let text = "AOCS documentation requires a design justification file, a verification matrix, and a test report for every subsystem.";
        let embedding = embedder.embed(text).await.unwrap();
        index.insert("1", text, embedding, meta("aocs.pdf", 2, ChunkType::Table));
        let orchestrator = build_orchestrator(unreachable_llm(), Arc::new(index)).await;

        let response = orchestrator
            .run(Query::new("Create a comprehensive report about AOCS documentation requirements"))
            .await;

        assert!(response.success);
        let artifact = response.artifact.expect("artifact should be attached for report-intent query");
        assert!(artifact.content.contains("<h1>") || artifact.content.contains(&response.answer[..20.min(response.answer.len())]));
    }

    #[tokio::test]
    async fn cache_hit_returns_identical_response_with_from_cache_set() {
        let server = MockServer::start().await;
        // The Reasoning Agent's full-prompt call and the Verification Agent's
        // judgement call hit the same endpoint; tell them apart by the
        // `max_tokens` the two agents are known to pass (512 vs 16) so the
        // judgement call gets a clean numeric score and confidence clears the
        // caching threshold deterministically.
        Mock::given(method("POST"))
            .and(path("/completion"))
            .respond_with(|req: &wiremock::Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
                if body.get("max_tokens").and_then(|v| v.as_u64()) == Some(16) {
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({"content": "I would score this answer as 0.97 overall."}))
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "content": "The loan processing fee is two percent of the sanctioned amount per the tariff sheet."
                    }))
                }
            })
            .mount(&server)
            .await;
        let mut llm_config = LlmConfig::default();
        llm_config.endpoint = server.uri();
        let llm = Arc::new(LlmClient::new(llm_config).unwrap());

        let index = InMemoryVectorIndex::new();
        let embedder = HashEmbedder::new(32);
        let text = "The loan processing fee is two percent of the sanctioned amount per the tariff sheet.";
        let embedding = embedder.embed(text).await.unwrap();
        index.insert("1", text, embedding, meta("tariff.pdf", 0, ChunkType::Table));
        let orchestrator = build_orchestrator(llm, Arc::new(index)).await;

        let query = Query::new("what is the loan processing fee");
        let first = orchestrator.run(query.clone()).await;
        assert!(!first.from_cache);

        let second = orchestrator.run(Query::new("what is the loan processing fee")).await;
        assert!(second.from_cache);
        assert_eq!(first.answer, second.answer);
    }
}
