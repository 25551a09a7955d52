//! Text embedding for the dense sub-search.
//!
//! Embedding a string is CPU-bound (tokenization plus a forward pass through
//! a BERT-family encoder), so every implementation runs the actual work
//! inside `spawn_blocking` and keeps the async surface a thin wrapper.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use crate::error::RetrievalError;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
    fn dimension(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct CandleEmbeddingConfig {
    pub model_repo: String,
    pub revision: String,
    pub cache_dir: Option<PathBuf>,
    pub max_sequence_length: usize,
}

impl Default for CandleEmbeddingConfig {
    fn default() -> Self {
        Self {
            model_repo: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            revision: "main".to_string(),
            cache_dir: None,
            max_sequence_length: 256,
        }
    }
}

/// A sentence-embedding model loaded through `hf-hub`, run with `candle`.
///
/// Mean-pools the last hidden state over non-padding tokens and L2-normalizes,
/// the standard sentence-embedding recipe for encoder-only BERT checkpoints.
pub struct CandleEmbedder {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
    dimension: usize,
    max_sequence_length: usize,
}

impl CandleEmbedder {
    pub fn load(config: &CandleEmbeddingConfig) -> Result<Self, RetrievalError> {
        let device = Device::Cpu;
        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_cache_dir(config.cache_dir.clone().unwrap_or_default())
            .build()
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let repo = api.repo(hf_hub::Repo::with_revision(
            config.model_repo.clone(),
            hf_hub::RepoType::Model,
            config.revision.clone(),
        ));

        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let tokenizer =
            Tokenizer::from_file(tokenizer_path).map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let config_path = repo
            .get("config.json")
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let bert_config: BertConfig = serde_json::from_str(
            &std::fs::read_to_string(config_path).map_err(|e| RetrievalError::Embedding(e.to_string()))?,
        )
        .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .map_err(|e| RetrievalError::Embedding(e.to_string()))?
        };
        let model =
            BertModel::load(vb, &bert_config).map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
            dimension: bert_config.hidden_size,
            max_sequence_length: config.max_sequence_length,
        })
    }

    fn embed_blocking(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        encoding.truncate(self.max_sequence_length, 0, tokenizers::TruncationDirection::Right);

        let ids = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let hidden = self
            .model
            .forward(&ids, &type_ids, Some(&attention_mask))
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let mask = attention_mask
            .to_dtype(DType::F32)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?
            .unsqueeze(2)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let masked = hidden
            .broadcast_mul(&mask)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let summed = masked
            .sum(1)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let counts = mask
            .sum(1)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let pooled = summed
            .broadcast_div(&counts)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let mut values = pooled
            .squeeze(0)
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in values.iter_mut() {
                *v /= norm;
            }
        }
        Ok(values)
    }
}

#[async_trait]
impl Embedder for CandleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let text = text.to_string();
        let model = Arc::clone(&self.model);
        let tokenizer = Arc::clone(&self.tokenizer);
        let device = self.device.clone();
        let dimension = self.dimension;
        let max_sequence_length = self.max_sequence_length;
        tokio::task::spawn_blocking(move || {
            let shadow = CandleEmbedder {
                model,
                tokenizer,
                device,
                dimension,
                max_sequence_length,
            };
            shadow.embed_blocking(&text)
        })
        .await
        .map_err(|e| RetrievalError::Embedding(e.to_string()))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic, model-free stand-in for tests: hashes overlapping word
/// trigrams into a fixed-size vector. Never used outside `#[cfg(test)]` and
/// orchestrator integration tests, where a real model would make the tests
/// slow and non-deterministic across HF Hub availability.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text.split_whitespace() {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            std::hash::Hash::hash(&word.to_lowercase(), &mut hasher);
            let bucket = (std::hash::Hasher::finish(&hasher) as usize) % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("revenue grew by ten percent").await.unwrap();
        let b = embedder.embed("revenue grew by ten percent").await.unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4 || norm == 0.0);
    }

    #[tokio::test]
    async fn hash_embedder_distinguishes_different_text() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("quarterly revenue report").await.unwrap();
        let b = embedder.embed("unrelated cooking recipe").await.unwrap();
        assert_ne!(a, b);
    }
}
