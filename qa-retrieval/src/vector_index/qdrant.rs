//! `VectorIndex` backed by a Qdrant collection.

use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;

use async_trait::async_trait;
use qa_core::search::{ChunkMetadata, ChunkType};
use qa_core::traits::{IndexedChunk, VectorHit, VectorIndex};

use crate::error::RetrievalError;

#[derive(Debug, Clone)]
pub struct QdrantVectorIndexConfig {
    pub endpoint: String,
    pub collection: String,
    pub vector_dim: usize,
    pub api_key: Option<String>,
}

impl Default for QdrantVectorIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:6334".to_string(),
            collection: "qa_knowledge_base".to_string(),
            vector_dim: 384,
            api_key: None,
        }
    }
}

pub struct QdrantVectorIndex {
    client: Qdrant,
    config: QdrantVectorIndexConfig,
}

impl QdrantVectorIndex {
    pub async fn connect(config: QdrantVectorIndexConfig) -> Result<Self, RetrievalError> {
        let mut builder = Qdrant::from_url(&config.endpoint);
        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub async fn ensure_collection(&self) -> Result<(), RetrievalError> {
        let exists = self
            .client
            .collection_exists(&self.config.collection)
            .await
            .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;
        if !exists {
            self.client
                .create_collection(CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                    VectorParamsBuilder::new(self.config.vector_dim as u64, Distance::Cosine),
                ))
                .await
                .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn upsert_chunk(
        &self,
        id: impl Into<String>,
        text: &str,
        embedding: Vec<f32>,
        metadata: &ChunkMetadata,
    ) -> Result<(), RetrievalError> {
        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert("text".to_string(), text.to_string().into());
        payload.insert("filename".to_string(), metadata.filename.clone().into());
        payload.insert("page".to_string(), (metadata.page as i64).into());
        payload.insert("chunk_index".to_string(), (metadata.chunk_index as i64).into());
        payload.insert("chunk_type".to_string(), chunk_type_str(metadata.chunk_type).into());
        if let Some(ref section) = metadata.section {
            payload.insert("section".to_string(), section.clone().into());
        }
        if let Some(ref image_path) = metadata.image_path {
            payload.insert("image_path".to_string(), image_path.clone().into());
        }
        payload.insert("has_image".to_string(), metadata.has_image.into());

        let point = PointStruct::new(id.into(), embedding, payload);
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, vec![point]))
            .await
            .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;
        Ok(())
    }
}

fn chunk_type_str(chunk_type: ChunkType) -> String {
    match chunk_type {
        ChunkType::Text => "text",
        ChunkType::Image => "image",
        ChunkType::Table => "table",
    }
    .to_string()
}

fn chunk_type_from_str(s: &str) -> ChunkType {
    match s {
        "image" => ChunkType::Image,
        "table" => ChunkType::Table,
        _ => ChunkType::Text,
    }
}

fn payload_to_metadata(payload: &HashMap<String, qdrant_client::qdrant::Value>) -> (String, ChunkMetadata) {
    let mut text = String::new();
    let mut filename = String::new();
    let mut page = 0u32;
    let mut chunk_index = 0u32;
    let mut chunk_type = ChunkType::Text;
    let mut section = None;
    let mut image_path = None;
    let mut has_image = false;

    for (key, value) in payload {
        match (key.as_str(), &value.kind) {
            ("text", Some(Kind::StringValue(s))) => text = s.clone(),
            ("filename", Some(Kind::StringValue(s))) => filename = s.clone(),
            ("page", Some(Kind::IntegerValue(n))) => page = *n as u32,
            ("chunk_index", Some(Kind::IntegerValue(n))) => chunk_index = *n as u32,
            ("chunk_type", Some(Kind::StringValue(s))) => chunk_type = chunk_type_from_str(s),
            ("section", Some(Kind::StringValue(s))) => section = Some(s.clone()),
            ("image_path", Some(Kind::StringValue(s))) => image_path = Some(s.clone()),
            ("has_image", Some(Kind::BoolValue(b))) => has_image = *b,
            _ => {}
        }
    }

    (
        text,
        ChunkMetadata {
            filename,
            page,
            chunk_index,
            chunk_type,
            section,
            image_path,
            has_image,
        },
    )
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn search(&self, embedding: &[f32], k: usize) -> qa_core::Result<Vec<VectorHit>> {
        let search_builder = SearchPointsBuilder::new(&self.config.collection, embedding.to_vec(), k as u64)
            .with_payload(true);

        let response = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;

        let hits = response
            .result
            .into_iter()
            .map(|point| {
                let (text, metadata) = payload_to_metadata(&point.payload);
                let id = point
                    .id
                    .map(|pid| match pid.point_id_options {
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
                        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
                        None => String::new(),
                    })
                    .unwrap_or_default();
                VectorHit {
                    id,
                    chunk: text,
                    metadata,
                    similarity: point.score,
                }
            })
            .collect();
        Ok(hits)
    }

    async fn documents(&self) -> qa_core::Result<Vec<IndexedChunk>> {
        // Lexical and section sub-searches need the full corpus; Qdrant's
        // scroll API is the analogue of a full-table scan here.
        let mut chunks = Vec::new();
        let mut offset = None;
        loop {
            let mut scroll = qdrant_client::qdrant::ScrollPointsBuilder::new(&self.config.collection)
                .with_payload(true)
                .limit(256);
            if let Some(ref o) = offset {
                scroll = scroll.offset(o.clone());
            }
            let response = self
                .client
                .scroll(scroll)
                .await
                .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;
            if response.result.is_empty() {
                break;
            }
            for point in &response.result {
                let (text, metadata) = payload_to_metadata(&point.payload);
                chunks.push(IndexedChunk { text, metadata });
            }
            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }
        Ok(chunks)
    }

    async fn count(&self) -> qa_core::Result<usize> {
        let info = self
            .client
            .collection_info(&self.config.collection)
            .await
            .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;
        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0) as usize)
    }

    async fn delete_by_file_hash(&self, hash: &str) -> qa_core::Result<bool> {
        let filter = Filter {
            must: vec![Condition::matches("filename", hash.to_string())],
            ..Default::default()
        };
        self.client
            .delete_points(DeletePointsBuilder::new(&self.config.collection).points(filter))
            .await
            .map_err(|e| RetrievalError::VectorIndex(e.to_string()))?;
        Ok(true)
    }
}
