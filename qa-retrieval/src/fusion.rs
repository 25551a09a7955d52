//! Score fusion: combines the three sub-searches' per-chunk scores into one
//! fused score, applies the table boost, and deduplicates by chunk identity.

use std::collections::HashMap;

use qa_config::RetrievalWeights;
use qa_core::search::{ChunkType, SearchResult, SearchSource};

/// One chunk's contribution from a single sub-search, keyed for fusion.
struct Contribution {
    result: SearchResult,
    vector_score: Option<f32>,
    keyword_score: Option<f32>,
    section_score: Option<f32>,
}

/// Combines the three sub-search result lists into one fused, deduplicated,
/// descending-ordered evidence list, applying table boost and truncating to
/// `top_k`.
pub fn fuse(
    vector_results: Vec<SearchResult>,
    keyword_results: Vec<SearchResult>,
    section_results: Vec<SearchResult>,
    weights: &RetrievalWeights,
    boost_tables: bool,
    table_boost_factor: f32,
    top_k: usize,
) -> Vec<SearchResult> {
    let mut by_key: HashMap<(String, u32, u32), Contribution> = HashMap::new();

    for r in vector_results {
        let key = r.metadata.key();
        let entry = by_key.entry(key).or_insert_with(|| Contribution {
            result: r.clone(),
            vector_score: None,
            keyword_score: None,
            section_score: None,
        });
        entry.vector_score = Some(r.score);
        entry.result.source |= SearchSource::VECTOR;
    }

    for r in keyword_results {
        let key = r.metadata.key();
        let entry = by_key.entry(key).or_insert_with(|| Contribution {
            result: r.clone(),
            vector_score: None,
            keyword_score: None,
            section_score: None,
        });
        entry.keyword_score = Some(r.score);
        entry.result.source |= SearchSource::KEYWORD;
    }

    for r in section_results {
        let key = r.metadata.key();
        let entry = by_key.entry(key).or_insert_with(|| Contribution {
            result: r.clone(),
            vector_score: None,
            keyword_score: None,
            section_score: None,
        });
        entry.section_score = Some(r.score);
        entry.result.source |= SearchSource::SECTION;
    }

    // Carry each chunk's raw vector score alongside the fused result so the
    // sort below can break ties on it before falling back to chunk id;
    // a chunk the dense sub-search never touched sorts as if it scored
    // below every chunk the dense sub-search did see.
    let mut fused: Vec<(SearchResult, f32)> = by_key
        .into_values()
        .map(|contribution| {
            let mut result = contribution.result;
            let vector_score = contribution.vector_score;
            result.score = fused_score(vector_score, contribution.keyword_score, contribution.section_score, weights);
            if boost_tables && result.metadata.chunk_type == ChunkType::Table {
                result.score = (result.score * table_boost_factor).min(1.0);
            }
            (result, vector_score.unwrap_or(-1.0))
        })
        .collect();

    fused.sort_by(|(a, a_vector), (b, b_vector)| {
        // Ties broken by vector score, then by chunk id.
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b_vector.partial_cmp(a_vector).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| b.metadata.key().cmp(&a.metadata.key()))
    });
    fused.truncate(top_k);
    fused.into_iter().map(|(result, _)| result).collect()
}

fn fused_score(
    vector: Option<f32>,
    keyword: Option<f32>,
    section: Option<f32>,
    weights: &RetrievalWeights,
) -> f32 {
    let mut total_weight = 0.0f32;
    let mut weighted_sum = 0.0f32;

    if let Some(score) = vector {
        weighted_sum += score * weights.vector;
        total_weight += weights.vector;
    }
    if let Some(score) = keyword {
        weighted_sum += score * weights.keyword;
        total_weight += weights.keyword;
    }
    if let Some(score) = section {
        weighted_sum += score * weights.section;
        total_weight += weights.section;
    }

    if total_weight <= 0.0 {
        0.0
    } else {
        (weighted_sum / total_weight).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::search::ChunkMetadata;

    fn meta(filename: &str, chunk_type: ChunkType) -> ChunkMetadata {
        ChunkMetadata {
            filename: filename.to_string(),
            page: 0,
            chunk_index: 0,
            chunk_type,
            section: None,
            image_path: None,
            has_image: false,
        }
    }

    #[test]
    fn fuses_and_renormalizes_over_present_sources() {
        let weights = RetrievalWeights::default();
        let vector = vec![SearchResult::new("a", meta("a.pdf", ChunkType::Text), 0.8, SearchSource::VECTOR)];
        let keyword = vec![SearchResult::new("a", meta("a.pdf", ChunkType::Text), 0.4, SearchSource::KEYWORD)];
        let fused = fuse(vector, keyword, vec![], &weights, false, 1.5, 10);
        assert_eq!(fused.len(), 1);
        // only vector+keyword present: (0.8*0.6 + 0.4*0.3) / (0.6+0.3)
        let expected = (0.8 * 0.6 + 0.4 * 0.3) / 0.9;
        assert!((fused[0].score - expected).abs() < 1e-5);
        assert!(fused[0].source.contains(SearchSource::VECTOR));
        assert!(fused[0].source.contains(SearchSource::KEYWORD));
    }

    #[test]
    fn deduplicates_by_chunk_identity() {
        let weights = RetrievalWeights::default();
        let vector = vec![SearchResult::new("a", meta("a.pdf", ChunkType::Text), 0.5, SearchSource::VECTOR)];
        let keyword = vec![SearchResult::new("a", meta("a.pdf", ChunkType::Text), 0.5, SearchSource::KEYWORD)];
        let fused = fuse(vector, keyword, vec![], &weights, false, 1.5, 10);
        assert_eq!(fused.len(), 1);
    }

    #[test]
    fn table_boost_only_applies_to_table_chunks() {
        let weights = RetrievalWeights::default();
        let vector = vec![
            SearchResult::new("a", meta("a.pdf", ChunkType::Table), 0.5, SearchSource::VECTOR),
            SearchResult::new("b", meta("b.pdf", ChunkType::Text), 0.5, SearchSource::VECTOR),
        ];
        let fused = fuse(vector, vec![], vec![], &weights, true, 1.5, 10);
        let table_result = fused.iter().find(|r| r.metadata.filename == "a.pdf").unwrap();
        let text_result = fused.iter().find(|r| r.metadata.filename == "b.pdf").unwrap();
        assert!(table_result.score > text_result.score);
    }

    #[test]
    fn ties_break_by_vector_score_before_chunk_id() {
        let weights = RetrievalWeights::default();
        // Equal fused score AND equal vector score: falls all the way
        // through to the chunk-id tie-break, which orders "b.pdf" first
        // ("b.pdf" > "a.pdf" lexicographically).
        let vector = vec![
            SearchResult::new("a", meta("a.pdf", ChunkType::Text), 0.9, SearchSource::VECTOR),
            SearchResult::new("b", meta("b.pdf", ChunkType::Text), 0.9, SearchSource::VECTOR),
        ];
        let fused = fuse(vector, vec![], vec![], &weights, false, 1.5, 10);
        assert_eq!(fused[0].metadata.filename, "b.pdf");
        assert_eq!(fused[1].metadata.filename, "a.pdf");

        // Now give "b.pdf" a keyword contribution that equalizes its fused
        // score with "a.pdf" but leaves "a.pdf" with the higher raw vector
        // score — "a.pdf" must still sort first.
        // a: vector 0.8 alone -> fused 0.8.
        // b: vector 0.7 + keyword 1.0 -> (0.7*0.6 + 1.0*0.3) / 0.9 = 0.8.
        let vector = vec![
            SearchResult::new("a", meta("a.pdf", ChunkType::Text), 0.8, SearchSource::VECTOR),
            SearchResult::new("b", meta("b.pdf", ChunkType::Text), 0.7, SearchSource::VECTOR),
        ];
        let keyword = vec![SearchResult::new("b", meta("b.pdf", ChunkType::Text), 1.0, SearchSource::KEYWORD)];
        let fused = fuse(vector, keyword, vec![], &weights, false, 1.5, 10);
        assert!((fused[0].score - fused[1].score).abs() < 1e-5);
        assert_eq!(fused[0].metadata.filename, "a.pdf");
    }

    #[test]
    fn empty_inputs_produce_empty_output() {
        let weights = RetrievalWeights::default();
        let fused = fuse(vec![], vec![], vec![], &weights, false, 1.5, 10);
        assert!(fused.is_empty());
    }
}
