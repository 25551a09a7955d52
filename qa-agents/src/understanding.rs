//! Query Understanding Agent (spec.md §4.2): classifies the query, extracts
//! keywords, and short-circuits casual small talk before any retrieval or
//! model call happens.

use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use qa_core::context::{intent, QueryType};
use qa_core::traits::Agent;
use qa_core::{ExecutionContext, Result};
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static CASUAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(hi|hello|hey|good\s*(morning|afternoon|evening)|thanks|thank\s*you|bye|goodbye|ok|okay|cool|sure|yo)(\s+(there|friend|friends|everyone|folks|guys|team|mate|buddy|all|again))*[\s!.,]*$",
    )
    .expect("casual pattern is valid")
});

/// Conversational filler that never counts as a "domain term" — both the
/// greeting tokens `CASUAL_PATTERN` recognizes and the trivial words that
/// commonly trail them ("there", "folks", …). Without this, "hello there"
/// would classify as non-casual: "hello"/"there" are both ≥4 characters, so
/// the naive length-only check in `has_domain_terms` would treat them as
/// content words.
static CASUAL_FILLER: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "hi", "hello", "hey", "good", "morning", "afternoon", "evening", "thanks", "thank", "you",
        "bye", "goodbye", "ok", "okay", "cool", "sure", "yo", "there", "friend", "friends",
        "everyone", "folks", "guys", "team", "mate", "buddy", "all", "again",
    ]
    .into_iter()
    .collect()
});

static COMPARATOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(compare|vs\.?|versus)\b").expect("comparator pattern is valid"));

static ENUMERATOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(list all|every|each)\b").expect("enumerator pattern is valid"));

static NUMERICAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(how\s+(much|many)|\d+(\.\d+)?\s*(%|percent|kg|km|mg|ml|usd|inr|rs|dollars?|rupees?))\b")
        .expect("numerical pattern is valid")
});

static ANALYTICAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(why|how)\b").expect("analytical pattern is valid"));

static FACTUAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(what|when|who)\b").expect("factual pattern is valid"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "i", "you", "we", "they",
        "it", "this", "that", "what", "which", "who", "whom", "whose", "to", "for", "in", "on",
        "at", "by", "with", "from", "and", "or", "but", "if", "then", "else", "about", "there",
    ]
    .into_iter()
    .collect()
});

fn is_casual(text: &str, token_count: usize) -> bool {
    let trimmed = text.trim();
    if CASUAL_PATTERN.is_match(trimmed) {
        return true;
    }
    token_count < 3 && !has_domain_terms(trimmed)
}

/// A query is treated as having domain terms if it carries any token long
/// enough to plausibly be a content word (four characters or more), unless
/// that token is itself conversational filler (a greeting or something that
/// commonly trails one).
fn has_domain_terms(text: &str) -> bool {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .any(|w| w.chars().count() >= 4 && !CASUAL_FILLER.contains(w.as_str()))
}

fn classify(text: &str) -> QueryType {
    if COMPARATOR_PATTERN.is_match(text) {
        QueryType::Comparison
    } else if ENUMERATOR_PATTERN.is_match(text) {
        QueryType::Extraction
    } else if NUMERICAL_PATTERN.is_match(text) {
        QueryType::Numerical
    } else if ANALYTICAL_PATTERN.is_match(text) {
        QueryType::Analytical
    } else if FACTUAL_PATTERN.is_match(text) {
        QueryType::Factual
    } else {
        QueryType::Research
    }
}

fn intent_for(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Comparison => intent::COMPARISON,
        QueryType::Extraction => intent::DATA_EXTRACTION,
        QueryType::Research | QueryType::Analytical => intent::ANALYSIS,
        _ => "general_qa",
    }
}

/// ≥4-character non-stopword tokens, order-preserving, capped at 8.
fn extract_keywords(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(w.as_str()))
        .take(8)
        .collect()
}

pub struct QueryUnderstandingAgent;

impl QueryUnderstandingAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for QueryUnderstandingAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for QueryUnderstandingAgent {
    async fn execute(&self, mut context: ExecutionContext) -> Result<ExecutionContext> {
        let text = context.user_query.clone();
        let token_count = text.split_whitespace().count();

        if is_casual(&text, token_count) {
            context.query_type = Some(QueryType::Casual);
            context.intent = Some("casual".to_string());
            context.keywords = Vec::new();
            return Ok(context);
        }

        let query_type = classify(&text);
        context.query_type = Some(query_type);
        context.intent = Some(intent_for(query_type).to_string());
        context.keywords = extract_keywords(&text);
        Ok(context)
    }

    fn name(&self) -> &'static str {
        "query_understanding"
    }
}
