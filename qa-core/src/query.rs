use serde::{Deserialize, Serialize};

/// The user's utterance plus optional overrides. Immutable within one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default)]
    pub top_k_override: Option<usize>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub language_hint: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k_override: None,
            session_id: None,
            language_hint: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k_override = Some(top_k);
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_language_hint(mut self, hint: impl Into<String>) -> Self {
        self.language_hint = Some(hint.into());
        self
    }

    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_count_counts_whitespace_separated_words() {
        let q = Query::new("what is the design justification file");
        assert_eq!(q.token_count(), 6);
    }

    #[test]
    fn builder_methods_set_optional_fields() {
        let q = Query::new("hi").with_top_k(20).with_session_id("s1").with_language_hint("hi");
        assert_eq!(q.top_k_override, Some(20));
        assert_eq!(q.session_id.as_deref(), Some("s1"));
        assert_eq!(q.language_hint.as_deref(), Some("hi"));
    }

    #[test]
    fn empty_query_detects_blank_and_whitespace_only() {
        assert!(Query::new("").is_empty());
        assert!(Query::new("   ").is_empty());
        assert!(!Query::new("hi").is_empty());
    }
}
