//! A provider that tries each link in order, falling through to the next on
//! failure (spec.md §4.1: "primary provider → secondary provider → verbatim
//! passthrough").

use async_trait::async_trait;
use qa_core::{Result, TranslationProvider};

pub struct FallbackChainProvider {
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl FallbackChainProvider {
    pub fn new(providers: Vec<Box<dyn TranslationProvider>>) -> Self {
        assert!(!providers.is_empty(), "fallback chain needs at least one provider");
        Self { providers }
    }
}

#[async_trait]
impl TranslationProvider for FallbackChainProvider {
    async fn translate(&self, text: &str, src: Option<&str>, dst: &str) -> Result<(String, String)> {
        let mut last_err = None;
        for provider in &self.providers {
            match provider.translate(text, src, dst).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "translation provider failed, falling through");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.expect("at least one provider was tried"))
    }

    fn name(&self) -> &str {
        "fallback_chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passthrough::PassthroughProvider;

    struct AlwaysFails;

    #[async_trait]
    impl TranslationProvider for AlwaysFails {
        async fn translate(&self, _text: &str, _src: Option<&str>, _dst: &str) -> Result<(String, String)> {
            Err(qa_core::Error::internal("provider unreachable"))
        }
        fn name(&self) -> &str {
            "always_fails"
        }
    }

    #[tokio::test]
    async fn falls_through_to_passthrough_on_primary_failure() {
        let chain = FallbackChainProvider::new(vec![Box::new(AlwaysFails), Box::new(PassthroughProvider)]);
        let (text, _) = chain.translate("hello", Some("en"), "en").await.unwrap();
        assert_eq!(text, "hello");
    }
}
