use async_trait::async_trait;
use qa_core::{Result, TranslationProvider};

/// The terminal link in the fallback chain: returns the text unchanged and
/// reports the source language as unknown. Always succeeds.
pub struct PassthroughProvider;

#[async_trait]
impl TranslationProvider for PassthroughProvider {
    async fn translate(&self, text: &str, src: Option<&str>, _dst: &str) -> Result<(String, String)> {
        Ok((text.to_string(), src.unwrap_or("und").to_string()))
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}
