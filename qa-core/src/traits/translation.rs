//! The pluggable translation provider contract (spec.md §6). No provider is
//! bundled; `qa-translation` ships the fallback-chain wrapper and a
//! passthrough implementation used as the terminal link in that chain.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait TranslationProvider: Send + Sync + 'static {
    /// Translate `text` to `dst`. `src` is a hint, not a guarantee — the
    /// provider may auto-detect and report a different `detected_src`.
    async fn translate(&self, text: &str, src: Option<&str>, dst: &str) -> Result<(String, String)>;

    fn name(&self) -> &str;
}
