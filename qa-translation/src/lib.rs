//! The translation pre-step's provider contract and its graceful-degradation
//! implementation (spec.md §4.1, §6). No provider is bundled; this crate
//! ships the fallback-chain wrapper and the passthrough terminal link.

pub mod chain;
pub mod passthrough;
pub mod script;

pub use chain::FallbackChainProvider;
pub use passthrough::PassthroughProvider;
pub use script::needs_translation;
