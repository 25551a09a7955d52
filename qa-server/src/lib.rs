//! Thin HTTP entry point for the document question-answering orchestrator
//! (spec.md §6's inbound/outbound contract; the transport itself is an
//! out-of-scope collaborator per spec.md §1).

pub mod error;
pub mod http;
pub mod metrics;
pub mod state;

pub use error::ServerError;
pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;
