//! The trivial shared interface the four cognitive agents conform to.
//!
//! spec.md §9 is explicit that the core needs no runtime plug-in registry:
//! the orchestrator calls each concrete agent directly rather than through
//! `dyn Agent`. This trait exists so every agent's boundary has the same
//! documented shape and so tests can write one generic harness instead of
//! four bespoke ones.

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::Result;

#[async_trait]
pub trait Agent: Send + Sync {
    /// Consumes the parts of the context this agent reads and returns the
    /// mutated context with this agent's fields populated. Failures are
    /// caught here, never propagated as a panic or a raw exception
    /// equivalent — callers match on `Err(Error)` and decide continue /
    /// fallback / terminate per spec.md §7.
    async fn execute(&self, context: ExecutionContext) -> Result<ExecutionContext>;

    fn name(&self) -> &'static str;
}
