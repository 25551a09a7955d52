//! Query Understanding, Reasoning, and Verification agents (spec.md §4.2,
//! §4.4, §4.5).

pub mod prompt;
pub mod reasoning;
pub mod understanding;
pub mod verification;

pub use reasoning::ReasoningAgent;
pub use understanding::QueryUnderstandingAgent;
pub use verification::VerificationAgent;
