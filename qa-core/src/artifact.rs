//! Optional sidecar document attached to a Response.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Report,
    Data,
}

/// `{ title, type, content: HTML }`, generated when the query or answer
/// merits a richer view than a chat reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub content: String,
}
