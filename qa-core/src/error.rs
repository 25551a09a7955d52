use std::fmt;

/// Error kind taxonomy. Not a type hierarchy — a flat classification the
/// orchestrator matches on to decide continue / fallback / terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyQuery,
    NoDocuments,
    NoEvidence,
    ContextOverflow,
    ModelTimeout,
    ModelUnreachable,
    ReasoningExhausted,
    VerificationFailed,
    CacheIo,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::EmptyQuery => "empty_query",
            ErrorKind::NoDocuments => "no_documents",
            ErrorKind::NoEvidence => "no_evidence",
            ErrorKind::ContextOverflow => "context_overflow",
            ErrorKind::ModelTimeout => "model_timeout",
            ErrorKind::ModelUnreachable => "model_unreachable",
            ErrorKind::ReasoningExhausted => "reasoning_exhausted",
            ErrorKind::VerificationFailed => "verification_failed",
            ErrorKind::CacheIo => "cache_io",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// The only error type that crosses an agent boundary. `message` is always
/// safe to show a caller; `detail` (never serialized to the Response) carries
/// the full context for the failure log.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
