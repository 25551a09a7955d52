use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("model server returned an error: {0}")]
    Api(String),

    #[error("response failed validation: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Network and timeout errors are transient; API/validation errors are
    /// terminal for the current attempt (matching the teacher's
    /// `is_retryable` classification in `backend.rs`).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for qa_core::Error {
    fn from(err: LlmError) -> Self {
        let kind = match &err {
            LlmError::Timeout => qa_core::ErrorKind::ModelTimeout,
            LlmError::Network(_) => qa_core::ErrorKind::ModelUnreachable,
            _ => qa_core::ErrorKind::Internal,
        };
        qa_core::Error::new(kind, err.to_string())
    }
}
