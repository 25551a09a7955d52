//! HTTP-facing error taxonomy. A thin wrapper around `qa_core::ErrorKind`
//! so the status-code mapping lives at the transport boundary, not in the
//! core crates.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
