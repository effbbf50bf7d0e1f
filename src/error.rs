//! Per-request error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Everything that can end a request early. Each variant maps to exactly
/// one status code; the message is sent to the client as plain text.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("failed to path unescape: {0}")]
    Decode(String),

    #[error("file not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("failed to stat file: {0}")]
    Stat(#[source] std::io::Error),

    #[error("failed to open file: {0}")]
    Open(#[source] std::io::Error),

    #[error("failed to open archive: {0:#}")]
    ArchiveOpen(#[source] anyhow::Error),

    #[error("failed to read archive entry: {0:#}")]
    ArchiveRead(#[source] anyhow::Error),

    #[error("failed to render directory listing: {0}")]
    Listing(#[source] std::io::Error),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::NotFound => StatusCode::NOT_FOUND,
            ServeError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServeError::Decode(_)
            | ServeError::Stat(_)
            | ServeError::Open(_)
            | ServeError::ArchiveOpen(_)
            | ServeError::ArchiveRead(_)
            | ServeError::Listing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (status, format!("{self}\n")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ServeError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServeError::Forbidden("file is a symlink").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServeError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ServeError::Decode("bad escape".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let err = ServeError::ArchiveOpen(anyhow::anyhow!("Not a valid ZIP file"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "failed to open archive: Not a valid ZIP file");
    }
}
