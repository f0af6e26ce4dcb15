//! Error types for kok-web

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kok_data::form::MissingField;
use serde_json::json;
use thiserror::Error;

/// Result type alias for request handlers
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a request handler can report to the client.
///
/// Every variant renders as `{"success": false, "message": ...}` with a
/// matching status code.
#[derive(Error, Debug)]
pub enum Error {
    /// No station has the requested code
    #[error("station not found: {0}")]
    NotFound(String),

    /// Bad credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed form submission
    #[error("{0}")]
    BadRequest(String),

    /// Database failure
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MissingField> for Error {
    fn from(err: MissingField) -> Self {
        Error::BadRequest(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Error::Storage(ref err) = self {
            log::error!("request failed: {:#}", err);
        } else {
            log::warn!("request rejected ({}): {}", status, self);
        }
        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(Error::NotFound("KK01".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Unauthorized("no".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::BadRequest("bad".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::Storage(anyhow::anyhow!("disk")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_field_is_bad_request() {
        let err: Error = MissingField("river").into();
        assert_eq!(err.to_string(), "missing form field: river");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
