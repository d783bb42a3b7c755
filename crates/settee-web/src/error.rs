use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("invalid JSON in parameter {key}: {reason}")]
    InvalidJson { key: String, reason: String },

    #[error("invalid integer for {key}: {value:?}")]
    InvalidInt { key: String, value: String },

    #[error("missing parameter: {0}")]
    MissingParam(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type WebResult<T> = Result<T, WebError>;

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(WebError::MissingParam("page".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WebError::Serialization("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn renders_as_response() {
        let resp = WebError::InvalidInt {
            key: "page".into(),
            value: "x".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
