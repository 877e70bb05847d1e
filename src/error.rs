// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::session::{SessionError, TaskError};
use crate::swap::SwapError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::InvalidKey(_) => Self::unprocessable(message),
            SessionError::NotBound | SessionError::AlreadyBound => Self::conflict(message),
            SessionError::UnknownToken(_)
            | SessionError::InvalidAmount(_)
            | SessionError::InvalidAddress(_) => Self::bad_request(message),
            SessionError::Swap(SwapError::NoQuote | SwapError::StaleQuote(_)) => {
                Self::conflict(message)
            }
            SessionError::Chain(_) | SessionError::Swap(_) => Self::service_unavailable(message),
            SessionError::Task(TaskError::Cancelled) => Self::conflict(message),
            SessionError::Storage(_) | SessionError::Task(_) => {
                error!(error = %message, "Internal failure");
                Self::internal("Internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainError;
    use crate::storage::StorageError;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let unp = ApiError::unprocessable("oops");
        assert_eq!(unp.status, StatusCode::UNPROCESSABLE_ENTITY);

        let down = ApiError::service_unavailable("down");
        assert_eq!(down.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn session_errors_map_to_status() {
        let cases = [
            (SessionError::InvalidKey("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (SessionError::NotBound, StatusCode::CONFLICT),
            (SessionError::AlreadyBound, StatusCode::CONFLICT),
            (SessionError::UnknownToken("X".into()), StatusCode::BAD_REQUEST),
            (SessionError::InvalidAmount("0".into()), StatusCode::BAD_REQUEST),
            (SessionError::InvalidAddress("?".into()), StatusCode::BAD_REQUEST),
            (
                SessionError::Chain(ChainError::Network("refused".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (SessionError::Swap(SwapError::NoResult), StatusCode::SERVICE_UNAVAILABLE),
            (SessionError::Swap(SwapError::NoQuote), StatusCode::CONFLICT),
            (
                SessionError::Storage(StorageError::NotInitialized),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(SessionError::Storage(StorageError::Corrupted("disk".into())));
        assert_eq!(err.message, "Internal error");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
