use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::spotify::SpotifyError;

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No credential cookie on the request.
    Unauthenticated,
    /// Spotify rejected the stored token.
    SessionExpired,
    /// The authorization server refused the code exchange.
    UpstreamAuth { status: StatusCode, body: String },
    Spotify(String),
    NoValidData(String),
    BadRequest(String),
}

impl From<SpotifyError> for AppError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Unauthorized => AppError::SessionExpired,
            other => AppError::Spotify(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            AppError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired".to_string()),
            AppError::UpstreamAuth { status, body } => {
                tracing::warn!(upstream_status = %status, "token exchange rejected");
                // Pass the authorization server's own error document through.
                let body = serde_json::from_str::<serde_json::Value>(&body)
                    .unwrap_or_else(|_| json!({ "error": body }));
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
            AppError::Spotify(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::NoValidData(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (
            status,
            Json(json!({ "error": message })),
        )
            .into_response()
    }
}
