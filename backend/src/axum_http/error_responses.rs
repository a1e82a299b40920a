use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Builds the error body for a failed request. Server errors never
/// leak their detail to the client; the handler logs it instead.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let message = if status.is_server_error() {
        "Internal server error".to_string()
    } else {
        message.to_string()
    };

    (
        status,
        Json(ErrorResponse {
            code: status.as_u16(),
            message,
        }),
    )
        .into_response()
}
