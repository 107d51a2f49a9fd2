use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sw_core::QueryError;

/// Maps query failures onto HTTP statuses at the handler boundary.
pub struct ApiError(QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QueryError::NotAuthenticated | QueryError::Unauthorized => StatusCode::UNAUTHORIZED,
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            QueryError::OAuth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// 400 with a message, for malformed caller input.
pub fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message })),
    )
        .into_response()
}
