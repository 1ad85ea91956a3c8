//! Request-level error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{flatten::FlattenError, generation::GenerationError};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request fails validation before any work is done
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) | GatewayError::Flatten(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) | GatewayError::Flatten(_) => {
                "invalid_request_error"
            }
            GatewayError::Generation(_) => "upstream_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_request() {
        let err = GatewayError::InvalidRequest("missing schema".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_type(), "invalid_request_error");
    }

    #[test]
    fn generation_errors_are_bad_gateway() {
        let err = GatewayError::Generation(GenerationError::WorkerUnavailable(
            "connection refused".to_string(),
        ));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
