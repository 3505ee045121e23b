//! API error type shared by the catalog, negotiation, analytics and
//! newsletter handlers.

use crate::negotiation::OptimizerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Database(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Optimizer(OptimizerError),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Database(err)
    }
}

impl From<OptimizerError> for ApiError {
    fn from(err: OptimizerError) -> Self {
        ApiError::Optimizer(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Optimizer(OptimizerError::Rejected { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Optimizer(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(err) => {
                tracing::error!("Database error: {:#}", err);
                "Internal server error".to_string()
            }
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Optimizer(OptimizerError::Rejected { detail, .. }) => detail.clone(),
            ApiError::Optimizer(err) => {
                tracing::error!("Optimizer error: {}", err);
                "Negotiation service unavailable".to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimizer_error_statuses() {
        let unreachable = ApiError::from(OptimizerError::Unreachable("refused".into()));
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);

        let garbled = ApiError::from(OptimizerError::InvalidResponse("eof".into()));
        assert_eq!(garbled.into_response().status(), StatusCode::BAD_GATEWAY);

        let rejected = ApiError::from(OptimizerError::Rejected {
            status: 422,
            detail: "bad weights".into(),
        });
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_error_is_500() {
        let err = ApiError::from(anyhow::anyhow!("disk I/O error"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
