use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tierline_core::{FilterError, RepositoryError};
use tierline_offer::OfferError;

#[derive(Debug)]
pub enum AppError {
    BadRequestError(String),
    ValidationError(String),
    NotFoundError(String),
    BadGatewayError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequestError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ValidationError(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadGatewayError(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment provider error".to_string())
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<OfferError> for AppError {
    fn from(err: OfferError) -> Self {
        match err {
            OfferError::UniquenessCheck(_) => AppError::InternalServerError(err.to_string()),
            _ => AppError::ValidationError(err.to_string()),
        }
    }
}

impl From<FilterError> for AppError {
    fn from(err: FilterError) -> Self {
        AppError::BadRequestError(err.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Offer(e) => e.into(),
            RepositoryError::Filter(msg) => AppError::BadRequestError(msg),
            RepositoryError::Payment(e) => AppError::BadGatewayError(e.to_string()),
            RepositoryError::Storage(_) | RepositoryError::Mapping { .. } => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}
