use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::application::order_saga::PlacementError;
use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Order {order_id} could not be completed: {cause}")]
    PartialFailure {
        order_id: Uuid,
        compensated: bool,
        cause: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Unavailable(_) => "transient_store",
            AppError::PartialFailure { .. } => "partial_failure",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => AppError::Validation(msg),
            DomainError::NotFound => AppError::NotFound,
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::TransientStore(msg) => AppError::Unavailable(msg),
            DomainError::PartialFailure {
                order_id,
                compensated,
                cause,
            } => AppError::PartialFailure {
                order_id,
                compensated,
                cause,
            },
        }
    }
}

impl From<PlacementError> for AppError {
    fn from(e: PlacementError) -> Self {
        e.source.into()
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::PartialFailure { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Unavailable(msg) => {
                log::error!("Store unavailable: {}", msg);
                json!({ "error": "Storage temporarily unavailable", "kind": self.kind() })
            }
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                json!({ "error": "Internal server error", "kind": self.kind() })
            }
            AppError::PartialFailure {
                order_id,
                compensated,
                ..
            } => json!({
                "error": self.to_string(),
                "kind": self.kind(),
                "order_id": order_id,
                "compensated": compensated,
            }),
            _ => json!({ "error": self.to_string(), "kind": self.kind() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
