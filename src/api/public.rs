//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::core::EngineError;

// Errors

pub struct ApiError(anyhow::Error);

/// Convert `ApiError` into an Axum compatible response, mapping the
/// engine's error taxonomy onto HTTP status codes.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Always log the error
        tracing::error!("{}", self.0);

        let status = match self.0.downcast_ref::<EngineError>() {
            Some(EngineError::Validation(_)) | Some(EngineError::NoRecipients) => {
                StatusCode::BAD_REQUEST
            }
            Some(EngineError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(EngineError::Unauthorized(_)) => StatusCode::FORBIDDEN,
            Some(EngineError::Conflict(_)) => StatusCode::CONFLICT,
            Some(EngineError::InsufficientBalance { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(EngineError::Delivery(_)) | None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("{}", self.0)).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod availability {
    pub use crate::api::routes::availability::public::*;
}

pub mod events {
    pub use crate::api::routes::events::public::*;
}

pub mod outbox {
    pub use crate::api::routes::outbox::public::*;
}

pub mod pto {
    pub use crate::api::routes::pto::public::*;
}
