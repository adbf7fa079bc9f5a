//! Error handling for the API layer.
//!
//! Handlers return `Result<T, ApiError>`; `ApiError` wraps the shared
//! [`AppError`] taxonomy and renders it as an HTTP response. Repository
//! errors convert through their `AppError` mapping, so every failure path
//! yields a classified, machine-readable response body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use faktura_core::invoice::RecurrenceError;
use faktura_core::validation::ValidationError;
use faktura_db::repositories::{
    BankAccountError, CustomerError, InvoiceError, SearchError, ServiceError,
    TransactionCategoryError, TransactionError, UserError,
};
use faktura_shared::AppError;

/// API result type alias.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error wrapping the application taxonomy.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details are logged, never exposed to clients.
        let message = match &self.0 {
            AppError::Database(detail) | AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                "An error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            error: self.0.error_code(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<CustomerError> for ApiError {
    fn from(err: CustomerError) -> Self {
        Self(err.into())
    }
}

impl From<BankAccountError> for ApiError {
    fn from(err: BankAccountError) -> Self {
        Self(err.into())
    }
}

impl From<TransactionCategoryError> for ApiError {
    fn from(err: TransactionCategoryError) -> Self {
        Self(err.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err.into())
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        Self(err.into())
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        Self(err.into())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err.into())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        Self(err.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(AppError::Validation(err.to_string()))
    }
}

impl From<RecurrenceError> for ApiError {
    fn from(err: RecurrenceError) -> Self {
        Self(AppError::Validation(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_422() {
        let err: ApiError = ValidationError::NonPositiveAmount.into();
        assert_eq!(err.0.status_code(), 422);
        assert_eq!(err.0.error_code(), "validation_error");
    }

    #[test]
    fn test_recurrence_error_maps_to_422() {
        let err: ApiError = RecurrenceError::WeeklyDayOutOfRange.into();
        assert_eq!(err.0.status_code(), 422);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err: ApiError = CustomerError::DuplicateLegalName.into();
        assert_eq!(err.0.status_code(), 409);
        assert_eq!(err.0.error_code(), "conflict");
    }

    #[test]
    fn test_foreign_tenant_maps_to_404_not_403() {
        // Foreign-tenant rows must be indistinguishable from missing rows.
        let err: ApiError = CustomerError::NotFound(uuid::Uuid::new_v4()).into();
        assert_eq!(err.0.status_code(), 404);
    }
}
