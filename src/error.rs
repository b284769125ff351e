//! # Error Handling
//!
//! Unified error handling for the Kontena API: every failure leaves the
//! service as a problem+json body carrying a trace id.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::lifecycle::{ApplyError, LifecycleError};
use crate::services::ServiceError;
use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Suggested retry delay in seconds (optional)
    pub retry_after: Option<u64>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            retry_after: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Set retry after delay
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Trace ID of the current request, or a generated correlation ID outside one
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

/// Whether `error` is a unique-constraint violation on any supported backend.
pub fn is_unique_violation(error: &DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    db_error
        .code()
        .is_some_and(|code| code == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code.as_ref()))
}

/// Errors returned by the repository layer
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[source] DbErr),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a SeaORM error, classifying uniqueness violations as conflicts
    pub fn database_error(error: DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return RepositoryError::Conflict("Resource already exists".to_string());
        }
        RepositoryError::Database(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        if let Some(retry_after) = self.retry_after
            && let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string())
        {
            headers.insert("retry-after", header_value);
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED".to_string(),
            format!("Invalid query string: {}", rejection.body_text()),
        )
    }
}

impl From<DbErr> for ApiError {
    fn from(error: DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            other => {
                tracing::error!("Database error: {:?}", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(db_err) => db_err.into(),
            RepositoryError::NotFound(what) => {
                Self::not_found(format!("{what} not found"))
            }
            RepositoryError::Validation(message) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
            }
            RepositoryError::Conflict(message) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", &message)
            }
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(error: LifecycleError) -> Self {
        let message = error.to_string();
        match error {
            LifecycleError::IllegalTransition { kind, from, to } => {
                Self::new(StatusCode::CONFLICT, "ILLEGAL_TRANSITION", &message).with_details(
                    json!({ "entity_type": kind, "from": from, "to": to }),
                )
            }
            LifecycleError::NotEditable { kind, status } => {
                Self::new(StatusCode::CONFLICT, "NOT_EDITABLE", &message)
                    .with_details(json!({ "entity_type": kind, "status": status }))
            }
            LifecycleError::AssetUnavailable { asset_id, status } => {
                Self::new(StatusCode::CONFLICT, "ASSET_UNAVAILABLE", &message)
                    .with_details(json!({ "asset_id": asset_id, "status": status }))
            }
            LifecycleError::AlreadyAssigned { asset_id, assignee } => {
                Self::new(StatusCode::CONFLICT, "ALREADY_ASSIGNED", &message)
                    .with_details(json!({ "asset_id": asset_id, "assigned_to_id": assignee }))
            }
            LifecycleError::HasDependents {
                kind,
                id,
                dependent,
                count,
            } => Self::new(StatusCode::CONFLICT, "HAS_DEPENDENTS", &message).with_details(json!({
                "entity_type": kind,
                "id": id,
                "dependent": dependent,
                "count": count,
            })),
            LifecycleError::InvalidApprover { approver_id } => {
                validation_error(&message, json!({ "approver_id": approver_id }))
            }
            LifecycleError::InvalidReference { field, id } => {
                validation_error(&message, json!({ field: id }))
            }
            LifecycleError::CyclicHierarchy { kind, id } => {
                validation_error(&message, json!({ "entity_type": kind, "parent_id": id }))
            }
            LifecycleError::Validation(_)
            | LifecycleError::UnknownEntityType(_)
            | LifecycleError::UnknownStatus { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
            }
            LifecycleError::NotFound { .. } => Self::not_found(message),
            LifecycleError::Apply(ApplyError::Conflict { .. } | ApplyError::UniqueViolation(_)) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", &message).with_retry_after(1)
            }
            LifecycleError::Apply(ApplyError::Storage(db_err))
            | LifecycleError::Storage(db_err) => db_err.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Lifecycle(err) => err.into(),
            ServiceError::Repository(err) => err.into(),
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::EntityKind;
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
        assert_eq!(error.retry_after, None);
    }

    #[test]
    fn test_api_error_with_details() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Test error message")
            .with_details(json!({"field": "value"}));

        assert_eq!(error.details, Some(Box::new(json!({"field": "value"}))));
    }

    #[test]
    fn test_content_type_header() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[test]
    fn test_database_error_mapping() {
        let api_error: ApiError = DbErr::RecordNotFound("test_record".to_string()).into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, Box::from("NOT_FOUND"));
        assert!(api_error.message.contains("test_record"));
    }

    #[test]
    fn test_repository_error_mapping() {
        let api_error: ApiError = RepositoryError::NotFound("vendor".to_string()).into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);

        let api_error: ApiError = RepositoryError::Validation("name is required".to_string()).into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));

        let api_error: ApiError = RepositoryError::Conflict("duplicate".to_string()).into();
        assert_eq!(api_error.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_lifecycle_conflicts_map_to_409() {
        let cases: Vec<(LifecycleError, &str)> = vec![
            (
                LifecycleError::IllegalTransition {
                    kind: EntityKind::ProcurementRequest,
                    from: "approved".to_string(),
                    to: "draft".to_string(),
                },
                "ILLEGAL_TRANSITION",
            ),
            (
                LifecycleError::NotEditable {
                    kind: EntityKind::ProcurementRequest,
                    status: "approved".to_string(),
                },
                "NOT_EDITABLE",
            ),
            (
                LifecycleError::HasDependents {
                    kind: EntityKind::AssetCategory,
                    id: Uuid::nil(),
                    dependent: "assets",
                    count: 2,
                },
                "HAS_DEPENDENTS",
            ),
            (
                ApplyError::Conflict {
                    kind: EntityKind::Asset,
                    id: Uuid::nil(),
                }
                .into(),
                "CONFLICT",
            ),
        ];

        for (error, code) in cases {
            let api_error: ApiError = error.into();
            assert_eq!(api_error.status, StatusCode::CONFLICT);
            assert_eq!(api_error.code.as_ref(), code);
        }
    }

    #[test]
    fn test_lifecycle_reference_errors_map_to_400() {
        let api_error: ApiError = LifecycleError::InvalidApprover { approver_id: None }.into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));

        let id = Uuid::new_v4();
        let api_error: ApiError = LifecycleError::InvalidReference {
            field: "category_id",
            id,
        }
        .into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            api_error.details.unwrap().get("category_id").unwrap(),
            &json!(id)
        );

        let api_error: ApiError = LifecycleError::UnknownEntityType("ticket".to_string()).into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_lifecycle_not_found_maps_to_404() {
        let api_error: ApiError = LifecycleError::NotFound {
            kind: EntityKind::Asset,
            id: Uuid::nil(),
        }
        .into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_lifecycle_storage_failure_maps_to_500() {
        let api_error: ApiError =
            LifecycleError::Storage(DbErr::Custom("disk full".to_string())).into();
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_with_details() {
        let field_errors = json!({
            "name": "Name is required",
            "email": "Invalid email format"
        });

        let validation_error = validation_error("Validation failed", field_errors.clone());

        assert_eq!(validation_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation_error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(validation_error.details, Some(Box::new(field_errors)));
    }
}
