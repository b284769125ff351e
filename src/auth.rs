//! # Tenant Context
//!
//! Resolves the tenant and the optional acting person from trusted request
//! headers. Authentication happens upstream; this layer only validates shape.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::lifecycle::ActorContext;

pub const TENANT_HEADER: &str = "X-Tenant-Id";
pub const PERSON_HEADER: &str = "X-Person-Id";

/// Tenant ID wrapper for type safety
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantId(pub Uuid);

/// Extractor for tenant ID from request extensions
#[derive(Debug, Clone, Copy)]
pub struct TenantExtension(pub TenantId);

/// Extractor for the tenant plus the acting person, if the caller named one
#[derive(Debug, Clone, Copy)]
pub struct ActorExtension(pub ActorContext);

/// Middleware that validates `X-Tenant-Id` / `X-Person-Id` and stores the
/// resolved context in request extensions.
pub async fn tenant_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let tenant = extract_tenant_id(request.headers())?;
    let person_id = extract_person_id(request.headers())?;
    tracing::debug!(tenant_id = %tenant.0, person_id = ?person_id, "Tenant-scoped request");

    request.extensions_mut().insert(TenantExtension(tenant));
    request
        .extensions_mut()
        .insert(ActorExtension(ActorContext::new(tenant.0, person_id)));

    Ok(next.run(request).await)
}

fn extract_tenant_id(headers: &HeaderMap) -> Result<TenantId, ApiError> {
    let header_value = headers
        .get(TENANT_HEADER)
        .ok_or_else(|| {
            validation_error(
                "Missing required header",
                serde_json::json!({ TENANT_HEADER: "Required header is missing" }),
            )
        })?
        .to_str()
        .map_err(|_| {
            validation_error(
                "Invalid tenant header",
                serde_json::json!({ TENANT_HEADER: "Header must be valid UTF-8" }),
            )
        })?;

    header_value.trim().parse::<Uuid>().map(TenantId).map_err(|_| {
        validation_error(
            "Invalid tenant ID",
            serde_json::json!({ TENANT_HEADER: "Must be a valid UUID" }),
        )
    })
}

fn extract_person_id(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = headers.get(PERSON_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<Uuid>().ok())
        .map(Some)
        .ok_or_else(|| {
            validation_error(
                "Invalid person ID",
                serde_json::json!({ PERSON_HEADER: "Must be a valid UUID" }),
            )
        })
}

/// OpenAPI header parameters for tenant-scoped endpoints
#[derive(Debug, Serialize, Deserialize, IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Header)]
pub struct TenantHeader {
    /// Tenant identifier (UUID) that scopes the request to a specific tenant
    #[serde(rename = "X-Tenant-Id")]
    #[param(rename = "X-Tenant-Id", value_type = String)]
    pub tenant_id: String,
    /// Person performing the request; used as assigner/requester when omitted from the body
    #[serde(rename = "X-Person-Id")]
    #[param(rename = "X-Person-Id", value_type = Option<String>)]
    pub person_id: Option<String>,
}

impl<S> FromRequestParts<S> for TenantExtension
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantExtension>()
            .copied()
            .ok_or_else(|| {
                validation_error(
                    "Tenant context missing",
                    serde_json::json!({ TENANT_HEADER: "Tenant context not present" }),
                )
            })
    }
}

impl<S> FromRequestParts<S> for ActorExtension
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorExtension>()
            .copied()
            .ok_or_else(|| {
                validation_error(
                    "Tenant context missing",
                    serde_json::json!({ TENANT_HEADER: "Tenant context not present" }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    async fn run_middleware(request: Request<Body>) -> Response {
        async fn handler(ActorExtension(actor): ActorExtension) -> String {
            match actor.person_id {
                Some(person) => format!("{}:{}", actor.tenant_id, person),
                None => actor.tenant_id.to_string(),
            }
        }

        Router::new()
            .route("/test", get(handler))
            .layer(axum::middleware::from_fn(tenant_middleware))
            .oneshot(request)
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_tenant_header_returns_400() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_tenant_uuid_returns_400() {
        let request = Request::builder()
            .uri("/test")
            .header(TENANT_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_person_uuid_returns_400() {
        let request = Request::builder()
            .uri("/test")
            .header(TENANT_HEADER, Uuid::new_v4().to_string())
            .header(PERSON_HEADER, "someone")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tenant_only_request_passes_through() {
        let tenant = Uuid::new_v4();
        let request = Request::builder()
            .uri("/test")
            .header(TENANT_HEADER, tenant.to_string())
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, tenant.to_string());
    }

    #[tokio::test]
    async fn person_header_becomes_the_actor() {
        let tenant = Uuid::new_v4();
        let person = Uuid::new_v4();
        let request = Request::builder()
            .uri("/test")
            .header(TENANT_HEADER, tenant.to_string())
            .header(PERSON_HEADER, person.to_string())
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, format!("{tenant}:{person}"));
    }
}
