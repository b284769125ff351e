//! # Lifecycle Query Handlers
//!
//! Read-only views over the status registry and the deletion guards, so
//! clients can decide which actions to offer before attempting them.

use axum::{
    extract::State,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::ApiQuery;
use crate::auth::{ActorExtension, TenantHeader};
use crate::error::ApiError;
use crate::lifecycle::{DeleteTarget, EntityKind, allowed_transitions};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct TransitionsQuery {
    /// `asset`, `asset_assignment`, `maintenance_record` or `procurement_request`
    pub entity_type: String,
    /// Current status
    pub from: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionsDto {
    #[schema(example = "procurement_request")]
    pub entity_type: String,
    #[schema(example = "submitted")]
    pub from: String,
    /// Statuses a caller may request next
    #[schema(example = json!(["approved", "rejected", "cancelled"]))]
    pub allowed: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct CanDeleteQuery {
    pub entity_type: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CanDeleteDto {
    pub entity_type: EntityKind,
    pub id: Uuid,
    pub deletable: bool,
}

/// Statuses reachable from `from` by a direct request
#[utoipa::path(
    get,
    path = "/api/v1/lifecycle/transitions",
    params(TenantHeader, TransitionsQuery),
    responses(
        (status = 200, description = "Allowed next statuses", body = TransitionsDto),
        (status = 400, description = "Unknown entity type or status", body = ApiError)
    ),
    tag = "lifecycle"
)]
pub async fn list_transitions(
    ApiQuery(query): ApiQuery<TransitionsQuery>,
) -> Result<Json<TransitionsDto>, ApiError> {
    let allowed = allowed_transitions(&query.entity_type, &query.from)?;
    let kind: EntityKind = query.entity_type.parse()?;
    Ok(Json(TransitionsDto {
        entity_type: kind.to_string(),
        from: query.from,
        allowed: allowed.into_iter().map(str::to_string).collect(),
    }))
}

/// Whether deleting the entity would currently pass its guards
#[utoipa::path(
    get,
    path = "/api/v1/lifecycle/can-delete",
    params(TenantHeader, CanDeleteQuery),
    responses(
        (status = 200, description = "Deletion check result", body = CanDeleteDto),
        (status = 400, description = "Unknown entity type", body = ApiError),
        (status = 404, description = "Entity not found", body = ApiError)
    ),
    tag = "lifecycle"
)]
pub async fn can_delete(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiQuery(query): ApiQuery<CanDeleteQuery>,
) -> Result<Json<CanDeleteDto>, ApiError> {
    let kind: EntityKind = query.entity_type.parse()?;
    let deletable = state
        .lifecycle
        .can_delete(actor, DeleteTarget::new(kind, query.id))
        .await?;
    Ok(Json(CanDeleteDto {
        entity_type: kind,
        id: query.id,
        deletable,
    }))
}
