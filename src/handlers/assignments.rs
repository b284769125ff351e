//! # Asset Assignment API Handlers
//!
//! Creating an assignment moves the asset to `assigned`; setting the
//! assignment to `returned` hands it back to stock.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiQuery, ListResponse, utc, utc_opt};
use crate::auth::{ActorExtension, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::lifecycle::{
    AssignmentStatus, DeleteTarget, EntityKind, LifecycleStatus, NewAssignment, TransitionContext,
};
use crate::models::asset_assignment;
use crate::repositories::{AssignmentFilter, AssignmentRepository, Page, UpdateAssignment};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAssignmentDto {
    pub asset_id: Uuid,
    pub assigned_to_id: Uuid,
    /// Defaults to the `X-Person-Id` caller
    pub assigned_by_id: Option<Uuid>,
    /// Defaults to now
    pub assignment_date: Option<DateTime<Utc>>,
    pub expected_return: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAssignmentDto {
    pub notes: Option<String>,
    pub expected_return: Option<DateTime<Utc>>,
    #[schema(example = "returned")]
    pub status: Option<AssignmentStatus>,
    /// Recorded when returning; defaults to now
    pub return_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentDto {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub assigned_to_id: Uuid,
    pub assigned_by_id: Uuid,
    pub assignment_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub expected_return: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[schema(example = "active")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<asset_assignment::Model> for AssignmentDto {
    fn from(model: asset_assignment::Model) -> Self {
        Self {
            id: model.id,
            asset_id: model.asset_id,
            assigned_to_id: model.assigned_to_id,
            assigned_by_id: model.assigned_by_id,
            assignment_date: utc(model.assignment_date),
            return_date: utc_opt(model.return_date),
            expected_return: utc_opt(model.expected_return),
            notes: model.notes,
            status: model.status,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListAssignmentsQuery {
    pub asset_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub status: Option<AssignmentStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    params(TenantHeader),
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Asset assigned", body = AssignmentDto),
        (status = 400, description = "Unknown asset or person", body = ApiError),
        (status = 409, description = "Asset unavailable or already assigned", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiJson(body): ApiJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<AssignmentDto>), ApiError> {
    let assignment = state
        .lifecycle
        .create_assignment(
            actor,
            NewAssignment {
                asset_id: body.asset_id,
                assigned_to_id: body.assigned_to_id,
                assigned_by_id: body.assigned_by_id,
                assignment_date: body.assignment_date,
                expected_return: body.expected_return,
                notes: body.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments",
    params(TenantHeader, ListAssignmentsQuery),
    responses(
        (status = 200, description = "Assignments, newest first", body = ListResponse<AssignmentDto>)
    ),
    tag = "assignments"
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListAssignmentsQuery>,
) -> Result<Json<ListResponse<AssignmentDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let filter = AssignmentFilter {
        asset_id: query.asset_id,
        assigned_to_id: query.assigned_to_id,
        status: query.status.map(|status| status.as_str().to_string()),
    };
    let assignments = AssignmentRepository::new(&state.db)
        .list(tenant.0, filter, page)
        .await?;
    Ok(Json(ListResponse::new(assignments, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Assignment UUID")),
    responses(
        (status = 200, description = "Assignment", body = AssignmentDto),
        (status = 404, description = "Assignment not found", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignmentDto>, ApiError> {
    AssignmentRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|assignment| Json(assignment.into()))
        .ok_or_else(|| ApiError::not_found(format!("asset_assignment {id} not found")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/assignments/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Assignment UUID")),
    request_body = UpdateAssignmentDto,
    responses(
        (status = 200, description = "Assignment updated", body = AssignmentDto),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 409, description = "Assignment already returned", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn update_assignment(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateAssignmentDto>,
) -> Result<Json<AssignmentDto>, ApiError> {
    let ctx = TransitionContext::new(actor).with_effective_date(body.return_date);
    let assignment = state
        .lifecycle
        .update_assignment(
            ctx,
            id,
            UpdateAssignment {
                notes: body.notes,
                expected_return: body.expected_return,
            },
            body.status,
        )
        .await?;
    Ok(Json(assignment.into()))
}

/// Withdraw an active assignment; the asset goes back to stock
#[utoipa::path(
    delete,
    path = "/api/v1/assignments/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Assignment UUID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 409, description = "Only active assignments can be deleted", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn delete_assignment(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::AssetAssignment, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
