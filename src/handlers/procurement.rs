//! # Procurement Request API Handlers
//!
//! Requests are created as `draft` with a `PR-YYYYMMDD-NNN` number. The
//! PATCH endpoint edits descriptive fields and drives the status table;
//! approving requires `approver_id`.

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
    DeleteTarget, EntityKind, LifecycleStatus, NewProcurementItem, NewProcurementRequest,
    ProcurementStatus, TransitionContext,
};
use crate::models::{procurement_item, procurement_request};
use crate::repositories::{Page, ProcurementFilter, ProcurementRepository, UpdateProcurement};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProcurementItemDto {
    pub category_id: Uuid,
    #[schema(example = "14\" developer laptop")]
    pub description: String,
    #[schema(example = 3)]
    pub quantity: i32,
    pub estimated_price: Option<f64>,
    pub preferred_vendor_id: Option<Uuid>,
    pub justification: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProcurementDto {
    /// Defaults to the `X-Person-Id` caller
    pub requested_by_id: Option<Uuid>,
    pub expected_date: Option<DateTime<Utc>>,
    /// Derived from the items' estimates when absent
    pub total_budget: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<CreateProcurementItemDto>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProcurementDto {
    pub expected_date: Option<DateTime<Utc>>,
    pub total_budget: Option<f64>,
    pub notes: Option<String>,
    #[schema(example = "approved")]
    pub status: Option<ProcurementStatus>,
    /// Required when approving
    pub approver_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcurementItemDto {
    pub id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub estimated_price: Option<f64>,
    pub preferred_vendor_id: Option<Uuid>,
    pub justification: Option<String>,
    pub status: String,
}

impl From<procurement_item::Model> for ProcurementItemDto {
    fn from(model: procurement_item::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            description: model.description,
            quantity: model.quantity,
            estimated_price: model.estimated_price,
            preferred_vendor_id: model.preferred_vendor_id,
            justification: model.justification,
            status: model.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcurementDto {
    pub id: Uuid,
    #[schema(example = "PR-20240115-001")]
    pub request_number: String,
    pub requested_by_id: Uuid,
    pub approved_by_id: Option<Uuid>,
    #[schema(example = "draft")]
    pub status: String,
    pub request_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub expected_date: Option<DateTime<Utc>>,
    pub total_budget: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<procurement_request::Model> for ProcurementDto {
    fn from(model: procurement_request::Model) -> Self {
        Self {
            id: model.id,
            request_number: model.request_number,
            requested_by_id: model.requested_by_id,
            approved_by_id: model.approved_by_id,
            status: model.status,
            request_date: utc(model.request_date),
            approval_date: utc_opt(model.approval_date),
            expected_date: utc_opt(model.expected_date),
            total_budget: model.total_budget,
            notes: model.notes,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

/// A request together with its line items
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcurementDetailDto {
    #[serde(flatten)]
    pub request: ProcurementDto,
    pub items: Vec<ProcurementItemDto>,
}

impl ProcurementDetailDto {
    fn new(request: procurement_request::Model, items: Vec<procurement_item::Model>) -> Self {
        Self {
            request: request.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListProcurementQuery {
    #[param(value_type = Option<String>)]
    pub status: Option<ProcurementStatus>,
    pub requested_by_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/procurement",
    params(TenantHeader),
    request_body = CreateProcurementDto,
    responses(
        (status = 201, description = "Draft request created", body = ProcurementDetailDto, headers(
            ("Location", description = "URL of the created request")
        )),
        (status = 400, description = "Validation failed or unknown reference", body = ApiError)
    ),
    tag = "procurement"
)]
pub async fn create_procurement(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiJson(body): ApiJson<CreateProcurementDto>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<ProcurementDetailDto>), ApiError> {
    let input = NewProcurementRequest {
        requested_by_id: body.requested_by_id,
        expected_date: body.expected_date,
        total_budget: body.total_budget,
        notes: body.notes,
        items: body
            .items
            .into_iter()
            .map(|item| NewProcurementItem {
                category_id: item.category_id,
                description: item.description,
                quantity: item.quantity,
                estimated_price: item.estimated_price,
                preferred_vendor_id: item.preferred_vendor_id,
                justification: item.justification,
            })
            .collect(),
    };
    let (request, items) = state
        .lifecycle
        .create_procurement_request(actor, input)
        .await?;

    let location = format!("/api/v1/procurement/{}", request.id);
    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(ProcurementDetailDto::new(request, items)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/procurement",
    params(TenantHeader, ListProcurementQuery),
    responses(
        (status = 200, description = "Procurement requests, newest first", body = ListResponse<ProcurementDto>)
    ),
    tag = "procurement"
)]
pub async fn list_procurement(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListProcurementQuery>,
) -> Result<Json<ListResponse<ProcurementDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let filter = ProcurementFilter {
        status: query.status.map(|status| status.as_str().to_string()),
        requested_by_id: query.requested_by_id,
    };
    let requests = ProcurementRepository::new(&state.db)
        .list(tenant.0, filter, page)
        .await?;
    Ok(Json(ListResponse::new(requests, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/procurement/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Procurement request UUID")),
    responses(
        (status = 200, description = "Request with items", body = ProcurementDetailDto),
        (status = 404, description = "Request not found", body = ApiError)
    ),
    tag = "procurement"
)]
pub async fn get_procurement(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcurementDetailDto>, ApiError> {
    let repo = ProcurementRepository::new(&state.db);
    let request = repo
        .get(tenant.0, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("procurement_request {id} not found")))?;
    let items = repo.items(tenant.0, id).await?;
    Ok(Json(ProcurementDetailDto::new(request, items)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/procurement/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Procurement request UUID")),
    request_body = UpdateProcurementDto,
    responses(
        (status = 200, description = "Request updated", body = ProcurementDetailDto),
        (status = 400, description = "Approval without approver", body = ApiError),
        (status = 404, description = "Request not found", body = ApiError),
        (status = 409, description = "Request no longer editable or transition not allowed", body = ApiError)
    ),
    tag = "procurement"
)]
pub async fn update_procurement(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateProcurementDto>,
) -> Result<Json<ProcurementDetailDto>, ApiError> {
    let ctx = TransitionContext::new(actor).with_approver(body.approver_id);
    let request = state
        .lifecycle
        .update_procurement_request(
            ctx,
            id,
            UpdateProcurement {
                expected_date: body.expected_date,
                total_budget: body.total_budget,
                notes: body.notes,
            },
            body.status,
        )
        .await?;
    let items = ProcurementRepository::new(&state.db)
        .items(actor.tenant_id, id)
        .await?;
    Ok(Json(ProcurementDetailDto::new(request, items)))
}

/// Delete a draft request and its items
#[utoipa::path(
    delete,
    path = "/api/v1/procurement/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Procurement request UUID")),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 404, description = "Request not found", body = ApiError),
        (status = 409, description = "Only drafts without purchase orders can be deleted", body = ApiError)
    ),
    tag = "procurement"
)]
pub async fn delete_procurement(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::ProcurementRequest, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
