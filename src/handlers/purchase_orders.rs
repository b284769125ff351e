//! # Purchase Order API Handlers

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
use crate::lifecycle::{DeleteTarget, EntityKind, NewPurchaseOrder};
use crate::models::purchase_order;
use crate::repositories::{Page, PurchaseOrderFilter, PurchaseOrderRepository};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePurchaseOrderDto {
    pub vendor_id: Uuid,
    /// Linked procurement request; must be `approved` or `ordered`
    pub procurement_id: Option<Uuid>,
    /// Defaults to the `X-Person-Id` caller
    pub created_by_id: Option<Uuid>,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub delivery_address: Option<String>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseOrderDto {
    pub id: Uuid,
    #[schema(example = "PO-20240115-001")]
    pub order_number: String,
    pub procurement_id: Option<Uuid>,
    pub vendor_id: Uuid,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub delivery_address: Option<String>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<purchase_order::Model> for PurchaseOrderDto {
    fn from(model: purchase_order::Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            procurement_id: model.procurement_id,
            vendor_id: model.vendor_id,
            status: model.status,
            order_date: utc(model.order_date),
            expected_delivery: utc_opt(model.expected_delivery),
            delivery_address: model.delivery_address,
            total_amount: model.total_amount,
            notes: model.notes,
            created_by_id: model.created_by_id,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListPurchaseOrdersQuery {
    pub vendor_id: Option<Uuid>,
    pub procurement_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    params(TenantHeader),
    request_body = CreatePurchaseOrderDto,
    responses(
        (status = 201, description = "Purchase order created", body = PurchaseOrderDto),
        (status = 400, description = "Unknown vendor or request", body = ApiError),
        (status = 409, description = "Request is not approved", body = ApiError)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiJson(body): ApiJson<CreatePurchaseOrderDto>,
) -> Result<(StatusCode, Json<PurchaseOrderDto>), ApiError> {
    let order = state
        .lifecycle
        .create_purchase_order(
            actor,
            NewPurchaseOrder {
                vendor_id: body.vendor_id,
                procurement_id: body.procurement_id,
                created_by_id: body.created_by_id,
                expected_delivery: body.expected_delivery,
                delivery_address: body.delivery_address,
                total_amount: body.total_amount,
                notes: body.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(TenantHeader, ListPurchaseOrdersQuery),
    responses(
        (status = 200, description = "Purchase orders, newest first", body = ListResponse<PurchaseOrderDto>)
    ),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListPurchaseOrdersQuery>,
) -> Result<Json<ListResponse<PurchaseOrderDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let filter = PurchaseOrderFilter {
        vendor_id: query.vendor_id,
        procurement_id: query.procurement_id,
        status: query.status,
    };
    let orders = PurchaseOrderRepository::new(&state.db)
        .list(tenant.0, filter, page)
        .await?;
    Ok(Json(ListResponse::new(orders, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Purchase order UUID")),
    responses(
        (status = 200, description = "Purchase order", body = PurchaseOrderDto),
        (status = 404, description = "Purchase order not found", body = ApiError)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrderDto>, ApiError> {
    PurchaseOrderRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|order| Json(order.into()))
        .ok_or_else(|| ApiError::not_found(format!("purchase_order {id} not found")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Purchase order UUID")),
    responses(
        (status = 204, description = "Purchase order deleted"),
        (status = 404, description = "Purchase order not found", body = ApiError)
    ),
    tag = "purchase-orders"
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::PurchaseOrder, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
