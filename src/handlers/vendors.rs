//! # Vendor API Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiQuery, ListResponse, utc};
use crate::auth::{ActorExtension, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::lifecycle::{DeleteTarget, EntityKind};
use crate::models::vendor;
use crate::repositories::{CreateVendor, Page, UpdateVendor, VendorRepository};
use crate::server::AppState;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct VendorFieldsDto {
    #[schema(example = "Northwind Supplies")]
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VendorDto {
    pub id: Uuid,
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<vendor::Model> for VendorDto {
    fn from(model: vendor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            contact_name: model.contact_name,
            contact_email: model.contact_email,
            contact_phone: model.contact_phone,
            address: model.address,
            website: model.website,
            notes: model.notes,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListVendorsQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Create a vendor; `name` is required
#[utoipa::path(
    post,
    path = "/api/v1/vendors",
    params(TenantHeader),
    request_body = VendorFieldsDto,
    responses(
        (status = 201, description = "Vendor created", body = VendorDto),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiJson(body): ApiJson<VendorFieldsDto>,
) -> Result<(StatusCode, Json<VendorDto>), ApiError> {
    let vendor = VendorRepository::new(&state.db)
        .create(
            tenant.0,
            CreateVendor {
                name: body.name.unwrap_or_default(),
                contact_name: body.contact_name,
                contact_email: body.contact_email,
                contact_phone: body.contact_phone,
                address: body.address,
                website: body.website,
                notes: body.notes,
            },
            state.lifecycle.clock().now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(vendor.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/vendors",
    params(TenantHeader, ListVendorsQuery),
    responses(
        (status = 200, description = "Vendors", body = ListResponse<VendorDto>)
    ),
    tag = "vendors"
)]
pub async fn list_vendors(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListVendorsQuery>,
) -> Result<Json<ListResponse<VendorDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let vendors = VendorRepository::new(&state.db).list(tenant.0, page).await?;
    Ok(Json(ListResponse::new(vendors, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Vendor UUID")),
    responses(
        (status = 200, description = "Vendor", body = VendorDto),
        (status = 404, description = "Vendor not found", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorDto>, ApiError> {
    VendorRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|vendor| Json(vendor.into()))
        .ok_or_else(|| ApiError::not_found(format!("vendor {id} not found")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/vendors/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Vendor UUID")),
    request_body = VendorFieldsDto,
    responses(
        (status = 200, description = "Vendor updated", body = VendorDto),
        (status = 404, description = "Vendor not found", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<VendorFieldsDto>,
) -> Result<Json<VendorDto>, ApiError> {
    let vendor = VendorRepository::new(&state.db)
        .update(
            tenant.0,
            id,
            UpdateVendor {
                name: body.name,
                contact_name: body.contact_name,
                contact_email: body.contact_email,
                contact_phone: body.contact_phone,
                address: body.address,
                website: body.website,
                notes: body.notes,
            },
            state.lifecycle.clock().now(),
        )
        .await?;
    Ok(Json(vendor.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Vendor UUID")),
    responses(
        (status = 204, description = "Vendor deleted"),
        (status = 404, description = "Vendor not found", body = ApiError),
        (status = 409, description = "Vendor still has purchase orders", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn delete_vendor(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::Vendor, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
