//! # Location API Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiQuery, ListResponse, double_option, utc};
use crate::auth::{ActorExtension, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::lifecycle::{DeleteTarget, EntityKind};
use crate::models::location;
use crate::repositories::{CreateLocation, LocationRepository, Page, UpdateLocation};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateLocationDto {
    #[schema(example = "HQ - Floor 3")]
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    #[schema(example = "office")]
    pub location_type: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateLocationDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub location_type: Option<String>,
    /// `null` detaches the location from its parent
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub location_type: Option<String>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<location::Model> for LocationDto {
    fn from(model: location::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            address: model.address,
            location_type: model.location_type,
            parent_id: model.parent_id,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListLocationsQuery {
    /// Only direct children of this location
    pub parent_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    params(TenantHeader),
    request_body = CreateLocationDto,
    responses(
        (status = 201, description = "Location created", body = LocationDto),
        (status = 400, description = "Validation failed or unknown parent", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiJson(body): ApiJson<CreateLocationDto>,
) -> Result<(StatusCode, Json<LocationDto>), ApiError> {
    let location = state
        .lifecycle
        .create_location(
            actor,
            CreateLocation {
                name: body.name,
                description: body.description,
                address: body.address,
                location_type: body.location_type,
                parent_id: body.parent_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(location.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    params(TenantHeader, ListLocationsQuery),
    responses(
        (status = 200, description = "Locations", body = ListResponse<LocationDto>)
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListLocationsQuery>,
) -> Result<Json<ListResponse<LocationDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let locations = LocationRepository::new(&state.db)
        .list(tenant.0, query.parent_id, page)
        .await?;
    Ok(Json(ListResponse::new(locations, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Location UUID")),
    responses(
        (status = 200, description = "Location", body = LocationDto),
        (status = 404, description = "Location not found", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<LocationDto>, ApiError> {
    LocationRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|location| Json(location.into()))
        .ok_or_else(|| ApiError::not_found(format!("location {id} not found")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/locations/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Location UUID")),
    request_body = UpdateLocationDto,
    responses(
        (status = 200, description = "Location updated", body = LocationDto),
        (status = 400, description = "Unknown parent or cycle", body = ApiError),
        (status = 404, description = "Location not found", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateLocationDto>,
) -> Result<Json<LocationDto>, ApiError> {
    let location = state
        .lifecycle
        .update_location(
            actor,
            id,
            UpdateLocation {
                name: body.name,
                description: body.description,
                address: body.address,
                location_type: body.location_type,
                parent_id: body.parent_id,
            },
        )
        .await?;
    Ok(Json(location.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Location UUID")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Location not found", body = ApiError),
        (status = 409, description = "Location still has assets or children", body = ApiError)
    ),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::Location, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
