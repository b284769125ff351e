//! # Asset Category API Handlers
//!
//! Categories form a tree per tenant. Re-parenting is checked against cycles
//! by the lifecycle service.

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
use crate::models::asset_category;
use crate::repositories::{AssetCategoryRepository, CreateCategory, Page, UpdateCategory};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryDto {
    #[schema(example = "Laptops")]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// Partial update; `parent_id: null` detaches the category from its parent
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCategoryDto {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<asset_category::Model> for CategoryDto {
    fn from(model: asset_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            parent_id: model.parent_id,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// Only direct children of this category
    pub parent_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    params(TenantHeader),
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 400, description = "Validation failed or unknown parent", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiJson(body): ApiJson<CreateCategoryDto>,
) -> Result<(StatusCode, Json<CategoryDto>), ApiError> {
    let category = state
        .lifecycle
        .create_category(
            actor,
            CreateCategory {
                name: body.name,
                description: body.description,
                parent_id: body.parent_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(TenantHeader, ListCategoriesQuery),
    responses(
        (status = 200, description = "Categories", body = ListResponse<CategoryDto>)
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListCategoriesQuery>,
) -> Result<Json<ListResponse<CategoryDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let categories = AssetCategoryRepository::new(&state.db)
        .list(tenant.0, query.parent_id, page)
        .await?;
    Ok(Json(ListResponse::new(categories, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Category UUID")),
    responses(
        (status = 200, description = "Category", body = CategoryDto),
        (status = 404, description = "Category not found", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryDto>, ApiError> {
    AssetCategoryRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|category| Json(category.into()))
        .ok_or_else(|| ApiError::not_found(format!("asset_category {id} not found")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Category UUID")),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = CategoryDto),
        (status = 400, description = "Unknown parent or cycle", body = ApiError),
        (status = 404, description = "Category not found", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateCategoryDto>,
) -> Result<Json<CategoryDto>, ApiError> {
    let category = state
        .lifecycle
        .update_category(
            actor,
            id,
            UpdateCategory {
                name: body.name,
                description: body.description,
                parent_id: body.parent_id,
            },
        )
        .await?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Category UUID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ApiError),
        (status = 409, description = "Category still has assets or children", body = ApiError)
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::AssetCategory, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
