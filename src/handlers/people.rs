//! # People API Handlers

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
use crate::models::person;
use crate::repositories::{CreatePerson, Page, PersonRepository};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePersonDto {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Defaults to "staff"
    #[serde(default)]
    #[schema(example = "manager")]
    pub role: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PersonDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<person::Model> for PersonDto {
    fn from(model: person::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            position: model.position,
            phone: model.phone,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListPeopleQuery {
    /// Page size (default 100, max 500)
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Register a person in the tenant
#[utoipa::path(
    post,
    path = "/api/v1/people",
    params(TenantHeader),
    request_body = CreatePersonDto,
    responses(
        (status = 201, description = "Person created", body = PersonDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Email already in use", body = ApiError)
    ),
    tag = "people"
)]
pub async fn create_person(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiJson(body): ApiJson<CreatePersonDto>,
) -> Result<(StatusCode, Json<PersonDto>), ApiError> {
    let person = PersonRepository::new(&state.db)
        .create(
            tenant.0,
            CreatePerson {
                name: body.name,
                email: body.email,
                role: body.role.unwrap_or_default(),
                position: body.position,
                phone: body.phone,
            },
            state.lifecycle.clock().now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(person.into())))
}

/// List people of the tenant
#[utoipa::path(
    get,
    path = "/api/v1/people",
    params(TenantHeader, ListPeopleQuery),
    responses(
        (status = 200, description = "People", body = ListResponse<PersonDto>)
    ),
    tag = "people"
)]
pub async fn list_people(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListPeopleQuery>,
) -> Result<Json<ListResponse<PersonDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let people = PersonRepository::new(&state.db).list(tenant.0, page).await?;
    Ok(Json(ListResponse::new(people, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/people/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Person UUID")),
    responses(
        (status = 200, description = "Person", body = PersonDto),
        (status = 404, description = "Person not found", body = ApiError)
    ),
    tag = "people"
)]
pub async fn get_person(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonDto>, ApiError> {
    PersonRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|person| Json(person.into()))
        .ok_or_else(|| ApiError::not_found(format!("person {id} not found")))
}

/// Soft-delete a person; blocked while they hold active assignments
#[utoipa::path(
    delete,
    path = "/api/v1/people/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Person UUID")),
    responses(
        (status = 204, description = "Person deleted"),
        (status = 404, description = "Person not found", body = ApiError),
        (status = 409, description = "Person still holds assets", body = ApiError)
    ),
    tag = "people"
)]
pub async fn delete_person(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::Person, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
