//! # Location Repository
//!
//! Locations nest like categories (site, building, room). The hierarchy
//! guard runs in the lifecycle layer before a parent is written.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{Page, require_text};
use crate::error::RepositoryError;
use crate::models::location::{self, ActiveModel as LocationActiveModel, Entity as Location};

#[derive(Debug, Clone)]
pub struct CreateLocation {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub location_type: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLocation {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub location_type: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
}

pub struct LocationRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LocationRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateLocation,
        now: DateTime<Utc>,
    ) -> Result<location::Model, RepositoryError> {
        require_text("name", &request.name)?;

        LocationActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            address: Set(request.address),
            location_type: Set(request.location_type),
            parent_id: Set(request.parent_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<location::Model>, RepositoryError> {
        Location::find_by_id(id)
            .filter(location::Column::TenantId.eq(tenant_id))
            .filter(location::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        parent_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<location::Model>, RepositoryError> {
        let mut query = Location::find()
            .filter(location::Column::TenantId.eq(tenant_id))
            .filter(location::Column::DeletedAt.is_null());
        if let Some(parent) = parent_id {
            query = query.filter(location::Column::ParentId.eq(parent));
        }

        query
            .order_by_asc(location::Column::Name)
            .order_by_asc(location::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UpdateLocation,
        now: DateTime<Utc>,
    ) -> Result<location::Model, RepositoryError> {
        let existing = self
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("location".to_string()))?;

        let mut active = existing.into_active_model();
        if let Some(name) = changes.name {
            require_text("name", &name)?;
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(address) = changes.address {
            active.address = Set(Some(address));
        }
        if let Some(location_type) = changes.location_type {
            active.location_type = Set(Some(location_type));
        }
        if let Some(parent_id) = changes.parent_id {
            active.parent_id = Set(parent_id);
        }
        active.updated_at = Set(now.into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
