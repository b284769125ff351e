//! # Asset Category Repository
//!
//! Categories form a per-tenant tree through `parent_id`. Callers run the
//! hierarchy guard before handing a parent to `create` or `update`.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{Page, require_text};
use crate::error::RepositoryError;
use crate::models::asset_category::{self, ActiveModel as CategoryActiveModel, Entity as Category};

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// Fields left `None` are unchanged. `parent_id: Some(None)` detaches the node.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
}

pub struct AssetCategoryRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AssetCategoryRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateCategory,
        now: DateTime<Utc>,
    ) -> Result<asset_category::Model, RepositoryError> {
        require_text("name", &request.name)?;

        CategoryActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
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
    ) -> Result<Option<asset_category::Model>, RepositoryError> {
        Category::find_by_id(id)
            .filter(asset_category::Column::TenantId.eq(tenant_id))
            .filter(asset_category::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Lists categories, optionally only the direct children of `parent_id`.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        parent_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<asset_category::Model>, RepositoryError> {
        let mut query = Category::find()
            .filter(asset_category::Column::TenantId.eq(tenant_id))
            .filter(asset_category::Column::DeletedAt.is_null());
        if let Some(parent) = parent_id {
            query = query.filter(asset_category::Column::ParentId.eq(parent));
        }

        query
            .order_by_asc(asset_category::Column::Name)
            .order_by_asc(asset_category::Column::Id)
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
        changes: UpdateCategory,
        now: DateTime<Utc>,
    ) -> Result<asset_category::Model, RepositoryError> {
        let existing = self
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("asset category".to_string()))?;

        let mut active = existing.into_active_model();
        if let Some(name) = changes.name {
            require_text("name", &name)?;
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
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
