//! # Tenant Repository
//!
//! Tenants are the isolation boundary; they are created and listed but
//! never soft-deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use super::require_text;
use crate::error::RepositoryError;
use crate::models::tenant::{self, ActiveModel as TenantActiveModel, Entity as Tenant};

/// Request data for creating a new tenant
#[derive(Debug, Clone)]
pub struct CreateTenantRequest {
    pub name: String,
}

/// Repository for Tenant database operations
pub struct TenantRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TenantRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        request: CreateTenantRequest,
        now: DateTime<Utc>,
    ) -> Result<tenant::Model, RepositoryError> {
        require_text("name", &request.name)?;

        TenantActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(Some(request.name.trim().to_string())),
            created_at: Set(now.into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, tenant_id: Uuid) -> Result<Option<tenant::Model>, RepositoryError> {
        Tenant::find_by_id(tenant_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(&self) -> Result<Vec<tenant::Model>, RepositoryError> {
        Tenant::find()
            .order_by_asc(tenant::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
