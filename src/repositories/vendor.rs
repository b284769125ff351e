//! # Vendor Repository

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{Page, require_text};
use crate::error::RepositoryError;
use crate::models::vendor::{self, ActiveModel as VendorActiveModel, Entity as Vendor};

#[derive(Debug, Clone, Default)]
pub struct CreateVendor {
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateVendor {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
}

pub struct VendorRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> VendorRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateVendor,
        now: DateTime<Utc>,
    ) -> Result<vendor::Model, RepositoryError> {
        require_text("name", &request.name)?;

        VendorActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            contact_name: Set(request.contact_name),
            contact_email: Set(request.contact_email),
            contact_phone: Set(request.contact_phone),
            address: Set(request.address),
            website: Set(request.website),
            notes: Set(request.notes),
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
    ) -> Result<Option<vendor::Model>, RepositoryError> {
        Vendor::find_by_id(id)
            .filter(vendor::Column::TenantId.eq(tenant_id))
            .filter(vendor::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        page: Page,
    ) -> Result<Vec<vendor::Model>, RepositoryError> {
        Vendor::find()
            .filter(vendor::Column::TenantId.eq(tenant_id))
            .filter(vendor::Column::DeletedAt.is_null())
            .order_by_asc(vendor::Column::Name)
            .order_by_asc(vendor::Column::Id)
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
        changes: UpdateVendor,
        now: DateTime<Utc>,
    ) -> Result<vendor::Model, RepositoryError> {
        let existing = self
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("vendor".to_string()))?;

        let mut active = existing.into_active_model();
        if let Some(name) = changes.name {
            require_text("name", &name)?;
            active.name = Set(name.trim().to_string());
        }
        if let Some(value) = changes.contact_name {
            active.contact_name = Set(Some(value));
        }
        if let Some(value) = changes.contact_email {
            active.contact_email = Set(Some(value));
        }
        if let Some(value) = changes.contact_phone {
            active.contact_phone = Set(Some(value));
        }
        if let Some(value) = changes.address {
            active.address = Set(Some(value));
        }
        if let Some(value) = changes.website {
            active.website = Set(Some(value));
        }
        if let Some(value) = changes.notes {
            active.notes = Set(Some(value));
        }
        active.updated_at = Set(now.into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
