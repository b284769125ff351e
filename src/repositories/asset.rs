//! # Asset Repository
//!
//! Descriptive asset data. `status` and `current_assignee_id` are only ever
//! written by the lifecycle layer; `create` takes an initial status the
//! service has already checked.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{Page, require_text};
use crate::error::RepositoryError;
use crate::models::asset::{self, ActiveModel as AssetActiveModel, Entity as Asset};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateAsset {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_price: Option<f64>,
    pub warranty_expiry: Option<DateTime<Utc>>,
    pub location_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateAsset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_price: Option<f64>,
    pub warranty_expiry: Option<DateTime<Utc>>,
    pub location_id: Option<Option<Uuid>>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilter {
    pub category_id: Option<Uuid>,
    pub status: Option<String>,
    pub location_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    /// Case-sensitive substring of the name or serial number
    pub search: Option<String>,
}

pub struct AssetRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AssetRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        status: &str,
        request: CreateAsset,
        now: DateTime<Utc>,
    ) -> Result<asset::Model, RepositoryError> {
        require_text("name", &request.name)?;
        if request.purchase_price.is_some_and(|price| price < 0.0) {
            return Err(RepositoryError::Validation(
                "purchase_price cannot be negative".to_string(),
            ));
        }

        AssetActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            description: Set(request.description),
            category_id: Set(request.category_id),
            serial_number: Set(request.serial_number),
            model_number: Set(request.model_number),
            manufacturer: Set(request.manufacturer),
            purchase_date: Set(request.purchase_date.map(|date| date.fixed_offset())),
            purchase_price: Set(request.purchase_price),
            warranty_expiry: Set(request.warranty_expiry.map(|date| date.fixed_offset())),
            status: Set(status.to_string()),
            location_id: Set(request.location_id),
            current_assignee_id: Set(None),
            notes: Set(request.notes),
            tags: Set(request.tags),
            barcode: Set(request.barcode),
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
    ) -> Result<Option<asset::Model>, RepositoryError> {
        Asset::find_by_id(id)
            .filter(asset::Column::TenantId.eq(tenant_id))
            .filter(asset::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: AssetFilter,
        page: Page,
    ) -> Result<Vec<asset::Model>, RepositoryError> {
        let mut query = Asset::find()
            .filter(asset::Column::TenantId.eq(tenant_id))
            .filter(asset::Column::DeletedAt.is_null());

        if let Some(category_id) = filter.category_id {
            query = query.filter(asset::Column::CategoryId.eq(category_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(asset::Column::Status.eq(status));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(asset::Column::LocationId.eq(location_id));
        }
        if let Some(assignee_id) = filter.assignee_id {
            query = query.filter(asset::Column::CurrentAssigneeId.eq(assignee_id));
        }
        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let search = search.trim();
            query = query.filter(
                sea_orm::Condition::any()
                    .add(asset::Column::Name.contains(search))
                    .add(asset::Column::SerialNumber.contains(search)),
            );
        }

        query
            .order_by_desc(asset::Column::CreatedAt)
            .order_by_asc(asset::Column::Id)
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
        changes: UpdateAsset,
        now: DateTime<Utc>,
    ) -> Result<asset::Model, RepositoryError> {
        let existing = self
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("asset".to_string()))?;

        let mut active = existing.into_active_model();
        if let Some(name) = changes.name {
            require_text("name", &name)?;
            active.name = Set(name.trim().to_string());
        }
        if let Some(value) = changes.description {
            active.description = Set(Some(value));
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(value) = changes.serial_number {
            active.serial_number = Set(Some(value));
        }
        if let Some(value) = changes.model_number {
            active.model_number = Set(Some(value));
        }
        if let Some(value) = changes.manufacturer {
            active.manufacturer = Set(Some(value));
        }
        if let Some(date) = changes.purchase_date {
            active.purchase_date = Set(Some(date.fixed_offset()));
        }
        if let Some(price) = changes.purchase_price {
            if price < 0.0 {
                return Err(RepositoryError::Validation(
                    "purchase_price cannot be negative".to_string(),
                ));
            }
            active.purchase_price = Set(Some(price));
        }
        if let Some(date) = changes.warranty_expiry {
            active.warranty_expiry = Set(Some(date.fixed_offset()));
        }
        if let Some(location_id) = changes.location_id {
            active.location_id = Set(location_id);
        }
        if let Some(value) = changes.notes {
            active.notes = Set(Some(value));
        }
        if let Some(value) = changes.tags {
            active.tags = Set(Some(value));
        }
        if let Some(value) = changes.barcode {
            active.barcode = Set(Some(value));
        }
        active.updated_at = Set(now.into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
