//! # Maintenance Record Repository

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};
use uuid::Uuid;

use super::Page;
use crate::error::RepositoryError;
use crate::models::maintenance_record::{self, Entity as MaintenanceRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceFilter {
    pub asset_id: Option<Uuid>,
    pub status: Option<String>,
    pub maintenance_type: Option<String>,
}

/// Descriptive fields of a maintenance record. References are checked by
/// the lifecycle service before they reach this layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMaintenance {
    pub description: Option<String>,
    pub results: Option<String>,
    pub cost: Option<f64>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub performed_by_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub next_scheduled: Option<DateTime<Utc>>,
}

impl UpdateMaintenance {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct MaintenanceRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> MaintenanceRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<maintenance_record::Model>, RepositoryError> {
        MaintenanceRecord::find_by_id(id)
            .filter(maintenance_record::Column::TenantId.eq(tenant_id))
            .filter(maintenance_record::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: MaintenanceFilter,
        page: Page,
    ) -> Result<Vec<maintenance_record::Model>, RepositoryError> {
        let mut query = MaintenanceRecord::find()
            .filter(maintenance_record::Column::TenantId.eq(tenant_id))
            .filter(maintenance_record::Column::DeletedAt.is_null());

        if let Some(asset_id) = filter.asset_id {
            query = query.filter(maintenance_record::Column::AssetId.eq(asset_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(maintenance_record::Column::Status.eq(status));
        }
        if let Some(kind) = filter.maintenance_type {
            query = query.filter(maintenance_record::Column::MaintenanceType.eq(kind));
        }

        query
            .order_by_desc(maintenance_record::Column::ScheduledDate)
            .order_by_asc(maintenance_record::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Writes descriptive fields; returns rows affected.
    pub async fn update_details(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: &UpdateMaintenance,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        if changes.cost.is_some_and(|cost| cost < 0.0) {
            return Err(RepositoryError::Validation(
                "cost cannot be negative".to_string(),
            ));
        }
        if changes
            .description
            .as_deref()
            .is_some_and(|text| text.trim().is_empty())
        {
            return Err(RepositoryError::Validation(
                "description is required".to_string(),
            ));
        }

        let mut update = MaintenanceRecord::update_many().col_expr(
            maintenance_record::Column::UpdatedAt,
            Expr::value(now.fixed_offset()),
        );
        if let Some(description) = &changes.description {
            update = update.col_expr(
                maintenance_record::Column::Description,
                Expr::value(description.clone()),
            );
        }
        if let Some(results) = &changes.results {
            update = update.col_expr(
                maintenance_record::Column::Results,
                Expr::value(Some(results.clone())),
            );
        }
        if let Some(cost) = changes.cost {
            update = update.col_expr(maintenance_record::Column::Cost, Expr::value(Some(cost)));
        }
        if let Some(date) = changes.scheduled_date {
            update = update.col_expr(
                maintenance_record::Column::ScheduledDate,
                Expr::value(date.fixed_offset()),
            );
        }
        if let Some(person_id) = changes.performed_by_id {
            update = update.col_expr(
                maintenance_record::Column::PerformedById,
                Expr::value(Some(person_id)),
            );
        }
        if let Some(vendor_id) = changes.vendor_id {
            update = update.col_expr(
                maintenance_record::Column::VendorId,
                Expr::value(Some(vendor_id)),
            );
        }
        if let Some(date) = changes.next_scheduled {
            update = update.col_expr(
                maintenance_record::Column::NextScheduled,
                Expr::value(Some(date.fixed_offset())),
            );
        }

        update
            .filter(maintenance_record::Column::Id.eq(id))
            .filter(maintenance_record::Column::TenantId.eq(tenant_id))
            .filter(maintenance_record::Column::DeletedAt.is_null())
            .exec(self.db)
            .await
            .map(|result| result.rows_affected)
            .map_err(RepositoryError::database_error)
    }
}
