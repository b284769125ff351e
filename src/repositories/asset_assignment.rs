//! # Asset Assignment Repository

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};
use uuid::Uuid;

use super::Page;
use crate::error::RepositoryError;
use crate::models::asset_assignment::{self, Entity as AssetAssignment};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub asset_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Descriptive fields of an assignment. The status moves through the
/// lifecycle service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateAssignment {
    pub notes: Option<String>,
    pub expected_return: Option<DateTime<Utc>>,
}

impl UpdateAssignment {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none() && self.expected_return.is_none()
    }
}

pub struct AssignmentRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AssignmentRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<asset_assignment::Model>, RepositoryError> {
        AssetAssignment::find_by_id(id)
            .filter(asset_assignment::Column::TenantId.eq(tenant_id))
            .filter(asset_assignment::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: AssignmentFilter,
        page: Page,
    ) -> Result<Vec<asset_assignment::Model>, RepositoryError> {
        let mut query = AssetAssignment::find()
            .filter(asset_assignment::Column::TenantId.eq(tenant_id))
            .filter(asset_assignment::Column::DeletedAt.is_null());

        if let Some(asset_id) = filter.asset_id {
            query = query.filter(asset_assignment::Column::AssetId.eq(asset_id));
        }
        if let Some(person_id) = filter.assigned_to_id {
            query = query.filter(asset_assignment::Column::AssignedToId.eq(person_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(asset_assignment::Column::Status.eq(status));
        }

        query
            .order_by_desc(asset_assignment::Column::AssignmentDate)
            .order_by_asc(asset_assignment::Column::Id)
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
        changes: &UpdateAssignment,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut update = AssetAssignment::update_many()
            .col_expr(
                asset_assignment::Column::UpdatedAt,
                Expr::value(now.fixed_offset()),
            );
        if let Some(notes) = &changes.notes {
            update = update.col_expr(
                asset_assignment::Column::Notes,
                Expr::value(Some(notes.clone())),
            );
        }
        if let Some(date) = changes.expected_return {
            update = update.col_expr(
                asset_assignment::Column::ExpectedReturn,
                Expr::value(Some(date.fixed_offset())),
            );
        }

        update
            .filter(asset_assignment::Column::Id.eq(id))
            .filter(asset_assignment::Column::TenantId.eq(tenant_id))
            .filter(asset_assignment::Column::DeletedAt.is_null())
            .exec(self.db)
            .await
            .map(|result| result.rows_affected)
            .map_err(RepositoryError::database_error)
    }
}
