//! # Procurement Request Repository
//!
//! Requests and their line items. Descriptive edits are compare-and-set on
//! the status the caller observed, so an edit never lands on a request that
//! left `draft`/`submitted` in the meantime.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};
use uuid::Uuid;

use super::Page;
use crate::error::RepositoryError;
use crate::models::procurement_item::{self, Entity as ProcurementItem};
use crate::models::procurement_request::{self, Entity as ProcurementRequest};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcurementFilter {
    pub status: Option<String>,
    pub requested_by_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateProcurement {
    pub expected_date: Option<DateTime<Utc>>,
    pub total_budget: Option<f64>,
    pub notes: Option<String>,
}

impl UpdateProcurement {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct ProcurementRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ProcurementRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<procurement_request::Model>, RepositoryError> {
        ProcurementRequest::find_by_id(id)
            .filter(procurement_request::Column::TenantId.eq(tenant_id))
            .filter(procurement_request::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn items(
        &self,
        tenant_id: Uuid,
        procurement_id: Uuid,
    ) -> Result<Vec<procurement_item::Model>, RepositoryError> {
        ProcurementItem::find()
            .filter(procurement_item::Column::ProcurementId.eq(procurement_id))
            .filter(procurement_item::Column::TenantId.eq(tenant_id))
            .filter(procurement_item::Column::DeletedAt.is_null())
            .order_by_asc(procurement_item::Column::CreatedAt)
            .order_by_asc(procurement_item::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: ProcurementFilter,
        page: Page,
    ) -> Result<Vec<procurement_request::Model>, RepositoryError> {
        let mut query = ProcurementRequest::find()
            .filter(procurement_request::Column::TenantId.eq(tenant_id))
            .filter(procurement_request::Column::DeletedAt.is_null());

        if let Some(status) = filter.status {
            query = query.filter(procurement_request::Column::Status.eq(status));
        }
        if let Some(person_id) = filter.requested_by_id {
            query = query.filter(procurement_request::Column::RequestedById.eq(person_id));
        }

        query
            .order_by_desc(procurement_request::Column::RequestDate)
            .order_by_desc(procurement_request::Column::RequestNumber)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Writes descriptive fields if the request still has `expected_status`.
    /// Returns rows affected.
    pub async fn update_details(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected_status: &str,
        changes: &UpdateProcurement,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        if changes.total_budget.is_some_and(|budget| budget < 0.0) {
            return Err(RepositoryError::Validation(
                "total_budget cannot be negative".to_string(),
            ));
        }

        let mut update = ProcurementRequest::update_many().col_expr(
            procurement_request::Column::UpdatedAt,
            Expr::value(now.fixed_offset()),
        );
        if let Some(date) = changes.expected_date {
            update = update.col_expr(
                procurement_request::Column::ExpectedDate,
                Expr::value(Some(date.fixed_offset())),
            );
        }
        if let Some(budget) = changes.total_budget {
            update = update.col_expr(
                procurement_request::Column::TotalBudget,
                Expr::value(Some(budget)),
            );
        }
        if let Some(notes) = &changes.notes {
            update = update.col_expr(
                procurement_request::Column::Notes,
                Expr::value(Some(notes.clone())),
            );
        }

        update
            .filter(procurement_request::Column::Id.eq(id))
            .filter(procurement_request::Column::TenantId.eq(tenant_id))
            .filter(procurement_request::Column::Status.eq(expected_status))
            .filter(procurement_request::Column::DeletedAt.is_null())
            .exec(self.db)
            .await
            .map(|result| result.rows_affected)
            .map_err(RepositoryError::database_error)
    }
}
