//! # Purchase Order Repository

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use super::Page;
use crate::error::RepositoryError;
use crate::models::purchase_order::{self, Entity as PurchaseOrder};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseOrderFilter {
    pub vendor_id: Option<Uuid>,
    pub procurement_id: Option<Uuid>,
    pub status: Option<String>,
}

pub struct PurchaseOrderRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> PurchaseOrderRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<purchase_order::Model>, RepositoryError> {
        PurchaseOrder::find_by_id(id)
            .filter(purchase_order::Column::TenantId.eq(tenant_id))
            .filter(purchase_order::Column::DeletedAt.is_null())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: PurchaseOrderFilter,
        page: Page,
    ) -> Result<Vec<purchase_order::Model>, RepositoryError> {
        let mut query = PurchaseOrder::find()
            .filter(purchase_order::Column::TenantId.eq(tenant_id))
            .filter(purchase_order::Column::DeletedAt.is_null());

        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(purchase_order::Column::VendorId.eq(vendor_id));
        }
        if let Some(procurement_id) = filter.procurement_id {
            query = query.filter(purchase_order::Column::ProcurementId.eq(procurement_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }

        query
            .order_by_desc(purchase_order::Column::OrderDate)
            .order_by_desc(purchase_order::Column::OrderNumber)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
