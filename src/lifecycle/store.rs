//! Persistence collaborator for the lifecycle layer.
//!
//! `LifecycleStore` is the only way the validator, enforcer and numbering
//! sequence reach storage. Every read is tenant-scoped and ignores
//! soft-deleted rows. `SeaOrmStore` implements it over any SeaORM
//! connection; handing it a `DatabaseTransaction` makes the transaction the
//! unit of work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::error::ApplyError;
use super::status::{AssignmentStatus, EntityKind, LifecycleStatus, MaintenanceStatus};
use super::transition::{AssigneeChange, DependentUpdate, NewRecord, TransitionTarget};
use crate::models::{
    asset, asset_assignment, asset_category, document_sequence, location, maintenance_record,
    person, procurement_item, procurement_request, purchase_order, vendor,
};

/// Rows that can block a delete or influence a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependents {
    AssetsInCategory(Uuid),
    ChildCategories(Uuid),
    AssetsAtLocation(Uuid),
    ChildLocations(Uuid),
    /// Scheduled or in-progress maintenance on an asset
    OpenMaintenance(Uuid),
    InProgressMaintenance(Uuid),
    ActiveAssignmentsOfAsset(Uuid),
    ActiveAssignmentsOfPerson(Uuid),
    PurchaseOrdersOfVendor(Uuid),
    PurchaseOrdersOfRequest(Uuid),
}

impl Dependents {
    /// Human readable name used in `HasDependents` messages.
    pub fn label(self) -> &'static str {
        match self {
            Dependents::AssetsInCategory(_) | Dependents::AssetsAtLocation(_) => "assets",
            Dependents::ChildCategories(_) => "child categories",
            Dependents::ChildLocations(_) => "child locations",
            Dependents::OpenMaintenance(_) => "open maintenance records",
            Dependents::InProgressMaintenance(_) => "in-progress maintenance records",
            Dependents::ActiveAssignmentsOfAsset(_) | Dependents::ActiveAssignmentsOfPerson(_) => {
                "active assignments"
            }
            Dependents::PurchaseOrdersOfVendor(_) | Dependents::PurchaseOrdersOfRequest(_) => {
                "purchase orders"
            }
        }
    }
}

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    async fn find_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<asset::Model>, DbErr>;

    async fn find_assignment(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<asset_assignment::Model>, DbErr>;

    async fn find_maintenance(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<maintenance_record::Model>, DbErr>;

    async fn find_procurement_request(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<procurement_request::Model>, DbErr>;

    /// Whether a live row of `kind` with this id exists in the tenant.
    async fn exists(&self, tenant_id: Uuid, kind: EntityKind, id: Uuid) -> Result<bool, DbErr>;

    /// `None` when the node does not exist, `Some(parent_id)` otherwise.
    /// Only categories and locations form hierarchies.
    async fn parent_of(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<Option<Uuid>>, DbErr>;

    async fn active_assignment(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<asset_assignment::Model>, DbErr>;

    async fn count_dependents(&self, tenant_id: Uuid, dependents: Dependents)
    -> Result<u64, DbErr>;

    /// Compare-and-set of the primary status; returns rows affected.
    async fn write_transition(
        &self,
        tenant_id: Uuid,
        target: &TransitionTarget,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError>;

    /// Compare-and-set of a dependent entity; returns rows affected.
    async fn write_dependent(
        &self,
        tenant_id: Uuid,
        update: &DependentUpdate,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError>;

    async fn insert_record(&self, record: &NewRecord) -> Result<(), ApplyError>;

    /// Marks a row deleted. When `expected_status` is given the row must
    /// still carry it. Returns rows affected.
    async fn soft_delete(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        id: Uuid,
        expected_status: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError>;

    async fn soft_delete_items(
        &self,
        tenant_id: Uuid,
        procurement_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError>;

    /// Increments and returns the counter for `(tenant, prefix, day)`,
    /// creating it at 1.
    async fn bump_sequence(
        &self,
        tenant_id: Uuid,
        prefix: &str,
        day: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, ApplyError>;
}

/// `LifecycleStore` over a SeaORM connection or transaction.
pub struct SeaOrmStore<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> SeaOrmStore<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

fn stamp(now: DateTime<Utc>) -> DateTimeWithTimeZone {
    now.fixed_offset()
}

macro_rules! live_count {
    ($db:expr, $module:ident, $tenant:expr, $($filter:expr),+) => {
        $module::Entity::find()
            .filter($module::Column::TenantId.eq($tenant))
            .filter($module::Column::DeletedAt.is_null())
            $(.filter($filter))+
            .count($db)
            .await
    };
}

macro_rules! soft_delete_rows {
    ($db:expr, $module:ident, $tenant:expr, $id:expr, $now:expr, $expected:expr) => {{
        let mut update = $module::Entity::update_many()
            .col_expr($module::Column::DeletedAt, Expr::value(Some($now)))
            .col_expr($module::Column::UpdatedAt, Expr::value($now))
            .filter($module::Column::Id.eq($id))
            .filter($module::Column::TenantId.eq($tenant))
            .filter($module::Column::DeletedAt.is_null());
        if let Some(expected) = $expected {
            update = update.filter($module::Column::Status.eq(expected));
        }
        update.exec($db).await.map(|res| res.rows_affected)
    }};
    ($db:expr, $module:ident, $tenant:expr, $id:expr, $now:expr) => {{
        $module::Entity::update_many()
            .col_expr($module::Column::DeletedAt, Expr::value(Some($now)))
            .col_expr($module::Column::UpdatedAt, Expr::value($now))
            .filter($module::Column::Id.eq($id))
            .filter($module::Column::TenantId.eq($tenant))
            .filter($module::Column::DeletedAt.is_null())
            .exec($db)
            .await
            .map(|res| res.rows_affected)
    }};
}

#[async_trait]
impl<C: ConnectionTrait> LifecycleStore for SeaOrmStore<'_, C> {
    async fn find_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<asset::Model>, DbErr> {
        asset::Entity::find_by_id(id)
            .filter(asset::Column::TenantId.eq(tenant_id))
            .filter(asset::Column::DeletedAt.is_null())
            .one(self.db)
            .await
    }

    async fn find_assignment(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<asset_assignment::Model>, DbErr> {
        asset_assignment::Entity::find_by_id(id)
            .filter(asset_assignment::Column::TenantId.eq(tenant_id))
            .filter(asset_assignment::Column::DeletedAt.is_null())
            .one(self.db)
            .await
    }

    async fn find_maintenance(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<maintenance_record::Model>, DbErr> {
        maintenance_record::Entity::find_by_id(id)
            .filter(maintenance_record::Column::TenantId.eq(tenant_id))
            .filter(maintenance_record::Column::DeletedAt.is_null())
            .one(self.db)
            .await
    }

    async fn find_procurement_request(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<procurement_request::Model>, DbErr> {
        procurement_request::Entity::find_by_id(id)
            .filter(procurement_request::Column::TenantId.eq(tenant_id))
            .filter(procurement_request::Column::DeletedAt.is_null())
            .one(self.db)
            .await
    }

    async fn exists(&self, tenant_id: Uuid, kind: EntityKind, id: Uuid) -> Result<bool, DbErr> {
        let count = match kind {
            EntityKind::Asset => live_count!(self.db, asset, tenant_id, asset::Column::Id.eq(id)),
            EntityKind::AssetAssignment => live_count!(
                self.db,
                asset_assignment,
                tenant_id,
                asset_assignment::Column::Id.eq(id)
            ),
            EntityKind::MaintenanceRecord => live_count!(
                self.db,
                maintenance_record,
                tenant_id,
                maintenance_record::Column::Id.eq(id)
            ),
            EntityKind::ProcurementRequest => live_count!(
                self.db,
                procurement_request,
                tenant_id,
                procurement_request::Column::Id.eq(id)
            ),
            EntityKind::PurchaseOrder => live_count!(
                self.db,
                purchase_order,
                tenant_id,
                purchase_order::Column::Id.eq(id)
            ),
            EntityKind::AssetCategory => live_count!(
                self.db,
                asset_category,
                tenant_id,
                asset_category::Column::Id.eq(id)
            ),
            EntityKind::Location => {
                live_count!(self.db, location, tenant_id, location::Column::Id.eq(id))
            }
            EntityKind::Vendor => {
                live_count!(self.db, vendor, tenant_id, vendor::Column::Id.eq(id))
            }
            EntityKind::Person => {
                live_count!(self.db, person, tenant_id, person::Column::Id.eq(id))
            }
        }?;
        Ok(count > 0)
    }

    async fn parent_of(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<Option<Uuid>>, DbErr> {
        match kind {
            EntityKind::AssetCategory => Ok(asset_category::Entity::find_by_id(id)
                .filter(asset_category::Column::TenantId.eq(tenant_id))
                .filter(asset_category::Column::DeletedAt.is_null())
                .one(self.db)
                .await?
                .map(|category| category.parent_id)),
            EntityKind::Location => Ok(location::Entity::find_by_id(id)
                .filter(location::Column::TenantId.eq(tenant_id))
                .filter(location::Column::DeletedAt.is_null())
                .one(self.db)
                .await?
                .map(|location| location.parent_id)),
            _ => Ok(None),
        }
    }

    async fn active_assignment(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<asset_assignment::Model>, DbErr> {
        asset_assignment::Entity::find()
            .filter(asset_assignment::Column::TenantId.eq(tenant_id))
            .filter(asset_assignment::Column::AssetId.eq(asset_id))
            .filter(asset_assignment::Column::Status.eq(AssignmentStatus::Active.as_str()))
            .filter(asset_assignment::Column::DeletedAt.is_null())
            .one(self.db)
            .await
    }

    async fn count_dependents(
        &self,
        tenant_id: Uuid,
        dependents: Dependents,
    ) -> Result<u64, DbErr> {
        match dependents {
            Dependents::AssetsInCategory(id) => {
                live_count!(self.db, asset, tenant_id, asset::Column::CategoryId.eq(id))
            }
            Dependents::ChildCategories(id) => live_count!(
                self.db,
                asset_category,
                tenant_id,
                asset_category::Column::ParentId.eq(id)
            ),
            Dependents::AssetsAtLocation(id) => {
                live_count!(self.db, asset, tenant_id, asset::Column::LocationId.eq(id))
            }
            Dependents::ChildLocations(id) => live_count!(
                self.db,
                location,
                tenant_id,
                location::Column::ParentId.eq(id)
            ),
            Dependents::OpenMaintenance(asset_id) => live_count!(
                self.db,
                maintenance_record,
                tenant_id,
                maintenance_record::Column::AssetId.eq(asset_id),
                maintenance_record::Column::Status.is_in([
                    MaintenanceStatus::Scheduled.as_str(),
                    MaintenanceStatus::InProgress.as_str(),
                ])
            ),
            Dependents::InProgressMaintenance(asset_id) => live_count!(
                self.db,
                maintenance_record,
                tenant_id,
                maintenance_record::Column::AssetId.eq(asset_id),
                maintenance_record::Column::Status.eq(MaintenanceStatus::InProgress.as_str())
            ),
            Dependents::ActiveAssignmentsOfAsset(asset_id) => live_count!(
                self.db,
                asset_assignment,
                tenant_id,
                asset_assignment::Column::AssetId.eq(asset_id),
                asset_assignment::Column::Status.eq(AssignmentStatus::Active.as_str())
            ),
            Dependents::ActiveAssignmentsOfPerson(person_id) => live_count!(
                self.db,
                asset_assignment,
                tenant_id,
                asset_assignment::Column::AssignedToId.eq(person_id),
                asset_assignment::Column::Status.eq(AssignmentStatus::Active.as_str())
            ),
            Dependents::PurchaseOrdersOfVendor(vendor_id) => live_count!(
                self.db,
                purchase_order,
                tenant_id,
                purchase_order::Column::VendorId.eq(vendor_id)
            ),
            Dependents::PurchaseOrdersOfRequest(request_id) => live_count!(
                self.db,
                purchase_order,
                tenant_id,
                purchase_order::Column::ProcurementId.eq(request_id)
            ),
        }
    }

    async fn write_transition(
        &self,
        tenant_id: Uuid,
        target: &TransitionTarget,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        let now = stamp(now);
        let result = match *target {
            TransitionTarget::Asset { id, from, to } => {
                asset::Entity::update_many()
                    .col_expr(asset::Column::Status, Expr::value(to.as_str()))
                    .col_expr(asset::Column::UpdatedAt, Expr::value(now))
                    .filter(asset::Column::Id.eq(id))
                    .filter(asset::Column::TenantId.eq(tenant_id))
                    .filter(asset::Column::Status.eq(from.as_str()))
                    .filter(asset::Column::DeletedAt.is_null())
                    .exec(self.db)
                    .await
            }
            TransitionTarget::AssetAssignment {
                id,
                from,
                to,
                return_date,
            } => {
                let mut update = asset_assignment::Entity::update_many()
                    .col_expr(asset_assignment::Column::Status, Expr::value(to.as_str()))
                    .col_expr(asset_assignment::Column::UpdatedAt, Expr::value(now));
                if let Some(date) = return_date {
                    update = update.col_expr(
                        asset_assignment::Column::ReturnDate,
                        Expr::value(Some(stamp(date))),
                    );
                }
                update
                    .filter(asset_assignment::Column::Id.eq(id))
                    .filter(asset_assignment::Column::TenantId.eq(tenant_id))
                    .filter(asset_assignment::Column::Status.eq(from.as_str()))
                    .filter(asset_assignment::Column::DeletedAt.is_null())
                    .exec(self.db)
                    .await
            }
            TransitionTarget::MaintenanceRecord {
                id,
                from,
                to,
                completed_date,
            } => {
                let mut update = maintenance_record::Entity::update_many()
                    .col_expr(maintenance_record::Column::Status, Expr::value(to.as_str()))
                    .col_expr(maintenance_record::Column::UpdatedAt, Expr::value(now));
                if let Some(date) = completed_date {
                    update = update.col_expr(
                        maintenance_record::Column::CompletedDate,
                        Expr::value(Some(stamp(date))),
                    );
                }
                update
                    .filter(maintenance_record::Column::Id.eq(id))
                    .filter(maintenance_record::Column::TenantId.eq(tenant_id))
                    .filter(maintenance_record::Column::Status.eq(from.as_str()))
                    .filter(maintenance_record::Column::DeletedAt.is_null())
                    .exec(self.db)
                    .await
            }
            TransitionTarget::ProcurementRequest {
                id,
                from,
                to,
                approved_by_id,
                approval_date,
            } => {
                let mut update = procurement_request::Entity::update_many()
                    .col_expr(procurement_request::Column::Status, Expr::value(to.as_str()))
                    .col_expr(procurement_request::Column::UpdatedAt, Expr::value(now));
                if let Some(approver) = approved_by_id {
                    update = update.col_expr(
                        procurement_request::Column::ApprovedById,
                        Expr::value(Some(approver)),
                    );
                }
                if let Some(date) = approval_date {
                    update = update.col_expr(
                        procurement_request::Column::ApprovalDate,
                        Expr::value(Some(stamp(date))),
                    );
                }
                update
                    .filter(procurement_request::Column::Id.eq(id))
                    .filter(procurement_request::Column::TenantId.eq(tenant_id))
                    .filter(procurement_request::Column::Status.eq(from.as_str()))
                    .filter(procurement_request::Column::DeletedAt.is_null())
                    .exec(self.db)
                    .await
            }
        };

        result
            .map(|res| res.rows_affected)
            .map_err(ApplyError::from_db)
    }

    async fn write_dependent(
        &self,
        tenant_id: Uuid,
        update: &DependentUpdate,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        match *update {
            DependentUpdate::Asset {
                asset_id,
                from,
                to,
                assignee,
            } => {
                let mut query = asset::Entity::update_many()
                    .col_expr(asset::Column::Status, Expr::value(to.as_str()))
                    .col_expr(asset::Column::UpdatedAt, Expr::value(stamp(now)));
                query = match assignee {
                    AssigneeChange::Keep => query,
                    AssigneeChange::Set(person_id) => query.col_expr(
                        asset::Column::CurrentAssigneeId,
                        Expr::value(Some(person_id)),
                    ),
                    AssigneeChange::Clear => query.col_expr(
                        asset::Column::CurrentAssigneeId,
                        Expr::value(Option::<Uuid>::None),
                    ),
                };
                query
                    .filter(asset::Column::Id.eq(asset_id))
                    .filter(asset::Column::TenantId.eq(tenant_id))
                    .filter(asset::Column::Status.eq(from.as_str()))
                    .filter(asset::Column::DeletedAt.is_null())
                    .exec(self.db)
                    .await
                    .map(|res| res.rows_affected)
                    .map_err(ApplyError::from_db)
            }
        }
    }

    async fn insert_record(&self, record: &NewRecord) -> Result<(), ApplyError> {
        match record {
            NewRecord::Assignment(model) => {
                asset_assignment::Entity::insert(
                    asset_assignment::ActiveModel::from(model.clone()).reset_all(),
                )
                .exec_without_returning(self.db)
                .await
                .map_err(ApplyError::from_db)?;
            }
            NewRecord::Maintenance(model) => {
                maintenance_record::Entity::insert(
                    maintenance_record::ActiveModel::from(model.clone()).reset_all(),
                )
                .exec_without_returning(self.db)
                .await
                .map_err(ApplyError::from_db)?;
            }
            NewRecord::ProcurementRequest { request, items } => {
                procurement_request::Entity::insert(
                    procurement_request::ActiveModel::from(request.clone()).reset_all(),
                )
                .exec_without_returning(self.db)
                .await
                .map_err(ApplyError::from_db)?;

                if !items.is_empty() {
                    procurement_item::Entity::insert_many(
                        items
                            .iter()
                            .cloned()
                            .map(|item| procurement_item::ActiveModel::from(item).reset_all()),
                    )
                    .exec_without_returning(self.db)
                    .await
                    .map_err(ApplyError::from_db)?;
                }
            }
            NewRecord::PurchaseOrder(model) => {
                purchase_order::Entity::insert(
                    purchase_order::ActiveModel::from(model.clone()).reset_all(),
                )
                .exec_without_returning(self.db)
                .await
                .map_err(ApplyError::from_db)?;
            }
        }
        Ok(())
    }

    async fn soft_delete(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        id: Uuid,
        expected_status: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        let now = stamp(now);
        let result = match kind {
            EntityKind::Asset => {
                soft_delete_rows!(self.db, asset, tenant_id, id, now, expected_status)
            }
            EntityKind::AssetAssignment => {
                soft_delete_rows!(self.db, asset_assignment, tenant_id, id, now, expected_status)
            }
            EntityKind::MaintenanceRecord => soft_delete_rows!(
                self.db,
                maintenance_record,
                tenant_id,
                id,
                now,
                expected_status
            ),
            EntityKind::ProcurementRequest => soft_delete_rows!(
                self.db,
                procurement_request,
                tenant_id,
                id,
                now,
                expected_status
            ),
            EntityKind::PurchaseOrder => {
                soft_delete_rows!(self.db, purchase_order, tenant_id, id, now, expected_status)
            }
            EntityKind::AssetCategory => soft_delete_rows!(self.db, asset_category, tenant_id, id, now),
            EntityKind::Location => soft_delete_rows!(self.db, location, tenant_id, id, now),
            EntityKind::Vendor => soft_delete_rows!(self.db, vendor, tenant_id, id, now),
            EntityKind::Person => soft_delete_rows!(self.db, person, tenant_id, id, now),
        };
        result.map_err(ApplyError::from_db)
    }

    async fn soft_delete_items(
        &self,
        tenant_id: Uuid,
        procurement_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        let now = stamp(now);
        procurement_item::Entity::update_many()
            .col_expr(procurement_item::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(procurement_item::Column::UpdatedAt, Expr::value(now))
            .filter(procurement_item::Column::ProcurementId.eq(procurement_id))
            .filter(procurement_item::Column::TenantId.eq(tenant_id))
            .filter(procurement_item::Column::DeletedAt.is_null())
            .exec(self.db)
            .await
            .map(|res| res.rows_affected)
            .map_err(ApplyError::from_db)
    }

    async fn bump_sequence(
        &self,
        tenant_id: Uuid,
        prefix: &str,
        day: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, ApplyError> {
        let now = stamp(now);
        let bumped = document_sequence::Entity::update_many()
            .col_expr(
                document_sequence::Column::LastValue,
                Expr::col(document_sequence::Column::LastValue).add(1),
            )
            .col_expr(document_sequence::Column::UpdatedAt, Expr::value(now))
            .filter(document_sequence::Column::TenantId.eq(tenant_id))
            .filter(document_sequence::Column::Prefix.eq(prefix))
            .filter(document_sequence::Column::Day.eq(day))
            .exec(self.db)
            .await
            .map_err(ApplyError::from_db)?;

        if bumped.rows_affected == 0 {
            // First number of the day. A concurrent first insert loses on the
            // primary key and surfaces as a retryable unique violation.
            document_sequence::Entity::insert(document_sequence::ActiveModel {
                tenant_id: Set(tenant_id),
                prefix: Set(prefix.to_string()),
                day: Set(day.to_string()),
                last_value: Set(1),
                updated_at: Set(now),
            })
            .exec_without_returning(self.db)
            .await
            .map_err(ApplyError::from_db)?;
            return Ok(1);
        }

        let row = document_sequence::Entity::find_by_id((
            tenant_id,
            prefix.to_string(),
            day.to_string(),
        ))
        .one(self.db)
        .await
        .map_err(ApplyError::Storage)?
        .ok_or_else(|| {
            ApplyError::Storage(DbErr::RecordNotFound(format!(
                "document sequence {prefix}/{day}"
            )))
        })?;

        Ok(i64::from(row.last_value))
    }
}
