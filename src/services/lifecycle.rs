//! Lifecycle Service
//!
//! Every mutation runs as validate → apply inside one database transaction.
//! A compare-and-set miss or a uniqueness violation means another request
//! committed first; the whole unit of work is then retried so the validator
//! sees the committed state.

use std::sync::Arc;

use metrics::counter;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::LifecycleConfig;
use crate::error::RepositoryError;
use crate::lifecycle::{
    ActorContext, ApplyError, AssetStatus, AssignmentStatus, Clock, DeleteTarget, EntityKind,
    LifecycleError, LifecycleStatus, MaintenanceStatus, NewAssignment, NewMaintenance,
    NewProcurementRequest, NewPurchaseOrder, NewRecord, ProcurementStatus, SeaOrmStore,
    SystemClock, TransitionContext, TransitionRequest, ValidatedTransition, enforcer, validator,
};
use crate::models::{
    asset, asset_assignment, asset_category, location, maintenance_record, procurement_item,
    procurement_request, purchase_order,
};
use crate::repositories::{
    AssetCategoryRepository, AssetRepository, AssignmentRepository, CreateAsset, CreateCategory,
    CreateLocation, LocationRepository, MaintenanceRepository, ProcurementRepository,
    UpdateAsset, UpdateAssignment, UpdateCategory, UpdateLocation, UpdateMaintenance,
    UpdateProcurement,
};

/// Failure of a lifecycle unit of work.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// Only lost compare-and-set races are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Lifecycle(err) if err.is_retryable())
    }
}

impl From<DbErr> for ServiceError {
    fn from(error: DbErr) -> Self {
        ServiceError::Lifecycle(LifecycleError::Storage(error))
    }
}

impl From<ApplyError> for ServiceError {
    fn from(error: ApplyError) -> Self {
        ServiceError::Lifecycle(error.into())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Runs `$body` inside a fresh transaction, committing on success and
/// retrying the whole block when it loses a race.
macro_rules! with_retry {
    ($service:expr, $operation:literal, |$txn:ident| $body:expr) => {{
        let mut attempt: u32 = 1;
        loop {
            let $txn = $service.db.begin().await?;
            let outcome: Result<_> = async { $body }.await;
            let outcome = match outcome {
                Ok(value) => $txn
                    .commit()
                    .await
                    .map(|()| value)
                    .map_err(|err| ServiceError::from(ApplyError::from_db(err))),
                Err(err) => {
                    if let Err(rollback_err) = $txn.rollback().await {
                        warn!(operation = $operation, error = %rollback_err, "Rollback failed");
                    }
                    Err(err)
                }
            };

            match outcome {
                Err(err) if err.is_retryable() && attempt < $service.max_attempts => {
                    counter!("lifecycle_retries_total", "operation" => $operation).increment(1);
                    debug!(
                        operation = $operation,
                        attempt,
                        error = %err,
                        "Concurrent write detected, retrying unit of work"
                    );
                    attempt += 1;
                }
                other => break other,
            }
        }
    }};
}

fn not_found(kind: EntityKind, id: Uuid) -> ServiceError {
    LifecycleError::NotFound { kind, id }.into()
}

/// A creation plan came back holding a different record kind.
fn unexpected_record(record: &NewRecord) -> ServiceError {
    LifecycleError::Storage(DbErr::Custom(format!(
        "unexpected {} record from creation",
        record.kind()
    )))
    .into()
}

/// Transactional entry point for every lifecycle mutation.
pub struct LifecycleService {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl LifecycleService {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>, max_attempts: u32) -> Self {
        Self {
            db,
            clock,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Wall-clock service configured from `KONTENA_LIFECYCLE_*` settings.
    pub fn from_config(db: DatabaseConnection, config: &LifecycleConfig) -> Self {
        Self::new(db, Arc::new(SystemClock), config.max_attempts)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Validates and applies a status change with all of its cascades.
    #[instrument(skip_all, fields(
        tenant_id = %ctx.actor.tenant_id,
        entity_type = %request.kind(),
        entity_id = %request.id(),
        to = request.target_status(),
    ))]
    pub async fn transition(
        &self,
        request: TransitionRequest,
        ctx: TransitionContext,
    ) -> Result<ValidatedTransition> {
        let plan = with_retry!(self, "transition", |txn| {
            let store = SeaOrmStore::new(&txn);
            let plan = validator::validate(&store, self.clock(), request, &ctx).await?;
            enforcer::apply(&store, self.clock(), &plan).await?;
            Ok(plan)
        })?;

        let (from, to) = plan.target.statuses();
        counter!(
            "lifecycle_transitions_total",
            "entity_type" => request.kind().as_str(),
            "to" => to
        )
        .increment(1);
        info!(from, effects = plan.effects.len(), "Transition applied");
        Ok(plan)
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, asset_id = %input.asset_id))]
    pub async fn create_assignment(
        &self,
        actor: ActorContext,
        input: NewAssignment,
    ) -> Result<asset_assignment::Model> {
        let record = with_retry!(self, "create_assignment", |txn| {
            let store = SeaOrmStore::new(&txn);
            let plan =
                validator::validate_assignment(&store, self.clock(), &input, &actor).await?;
            Ok(enforcer::apply_creation(&store, self.clock(), plan).await?)
        })?;

        match record {
            NewRecord::Assignment(model) => {
                info!(assignment_id = %model.id, assigned_to_id = %model.assigned_to_id, "Asset assigned");
                Ok(model)
            }
            other => Err(unexpected_record(&other)),
        }
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, asset_id = %input.asset_id))]
    pub async fn create_maintenance(
        &self,
        actor: ActorContext,
        input: NewMaintenance,
    ) -> Result<maintenance_record::Model> {
        let record = with_retry!(self, "create_maintenance", |txn| {
            let store = SeaOrmStore::new(&txn);
            let plan =
                validator::validate_maintenance(&store, self.clock(), &input, &actor).await?;
            Ok(enforcer::apply_creation(&store, self.clock(), plan).await?)
        })?;

        match record {
            NewRecord::Maintenance(model) => {
                info!(maintenance_id = %model.id, status = %model.status, "Maintenance recorded");
                Ok(model)
            }
            other => Err(unexpected_record(&other)),
        }
    }

    /// Creates a draft request with its items and a generated `PR-` number.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, items = input.items.len()))]
    pub async fn create_procurement_request(
        &self,
        actor: ActorContext,
        input: NewProcurementRequest,
    ) -> Result<(procurement_request::Model, Vec<procurement_item::Model>)> {
        let record = with_retry!(self, "create_procurement_request", |txn| {
            let store = SeaOrmStore::new(&txn);
            let plan = validator::validate_procurement_request(&store, self.clock(), &input, &actor)
                .await?;
            Ok(enforcer::apply_creation(&store, self.clock(), plan).await?)
        })?;

        match record {
            NewRecord::ProcurementRequest { request, items } => {
                info!(request_number = %request.request_number, "Procurement request created");
                Ok((request, items))
            }
            other => Err(unexpected_record(&other)),
        }
    }

    /// Creates a draft purchase order with a generated `PO-` number.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, vendor_id = %input.vendor_id))]
    pub async fn create_purchase_order(
        &self,
        actor: ActorContext,
        input: NewPurchaseOrder,
    ) -> Result<purchase_order::Model> {
        let record = with_retry!(self, "create_purchase_order", |txn| {
            let store = SeaOrmStore::new(&txn);
            let plan =
                validator::validate_purchase_order(&store, self.clock(), &input, &actor).await?;
            Ok(enforcer::apply_creation(&store, self.clock(), plan).await?)
        })?;

        match record {
            NewRecord::PurchaseOrder(model) => {
                info!(order_number = %model.order_number, "Purchase order created");
                Ok(model)
            }
            other => Err(unexpected_record(&other)),
        }
    }

    /// Edits descriptive fields (only while `draft` or `submitted`) and then
    /// applies an optional status change, in one transaction.
    #[instrument(skip_all, fields(tenant_id = %ctx.actor.tenant_id, procurement_id = %id))]
    pub async fn update_procurement_request(
        &self,
        ctx: TransitionContext,
        id: Uuid,
        changes: UpdateProcurement,
        status: Option<ProcurementStatus>,
    ) -> Result<procurement_request::Model> {
        let tenant_id = ctx.actor.tenant_id;
        with_retry!(self, "update_procurement_request", |txn| {
            let store = SeaOrmStore::new(&txn);
            let repo = ProcurementRepository::new(&txn);

            if !changes.is_empty() {
                let (_, current) =
                    validator::ensure_procurement_editable(&store, tenant_id, id).await?;
                let written = repo
                    .update_details(tenant_id, id, current.as_str(), &changes, self.clock().now())
                    .await?;
                if written == 0 {
                    return Err(ApplyError::Conflict {
                        kind: EntityKind::ProcurementRequest,
                        id,
                    }
                    .into());
                }
            }

            if let Some(to) = status {
                let request = TransitionRequest::ProcurementRequest { id, to };
                let plan = validator::validate(&store, self.clock(), request, &ctx).await?;
                enforcer::apply(&store, self.clock(), &plan).await?;
            }

            repo.get(tenant_id, id)
                .await?
                .ok_or_else(|| not_found(EntityKind::ProcurementRequest, id))
        })
    }

    /// Edits notes and expected return; a `returned` status releases the asset.
    #[instrument(skip_all, fields(tenant_id = %ctx.actor.tenant_id, assignment_id = %id))]
    pub async fn update_assignment(
        &self,
        ctx: TransitionContext,
        id: Uuid,
        changes: UpdateAssignment,
        status: Option<AssignmentStatus>,
    ) -> Result<asset_assignment::Model> {
        let tenant_id = ctx.actor.tenant_id;
        with_retry!(self, "update_assignment", |txn| {
            let store = SeaOrmStore::new(&txn);
            let repo = AssignmentRepository::new(&txn);

            if repo.get(tenant_id, id).await?.is_none() {
                return Err(not_found(EntityKind::AssetAssignment, id));
            }
            if !changes.is_empty() {
                repo.update_details(tenant_id, id, &changes, self.clock().now())
                    .await?;
            }
            if let Some(to) = status {
                let request = TransitionRequest::AssetAssignment { id, to };
                let plan = validator::validate(&store, self.clock(), request, &ctx).await?;
                enforcer::apply(&store, self.clock(), &plan).await?;
            }

            repo.get(tenant_id, id)
                .await?
                .ok_or_else(|| not_found(EntityKind::AssetAssignment, id))
        })
    }

    #[instrument(skip_all, fields(tenant_id = %ctx.actor.tenant_id, maintenance_id = %id))]
    pub async fn update_maintenance(
        &self,
        ctx: TransitionContext,
        id: Uuid,
        changes: UpdateMaintenance,
        status: Option<MaintenanceStatus>,
    ) -> Result<maintenance_record::Model> {
        let tenant_id = ctx.actor.tenant_id;
        with_retry!(self, "update_maintenance", |txn| {
            let store = SeaOrmStore::new(&txn);
            let repo = MaintenanceRepository::new(&txn);

            if repo.get(tenant_id, id).await?.is_none() {
                return Err(not_found(EntityKind::MaintenanceRecord, id));
            }
            if let Some(person_id) = changes.performed_by_id {
                validator::require(
                    &store,
                    tenant_id,
                    EntityKind::Person,
                    "performed_by_id",
                    person_id,
                )
                .await?;
            }
            if let Some(vendor_id) = changes.vendor_id {
                validator::require(&store, tenant_id, EntityKind::Vendor, "vendor_id", vendor_id)
                    .await?;
            }
            if !changes.is_empty() {
                repo.update_details(tenant_id, id, &changes, self.clock().now())
                    .await?;
            }
            if let Some(to) = status {
                let request = TransitionRequest::MaintenanceRecord { id, to };
                let plan = validator::validate(&store, self.clock(), request, &ctx).await?;
                enforcer::apply(&store, self.clock(), &plan).await?;
            }

            repo.get(tenant_id, id)
                .await?
                .ok_or_else(|| not_found(EntityKind::MaintenanceRecord, id))
        })
    }

    /// Registers an asset. New assets start in `procurement` or `in_stock`
    /// (default) and never carry an assignee.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id))]
    pub async fn create_asset(
        &self,
        actor: ActorContext,
        status: Option<AssetStatus>,
        request: CreateAsset,
    ) -> Result<asset::Model> {
        let status = status.unwrap_or(AssetStatus::InStock);
        if !matches!(status, AssetStatus::Procurement | AssetStatus::InStock) {
            return Err(LifecycleError::Validation(format!(
                "assets cannot be created in status '{status}'"
            ))
            .into());
        }

        let tenant_id = actor.tenant_id;
        with_retry!(self, "create_asset", |txn| {
            let store = SeaOrmStore::new(&txn);
            validator::require(
                &store,
                tenant_id,
                EntityKind::AssetCategory,
                "category_id",
                request.category_id,
            )
            .await?;
            if let Some(location_id) = request.location_id {
                validator::require(
                    &store,
                    tenant_id,
                    EntityKind::Location,
                    "location_id",
                    location_id,
                )
                .await?;
            }

            Ok(AssetRepository::new(&txn)
                .create(tenant_id, status.as_str(), request.clone(), self.clock().now())
                .await?)
        })
    }

    /// Edits descriptive fields. Status moves only through `transition`.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, asset_id = %id))]
    pub async fn update_asset(
        &self,
        actor: ActorContext,
        id: Uuid,
        changes: UpdateAsset,
    ) -> Result<asset::Model> {
        let tenant_id = actor.tenant_id;
        with_retry!(self, "update_asset", |txn| {
            let store = SeaOrmStore::new(&txn);
            if let Some(category_id) = changes.category_id {
                validator::require(
                    &store,
                    tenant_id,
                    EntityKind::AssetCategory,
                    "category_id",
                    category_id,
                )
                .await?;
            }
            if let Some(Some(location_id)) = changes.location_id {
                validator::require(
                    &store,
                    tenant_id,
                    EntityKind::Location,
                    "location_id",
                    location_id,
                )
                .await?;
            }

            Ok(AssetRepository::new(&txn)
                .update(tenant_id, id, changes.clone(), self.clock().now())
                .await?)
        })
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id))]
    pub async fn create_category(
        &self,
        actor: ActorContext,
        request: CreateCategory,
    ) -> Result<asset_category::Model> {
        let tenant_id = actor.tenant_id;
        with_retry!(self, "create_category", |txn| {
            if let Some(parent_id) = request.parent_id {
                let store = SeaOrmStore::new(&txn);
                enforcer::check_parent(&store, tenant_id, EntityKind::AssetCategory, None, parent_id)
                    .await?;
            }
            Ok(AssetCategoryRepository::new(&txn)
                .create(tenant_id, request.clone(), self.clock().now())
                .await?)
        })
    }

    /// Edits a category; a new parent must not be the category or one of its
    /// descendants.
    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, category_id = %id))]
    pub async fn update_category(
        &self,
        actor: ActorContext,
        id: Uuid,
        changes: UpdateCategory,
    ) -> Result<asset_category::Model> {
        let tenant_id = actor.tenant_id;
        with_retry!(self, "update_category", |txn| {
            let repo = AssetCategoryRepository::new(&txn);
            if repo.get(tenant_id, id).await?.is_none() {
                return Err(not_found(EntityKind::AssetCategory, id));
            }
            if let Some(Some(parent_id)) = changes.parent_id {
                let store = SeaOrmStore::new(&txn);
                enforcer::check_parent(
                    &store,
                    tenant_id,
                    EntityKind::AssetCategory,
                    Some(id),
                    parent_id,
                )
                .await?;
            }
            Ok(repo
                .update(tenant_id, id, changes.clone(), self.clock().now())
                .await?)
        })
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id))]
    pub async fn create_location(
        &self,
        actor: ActorContext,
        request: CreateLocation,
    ) -> Result<location::Model> {
        let tenant_id = actor.tenant_id;
        with_retry!(self, "create_location", |txn| {
            if let Some(parent_id) = request.parent_id {
                let store = SeaOrmStore::new(&txn);
                enforcer::check_parent(&store, tenant_id, EntityKind::Location, None, parent_id)
                    .await?;
            }
            Ok(LocationRepository::new(&txn)
                .create(tenant_id, request.clone(), self.clock().now())
                .await?)
        })
    }

    #[instrument(skip_all, fields(tenant_id = %actor.tenant_id, location_id = %id))]
    pub async fn update_location(
        &self,
        actor: ActorContext,
        id: Uuid,
        changes: UpdateLocation,
    ) -> Result<location::Model> {
        let tenant_id = actor.tenant_id;
        with_retry!(self, "update_location", |txn| {
            let repo = LocationRepository::new(&txn);
            if repo.get(tenant_id, id).await?.is_none() {
                return Err(not_found(EntityKind::Location, id));
            }
            if let Some(Some(parent_id)) = changes.parent_id {
                let store = SeaOrmStore::new(&txn);
                enforcer::check_parent(&store, tenant_id, EntityKind::Location, Some(id), parent_id)
                    .await?;
            }
            Ok(repo
                .update(tenant_id, id, changes.clone(), self.clock().now())
                .await?)
        })
    }

    /// Soft-deletes `target` once its guards pass, cascading as needed.
    #[instrument(skip_all, fields(
        tenant_id = %actor.tenant_id,
        entity_type = %target.kind,
        entity_id = %target.id,
    ))]
    pub async fn delete(&self, actor: ActorContext, target: DeleteTarget) -> Result<()> {
        with_retry!(self, "delete", |txn| {
            let store = SeaOrmStore::new(&txn);
            let plan = enforcer::check_delete(&store, actor.tenant_id, target).await?;
            enforcer::delete(&store, self.clock(), &plan).await?;
            Ok(())
        })?;

        counter!("lifecycle_deletions_total", "entity_type" => target.kind.as_str()).increment(1);
        info!("Entity deleted");
        Ok(())
    }

    /// Read-only answer to "would `delete` pass its guards right now".
    pub async fn can_delete(&self, actor: ActorContext, target: DeleteTarget) -> Result<bool> {
        let store = SeaOrmStore::new(&self.db);
        Ok(enforcer::can_delete(&store, actor.tenant_id, target).await?)
    }
}
