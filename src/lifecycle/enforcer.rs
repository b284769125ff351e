//! Cross-entity consistency enforcer.
//!
//! Applies validated plans through the store. Every write is a
//! compare-and-set against the status the validator observed; a write that
//! matches no row aborts with `ApplyError::Conflict` so the caller can roll
//! back and retry the whole unit of work.

use std::collections::HashSet;

use uuid::Uuid;

use super::clock::Clock;
use super::error::{ApplyError, LifecycleError};
use super::numbering::{self, PROCUREMENT_REQUEST_PREFIX, PURCHASE_ORDER_PREFIX};
use super::status::{
    AssetStatus, AssignmentStatus, EntityKind, LifecycleStatus, MaintenanceStatus,
    ProcurementStatus,
};
use super::store::{Dependents, LifecycleStore};
use super::transition::{
    AssigneeChange, DeleteTarget, DependentUpdate, NewRecord, ValidatedCreation,
    ValidatedDeletion, ValidatedTransition,
};

/// Writes the primary status change, then every dependent update.
pub async fn apply<S>(
    store: &S,
    clock: &dyn Clock,
    plan: &ValidatedTransition,
) -> Result<(), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let now = clock.now();
    let written = store.write_transition(plan.tenant_id, &plan.target, now).await?;
    if written == 0 {
        return Err(ApplyError::Conflict {
            kind: plan.target.kind(),
            id: plan.target.id(),
        }
        .into());
    }
    apply_effects(store, clock, plan.tenant_id, &plan.effects).await
}

/// Numbers the record if it needs one, inserts it and applies its effects.
/// Returns the record as stored.
pub async fn apply_creation<S>(
    store: &S,
    clock: &dyn Clock,
    plan: ValidatedCreation,
) -> Result<NewRecord, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let now = clock.now();
    let mut record = plan.record;
    match &mut record {
        NewRecord::ProcurementRequest { request, .. } => {
            request.request_number =
                numbering::next(store, plan.tenant_id, PROCUREMENT_REQUEST_PREFIX, now).await?;
        }
        NewRecord::PurchaseOrder(order) => {
            order.order_number =
                numbering::next(store, plan.tenant_id, PURCHASE_ORDER_PREFIX, now).await?;
        }
        NewRecord::Assignment(_) | NewRecord::Maintenance(_) => {}
    }

    store.insert_record(&record).await?;
    apply_effects(store, clock, plan.tenant_id, &plan.effects).await?;
    Ok(record)
}

async fn apply_effects<S>(
    store: &S,
    clock: &dyn Clock,
    tenant_id: Uuid,
    effects: &[DependentUpdate],
) -> Result<(), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let now = clock.now();
    for effect in effects {
        let written = store.write_dependent(tenant_id, effect, now).await?;
        if written == 0 {
            let DependentUpdate::Asset { asset_id, .. } = *effect;
            return Err(ApplyError::Conflict {
                kind: EntityKind::Asset,
                id: asset_id,
            }
            .into());
        }
    }
    Ok(())
}

/// Decides whether `target` may be soft-deleted and what else must change.
pub async fn check_delete<S>(
    store: &S,
    tenant_id: Uuid,
    target: DeleteTarget,
) -> Result<ValidatedDeletion, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let DeleteTarget { kind, id } = target;
    let not_found = LifecycleError::NotFound { kind, id };
    let mut deletion = ValidatedDeletion {
        tenant_id,
        target,
        expected_status: None,
        cascade_items: false,
        effects: Vec::new(),
    };

    match kind {
        EntityKind::Asset => {
            ensure_exists(store, tenant_id, target).await?;
            guard(store, tenant_id, target, Dependents::ActiveAssignmentsOfAsset(id)).await?;
            guard(store, tenant_id, target, Dependents::OpenMaintenance(id)).await?;
        }
        EntityKind::AssetCategory => {
            ensure_exists(store, tenant_id, target).await?;
            guard(store, tenant_id, target, Dependents::AssetsInCategory(id)).await?;
            guard(store, tenant_id, target, Dependents::ChildCategories(id)).await?;
        }
        EntityKind::Location => {
            ensure_exists(store, tenant_id, target).await?;
            guard(store, tenant_id, target, Dependents::AssetsAtLocation(id)).await?;
            guard(store, tenant_id, target, Dependents::ChildLocations(id)).await?;
        }
        EntityKind::Vendor => {
            ensure_exists(store, tenant_id, target).await?;
            guard(store, tenant_id, target, Dependents::PurchaseOrdersOfVendor(id)).await?;
        }
        EntityKind::Person => {
            ensure_exists(store, tenant_id, target).await?;
            guard(store, tenant_id, target, Dependents::ActiveAssignmentsOfPerson(id)).await?;
        }
        EntityKind::PurchaseOrder => {
            ensure_exists(store, tenant_id, target).await?;
        }
        EntityKind::ProcurementRequest => {
            let request = store
                .find_procurement_request(tenant_id, id)
                .await?
                .ok_or(not_found)?;
            let status: ProcurementStatus = request.status.parse()?;
            if status != ProcurementStatus::Draft {
                return Err(LifecycleError::NotEditable {
                    kind,
                    status: request.status,
                });
            }
            guard(store, tenant_id, target, Dependents::PurchaseOrdersOfRequest(id)).await?;
            deletion.expected_status = Some(status.as_str());
            deletion.cascade_items = true;
        }
        EntityKind::AssetAssignment => {
            let assignment = store
                .find_assignment(tenant_id, id)
                .await?
                .ok_or(not_found)?;
            let status: AssignmentStatus = assignment.status.parse()?;
            if status != AssignmentStatus::Active {
                return Err(LifecycleError::NotEditable {
                    kind,
                    status: assignment.status,
                });
            }
            deletion.expected_status = Some(status.as_str());

            // Withdrawing an active assignment hands the asset back to stock.
            if let Some(asset) = store.find_asset(tenant_id, assignment.asset_id).await? {
                let asset_status: AssetStatus = asset.status.parse()?;
                if asset_status == AssetStatus::Assigned {
                    deletion.effects.push(DependentUpdate::Asset {
                        asset_id: asset.id,
                        from: asset_status,
                        to: AssetStatus::InStock,
                        assignee: AssigneeChange::Clear,
                    });
                }
            }
        }
        EntityKind::MaintenanceRecord => {
            let record = store
                .find_maintenance(tenant_id, id)
                .await?
                .ok_or(not_found)?;
            let status: MaintenanceStatus = record.status.parse()?;
            if !matches!(
                status,
                MaintenanceStatus::Scheduled | MaintenanceStatus::Cancelled
            ) {
                return Err(LifecycleError::NotEditable {
                    kind,
                    status: record.status,
                });
            }
            deletion.expected_status = Some(status.as_str());
        }
    }

    Ok(deletion)
}

/// `check_delete` as a yes/no answer. Missing entities are still errors.
pub async fn can_delete<S>(
    store: &S,
    tenant_id: Uuid,
    target: DeleteTarget,
) -> Result<bool, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    match check_delete(store, tenant_id, target).await {
        Ok(_) => Ok(true),
        Err(LifecycleError::HasDependents { .. } | LifecycleError::NotEditable { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Soft-deletes a checked target, cascading to items and dependents.
pub async fn delete<S>(
    store: &S,
    clock: &dyn Clock,
    plan: &ValidatedDeletion,
) -> Result<(), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let now = clock.now();
    let DeleteTarget { kind, id } = plan.target;
    let deleted = store
        .soft_delete(plan.tenant_id, kind, id, plan.expected_status, now)
        .await?;
    if deleted == 0 {
        return Err(ApplyError::Conflict { kind, id }.into());
    }
    if plan.cascade_items {
        store.soft_delete_items(plan.tenant_id, id, now).await?;
    }
    apply_effects(store, clock, plan.tenant_id, &plan.effects).await
}

/// Verifies that `parent_id` may become the parent of `id` (`None` when
/// the node is being created): it must exist in the tenant and must not be
/// the node itself or one of its descendants.
pub async fn check_parent<S>(
    store: &S,
    tenant_id: Uuid,
    kind: EntityKind,
    id: Option<Uuid>,
    parent_id: Uuid,
) -> Result<(), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    if !matches!(kind, EntityKind::AssetCategory | EntityKind::Location) {
        return Err(LifecycleError::Validation(format!(
            "{kind} does not form a hierarchy"
        )));
    }
    if id == Some(parent_id) {
        return Err(LifecycleError::CyclicHierarchy { kind, id: parent_id });
    }

    let Some(mut next) = store.parent_of(tenant_id, kind, parent_id).await? else {
        return Err(LifecycleError::InvalidReference {
            field: "parent_id",
            id: parent_id,
        });
    };

    let mut visited = HashSet::from([parent_id]);
    while let Some(ancestor) = next {
        if Some(ancestor) == id || !visited.insert(ancestor) {
            return Err(LifecycleError::CyclicHierarchy {
                kind,
                id: id.unwrap_or(parent_id),
            });
        }
        next = store
            .parent_of(tenant_id, kind, ancestor)
            .await?
            .flatten();
    }
    Ok(())
}

async fn ensure_exists<S>(
    store: &S,
    tenant_id: Uuid,
    target: DeleteTarget,
) -> Result<(), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    if store.exists(tenant_id, target.kind, target.id).await? {
        Ok(())
    } else {
        Err(LifecycleError::NotFound {
            kind: target.kind,
            id: target.id,
        })
    }
}

async fn guard<S>(
    store: &S,
    tenant_id: Uuid,
    target: DeleteTarget,
    dependents: Dependents,
) -> Result<(), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let count = store.count_dependents(tenant_id, dependents).await?;
    if count > 0 {
        return Err(LifecycleError::HasDependents {
            kind: target.kind,
            id: target.id,
            dependent: dependents.label(),
            count,
        });
    }
    Ok(())
}
