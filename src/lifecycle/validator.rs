//! Transition validator.
//!
//! Every function here only reads through the store. The result is a plan
//! (`ValidatedTransition` or `ValidatedCreation`) naming the status to write,
//! the timestamps to stamp and the dependent rows to update.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::clock::Clock;
use super::error::LifecycleError;
use super::status::{
    AssetStatus, AssignmentStatus, EntityKind, LifecycleStatus, MaintenanceStatus,
    MaintenanceType, ProcurementStatus,
};
use super::store::{Dependents, LifecycleStore};
use super::transition::{
    ActorContext, AssigneeChange, DependentUpdate, NewRecord, TransitionContext,
    TransitionRequest, TransitionTarget, ValidatedCreation, ValidatedTransition,
};
use crate::models::{
    asset, asset_assignment, maintenance_record, procurement_item, procurement_request,
    purchase_order,
};

/// Input for assigning an asset to a person.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAssignment {
    pub asset_id: Uuid,
    pub assigned_to_id: Uuid,
    /// Falls back to the actor when absent
    pub assigned_by_id: Option<Uuid>,
    pub assignment_date: Option<DateTime<Utc>>,
    pub expected_return: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Input for recording maintenance on an asset.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMaintenance {
    pub asset_id: Uuid,
    pub maintenance_type: MaintenanceType,
    /// `scheduled` (default) or `in_progress`
    pub status: Option<MaintenanceStatus>,
    pub scheduled_date: DateTime<Utc>,
    pub performed_by_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub cost: Option<f64>,
    pub description: String,
    pub results: Option<String>,
    pub next_scheduled: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProcurementItem {
    pub category_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub estimated_price: Option<f64>,
    pub preferred_vendor_id: Option<Uuid>,
    pub justification: Option<String>,
}

/// Input for opening a procurement request. It always starts as `draft`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewProcurementRequest {
    /// Falls back to the actor when absent
    pub requested_by_id: Option<Uuid>,
    pub expected_date: Option<DateTime<Utc>>,
    /// Derived from the items' estimates when absent
    pub total_budget: Option<f64>,
    pub notes: Option<String>,
    pub items: Vec<NewProcurementItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchaseOrder {
    pub vendor_id: Uuid,
    pub procurement_id: Option<Uuid>,
    /// Falls back to the actor when absent
    pub created_by_id: Option<Uuid>,
    pub expected_delivery: Option<DateTime<Utc>>,
    pub delivery_address: Option<String>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
}

const PURCHASE_ORDER_DRAFT: &str = "draft";
const PROCUREMENT_ITEM_PENDING: &str = "pending";

/// Decides whether `request` may happen and describes the resulting writes.
pub async fn validate<S>(
    store: &S,
    clock: &dyn Clock,
    request: TransitionRequest,
    ctx: &TransitionContext,
) -> Result<ValidatedTransition, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let tenant_id = ctx.actor.tenant_id;
    let now = clock.now();

    let (target, effects) = match request {
        TransitionRequest::Asset { id, to } => {
            let asset = load_asset(store, tenant_id, id).await?;
            let from: AssetStatus = asset.status.parse()?;
            from.transition_to(to)?;
            (TransitionTarget::Asset { id, from, to }, Vec::new())
        }

        TransitionRequest::AssetAssignment { id, to } => {
            let assignment = store
                .find_assignment(tenant_id, id)
                .await?
                .ok_or(LifecycleError::NotFound {
                    kind: EntityKind::AssetAssignment,
                    id,
                })?;
            let from: AssignmentStatus = assignment.status.parse()?;
            from.transition_to(to)?;

            let mut effects = Vec::new();
            let mut return_date = None;
            if to == AssignmentStatus::Returned {
                return_date = Some(ctx.effective_date.unwrap_or(now));
                if let Some(asset) = store.find_asset(tenant_id, assignment.asset_id).await? {
                    let asset_status: AssetStatus = asset.status.parse()?;
                    if asset_status != AssetStatus::InStock || asset.current_assignee_id.is_some()
                    {
                        effects.push(DependentUpdate::Asset {
                            asset_id: asset.id,
                            from: asset_status,
                            to: AssetStatus::InStock,
                            assignee: AssigneeChange::Clear,
                        });
                    }
                }
            }

            (
                TransitionTarget::AssetAssignment {
                    id,
                    from,
                    to,
                    return_date,
                },
                effects,
            )
        }

        TransitionRequest::MaintenanceRecord { id, to } => {
            let record = store
                .find_maintenance(tenant_id, id)
                .await?
                .ok_or(LifecycleError::NotFound {
                    kind: EntityKind::MaintenanceRecord,
                    id,
                })?;
            let from: MaintenanceStatus = record.status.parse()?;
            from.transition_to(to)?;

            let effects = match to {
                MaintenanceStatus::InProgress => {
                    let asset = load_asset(store, tenant_id, record.asset_id).await?;
                    enter_maintenance(&asset)?.into_iter().collect()
                }
                MaintenanceStatus::Completed | MaintenanceStatus::Cancelled
                    if from == MaintenanceStatus::InProgress =>
                {
                    leave_maintenance(store, tenant_id, record.asset_id)
                        .await?
                        .into_iter()
                        .collect()
                }
                _ => Vec::new(),
            };

            let completed_date = (to == MaintenanceStatus::Completed)
                .then(|| ctx.effective_date.unwrap_or(now));

            (
                TransitionTarget::MaintenanceRecord {
                    id,
                    from,
                    to,
                    completed_date,
                },
                effects,
            )
        }

        TransitionRequest::ProcurementRequest { id, to } => {
            let record = store
                .find_procurement_request(tenant_id, id)
                .await?
                .ok_or(LifecycleError::NotFound {
                    kind: EntityKind::ProcurementRequest,
                    id,
                })?;
            let from: ProcurementStatus = record.status.parse()?;
            from.transition_to(to)?;

            let (approved_by_id, approval_date) = if to == ProcurementStatus::Approved {
                let approver = ctx
                    .approver_id
                    .ok_or(LifecycleError::InvalidApprover { approver_id: None })?;
                if !store.exists(tenant_id, EntityKind::Person, approver).await? {
                    return Err(LifecycleError::InvalidApprover {
                        approver_id: Some(approver),
                    });
                }
                (Some(approver), Some(now))
            } else {
                (None, None)
            };

            (
                TransitionTarget::ProcurementRequest {
                    id,
                    from,
                    to,
                    approved_by_id,
                    approval_date,
                },
                Vec::new(),
            )
        }
    };

    Ok(ValidatedTransition {
        tenant_id,
        target,
        effects,
    })
}

/// Checks a new assignment and plans the asset flip to `assigned`.
pub async fn validate_assignment<S>(
    store: &S,
    clock: &dyn Clock,
    input: &NewAssignment,
    actor: &ActorContext,
) -> Result<ValidatedCreation, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let tenant_id = actor.tenant_id;
    let assigned_by_id = input
        .assigned_by_id
        .or(actor.person_id)
        .ok_or_else(|| LifecycleError::Validation("assigned_by_id is required".to_string()))?;

    let asset = store
        .find_asset(tenant_id, input.asset_id)
        .await?
        .ok_or(LifecycleError::InvalidReference {
            field: "asset_id",
            id: input.asset_id,
        })?;
    require(store, tenant_id, EntityKind::Person, "assigned_to_id", input.assigned_to_id).await?;
    require(store, tenant_id, EntityKind::Person, "assigned_by_id", assigned_by_id).await?;

    let asset_status: AssetStatus = asset.status.parse()?;
    if !matches!(asset_status, AssetStatus::InStock | AssetStatus::Assigned) {
        return Err(LifecycleError::AssetUnavailable {
            asset_id: asset.id,
            status: asset.status,
        });
    }

    if let Some(active) = store.active_assignment(tenant_id, asset.id).await? {
        return Err(LifecycleError::AlreadyAssigned {
            asset_id: asset.id,
            assignee: active.assigned_to_id,
        });
    }
    if let Some(holder) = asset.current_assignee_id
        && holder != input.assigned_to_id
    {
        return Err(LifecycleError::AlreadyAssigned {
            asset_id: asset.id,
            assignee: holder,
        });
    }

    let now = clock.now();
    let record = asset_assignment::Model {
        id: Uuid::new_v4(),
        tenant_id,
        asset_id: asset.id,
        assigned_to_id: input.assigned_to_id,
        assigned_by_id,
        assignment_date: input.assignment_date.unwrap_or(now).fixed_offset(),
        return_date: None,
        expected_return: input.expected_return.map(|date| date.fixed_offset()),
        notes: input.notes.clone(),
        status: AssignmentStatus::Active.as_str().to_string(),
        created_at: now.fixed_offset(),
        updated_at: now.fixed_offset(),
        deleted_at: None,
    };

    Ok(ValidatedCreation {
        tenant_id,
        record: NewRecord::Assignment(record),
        effects: vec![DependentUpdate::Asset {
            asset_id: asset.id,
            from: asset_status,
            to: AssetStatus::Assigned,
            assignee: AssigneeChange::Set(input.assigned_to_id),
        }],
    })
}

/// Checks a new maintenance record. Creating it `in_progress` puts the asset
/// into maintenance.
pub async fn validate_maintenance<S>(
    store: &S,
    clock: &dyn Clock,
    input: &NewMaintenance,
    actor: &ActorContext,
) -> Result<ValidatedCreation, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let tenant_id = actor.tenant_id;
    let status = input.status.unwrap_or(MaintenanceStatus::Scheduled);
    if !matches!(
        status,
        MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress
    ) {
        return Err(LifecycleError::Validation(format!(
            "maintenance records start as scheduled or in_progress, not {status}"
        )));
    }
    if input.description.trim().is_empty() {
        return Err(LifecycleError::Validation(
            "description is required".to_string(),
        ));
    }

    let asset = store
        .find_asset(tenant_id, input.asset_id)
        .await?
        .ok_or(LifecycleError::InvalidReference {
            field: "asset_id",
            id: input.asset_id,
        })?;
    if let Some(performer) = input.performed_by_id {
        require(store, tenant_id, EntityKind::Person, "performed_by_id", performer).await?;
    }
    if let Some(vendor) = input.vendor_id {
        require(store, tenant_id, EntityKind::Vendor, "vendor_id", vendor).await?;
    }

    let asset_status: AssetStatus = asset.status.parse()?;
    if asset_status == AssetStatus::Retired {
        return Err(LifecycleError::AssetUnavailable {
            asset_id: asset.id,
            status: asset.status,
        });
    }

    let effects = if status == MaintenanceStatus::InProgress {
        enter_maintenance(&asset)?.into_iter().collect()
    } else {
        Vec::new()
    };

    let now = clock.now();
    let record = maintenance_record::Model {
        id: Uuid::new_v4(),
        tenant_id,
        asset_id: asset.id,
        maintenance_type: input.maintenance_type.as_str().to_string(),
        status: status.as_str().to_string(),
        scheduled_date: input.scheduled_date.fixed_offset(),
        completed_date: None,
        performed_by_id: input.performed_by_id,
        vendor_id: input.vendor_id,
        cost: input.cost,
        description: input.description.clone(),
        results: input.results.clone(),
        next_scheduled: input.next_scheduled.map(|date| date.fixed_offset()),
        created_at: now.fixed_offset(),
        updated_at: now.fixed_offset(),
        deleted_at: None,
    };

    Ok(ValidatedCreation {
        tenant_id,
        record: NewRecord::Maintenance(record),
        effects,
    })
}

/// Checks a new procurement request and its items.
pub async fn validate_procurement_request<S>(
    store: &S,
    clock: &dyn Clock,
    input: &NewProcurementRequest,
    actor: &ActorContext,
) -> Result<ValidatedCreation, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let tenant_id = actor.tenant_id;
    let requested_by_id = input
        .requested_by_id
        .or(actor.person_id)
        .ok_or_else(|| LifecycleError::Validation("requested_by_id is required".to_string()))?;
    require(store, tenant_id, EntityKind::Person, "requested_by_id", requested_by_id).await?;

    let now = clock.now();
    let request_id = Uuid::new_v4();
    let mut items = Vec::with_capacity(input.items.len());
    for item in &input.items {
        if item.quantity < 1 {
            return Err(LifecycleError::Validation(
                "item quantity must be at least 1".to_string(),
            ));
        }
        if item.description.trim().is_empty() {
            return Err(LifecycleError::Validation(
                "item description is required".to_string(),
            ));
        }
        require(store, tenant_id, EntityKind::AssetCategory, "category_id", item.category_id)
            .await?;
        if let Some(vendor) = item.preferred_vendor_id {
            require(store, tenant_id, EntityKind::Vendor, "preferred_vendor_id", vendor).await?;
        }

        items.push(procurement_item::Model {
            id: Uuid::new_v4(),
            tenant_id,
            procurement_id: request_id,
            category_id: item.category_id,
            description: item.description.clone(),
            quantity: item.quantity,
            estimated_price: item.estimated_price,
            preferred_vendor_id: item.preferred_vendor_id,
            justification: item.justification.clone(),
            status: PROCUREMENT_ITEM_PENDING.to_string(),
            created_at: now.fixed_offset(),
            updated_at: now.fixed_offset(),
            deleted_at: None,
        });
    }

    let total_budget = input.total_budget.or_else(|| estimated_total(&input.items));

    let request = procurement_request::Model {
        id: request_id,
        tenant_id,
        request_number: String::new(),
        requested_by_id,
        approved_by_id: None,
        status: ProcurementStatus::Draft.as_str().to_string(),
        request_date: now.fixed_offset(),
        approval_date: None,
        expected_date: input.expected_date.map(|date| date.fixed_offset()),
        total_budget,
        notes: input.notes.clone(),
        created_at: now.fixed_offset(),
        updated_at: now.fixed_offset(),
        deleted_at: None,
    };

    Ok(ValidatedCreation {
        tenant_id,
        record: NewRecord::ProcurementRequest { request, items },
        effects: Vec::new(),
    })
}

/// Checks a new purchase order. A linked procurement request must already be
/// approved.
pub async fn validate_purchase_order<S>(
    store: &S,
    clock: &dyn Clock,
    input: &NewPurchaseOrder,
    actor: &ActorContext,
) -> Result<ValidatedCreation, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let tenant_id = actor.tenant_id;
    let created_by_id = input
        .created_by_id
        .or(actor.person_id)
        .ok_or_else(|| LifecycleError::Validation("created_by_id is required".to_string()))?;
    require(store, tenant_id, EntityKind::Person, "created_by_id", created_by_id).await?;
    require(store, tenant_id, EntityKind::Vendor, "vendor_id", input.vendor_id).await?;

    if let Some(procurement_id) = input.procurement_id {
        let request = store
            .find_procurement_request(tenant_id, procurement_id)
            .await?
            .ok_or(LifecycleError::InvalidReference {
                field: "procurement_id",
                id: procurement_id,
            })?;
        let status: ProcurementStatus = request.status.parse()?;
        if !matches!(
            status,
            ProcurementStatus::Approved | ProcurementStatus::Ordered
        ) {
            return Err(LifecycleError::NotEditable {
                kind: EntityKind::ProcurementRequest,
                status: request.status,
            });
        }
    }

    let now = clock.now();
    let order = purchase_order::Model {
        id: Uuid::new_v4(),
        tenant_id,
        order_number: String::new(),
        procurement_id: input.procurement_id,
        vendor_id: input.vendor_id,
        status: PURCHASE_ORDER_DRAFT.to_string(),
        order_date: now.fixed_offset(),
        expected_delivery: input.expected_delivery.map(|date| date.fixed_offset()),
        delivery_address: input.delivery_address.clone(),
        total_amount: input.total_amount,
        notes: input.notes.clone(),
        created_by_id,
        created_at: now.fixed_offset(),
        updated_at: now.fixed_offset(),
        deleted_at: None,
    };

    Ok(ValidatedCreation {
        tenant_id,
        record: NewRecord::PurchaseOrder(order),
        effects: Vec::new(),
    })
}

/// Loads a procurement request whose descriptive fields may still change.
pub async fn ensure_procurement_editable<S>(
    store: &S,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<(procurement_request::Model, ProcurementStatus), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let request = store
        .find_procurement_request(tenant_id, id)
        .await?
        .ok_or(LifecycleError::NotFound {
            kind: EntityKind::ProcurementRequest,
            id,
        })?;
    let status: ProcurementStatus = request.status.parse()?;
    if !status.is_editable() {
        return Err(LifecycleError::NotEditable {
            kind: EntityKind::ProcurementRequest,
            status: request.status,
        });
    }
    Ok((request, status))
}

pub(crate) async fn require<S>(
    store: &S,
    tenant_id: Uuid,
    kind: EntityKind,
    field: &'static str,
    id: Uuid,
) -> Result<(), LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    if store.exists(tenant_id, kind, id).await? {
        Ok(())
    } else {
        Err(LifecycleError::InvalidReference { field, id })
    }
}

async fn load_asset<S>(store: &S, tenant_id: Uuid, id: Uuid) -> Result<asset::Model, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    store
        .find_asset(tenant_id, id)
        .await?
        .ok_or(LifecycleError::NotFound {
            kind: EntityKind::Asset,
            id,
        })
}

/// An asset can only go into maintenance from stock. One that is already in
/// maintenance stays there; an assigned asset must be returned first.
fn enter_maintenance(asset: &asset::Model) -> Result<Option<DependentUpdate>, LifecycleError> {
    let status: AssetStatus = asset.status.parse()?;
    match status {
        AssetStatus::InStock => Ok(Some(DependentUpdate::Asset {
            asset_id: asset.id,
            from: AssetStatus::InStock,
            to: AssetStatus::Maintenance,
            assignee: AssigneeChange::Keep,
        })),
        AssetStatus::Maintenance => Ok(None),
        _ => Err(LifecycleError::AssetUnavailable {
            asset_id: asset.id,
            status: asset.status.clone(),
        }),
    }
}

/// Returns the asset to stock when it is in maintenance and the closing
/// record is the last one in progress.
async fn leave_maintenance<S>(
    store: &S,
    tenant_id: Uuid,
    asset_id: Uuid,
) -> Result<Option<DependentUpdate>, LifecycleError>
where
    S: LifecycleStore + ?Sized,
{
    let Some(asset) = store.find_asset(tenant_id, asset_id).await? else {
        return Ok(None);
    };
    let status: AssetStatus = asset.status.parse()?;
    if status != AssetStatus::Maintenance {
        return Ok(None);
    }
    let in_progress = store
        .count_dependents(tenant_id, Dependents::InProgressMaintenance(asset_id))
        .await?;
    if in_progress > 1 {
        return Ok(None);
    }
    Ok(Some(DependentUpdate::Asset {
        asset_id,
        from: AssetStatus::Maintenance,
        to: AssetStatus::InStock,
        assignee: AssigneeChange::Keep,
    }))
}

fn estimated_total(items: &[NewProcurementItem]) -> Option<f64> {
    items
        .iter()
        .filter_map(|item| {
            item.estimated_price
                .map(|price| price * f64::from(item.quantity))
        })
        .reduce(|total, line| total + line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, price: Option<f64>) -> NewProcurementItem {
        NewProcurementItem {
            category_id: Uuid::new_v4(),
            description: "Laptop".to_string(),
            quantity,
            estimated_price: price,
            preferred_vendor_id: None,
            justification: None,
        }
    }

    #[test]
    fn estimated_total_sums_priced_lines_only() {
        assert_eq!(estimated_total(&[]), None);
        assert_eq!(estimated_total(&[item(2, None)]), None);
        assert_eq!(
            estimated_total(&[item(2, Some(10.0)), item(1, None), item(3, Some(1.5))]),
            Some(24.5)
        );
    }

    #[test]
    fn only_stocked_assets_enter_maintenance() {
        let mut asset = asset::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Drill".to_string(),
            description: None,
            category_id: Uuid::new_v4(),
            serial_number: None,
            model_number: None,
            manufacturer: None,
            purchase_date: None,
            purchase_price: None,
            warranty_expiry: None,
            status: "in_stock".to_string(),
            location_id: None,
            current_assignee_id: None,
            notes: None,
            tags: None,
            barcode: None,
            created_at: Utc::now().fixed_offset(),
            updated_at: Utc::now().fixed_offset(),
            deleted_at: None,
        };
        assert!(matches!(
            enter_maintenance(&asset),
            Ok(Some(DependentUpdate::Asset {
                to: AssetStatus::Maintenance,
                ..
            }))
        ));

        asset.status = "maintenance".to_string();
        assert_eq!(enter_maintenance(&asset).unwrap(), None);

        asset.status = "assigned".to_string();
        assert!(matches!(
            enter_maintenance(&asset),
            Err(LifecycleError::AssetUnavailable { .. })
        ));
    }
}
