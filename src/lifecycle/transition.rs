//! Requests handed to the validator and the change plans it hands back.
//!
//! A plan describes every write a mutation needs. Nothing here touches
//! storage; the enforcer applies a plan inside the caller's transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::LifecycleError;
use super::status::{
    AssetStatus, AssignmentStatus, EntityKind, LifecycleStatus, MaintenanceStatus,
    ProcurementStatus,
};
use crate::models::{
    asset_assignment, maintenance_record, procurement_item, procurement_request, purchase_order,
};

/// Who is asking, as resolved by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub tenant_id: Uuid,
    /// Trusted caller identity, when the request carried one
    pub person_id: Option<Uuid>,
}

impl ActorContext {
    pub fn new(tenant_id: Uuid, person_id: Option<Uuid>) -> Self {
        Self {
            tenant_id,
            person_id,
        }
    }
}

/// Inputs a transition may need beyond the target status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionContext {
    pub actor: ActorContext,
    /// Required when approving a procurement request; never inferred from the actor
    pub approver_id: Option<Uuid>,
    /// Overrides "now" for return and completion dates
    pub effective_date: Option<DateTime<Utc>>,
}

impl TransitionContext {
    pub fn new(actor: ActorContext) -> Self {
        Self {
            actor,
            approver_id: None,
            effective_date: None,
        }
    }

    pub fn with_approver(mut self, approver_id: Option<Uuid>) -> Self {
        self.approver_id = approver_id;
        self
    }

    pub fn with_effective_date(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.effective_date = date;
        self
    }
}

/// A requested status change on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRequest {
    Asset { id: Uuid, to: AssetStatus },
    AssetAssignment { id: Uuid, to: AssignmentStatus },
    MaintenanceRecord { id: Uuid, to: MaintenanceStatus },
    ProcurementRequest { id: Uuid, to: ProcurementStatus },
}

impl TransitionRequest {
    /// Builds a request from string-typed input.
    pub fn parse(entity_type: &str, id: Uuid, to: &str) -> Result<Self, LifecycleError> {
        let kind: EntityKind = entity_type.parse()?;
        Ok(match kind {
            EntityKind::Asset => TransitionRequest::Asset { id, to: to.parse()? },
            EntityKind::AssetAssignment => TransitionRequest::AssetAssignment { id, to: to.parse()? },
            EntityKind::MaintenanceRecord => {
                TransitionRequest::MaintenanceRecord { id, to: to.parse()? }
            }
            EntityKind::ProcurementRequest => {
                TransitionRequest::ProcurementRequest { id, to: to.parse()? }
            }
            other => return Err(LifecycleError::UnknownEntityType(other.to_string())),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            TransitionRequest::Asset { .. } => EntityKind::Asset,
            TransitionRequest::AssetAssignment { .. } => EntityKind::AssetAssignment,
            TransitionRequest::MaintenanceRecord { .. } => EntityKind::MaintenanceRecord,
            TransitionRequest::ProcurementRequest { .. } => EntityKind::ProcurementRequest,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            TransitionRequest::Asset { id, .. }
            | TransitionRequest::AssetAssignment { id, .. }
            | TransitionRequest::MaintenanceRecord { id, .. }
            | TransitionRequest::ProcurementRequest { id, .. } => id,
        }
    }

    pub fn target_status(&self) -> &'static str {
        match *self {
            TransitionRequest::Asset { to, .. } => to.as_str(),
            TransitionRequest::AssetAssignment { to, .. } => to.as_str(),
            TransitionRequest::MaintenanceRecord { to, .. } => to.as_str(),
            TransitionRequest::ProcurementRequest { to, .. } => to.as_str(),
        }
    }
}

/// The primary write of a transition: a compare-and-set on `from`.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionTarget {
    Asset {
        id: Uuid,
        from: AssetStatus,
        to: AssetStatus,
    },
    AssetAssignment {
        id: Uuid,
        from: AssignmentStatus,
        to: AssignmentStatus,
        return_date: Option<DateTime<Utc>>,
    },
    MaintenanceRecord {
        id: Uuid,
        from: MaintenanceStatus,
        to: MaintenanceStatus,
        completed_date: Option<DateTime<Utc>>,
    },
    ProcurementRequest {
        id: Uuid,
        from: ProcurementStatus,
        to: ProcurementStatus,
        approved_by_id: Option<Uuid>,
        approval_date: Option<DateTime<Utc>>,
    },
}

impl TransitionTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            TransitionTarget::Asset { .. } => EntityKind::Asset,
            TransitionTarget::AssetAssignment { .. } => EntityKind::AssetAssignment,
            TransitionTarget::MaintenanceRecord { .. } => EntityKind::MaintenanceRecord,
            TransitionTarget::ProcurementRequest { .. } => EntityKind::ProcurementRequest,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            TransitionTarget::Asset { id, .. }
            | TransitionTarget::AssetAssignment { id, .. }
            | TransitionTarget::MaintenanceRecord { id, .. }
            | TransitionTarget::ProcurementRequest { id, .. } => id,
        }
    }

    /// `(from, to)` as stored strings.
    pub fn statuses(&self) -> (&'static str, &'static str) {
        match *self {
            TransitionTarget::Asset { from, to, .. } => (from.as_str(), to.as_str()),
            TransitionTarget::AssetAssignment { from, to, .. } => (from.as_str(), to.as_str()),
            TransitionTarget::MaintenanceRecord { from, to, .. } => (from.as_str(), to.as_str()),
            TransitionTarget::ProcurementRequest { from, to, .. } => (from.as_str(), to.as_str()),
        }
    }
}

/// What happens to an asset's assignee column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeChange {
    Keep,
    Set(Uuid),
    Clear,
}

/// A write to an entity other than the one being transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentUpdate {
    /// Move an asset from the status the validator observed to a new one.
    Asset {
        asset_id: Uuid,
        from: AssetStatus,
        to: AssetStatus,
        assignee: AssigneeChange,
    },
}

/// Output of `validate` for a status change.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransition {
    pub tenant_id: Uuid,
    pub target: TransitionTarget,
    pub effects: Vec<DependentUpdate>,
}

/// A row to insert, fully built except for generated numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum NewRecord {
    Assignment(asset_assignment::Model),
    Maintenance(maintenance_record::Model),
    /// `request_number` is assigned by the enforcer
    ProcurementRequest {
        request: procurement_request::Model,
        items: Vec<procurement_item::Model>,
    },
    /// `order_number` is assigned by the enforcer
    PurchaseOrder(purchase_order::Model),
}

impl NewRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            NewRecord::Assignment(_) => EntityKind::AssetAssignment,
            NewRecord::Maintenance(_) => EntityKind::MaintenanceRecord,
            NewRecord::ProcurementRequest { .. } => EntityKind::ProcurementRequest,
            NewRecord::PurchaseOrder(_) => EntityKind::PurchaseOrder,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            NewRecord::Assignment(model) => model.id,
            NewRecord::Maintenance(model) => model.id,
            NewRecord::ProcurementRequest { request, .. } => request.id,
            NewRecord::PurchaseOrder(model) => model.id,
        }
    }
}

/// Output of a creation check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCreation {
    pub tenant_id: Uuid,
    pub record: NewRecord,
    pub effects: Vec<DependentUpdate>,
}

/// Entity addressed by a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTarget {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl DeleteTarget {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Output of `check_delete`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDeletion {
    pub tenant_id: Uuid,
    pub target: DeleteTarget,
    /// Status observed during the check; the soft delete only lands if unchanged
    pub expected_status: Option<&'static str>,
    /// Soft-delete the request's items along with it
    pub cascade_items: bool,
    pub effects: Vec<DependentUpdate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builds_typed_requests() {
        let id = Uuid::new_v4();
        let request = TransitionRequest::parse("procurement_request", id, "submitted").unwrap();
        assert_eq!(
            request,
            TransitionRequest::ProcurementRequest {
                id,
                to: ProcurementStatus::Submitted
            }
        );
        assert_eq!(request.kind(), EntityKind::ProcurementRequest);
        assert_eq!(request.target_status(), "submitted");
    }

    #[test]
    fn parse_rejects_kinds_without_a_status_table() {
        let result = TransitionRequest::parse("vendor", Uuid::new_v4(), "active");
        assert!(matches!(result, Err(LifecycleError::UnknownEntityType(_))));

        let result = TransitionRequest::parse("asset", Uuid::new_v4(), "stolen");
        assert!(matches!(result, Err(LifecycleError::UnknownStatus { .. })));
    }
}
