//! Lifecycle rules for assets, assignments, maintenance and procurement.
//!
//! The flow for every mutation is the same: the validator reads through a
//! [`LifecycleStore`] and returns a plan, the enforcer applies the plan with
//! compare-and-set writes, and the service wraps both in one transaction.

pub mod clock;
pub mod enforcer;
pub mod error;
pub mod numbering;
pub mod status;
pub mod store;
pub mod transition;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ApplyError, LifecycleError};
pub use status::{
    AssetStatus, AssignmentStatus, EntityKind, LifecycleStatus, MaintenanceStatus,
    MaintenanceType, ProcurementStatus, allowed_transitions,
};
pub use store::{Dependents, LifecycleStore, SeaOrmStore};
pub use transition::{
    ActorContext, AssigneeChange, DeleteTarget, DependentUpdate, NewRecord, TransitionContext,
    TransitionRequest, TransitionTarget, ValidatedCreation, ValidatedDeletion,
    ValidatedTransition,
};
pub use validator::{
    NewAssignment, NewMaintenance, NewProcurementItem, NewProcurementRequest, NewPurchaseOrder,
};
