//! Error taxonomy for lifecycle validation and application.

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use super::status::EntityKind;
use crate::error::is_unique_violation;

/// Errors returned by the validator, the enforcer and the numbering sequence.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{kind} cannot move from '{from}' to '{to}'")]
    IllegalTransition {
        kind: EntityKind,
        from: String,
        to: String,
    },

    #[error("approver is missing or is not a person of this tenant")]
    InvalidApprover { approver_id: Option<Uuid> },

    #[error("{field} {id} does not exist in this tenant")]
    InvalidReference { field: &'static str, id: Uuid },

    #[error("{kind} {id} still has {count} {dependent}")]
    HasDependents {
        kind: EntityKind,
        id: Uuid,
        dependent: &'static str,
        count: u64,
    },

    #[error("unknown entity type '{0}'")]
    UnknownEntityType(String),

    #[error("unknown {kind} status '{status}'")]
    UnknownStatus { kind: EntityKind, status: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("{kind} cannot be modified in status '{status}'")]
    NotEditable { kind: EntityKind, status: String },

    #[error("asset {asset_id} is not available (status '{status}')")]
    AssetUnavailable { asset_id: Uuid, status: String },

    #[error("asset {asset_id} is already assigned to {assignee}")]
    AlreadyAssigned { asset_id: Uuid, assignee: Uuid },

    #[error("{kind} {id} would become its own ancestor")]
    CyclicHierarchy { kind: EntityKind, id: Uuid },

    #[error("{0}")]
    Validation(String),

    #[error("storage read failed: {0}")]
    Storage(#[source] DbErr),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl LifecycleError {
    /// Whether re-running the whole unit of work may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LifecycleError::Apply(err) if err.is_conflict())
    }
}

impl From<DbErr> for LifecycleError {
    fn from(error: DbErr) -> Self {
        LifecycleError::Storage(error)
    }
}

/// Failure while persisting a validated change.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// A compare-and-set write matched no row: someone else changed it first.
    #[error("{kind} {id} was modified concurrently")]
    Conflict { kind: EntityKind, id: Uuid },

    #[error("write rejected by a uniqueness constraint")]
    UniqueViolation(#[source] DbErr),

    #[error("storage write failed: {0}")]
    Storage(#[source] DbErr),
}

impl ApplyError {
    /// Classify a write error coming back from SeaORM.
    pub fn from_db(error: DbErr) -> Self {
        if is_unique_violation(&error) {
            ApplyError::UniqueViolation(error)
        } else {
            ApplyError::Storage(error)
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ApplyError::Conflict { .. } | ApplyError::UniqueViolation(_)
        )
    }
}
