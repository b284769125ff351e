//! Status registry: the legal states of each lifecycle entity and the
//! transitions a caller may request directly.
//!
//! Statuses are persisted as their snake_case string. Anything stored or
//! received outside the catalogue fails with `UnknownStatus`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::LifecycleError;

/// Entity types known to the lifecycle layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Asset,
    AssetAssignment,
    MaintenanceRecord,
    ProcurementRequest,
    PurchaseOrder,
    AssetCategory,
    Location,
    Vendor,
    Person,
}

impl EntityKind {
    pub const ALL: &'static [EntityKind] = &[
        EntityKind::Asset,
        EntityKind::AssetAssignment,
        EntityKind::MaintenanceRecord,
        EntityKind::ProcurementRequest,
        EntityKind::PurchaseOrder,
        EntityKind::AssetCategory,
        EntityKind::Location,
        EntityKind::Vendor,
        EntityKind::Person,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Asset => "asset",
            EntityKind::AssetAssignment => "asset_assignment",
            EntityKind::MaintenanceRecord => "maintenance_record",
            EntityKind::ProcurementRequest => "procurement_request",
            EntityKind::PurchaseOrder => "purchase_order",
            EntityKind::AssetCategory => "asset_category",
            EntityKind::Location => "location",
            EntityKind::Vendor => "vendor",
            EntityKind::Person => "person",
        }
    }

    /// Whether this kind carries a status governed by a transition table.
    pub fn has_status_table(self) -> bool {
        matches!(
            self,
            EntityKind::Asset
                | EntityKind::AssetAssignment
                | EntityKind::MaintenanceRecord
                | EntityKind::ProcurementRequest
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = LifecycleError;

    /// Accepts `procurement_request`, `ProcurementRequest` or `procurement-request`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().replace('_', "") == normalized)
            .ok_or_else(|| LifecycleError::UnknownEntityType(value.to_string()))
    }
}

/// Behaviour shared by every status enum in the registry.
pub trait LifecycleStatus:
    Copy + Eq + fmt::Debug + fmt::Display + FromStr<Err = LifecycleError> + Send + Sync + 'static
{
    /// Entity kind this status belongs to.
    const KIND: EntityKind;

    fn as_str(self) -> &'static str;

    /// Statuses reachable from `self` by a direct request.
    fn allowed_transitions(self) -> &'static [Self];

    fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Returns `next` when the table allows it, `IllegalTransition` otherwise.
    fn transition_to(self, next: Self) -> Result<Self, LifecycleError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LifecycleError::IllegalTransition {
                kind: Self::KIND,
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

macro_rules! lifecycle_status {
    (
        $(#[$meta:meta])*
        $name:ident for $kind:ident {
            $($variant:ident = $text:literal => [$($next:ident),*],)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];
        }

        impl LifecycleStatus for $name {
            const KIND: EntityKind = EntityKind::$kind;

            fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            fn allowed_transitions(self) -> &'static [Self] {
                match self {
                    $($name::$variant => &[$($name::$next),*],)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LifecycleError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(LifecycleError::UnknownStatus {
                        kind: EntityKind::$kind,
                        status: other.to_string(),
                    }),
                }
            }
        }
    };
}

lifecycle_status! {
    /// Asset status. `assigned` and `maintenance` are entered only through the
    /// assignment and maintenance workflows, never by a direct request.
    AssetStatus for Asset {
        Procurement = "procurement" => [InStock, Retired],
        InStock = "in_stock" => [Retired],
        Assigned = "assigned" => [],
        Maintenance = "maintenance" => [],
        Retired = "retired" => [],
    }
}

lifecycle_status! {
    AssignmentStatus for AssetAssignment {
        Active = "active" => [Returned],
        Returned = "returned" => [],
    }
}

lifecycle_status! {
    MaintenanceStatus for MaintenanceRecord {
        Scheduled = "scheduled" => [InProgress, Cancelled],
        InProgress = "in_progress" => [Completed, Cancelled],
        Completed = "completed" => [],
        Cancelled = "cancelled" => [],
    }
}

lifecycle_status! {
    /// Procurement request status. `ordered` and `received` belong to the
    /// purchase-order workflow and cannot be requested directly.
    ProcurementStatus for ProcurementRequest {
        Draft = "draft" => [Submitted, Cancelled],
        Submitted = "submitted" => [Approved, Rejected, Cancelled],
        Approved = "approved" => [],
        Rejected = "rejected" => [],
        Ordered = "ordered" => [],
        Received = "received" => [],
        Cancelled = "cancelled" => [],
    }
}

impl ProcurementStatus {
    /// Descriptive fields may change only before a decision is made.
    pub fn is_editable(self) -> bool {
        matches!(self, ProcurementStatus::Draft | ProcurementStatus::Submitted)
    }
}

impl MaintenanceStatus {
    /// Records that still hold (or will hold) the asset.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress
        )
    }
}

/// Kind of maintenance work. Descriptive only, no transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceType {
    Preventive,
    Corrective,
    Calibration,
    Inspection,
}

impl MaintenanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceType::Preventive => "preventive",
            MaintenanceType::Corrective => "corrective",
            MaintenanceType::Calibration => "calibration",
            MaintenanceType::Inspection => "inspection",
        }
    }
}

/// Looks up the statuses reachable from `from` for a string-typed entity.
///
/// Fails with `UnknownEntityType` for kinds without a status table and
/// `UnknownStatus` for values outside the catalogue.
pub fn allowed_transitions(
    entity_type: &str,
    from: &str,
) -> Result<Vec<&'static str>, LifecycleError> {
    let kind: EntityKind = entity_type.parse()?;
    match kind {
        EntityKind::Asset => reachable::<AssetStatus>(from),
        EntityKind::AssetAssignment => reachable::<AssignmentStatus>(from),
        EntityKind::MaintenanceRecord => reachable::<MaintenanceStatus>(from),
        EntityKind::ProcurementRequest => reachable::<ProcurementStatus>(from),
        other => Err(LifecycleError::UnknownEntityType(other.to_string())),
    }
}

fn reachable<S: LifecycleStatus>(from: &str) -> Result<Vec<&'static str>, LifecycleError> {
    let from: S = from.parse()?;
    Ok(from
        .allowed_transitions()
        .iter()
        .map(|status| status.as_str())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_only_table_transitions<S: LifecycleStatus>(all: &[S]) {
        for &from in all {
            for &to in all {
                let result = from.transition_to(to);
                if from.allowed_transitions().contains(&to) {
                    assert_eq!(result.unwrap(), to);
                } else {
                    match result {
                        Err(LifecycleError::IllegalTransition { kind, .. }) => {
                            assert_eq!(kind, S::KIND)
                        }
                        other => panic!("{from} -> {to} should be illegal, got {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn every_pair_outside_the_table_is_illegal() {
        assert_only_table_transitions(AssetStatus::ALL);
        assert_only_table_transitions(AssignmentStatus::ALL);
        assert_only_table_transitions(MaintenanceStatus::ALL);
        assert_only_table_transitions(ProcurementStatus::ALL);
    }

    #[test]
    fn procurement_table_matches_catalogue() {
        assert_eq!(
            allowed_transitions("procurement_request", "draft").unwrap(),
            vec!["submitted", "cancelled"]
        );
        assert_eq!(
            allowed_transitions("ProcurementRequest", "submitted").unwrap(),
            vec!["approved", "rejected", "cancelled"]
        );
        for terminal in ["approved", "rejected", "cancelled", "ordered", "received"] {
            assert!(
                allowed_transitions("procurement_request", terminal)
                    .unwrap()
                    .is_empty(),
                "{terminal} should be terminal"
            );
        }
    }

    #[test]
    fn maintenance_and_assignment_tables_match_catalogue() {
        assert_eq!(
            allowed_transitions("maintenance_record", "scheduled").unwrap(),
            vec!["in_progress", "cancelled"]
        );
        assert_eq!(
            allowed_transitions("maintenance_record", "in_progress").unwrap(),
            vec!["completed", "cancelled"]
        );
        assert!(MaintenanceStatus::Completed.is_terminal());
        assert!(MaintenanceStatus::Cancelled.is_terminal());

        assert_eq!(
            allowed_transitions("asset_assignment", "active").unwrap(),
            vec!["returned"]
        );
        assert!(
            allowed_transitions("asset-assignment", "returned")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn asset_workflow_states_are_not_directly_reachable() {
        for from in AssetStatus::ALL {
            assert!(!from.can_transition_to(AssetStatus::Assigned));
            assert!(!from.can_transition_to(AssetStatus::Maintenance));
        }
    }

    #[test]
    fn unknown_inputs_are_rejected() {
        assert!(matches!(
            allowed_transitions("ticket", "open"),
            Err(LifecycleError::UnknownEntityType(name)) if name == "ticket"
        ));
        assert!(matches!(
            allowed_transitions("vendor", "active"),
            Err(LifecycleError::UnknownEntityType(_))
        ));
        assert!(matches!(
            allowed_transitions("asset", "lost"),
            Err(LifecycleError::UnknownStatus { kind: EntityKind::Asset, status }) if status == "lost"
        ));
    }

    #[test]
    fn statuses_round_trip_through_their_stored_form() {
        for status in MaintenanceStatus::ALL {
            assert_eq!(status.as_str().parse::<MaintenanceStatus>().unwrap(), *status);
        }
        assert_eq!(
            serde_json::to_value(MaintenanceStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(AssetStatus::InStock.to_string(), "in_stock");
    }

    #[test]
    fn entity_kind_parsing_is_lenient_about_case_and_separators() {
        assert_eq!(
            "MaintenanceRecord".parse::<EntityKind>().unwrap(),
            EntityKind::MaintenanceRecord
        );
        assert_eq!(
            "asset_category".parse::<EntityKind>().unwrap(),
            EntityKind::AssetCategory
        );
        assert!(EntityKind::Asset.has_status_table());
        assert!(!EntityKind::Vendor.has_status_table());
    }
}
