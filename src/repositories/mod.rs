//! # Repository Layer
//!
//! Tenant-scoped SeaORM access for descriptive fields. Repositories borrow any
//! `ConnectionTrait`, so the lifecycle service can run them inside its own
//! transaction. Status columns are never written here; they belong to the
//! lifecycle layer.

pub mod asset;
pub mod asset_assignment;
pub mod asset_category;
pub mod location;
pub mod maintenance_record;
pub mod person;
pub mod procurement;
pub mod purchase_order;
pub mod tenant;
pub mod vendor;

pub use asset::{AssetFilter, AssetRepository, CreateAsset, UpdateAsset};
pub use asset_assignment::{AssignmentFilter, AssignmentRepository, UpdateAssignment};
pub use asset_category::{AssetCategoryRepository, CreateCategory, UpdateCategory};
pub use location::{CreateLocation, LocationRepository, UpdateLocation};
pub use maintenance_record::{MaintenanceFilter, MaintenanceRepository, UpdateMaintenance};
pub use person::{CreatePerson, PersonRepository};
pub use procurement::{ProcurementFilter, ProcurementRepository, UpdateProcurement};
pub use purchase_order::{PurchaseOrderFilter, PurchaseOrderRepository};
pub use tenant::{CreateTenantRequest, TenantRepository};
pub use vendor::{CreateVendor, UpdateVendor, VendorRepository};

/// Offset pagination applied to list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 500;

    /// Clamps the limit into `1..=MAX_LIMIT`.
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Rejects blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), crate::error::RepositoryError> {
    if value.trim().is_empty() {
        return Err(crate::error::RepositoryError::Validation(format!(
            "{field} is required"
        )));
    }
    if value.len() > 255 {
        return Err(crate::error::RepositoryError::Validation(format!(
            "{field} must be at most 255 characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_limit_is_clamped() {
        assert_eq!(Page::new(None, None).limit, Page::DEFAULT_LIMIT);
        assert_eq!(Page::new(Some(0), None).limit, 1);
        assert_eq!(Page::new(Some(10_000), Some(5)), Page { limit: 500, offset: 5 });
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("name", "  ").is_err());
        assert!(require_text("name", &"x".repeat(256)).is_err());
        assert!(require_text("name", "Laptop").is_ok());
    }
}
