//! # Data Models
//!
//! SeaORM entities for the asset and procurement tables, plus the small
//! response types shared by the HTTP layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod asset;
pub mod asset_assignment;
pub mod asset_category;
pub mod document_sequence;
pub mod location;
pub mod maintenance_record;
pub mod person;
pub mod procurement_item;
pub mod procurement_request;
pub mod purchase_order;
pub mod tenant;
pub mod vendor;

pub use asset::Entity as Asset;
pub use asset_assignment::Entity as AssetAssignment;
pub use asset_category::Entity as AssetCategory;
pub use document_sequence::Entity as DocumentSequence;
pub use location::Entity as Location;
pub use maintenance_record::Entity as MaintenanceRecord;
pub use person::Entity as Person;
pub use procurement_item::Entity as ProcurementItem;
pub use procurement_request::Entity as ProcurementRequest;
pub use purchase_order::Entity as PurchaseOrder;
pub use tenant::Entity as Tenant;
pub use vendor::Entity as Vendor;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "kontena".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
