//! Asset entity model
//!
//! This module contains the SeaORM entity model for the assets table.
//! `status` holds one of the `AssetStatus` strings and is only changed through
//! the lifecycle layer; `current_assignee_id` is set exactly while the asset
//! is `assigned`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Asset entity representing a tracked physical or digital asset
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    /// Unique identifier for the asset (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant identifier for multi-tenancy
    pub tenant_id: Uuid,

    /// Human readable name
    pub name: String,

    pub description: Option<String>,

    /// Category this asset belongs to
    pub category_id: Uuid,

    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<DateTimeWithTimeZone>,
    pub purchase_price: Option<f64>,
    pub warranty_expiry: Option<DateTimeWithTimeZone>,

    /// Lifecycle status (procurement, in_stock, assigned, maintenance, retired)
    pub status: String,

    /// Location where the asset is kept
    pub location_id: Option<Uuid>,

    /// Person currently holding the asset
    pub current_assignee_id: Option<Uuid>,

    pub notes: Option<String>,
    pub tags: Option<String>,
    pub barcode: Option<String>,

    /// Timestamp when the asset was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the asset was last updated
    pub updated_at: DateTimeWithTimeZone,

    /// Soft-delete marker
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset_category::Entity",
        from = "Column::CategoryId",
        to = "super::asset_category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::asset_assignment::Entity")]
    Assignment,
    #[sea_orm(has_many = "super::maintenance_record::Entity")]
    Maintenance,
}

impl Related<super::asset_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::asset_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::maintenance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Maintenance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
