//! MaintenanceRecord entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub asset_id: Uuid,
    /// preventive, corrective, calibration or inspection
    pub maintenance_type: String,
    /// scheduled, in_progress, completed or cancelled
    pub status: String,
    pub scheduled_date: DateTimeWithTimeZone,
    pub completed_date: Option<DateTimeWithTimeZone>,
    pub performed_by_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub cost: Option<f64>,
    pub description: String,
    pub results: Option<String>,
    pub next_scheduled: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::AssetId",
        to = "super::asset::Column::Id"
    )]
    Asset,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
