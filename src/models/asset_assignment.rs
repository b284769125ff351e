//! AssetAssignment entity model
//!
//! At most one live row per asset may be `active`; a partial unique index
//! enforces this at the storage level.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "asset_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub asset_id: Uuid,
    /// Person receiving the asset
    pub assigned_to_id: Uuid,
    /// Person handing the asset out
    pub assigned_by_id: Uuid,
    pub assignment_date: DateTimeWithTimeZone,
    pub return_date: Option<DateTimeWithTimeZone>,
    pub expected_return: Option<DateTimeWithTimeZone>,
    pub notes: Option<String>,
    /// `active` or `returned`
    pub status: String,
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
