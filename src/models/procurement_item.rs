//! ProcurementItem entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "procurement_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Owning procurement request
    pub procurement_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub estimated_price: Option<f64>,
    pub preferred_vendor_id: Option<Uuid>,
    pub justification: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::procurement_request::Entity",
        from = "Column::ProcurementId",
        to = "super::procurement_request::Column::Id"
    )]
    Request,
}

impl Related<super::procurement_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
