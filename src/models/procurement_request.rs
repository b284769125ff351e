//! ProcurementRequest entity model
//!
//! A request to buy assets. `request_number` is generated per tenant and day
//! (`PR-YYYYMMDD-NNN`) and is unique per tenant.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "procurement_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub request_number: String,
    pub requested_by_id: Uuid,
    /// Stamped when the request is approved
    pub approved_by_id: Option<Uuid>,
    pub status: String,
    pub request_date: DateTimeWithTimeZone,
    pub approval_date: Option<DateTimeWithTimeZone>,
    pub expected_date: Option<DateTimeWithTimeZone>,
    pub total_budget: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::procurement_item::Entity")]
    Item,
}

impl Related<super::procurement_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
