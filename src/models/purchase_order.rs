//! PurchaseOrder entity model
//!
//! Purchase orders reference a vendor and optionally the procurement request
//! they fulfil. Both references block deletion of the referenced row.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Generated `PO-YYYYMMDD-NNN` number
    pub order_number: String,
    pub procurement_id: Option<Uuid>,
    pub vendor_id: Uuid,
    pub status: String,
    pub order_date: DateTimeWithTimeZone,
    pub expected_delivery: Option<DateTimeWithTimeZone>,
    pub delivery_address: Option<String>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
    pub created_by_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
