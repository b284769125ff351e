//! DocumentSequence entity model
//!
//! Per-tenant, per-prefix, per-day counters backing generated document
//! numbers.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "document_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tenant_id: Uuid,
    /// Document prefix such as `PR` or `PO`
    #[sea_orm(primary_key, auto_increment = false)]
    pub prefix: String,
    /// Calendar day as `YYYYMMDD`
    #[sea_orm(primary_key, auto_increment = false)]
    pub day: String,
    /// Last number handed out for this key
    pub last_value: i32,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
