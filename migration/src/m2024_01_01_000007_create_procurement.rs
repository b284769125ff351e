//! Migration to create the procurement tables.
//!
//! Creates procurement_requests with their procurement_items, and
//! purchase_orders. Request and order numbers are unique per tenant.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProcurementRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProcurementRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProcurementRequests::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProcurementRequests::RequestNumber)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProcurementRequests::RequestedById)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProcurementRequests::ApprovedById).uuid().null())
                    .col(
                        ColumnDef::new(ProcurementRequests::Status)
                            .text()
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(ProcurementRequests::RequestDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProcurementRequests::ApprovalDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProcurementRequests::ExpectedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProcurementRequests::TotalBudget)
                            .double()
                            .null(),
                    )
                    .col(ColumnDef::new(ProcurementRequests::Notes).text().null())
                    .col(
                        ColumnDef::new(ProcurementRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProcurementRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProcurementRequests::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_procurement_requests_tenant_id")
                            .from(ProcurementRequests::Table, ProcurementRequests::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_procurement_requests_requested_by_id")
                            .from(
                                ProcurementRequests::Table,
                                ProcurementRequests::RequestedById,
                            )
                            .to(People::Table, People::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_procurement_requests_approved_by_id")
                            .from(ProcurementRequests::Table, ProcurementRequests::ApprovedById)
                            .to(People::Table, People::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create composite unique index on (tenant_id, request_number)
        manager
            .create_index(
                Index::create()
                    .name("idx_procurement_requests_tenant_number")
                    .table(ProcurementRequests::Table)
                    .col(ProcurementRequests::TenantId)
                    .col(ProcurementRequests::RequestNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProcurementItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProcurementItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProcurementItems::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProcurementItems::ProcurementId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProcurementItems::CategoryId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProcurementItems::Description)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProcurementItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(ProcurementItems::EstimatedPrice)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProcurementItems::PreferredVendorId)
                            .uuid()
                            .null(),
                    )
                    .col(ColumnDef::new(ProcurementItems::Justification).text().null())
                    .col(
                        ColumnDef::new(ProcurementItems::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ProcurementItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProcurementItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProcurementItems::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_procurement_items_procurement_id")
                            .from(ProcurementItems::Table, ProcurementItems::ProcurementId)
                            .to(ProcurementRequests::Table, ProcurementRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_procurement_items_category_id")
                            .from(ProcurementItems::Table, ProcurementItems::CategoryId)
                            .to(AssetCategories::Table, AssetCategories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_procurement_items_preferred_vendor_id")
                            .from(ProcurementItems::Table, ProcurementItems::PreferredVendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_procurement_items_procurement_id")
                    .table(ProcurementItems::Table)
                    .col(ProcurementItems::ProcurementId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::TenantId).uuid().not_null())
                    .col(ColumnDef::new(PurchaseOrders::OrderNumber).text().not_null())
                    .col(ColumnDef::new(PurchaseOrders::ProcurementId).uuid().null())
                    .col(ColumnDef::new(PurchaseOrders::VendorId).uuid().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::Status)
                            .text()
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::ExpectedDelivery)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::DeliveryAddress).text().null())
                    .col(ColumnDef::new(PurchaseOrders::TotalAmount).double().null())
                    .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                    .col(ColumnDef::new(PurchaseOrders::CreatedById).uuid().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_tenant_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_procurement_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::ProcurementId)
                            .to(ProcurementRequests::Table, ProcurementRequests::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_vendor_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_created_by_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::CreatedById)
                            .to(People::Table, People::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_tenant_number")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::TenantId)
                    .col(PurchaseOrders::OrderNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProcurementItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProcurementRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProcurementRequests {
    Table,
    Id,
    TenantId,
    RequestNumber,
    RequestedById,
    ApprovedById,
    Status,
    RequestDate,
    ApprovalDate,
    ExpectedDate,
    TotalBudget,
    Notes,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum ProcurementItems {
    Table,
    Id,
    TenantId,
    ProcurementId,
    CategoryId,
    Description,
    Quantity,
    EstimatedPrice,
    PreferredVendorId,
    Justification,
    Status,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Id,
    TenantId,
    OrderNumber,
    ProcurementId,
    VendorId,
    Status,
    OrderDate,
    ExpectedDelivery,
    DeliveryAddress,
    TotalAmount,
    Notes,
    CreatedById,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum People {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AssetCategories {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
}
