//! Migration to create the assets table.
//!
//! `status` is stored as text; the lifecycle layer owns the set of legal
//! values. `current_assignee_id` is non-null exactly when `status = 'assigned'`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Assets::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Assets::Name).text().not_null())
                    .col(ColumnDef::new(Assets::Description).text().null())
                    .col(ColumnDef::new(Assets::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(Assets::SerialNumber).text().null())
                    .col(ColumnDef::new(Assets::ModelNumber).text().null())
                    .col(ColumnDef::new(Assets::Manufacturer).text().null())
                    .col(
                        ColumnDef::new(Assets::PurchaseDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Assets::PurchasePrice).double().null())
                    .col(
                        ColumnDef::new(Assets::WarrantyExpiry)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Assets::Status)
                            .text()
                            .not_null()
                            .default("in_stock"),
                    )
                    .col(ColumnDef::new(Assets::LocationId).uuid().null())
                    .col(ColumnDef::new(Assets::CurrentAssigneeId).uuid().null())
                    .col(ColumnDef::new(Assets::Notes).text().null())
                    .col(ColumnDef::new(Assets::Tags).text().null())
                    .col(ColumnDef::new(Assets::Barcode).text().null())
                    .col(
                        ColumnDef::new(Assets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Assets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Assets::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_tenant_id")
                            .from(Assets::Table, Assets::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_category_id")
                            .from(Assets::Table, Assets::CategoryId)
                            .to(AssetCategories::Table, AssetCategories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_location_id")
                            .from(Assets::Table, Assets::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_current_assignee_id")
                            .from(Assets::Table, Assets::CurrentAssigneeId)
                            .to(People::Table, People::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index for tenant-scoped listings filtered by status
        manager
            .create_index(
                Index::create()
                    .name("idx_assets_tenant_status")
                    .table(Assets::Table)
                    .col(Assets::TenantId)
                    .col(Assets::Status)
                    .to_owned(),
            )
            .await?;

        // Create index for category and location dependent lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_assets_category_id")
                    .table(Assets::Table)
                    .col(Assets::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assets_location_id")
                    .table(Assets::Table)
                    .col(Assets::LocationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    CategoryId,
    SerialNumber,
    ModelNumber,
    Manufacturer,
    PurchaseDate,
    PurchasePrice,
    WarrantyExpiry,
    Status,
    LocationId,
    CurrentAssigneeId,
    Notes,
    Tags,
    Barcode,
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
enum AssetCategories {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum People {
    Table,
    Id,
}
