//! Migration to create the reference data tables.
//!
//! Asset categories and locations are tenant-scoped trees linked through a
//! nullable `parent_id`; vendors are flat.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssetCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetCategories::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AssetCategories::TenantId).uuid().not_null())
                    .col(ColumnDef::new(AssetCategories::Name).text().not_null())
                    .col(ColumnDef::new(AssetCategories::Description).text().null())
                    .col(ColumnDef::new(AssetCategories::ParentId).uuid().null())
                    .col(
                        ColumnDef::new(AssetCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AssetCategories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AssetCategories::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_categories_tenant_id")
                            .from(AssetCategories::Table, AssetCategories::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_categories_parent_id")
                            .from(AssetCategories::Table, AssetCategories::ParentId)
                            .to(AssetCategories::Table, AssetCategories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_asset_categories_tenant_parent")
                    .table(AssetCategories::Table)
                    .col(AssetCategories::TenantId)
                    .col(AssetCategories::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Locations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Locations::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Locations::Name).text().not_null())
                    .col(ColumnDef::new(Locations::Description).text().null())
                    .col(ColumnDef::new(Locations::Address).text().null())
                    .col(ColumnDef::new(Locations::LocationType).text().null())
                    .col(ColumnDef::new(Locations::ParentId).uuid().null())
                    .col(
                        ColumnDef::new(Locations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Locations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Locations::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_locations_tenant_id")
                            .from(Locations::Table, Locations::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_locations_parent_id")
                            .from(Locations::Table, Locations::ParentId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_locations_tenant_parent")
                    .table(Locations::Table)
                    .col(Locations::TenantId)
                    .col(Locations::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vendors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vendors::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Vendors::Name).text().not_null())
                    .col(ColumnDef::new(Vendors::ContactName).text().null())
                    .col(ColumnDef::new(Vendors::ContactEmail).text().null())
                    .col(ColumnDef::new(Vendors::ContactPhone).text().null())
                    .col(ColumnDef::new(Vendors::Address).text().null())
                    .col(ColumnDef::new(Vendors::Website).text().null())
                    .col(ColumnDef::new(Vendors::Notes).text().null())
                    .col(
                        ColumnDef::new(Vendors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Vendors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Vendors::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vendors_tenant_id")
                            .from(Vendors::Table, Vendors::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vendors_tenant_id")
                    .table(Vendors::Table)
                    .col(Vendors::TenantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssetCategories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AssetCategories {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    ParentId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    TenantId,
    Name,
    Description,
    Address,
    LocationType,
    ParentId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
    TenantId,
    Name,
    ContactName,
    ContactEmail,
    ContactPhone,
    Address,
    Website,
    Notes,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
