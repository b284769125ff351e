//! Migration to create the maintenance_records table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MaintenanceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaintenanceRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MaintenanceRecords::TenantId).uuid().not_null())
                    .col(ColumnDef::new(MaintenanceRecords::AssetId).uuid().not_null())
                    .col(
                        ColumnDef::new(MaintenanceRecords::MaintenanceType)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::Status)
                            .text()
                            .not_null()
                            .default("scheduled"),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::ScheduledDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::CompletedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(MaintenanceRecords::PerformedById).uuid().null())
                    .col(ColumnDef::new(MaintenanceRecords::VendorId).uuid().null())
                    .col(ColumnDef::new(MaintenanceRecords::Cost).double().null())
                    .col(
                        ColumnDef::new(MaintenanceRecords::Description)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MaintenanceRecords::Results).text().null())
                    .col(
                        ColumnDef::new(MaintenanceRecords::NextScheduled)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MaintenanceRecords::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_records_tenant_id")
                            .from(MaintenanceRecords::Table, MaintenanceRecords::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_records_asset_id")
                            .from(MaintenanceRecords::Table, MaintenanceRecords::AssetId)
                            .to(Assets::Table, Assets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_records_performed_by_id")
                            .from(MaintenanceRecords::Table, MaintenanceRecords::PerformedById)
                            .to(People::Table, People::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_records_vendor_id")
                            .from(MaintenanceRecords::Table, MaintenanceRecords::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_maintenance_records_asset_status")
                    .table(MaintenanceRecords::Table)
                    .col(MaintenanceRecords::AssetId)
                    .col(MaintenanceRecords::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaintenanceRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MaintenanceRecords {
    Table,
    Id,
    TenantId,
    AssetId,
    MaintenanceType,
    Status,
    ScheduledDate,
    CompletedDate,
    PerformedById,
    VendorId,
    Cost,
    Description,
    Results,
    NextScheduled,
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
enum Assets {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum People {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
}
