//! Migration to create the asset_assignments table.
//!
//! A partial unique index guarantees at most one live `active` assignment per
//! asset, so two racing assignment requests cannot both commit.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssetAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetAssignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AssetAssignments::TenantId).uuid().not_null())
                    .col(ColumnDef::new(AssetAssignments::AssetId).uuid().not_null())
                    .col(
                        ColumnDef::new(AssetAssignments::AssignedToId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetAssignments::AssignedById)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetAssignments::AssignmentDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssetAssignments::ReturnDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssetAssignments::ExpectedReturn)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(AssetAssignments::Notes).text().null())
                    .col(
                        ColumnDef::new(AssetAssignments::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(AssetAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AssetAssignments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AssetAssignments::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_assignments_tenant_id")
                            .from(AssetAssignments::Table, AssetAssignments::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_assignments_asset_id")
                            .from(AssetAssignments::Table, AssetAssignments::AssetId)
                            .to(Assets::Table, Assets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_assignments_assigned_to_id")
                            .from(AssetAssignments::Table, AssetAssignments::AssignedToId)
                            .to(People::Table, People::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_assignments_assigned_by_id")
                            .from(AssetAssignments::Table, AssetAssignments::AssignedById)
                            .to(People::Table, People::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_asset_assignments_tenant_asset")
                    .table(AssetAssignments::Table)
                    .col(AssetAssignments::TenantId)
                    .col(AssetAssignments::AssetId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_asset_assignments_one_active \
                 ON asset_assignments (tenant_id, asset_id) \
                 WHERE status = 'active' AND deleted_at IS NULL"
                    .to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "DROP INDEX IF EXISTS idx_asset_assignments_one_active",
            ))
            .await?;

        manager
            .drop_table(Table::drop().table(AssetAssignments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AssetAssignments {
    Table,
    Id,
    TenantId,
    AssetId,
    AssignedToId,
    AssignedById,
    AssignmentDate,
    ReturnDate,
    ExpectedReturn,
    Notes,
    Status,
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
