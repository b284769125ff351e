//! Migration to create the document_sequences table.
//!
//! One counter row per (tenant, prefix, day). The row is bumped inside the
//! transaction that creates the numbered document, so concurrent creators
//! serialize on it instead of reading "the last number" and racing.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentSequences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DocumentSequences::TenantId).uuid().not_null())
                    .col(ColumnDef::new(DocumentSequences::Prefix).text().not_null())
                    .col(ColumnDef::new(DocumentSequences::Day).text().not_null())
                    .col(
                        ColumnDef::new(DocumentSequences::LastValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DocumentSequences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(DocumentSequences::TenantId)
                            .col(DocumentSequences::Prefix)
                            .col(DocumentSequences::Day),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_sequences_tenant_id")
                            .from(DocumentSequences::Table, DocumentSequences::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentSequences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocumentSequences {
    Table,
    TenantId,
    Prefix,
    Day,
    LastValue,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
}
