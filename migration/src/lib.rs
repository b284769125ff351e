//! Database migrations for the Kontena asset and procurement service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2024_01_01_000001_create_tenants;
mod m2024_01_01_000002_create_people;
mod m2024_01_01_000003_create_reference_data;
mod m2024_01_01_000004_create_assets;
mod m2024_01_01_000005_create_asset_assignments;
mod m2024_01_01_000006_create_maintenance_records;
mod m2024_01_01_000007_create_procurement;
mod m2024_01_01_000008_create_document_sequences;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2024_01_01_000001_create_tenants::Migration),
            Box::new(m2024_01_01_000002_create_people::Migration),
            Box::new(m2024_01_01_000003_create_reference_data::Migration),
            Box::new(m2024_01_01_000004_create_assets::Migration),
            Box::new(m2024_01_01_000005_create_asset_assignments::Migration),
            Box::new(m2024_01_01_000006_create_maintenance_records::Migration),
            Box::new(m2024_01_01_000007_create_procurement::Migration),
            Box::new(m2024_01_01_000008_create_document_sequences::Migration),
        ]
    }
}
