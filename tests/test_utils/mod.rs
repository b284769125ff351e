//! Test utilities for database testing.
//!
//! In-memory SQLite with migrations applied, plus a seeded tenant that the
//! lifecycle tests build on.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use kontena::lifecycle::{ActorContext, FixedClock};
use kontena::models::{asset, asset_category, location, person, vendor};
use kontena::repositories::{
    AssetCategoryRepository, AssetRepository, CreateAsset, CreateCategory, CreateLocation,
    CreatePerson, CreateTenantRequest, CreateVendor, LocationRepository, PersonRepository,
    TenantRepository, VendorRepository,
};
use kontena::services::LifecycleService;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // Fixture rows are inserted in dependency order, but SQLite's FK checks
    // differ from Postgres; keep them off like the rest of the suite.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// The instant every test service believes it is.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

/// A lifecycle service on `db` whose clock is frozen at [`test_now`].
pub fn test_service(db: &DatabaseConnection) -> LifecycleService {
    LifecycleService::new(db.clone(), Arc::new(FixedClock(test_now())), 3)
}

/// One seeded tenant: two people, a category, a location and a vendor.
#[allow(dead_code)]
pub struct TenantFixture {
    pub tenant_id: Uuid,
    pub requester: person::Model,
    pub manager: person::Model,
    pub category: asset_category::Model,
    pub location: location::Model,
    pub vendor: vendor::Model,
}

#[allow(dead_code)]
impl TenantFixture {
    /// Acting as the requester.
    pub fn actor(&self) -> ActorContext {
        ActorContext::new(self.tenant_id, Some(self.requester.id))
    }

    /// Acting without an `X-Person-Id`.
    pub fn anonymous(&self) -> ActorContext {
        ActorContext::new(self.tenant_id, None)
    }
}

/// Creates a tenant and its reference data through the repositories.
pub async fn seed_tenant(db: &DatabaseConnection, name: &str) -> Result<TenantFixture> {
    let tenant = TenantRepository::new(db)
        .create(
            CreateTenantRequest {
                name: name.to_string(),
            },
            test_now(),
        )
        .await?;

    let people = PersonRepository::new(db);
    let requester = people
        .create(
            tenant.id,
            CreatePerson {
                name: "Rita Requester".to_string(),
                email: format!("rita@{}.test", name.to_lowercase()),
                role: String::new(),
                position: Some("Engineer".to_string()),
                phone: None,
            },
            test_now(),
        )
        .await?;
    let manager = people
        .create(
            tenant.id,
            CreatePerson {
                name: "Manny Manager".to_string(),
                email: format!("manny@{}.test", name.to_lowercase()),
                role: "manager".to_string(),
                position: None,
                phone: None,
            },
            test_now(),
        )
        .await?;

    let category = AssetCategoryRepository::new(db)
        .create(
            tenant.id,
            CreateCategory {
                name: "Laptops".to_string(),
                description: None,
                parent_id: None,
            },
            test_now(),
        )
        .await?;
    let location = LocationRepository::new(db)
        .create(
            tenant.id,
            CreateLocation {
                name: "HQ".to_string(),
                description: None,
                address: Some("1 Main St".to_string()),
                location_type: Some("building".to_string()),
                parent_id: None,
            },
            test_now(),
        )
        .await?;
    let vendor = VendorRepository::new(db)
        .create(
            tenant.id,
            CreateVendor {
                name: "Acme Supplies".to_string(),
                ..Default::default()
            },
            test_now(),
        )
        .await?;

    Ok(TenantFixture {
        tenant_id: tenant.id,
        requester,
        manager,
        category,
        location,
        vendor,
    })
}

/// Inserts an asset directly in `status`, bypassing the creation rules.
#[allow(dead_code)]
pub async fn insert_asset(
    db: &DatabaseConnection,
    fixture: &TenantFixture,
    name: &str,
    status: &str,
) -> Result<asset::Model> {
    let asset = AssetRepository::new(db)
        .create(
            fixture.tenant_id,
            status,
            CreateAsset {
                name: name.to_string(),
                description: None,
                category_id: fixture.category.id,
                serial_number: Some(format!("SN-{name}")),
                model_number: None,
                manufacturer: None,
                purchase_date: None,
                purchase_price: Some(1200.0),
                warranty_expiry: None,
                location_id: Some(fixture.location.id),
                notes: None,
                tags: None,
                barcode: None,
            },
            test_now(),
        )
        .await?;
    Ok(asset)
}
