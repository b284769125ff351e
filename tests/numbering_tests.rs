//! Document numbers drawn from the per-tenant daily sequence.

mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use kontena::lifecycle::{FixedClock, NewProcurementRequest};
use kontena::services::LifecycleService;

use test_utils::{seed_tenant, setup_test_db, test_now, test_service};

#[tokio::test]
async fn request_numbers_increase_within_a_day() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let (request, _) = service
            .create_procurement_request(fx.actor(), NewProcurementRequest::default())
            .await?;
        numbers.push(request.request_number);
    }

    assert_eq!(
        numbers,
        vec!["PR-20240115-001", "PR-20240115-002", "PR-20240115-003"]
    );
    Ok(())
}

#[tokio::test]
async fn sequences_are_independent_per_tenant_and_day() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = seed_tenant(&db, "Acme").await?;
    let globex = seed_tenant(&db, "Globex").await?;
    let service = test_service(&db);

    let (first, _) = service
        .create_procurement_request(acme.actor(), NewProcurementRequest::default())
        .await?;
    let (second, _) = service
        .create_procurement_request(acme.actor(), NewProcurementRequest::default())
        .await?;
    let (other_tenant, _) = service
        .create_procurement_request(globex.actor(), NewProcurementRequest::default())
        .await?;

    assert_eq!(first.request_number, "PR-20240115-001");
    assert_eq!(second.request_number, "PR-20240115-002");
    assert_eq!(other_tenant.request_number, "PR-20240115-001");

    let tomorrow = LifecycleService::new(
        db.clone(),
        Arc::new(FixedClock(test_now() + Duration::days(1))),
        3,
    );
    let (next_day, _) = tomorrow
        .create_procurement_request(acme.actor(), NewProcurementRequest::default())
        .await?;
    assert_eq!(next_day.request_number, "PR-20240116-001");
    Ok(())
}
