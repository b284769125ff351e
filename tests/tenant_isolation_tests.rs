mod test_utils;

use anyhow::Result;
use kontena::lifecycle::{
    AssetStatus, DeleteTarget, EntityKind, LifecycleError, NewAssignment, TransitionContext,
    TransitionRequest,
};
use kontena::repositories::{AssetFilter, AssetRepository, Page};
use kontena::services::ServiceError;

use test_utils::{insert_asset, seed_tenant, setup_test_db, test_service};

#[tokio::test]
async fn assets_are_invisible_across_tenants() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = seed_tenant(&db, "Acme").await?;
    let globex = seed_tenant(&db, "Globex").await?;
    let asset = insert_asset(&db, &acme, "laptop-1", "in_stock").await?;

    let repo = AssetRepository::new(&db);
    assert!(repo.get(globex.tenant_id, asset.id).await?.is_none());
    assert!(
        repo.list(globex.tenant_id, AssetFilter::default(), Page::default())
            .await?
            .is_empty()
    );
    assert_eq!(
        repo.list(acme.tenant_id, AssetFilter::default(), Page::default())
            .await?
            .len(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn lifecycle_operations_do_not_reach_other_tenants() -> Result<()> {
    let db = setup_test_db().await?;
    let acme = seed_tenant(&db, "Acme").await?;
    let globex = seed_tenant(&db, "Globex").await?;
    let service = test_service(&db);
    let asset = insert_asset(&db, &acme, "laptop-1", "in_stock").await?;

    let err = service
        .transition(
            TransitionRequest::Asset {
                id: asset.id,
                to: AssetStatus::Retired,
            },
            TransitionContext::new(globex.actor()),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::NotFound { .. })
    ));

    // A person from another tenant is not a valid assignee
    let err = service
        .create_assignment(
            acme.actor(),
            NewAssignment {
                asset_id: asset.id,
                assigned_to_id: globex.manager.id,
                assigned_by_id: None,
                assignment_date: None,
                expected_return: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::InvalidReference { field: "assigned_to_id", .. })
    ));

    let err = service
        .delete(
            globex.actor(),
            DeleteTarget::new(EntityKind::Asset, asset.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::NotFound { .. })
    ));

    let untouched = AssetRepository::new(&db)
        .get(acme.tenant_id, asset.id)
        .await?
        .unwrap();
    assert_eq!(untouched.status, "in_stock");
    Ok(())
}
