//! Referential guards on delete and hierarchy edits.

mod test_utils;

use anyhow::Result;
use kontena::lifecycle::{
    DeleteTarget, EntityKind, LifecycleError, MaintenanceStatus, MaintenanceType, NewAssignment,
    NewMaintenance, NewProcurementItem, NewProcurementRequest, NewPurchaseOrder,
    ProcurementStatus, TransitionContext, TransitionRequest,
};
use kontena::repositories::{
    AssetCategoryRepository, AssetRepository, AssignmentRepository, CreateCategory,
    CreateLocation, ProcurementRepository, UpdateCategory, UpdateLocation,
};
use kontena::services::ServiceError;
use uuid::Uuid;

use test_utils::{insert_asset, seed_tenant, setup_test_db, test_now, test_service};

#[tokio::test]
async fn category_in_use_cannot_be_deleted() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);
    let asset = insert_asset(&db, &fx, "laptop-1", "in_stock").await?;
    let target = DeleteTarget::new(EntityKind::AssetCategory, fx.category.id);

    assert!(!service.can_delete(fx.actor(), target).await?);
    let err = service.delete(fx.actor(), target).await.unwrap_err();
    match err {
        ServiceError::Lifecycle(LifecycleError::HasDependents {
            kind,
            dependent,
            count,
            ..
        }) => {
            assert_eq!(kind, EntityKind::AssetCategory);
            assert_eq!(dependent, "assets");
            assert_eq!(count, 1);
        }
        other => panic!("expected dependents error, got {other:?}"),
    }

    // Once the asset is gone the category is free
    service
        .delete(fx.actor(), DeleteTarget::new(EntityKind::Asset, asset.id))
        .await?;
    assert!(service.can_delete(fx.actor(), target).await?);
    service.delete(fx.actor(), target).await?;

    let gone = AssetCategoryRepository::new(&db)
        .get(fx.tenant_id, fx.category.id)
        .await?;
    assert!(gone.is_none());
    Ok(())
}

#[tokio::test]
async fn parent_category_with_children_is_protected() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);

    let child = service
        .create_category(
            fx.actor(),
            CreateCategory {
                name: "Ultrabooks".to_string(),
                description: None,
                parent_id: Some(fx.category.id),
            },
        )
        .await?;

    assert!(
        !service
            .can_delete(
                fx.actor(),
                DeleteTarget::new(EntityKind::AssetCategory, fx.category.id)
            )
            .await?
    );
    assert!(
        service
            .can_delete(fx.actor(), DeleteTarget::new(EntityKind::AssetCategory, child.id))
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn category_cannot_become_its_own_ancestor() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);

    let child = service
        .create_category(
            fx.actor(),
            CreateCategory {
                name: "Ultrabooks".to_string(),
                description: None,
                parent_id: Some(fx.category.id),
            },
        )
        .await?;
    let grandchild = service
        .create_category(
            fx.actor(),
            CreateCategory {
                name: "13 inch".to_string(),
                description: None,
                parent_id: Some(child.id),
            },
        )
        .await?;

    let err = service
        .update_category(
            fx.actor(),
            fx.category.id,
            UpdateCategory {
                parent_id: Some(Some(grandchild.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::CyclicHierarchy { kind: EntityKind::AssetCategory, .. })
    ));

    let err = service
        .update_category(
            fx.actor(),
            child.id,
            UpdateCategory {
                parent_id: Some(Some(child.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::CyclicHierarchy { .. })
    ));

    // Detaching is always allowed
    let detached = service
        .update_category(
            fx.actor(),
            grandchild.id,
            UpdateCategory {
                parent_id: Some(None),
                ..Default::default()
            },
        )
        .await?;
    assert!(detached.parent_id.is_none());
    Ok(())
}

#[tokio::test]
async fn location_parent_must_exist_and_not_loop() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);

    let err = service
        .create_location(
            fx.actor(),
            CreateLocation {
                name: "Room 101".to_string(),
                description: None,
                address: None,
                location_type: Some("room".to_string()),
                parent_id: Some(Uuid::new_v4()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::InvalidReference { field: "parent_id", .. })
    ));

    let room = service
        .create_location(
            fx.actor(),
            CreateLocation {
                name: "Room 101".to_string(),
                description: None,
                address: None,
                location_type: Some("room".to_string()),
                parent_id: Some(fx.location.id),
            },
        )
        .await?;
    let err = service
        .update_location(
            fx.actor(),
            fx.location.id,
            UpdateLocation {
                parent_id: Some(Some(room.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::CyclicHierarchy { kind: EntityKind::Location, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn assigned_asset_and_assignee_are_protected() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);
    let asset = insert_asset(&db, &fx, "laptop-2", "in_stock").await?;

    let assignment = service
        .create_assignment(
            fx.actor(),
            NewAssignment {
                asset_id: asset.id,
                assigned_to_id: fx.manager.id,
                assigned_by_id: None,
                assignment_date: None,
                expected_return: None,
                notes: None,
            },
        )
        .await?;

    assert!(
        !service
            .can_delete(fx.actor(), DeleteTarget::new(EntityKind::Asset, asset.id))
            .await?
    );
    assert!(
        !service
            .can_delete(fx.actor(), DeleteTarget::new(EntityKind::Person, fx.manager.id))
            .await?
    );
    assert!(
        service
            .can_delete(fx.actor(), DeleteTarget::new(EntityKind::Person, fx.requester.id))
            .await?
    );

    // Withdrawing the assignment hands the asset back
    service
        .delete(
            fx.actor(),
            DeleteTarget::new(EntityKind::AssetAssignment, assignment.id),
        )
        .await?;
    let asset = AssetRepository::new(&db)
        .get(fx.tenant_id, asset.id)
        .await?
        .unwrap();
    assert_eq!(asset.status, "in_stock");
    assert!(asset.current_assignee_id.is_none());
    assert!(
        AssignmentRepository::new(&db)
            .get(fx.tenant_id, assignment.id)
            .await?
            .is_none()
    );
    assert!(
        service
            .can_delete(fx.actor(), DeleteTarget::new(EntityKind::Person, fx.manager.id))
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn in_progress_maintenance_blocks_deletion() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);
    let asset = insert_asset(&db, &fx, "laptop-3", "in_stock").await?;

    let record = service
        .create_maintenance(
            fx.actor(),
            NewMaintenance {
                asset_id: asset.id,
                maintenance_type: MaintenanceType::Inspection,
                status: Some(MaintenanceStatus::InProgress),
                scheduled_date: test_now(),
                performed_by_id: Some(fx.manager.id),
                vendor_id: None,
                cost: None,
                description: "Annual check".to_string(),
                results: None,
                next_scheduled: None,
            },
        )
        .await?;

    let err = service
        .delete(
            fx.actor(),
            DeleteTarget::new(EntityKind::MaintenanceRecord, record.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::NotEditable { ref status, .. }) if status == "in_progress"
    ));
    assert!(
        !service
            .can_delete(fx.actor(), DeleteTarget::new(EntityKind::Asset, asset.id))
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn vendor_with_orders_and_submitted_requests_are_protected() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);

    let (draft, items) = service
        .create_procurement_request(
            fx.actor(),
            NewProcurementRequest {
                items: vec![NewProcurementItem {
                    category_id: fx.category.id,
                    description: "Docking station".to_string(),
                    quantity: 1,
                    estimated_price: Some(250.0),
                    preferred_vendor_id: None,
                    justification: None,
                }],
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(items.len(), 1);

    let (submitted, _) = service
        .create_procurement_request(fx.actor(), NewProcurementRequest::default())
        .await?;
    for (to, approver) in [
        (ProcurementStatus::Submitted, None),
        (ProcurementStatus::Approved, Some(fx.manager.id)),
    ] {
        service
            .transition(
                TransitionRequest::ProcurementRequest {
                    id: submitted.id,
                    to,
                },
                TransitionContext::new(fx.actor()).with_approver(approver),
            )
            .await?;
    }
    service
        .create_purchase_order(
            fx.actor(),
            NewPurchaseOrder {
                vendor_id: fx.vendor.id,
                procurement_id: Some(submitted.id),
                created_by_id: None,
                expected_delivery: None,
                delivery_address: None,
                total_amount: None,
                notes: None,
            },
        )
        .await?;

    assert!(
        !service
            .can_delete(fx.actor(), DeleteTarget::new(EntityKind::Vendor, fx.vendor.id))
            .await?
    );
    assert!(
        !service
            .can_delete(
                fx.actor(),
                DeleteTarget::new(EntityKind::ProcurementRequest, submitted.id)
            )
            .await?
    );

    // Drafts go away together with their items
    service
        .delete(
            fx.actor(),
            DeleteTarget::new(EntityKind::ProcurementRequest, draft.id),
        )
        .await?;
    let repo = ProcurementRepository::new(&db);
    assert!(repo.get(fx.tenant_id, draft.id).await?.is_none());
    assert!(repo.items(fx.tenant_id, draft.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_entity_is_not_found() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let service = test_service(&db);

    let target = DeleteTarget::new(EntityKind::Vendor, Uuid::new_v4());
    let err = service.can_delete(fx.actor(), target).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Lifecycle(LifecycleError::NotFound { kind: EntityKind::Vendor, .. })
    ));
    Ok(())
}
