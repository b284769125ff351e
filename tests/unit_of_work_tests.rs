//! A failing write inside a unit of work leaves no partial changes behind.

mod test_utils;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kontena::lifecycle::{
    ApplyError, AssignmentStatus, Dependents, DependentUpdate, EntityKind, FixedClock,
    LifecycleError, LifecycleStore, NewAssignment, NewRecord, SeaOrmStore, TransitionContext,
    TransitionRequest, TransitionTarget, enforcer, validator,
};
use kontena::models::{asset, asset_assignment, maintenance_record, procurement_request};
use kontena::repositories::{AssetRepository, AssignmentRepository};
use sea_orm::{DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;

use test_utils::{TenantFixture, insert_asset, seed_tenant, setup_test_db, test_now, test_service};

/// Delegates to the SeaORM store but loses every dependent compare-and-set,
/// as if another writer had moved the row first.
struct LosingDependentStore<'a> {
    inner: SeaOrmStore<'a, DatabaseTransaction>,
}

#[async_trait]
impl LifecycleStore for LosingDependentStore<'_> {
    async fn find_asset(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<asset::Model>, DbErr> {
        self.inner.find_asset(tenant_id, id).await
    }

    async fn find_assignment(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<asset_assignment::Model>, DbErr> {
        self.inner.find_assignment(tenant_id, id).await
    }

    async fn find_maintenance(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<maintenance_record::Model>, DbErr> {
        self.inner.find_maintenance(tenant_id, id).await
    }

    async fn find_procurement_request(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<procurement_request::Model>, DbErr> {
        self.inner.find_procurement_request(tenant_id, id).await
    }

    async fn exists(&self, tenant_id: Uuid, kind: EntityKind, id: Uuid) -> Result<bool, DbErr> {
        self.inner.exists(tenant_id, kind, id).await
    }

    async fn parent_of(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<Option<Uuid>>, DbErr> {
        self.inner.parent_of(tenant_id, kind, id).await
    }

    async fn active_assignment(
        &self,
        tenant_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<asset_assignment::Model>, DbErr> {
        self.inner.active_assignment(tenant_id, asset_id).await
    }

    async fn count_dependents(
        &self,
        tenant_id: Uuid,
        dependents: Dependents,
    ) -> Result<u64, DbErr> {
        self.inner.count_dependents(tenant_id, dependents).await
    }

    async fn write_transition(
        &self,
        tenant_id: Uuid,
        target: &TransitionTarget,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        self.inner.write_transition(tenant_id, target, now).await
    }

    async fn write_dependent(
        &self,
        _tenant_id: Uuid,
        _update: &DependentUpdate,
        _now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        Ok(0)
    }

    async fn insert_record(&self, record: &NewRecord) -> Result<(), ApplyError> {
        self.inner.insert_record(record).await
    }

    async fn soft_delete(
        &self,
        tenant_id: Uuid,
        kind: EntityKind,
        id: Uuid,
        expected_status: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        self.inner
            .soft_delete(tenant_id, kind, id, expected_status, now)
            .await
    }

    async fn soft_delete_items(
        &self,
        tenant_id: Uuid,
        procurement_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, ApplyError> {
        self.inner
            .soft_delete_items(tenant_id, procurement_id, now)
            .await
    }

    async fn bump_sequence(
        &self,
        tenant_id: Uuid,
        prefix: &str,
        day: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, ApplyError> {
        self.inner.bump_sequence(tenant_id, prefix, day, now).await
    }
}

async fn assigned_laptop(
    db: &sea_orm::DatabaseConnection,
    fx: &TenantFixture,
) -> Result<(asset::Model, asset_assignment::Model)> {
    let asset = insert_asset(db, fx, "laptop-1", "in_stock").await?;
    let assignment = test_service(db)
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
    Ok((asset, assignment))
}

#[tokio::test]
async fn lost_dependent_write_rolls_back_the_primary_write() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let (asset, assignment) = assigned_laptop(&db, &fx).await?;
    let clock = FixedClock(test_now());

    let txn = db.begin().await?;
    let store = LosingDependentStore {
        inner: SeaOrmStore::new(&txn),
    };
    let plan = validator::validate(
        &store,
        &clock,
        TransitionRequest::AssetAssignment {
            id: assignment.id,
            to: AssignmentStatus::Returned,
        },
        &TransitionContext::new(fx.actor()),
    )
    .await?;
    assert_eq!(plan.effects.len(), 1);

    let err = enforcer::apply(&store, &clock, &plan).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Apply(ApplyError::Conflict { kind: EntityKind::Asset, id }) if id == asset.id
    ));
    assert!(err.is_retryable());
    txn.rollback().await?;

    // The assignment row was written before the failure; none of it survives
    let stored = AssignmentRepository::new(&db)
        .get(fx.tenant_id, assignment.id)
        .await?
        .unwrap();
    assert_eq!(stored.status, "active");
    assert!(stored.return_date.is_none());

    let asset = AssetRepository::new(&db)
        .get(fx.tenant_id, asset.id)
        .await?
        .unwrap();
    assert_eq!(asset.status, "assigned");
    assert_eq!(asset.current_assignee_id, Some(fx.manager.id));
    Ok(())
}

#[tokio::test]
async fn stale_plan_conflicts_and_revalidation_sees_the_winner() -> Result<()> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let (_asset, assignment) = assigned_laptop(&db, &fx).await?;
    let clock = FixedClock(test_now());
    let request = TransitionRequest::AssetAssignment {
        id: assignment.id,
        to: AssignmentStatus::Returned,
    };
    let ctx = TransitionContext::new(fx.actor());

    let stale = validator::validate(&SeaOrmStore::new(&db), &clock, request, &ctx).await?;

    // Another writer returns the assignment in between
    test_service(&db).transition(request, ctx).await?;

    let txn = db.begin().await?;
    let store = SeaOrmStore::new(&txn);
    let err = enforcer::apply(&store, &clock, &stale).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Apply(ApplyError::Conflict { kind: EntityKind::AssetAssignment, .. })
    ));
    assert!(err.is_retryable());

    // A retry validates against committed state and refuses the change
    let err = validator::validate(&store, &clock, request, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::IllegalTransition { kind: EntityKind::AssetAssignment, .. }
    ));
    txn.rollback().await?;
    Ok(())
}
