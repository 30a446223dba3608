use chrono::NaiveDate;
use sea_orm::Database;

use engine::{
    Engine, EngineError, EntryCmd, EntryFilter, EntryKind, EntryTag, ErrorClass, HolderKind,
    NewHolderCmd, ReconcileMode, TenantScope, TransferCmd, TransferDirection, UpdateTransferCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

const MODES: [ReconcileMode; 2] = [ReconcileMode::Recompute, ReconcileMode::Incremental];

async fn engine_with_db(mode: ReconcileMode) -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder()
        .database(db)
        .reconcile_mode(mode)
        .build()
        .await
        .unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

async fn funds(engine: &Engine, scope: &TenantScope, name: &str, initial: i64) -> Uuid {
    engine
        .new_holder(
            scope,
            NewHolderCmd::new(HolderKind::Wallet, name).initial_balance(initial),
        )
        .await
        .unwrap()
        .id
}

async fn balance(engine: &Engine, scope: &TenantScope, holder_id: Uuid) -> i64 {
    engine.holder(scope, holder_id).await.unwrap().balance_minor
}

async fn entry_count(engine: &Engine, scope: &TenantScope) -> usize {
    engine
        .list_entries(scope, &EntryFilter::new())
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn transfer_moves_money_symmetrically() {
    for mode in MODES {
        let engine = engine_with_db(mode).await;
        let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
        let a = funds(&engine, &scope, "Bank", 100).await;
        let b = funds(&engine, &scope, "Cash", 20).await;

        let transfer = engine
            .transfer(
                &scope,
                TransferCmd::new(a, b, 40, day(1)).description("rent split"),
            )
            .await
            .unwrap();

        assert_eq!(balance(&engine, &scope, a).await, 60, "{mode:?}");
        assert_eq!(balance(&engine, &scope, b).await, 60, "{mode:?}");
        assert_eq!(transfer.source.amount_minor, transfer.destination.amount_minor);
        assert_eq!(transfer.source.kind.pair_id(), Some(transfer.pair_id));
        assert_eq!(transfer.destination.kind.pair_id(), Some(transfer.pair_id));
        assert_eq!(
            transfer.destination.kind,
            EntryKind::Transfer {
                pair_id: transfer.pair_id,
                direction: TransferDirection::In,
            }
        );
        assert_eq!(
            transfer.destination.note.as_deref(),
            Some("Transfer from Bank - rent split")
        );

        let loaded = engine.transfer_pair(&scope, transfer.pair_id).await.unwrap();
        assert_eq!(loaded.source.id, transfer.source.id);
        assert_eq!(loaded.destination.id, transfer.destination.id);
    }
}

#[tokio::test]
async fn transfer_to_itself_is_rejected_without_entries() {
    let engine = engine_with_db(ReconcileMode::default()).await;
    let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
    let a = funds(&engine, &scope, "Bank", 100).await;

    let err = engine
        .transfer(&scope, TransferCmd::new(a, a, 10, day(1)))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(entry_count(&engine, &scope).await, 0);
    assert_eq!(balance(&engine, &scope, a).await, 100);
}

#[tokio::test]
async fn missing_destination_rolls_back_the_source_debit() {
    for mode in MODES {
        let engine = engine_with_db(mode).await;
        let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
        let a = funds(&engine, &scope, "Bank", 100).await;

        let err = engine
            .transfer(&scope, TransferCmd::new(a, Uuid::new_v4(), 40, day(1)))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::KeyNotFound("holder".to_string()));
        assert_eq!(balance(&engine, &scope, a).await, 100, "{mode:?}");
        assert_eq!(entry_count(&engine, &scope).await, 0);
    }
}

#[tokio::test]
async fn transfers_only_touch_accounts_and_wallets() {
    let engine = engine_with_db(ReconcileMode::default()).await;
    let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
    let a = funds(&engine, &scope, "Bank", 100).await;
    let contact = engine
        .new_holder(&scope, NewHolderCmd::new(HolderKind::Contact, "Sami"))
        .await
        .unwrap()
        .id;

    let err = engine
        .transfer(&scope, TransferCmd::new(a, contact, 10, day(1)))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(balance(&engine, &scope, a).await, 100);
    assert_eq!(entry_count(&engine, &scope).await, 0);
}

#[tokio::test]
async fn transfer_sides_cannot_be_edited_or_deleted_alone() {
    let engine = engine_with_db(ReconcileMode::default()).await;
    let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
    let a = funds(&engine, &scope, "Bank", 100).await;
    let b = funds(&engine, &scope, "Cash", 0).await;
    let transfer = engine
        .transfer(&scope, TransferCmd::new(a, b, 25, day(2)))
        .await
        .unwrap();

    let err = engine
        .delete_entry(&scope, transfer.source.id)
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Unsupported);

    let err = engine
        .update_entry(
            &scope,
            transfer.destination.id,
            EntryCmd::new(b, EntryTag::Income, 25, day(2)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    // Turning a plain entry into a transfer is refused as well.
    let income = engine
        .record_entry(&scope, EntryCmd::new(a, EntryTag::Income, 5, day(2)))
        .await
        .unwrap();
    let err = engine
        .update_entry(
            &scope,
            income.id,
            EntryCmd::new(a, EntryTag::Transfer, 5, day(2)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    assert_eq!(balance(&engine, &scope, a).await, 80);
    assert_eq!(balance(&engine, &scope, b).await, 25);
}

#[tokio::test]
async fn delete_and_update_transfer_keep_both_sides_in_step() {
    for mode in MODES {
        let engine = engine_with_db(mode).await;
        let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
        let a = funds(&engine, &scope, "Bank", 100).await;
        let b = funds(&engine, &scope, "Cash", 20).await;
        let transfer = engine
            .transfer(&scope, TransferCmd::new(a, b, 40, day(3)))
            .await
            .unwrap();

        let updated = engine
            .update_transfer(
                &scope,
                transfer.pair_id,
                UpdateTransferCmd::new(10)
                    .occurred_on(day(4))
                    .description("coffee"),
            )
            .await
            .unwrap();
        assert_eq!(updated.source.amount_minor, 10);
        assert_eq!(updated.destination.occurred_on, day(4));
        assert_eq!(
            updated.destination.note.as_deref(),
            Some("Transfer from Bank - coffee")
        );
        assert_eq!(balance(&engine, &scope, a).await, 90, "{mode:?}");
        assert_eq!(balance(&engine, &scope, b).await, 30, "{mode:?}");

        engine
            .delete_transfer(&scope, transfer.pair_id)
            .await
            .unwrap();
        assert_eq!(balance(&engine, &scope, a).await, 100, "{mode:?}");
        assert_eq!(balance(&engine, &scope, b).await, 20, "{mode:?}");
        assert_eq!(entry_count(&engine, &scope).await, 0);
        assert_eq!(
            engine
                .transfer_pair(&scope, transfer.pair_id)
                .await
                .unwrap_err(),
            EngineError::KeyNotFound("transfer".to_string())
        );
    }
}
