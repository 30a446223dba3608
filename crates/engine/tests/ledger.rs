use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    CategoryKind, CategoryUpdate, Engine, EngineError, EntryCmd, EntryFilter, EntryKind,
    EntryTag, ErrorClass, HolderKind, HolderUpdate, NewCategoryCmd, NewHolderCmd, ReconcileMode,
    TenantScope,
};
use migration::MigratorTrait;
use uuid::Uuid;

const MODES: [ReconcileMode; 2] = [ReconcileMode::Recompute, ReconcileMode::Incremental];

async fn engine_with_db(mode: ReconcileMode) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .reconcile_mode(mode)
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn scope() -> TenantScope {
    TenantScope::new(Uuid::new_v4(), Uuid::new_v4())
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

async fn account(engine: &Engine, scope: &TenantScope, name: &str, initial: i64) -> Uuid {
    engine
        .new_holder(
            scope,
            NewHolderCmd::new(HolderKind::Account, name).initial_balance(initial),
        )
        .await
        .unwrap()
        .id
}

async fn balance(engine: &Engine, scope: &TenantScope, holder_id: Uuid) -> i64 {
    engine.holder(scope, holder_id).await.unwrap().balance_minor
}

#[tokio::test]
async fn expense_lowers_balance_and_delete_restores_it() {
    for mode in MODES {
        let (engine, _db) = engine_with_db(mode).await;
        let scope = scope();
        let a = account(&engine, &scope, "Main", 100).await;

        let entry = engine
            .record_entry(&scope, EntryCmd::new(a, EntryTag::Expense, 30, day(1)))
            .await
            .unwrap();
        assert_eq!(balance(&engine, &scope, a).await, 70, "{mode:?}");

        engine.delete_entry(&scope, entry.id).await.unwrap();
        assert_eq!(balance(&engine, &scope, a).await, 100, "{mode:?}");
        assert!(engine.audit_balances(&scope).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn zero_or_negative_amounts_are_rejected() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let scope = scope();
    let a = account(&engine, &scope, "Main", 0).await;

    for amount in [0, -10] {
        let err = engine
            .record_entry(&scope, EntryCmd::new(a, EntryTag::Income, amount, day(1)))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Validation);
    }
    assert_eq!(balance(&engine, &scope, a).await, 0);
    assert!(
        engine
            .list_entries(&scope, &EntryFilter::new())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn update_moves_effect_between_holders_kinds_and_amounts() {
    for mode in MODES {
        let (engine, _db) = engine_with_db(mode).await;
        let scope = scope();
        let a = account(&engine, &scope, "Checking", 1_000).await;
        let b = account(&engine, &scope, "Savings", 500).await;

        let entry = engine
            .record_entry(&scope, EntryCmd::new(a, EntryTag::Expense, 200, day(2)))
            .await
            .unwrap();
        assert_eq!(balance(&engine, &scope, a).await, 800);

        // Same holder, bigger amount.
        engine
            .update_entry(
                &scope,
                entry.id,
                EntryCmd::new(a, EntryTag::Expense, 350, day(2)),
            )
            .await
            .unwrap();
        assert_eq!(balance(&engine, &scope, a).await, 650, "{mode:?}");

        // Different holder, different kind, different amount.
        let updated = engine
            .update_entry(
                &scope,
                entry.id,
                EntryCmd::new(b, EntryTag::Income, 75, day(3)).note("refund"),
            )
            .await
            .unwrap();
        assert_eq!(updated.kind, EntryKind::Income);
        assert_eq!(updated.holder_id, b);
        assert_eq!(balance(&engine, &scope, a).await, 1_000, "{mode:?}");
        assert_eq!(balance(&engine, &scope, b).await, 575, "{mode:?}");
        assert!(engine.audit_balances(&scope).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn contact_entries_move_contact_and_wallet_together() {
    for mode in MODES {
        let (engine, _db) = engine_with_db(mode).await;
        let scope = scope();
        let wallet = engine
            .new_holder(
                &scope,
                NewHolderCmd::new(HolderKind::Wallet, "Cash").initial_balance(5_000),
            )
            .await
            .unwrap()
            .id;
        let contact = engine
            .new_holder(&scope, NewHolderCmd::new(HolderKind::Contact, "Rahim"))
            .await
            .unwrap()
            .id;

        engine
            .record_entry(
                &scope,
                EntryCmd::new(contact, EntryTag::Give, 1_000, day(4)).wallet_id(wallet),
            )
            .await
            .unwrap();
        assert_eq!(balance(&engine, &scope, contact).await, -1_000);
        assert_eq!(balance(&engine, &scope, wallet).await, 4_000);

        engine
            .record_entry(
                &scope,
                EntryCmd::new(contact, EntryTag::Receive, 400, day(5)).wallet_id(wallet),
            )
            .await
            .unwrap();
        assert_eq!(balance(&engine, &scope, contact).await, -600, "{mode:?}");
        assert_eq!(balance(&engine, &scope, wallet).await, 4_400, "{mode:?}");

        let overview = engine.contact_overview(&scope).await.unwrap();
        assert_eq!(overview.total_given_minor, 1_000);
        assert_eq!(overview.total_received_minor, 400);
        assert_eq!(overview.top_contacts[0].holder_id, contact);
    }
}

#[tokio::test]
async fn entries_respect_holder_and_category_kinds() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let scope = scope();
    let a = account(&engine, &scope, "Main", 0).await;
    let contact = engine
        .new_holder(&scope, NewHolderCmd::new(HolderKind::Contact, "Karim"))
        .await
        .unwrap()
        .id;
    let salary = engine
        .new_category(&scope, NewCategoryCmd::new(CategoryKind::Income, "Salary"))
        .await
        .unwrap()
        .id;

    let err = engine
        .record_entry(&scope, EntryCmd::new(contact, EntryTag::Expense, 10, day(1)))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    let err = engine
        .record_entry(&scope, EntryCmd::new(a, EntryTag::Give, 10, day(1)))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    let err = engine
        .record_entry(
            &scope,
            EntryCmd::new(a, EntryTag::Expense, 10, day(1)).category_id(salary),
        )
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    engine
        .record_entry(
            &scope,
            EntryCmd::new(a, EntryTag::Income, 10, day(1)).category_id(salary),
        )
        .await
        .unwrap();
    assert_eq!(balance(&engine, &scope, a).await, 10);
}

#[tokio::test]
async fn other_scopes_see_nothing() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let mine = scope();
    let theirs = TenantScope::new(mine.tenant_id, Uuid::new_v4());
    let a = account(&engine, &mine, "Main", 100).await;
    let entry = engine
        .record_entry(&mine, EntryCmd::new(a, EntryTag::Expense, 30, day(1)))
        .await
        .unwrap();

    assert_eq!(
        engine.holder(&theirs, a).await.unwrap_err(),
        EngineError::KeyNotFound("holder".to_string())
    );
    assert_eq!(
        engine.delete_entry(&theirs, entry.id).await.unwrap_err(),
        EngineError::KeyNotFound("entry".to_string())
    );
    let err = engine
        .record_entry(&theirs, EntryCmd::new(a, EntryTag::Income, 5, day(1)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("holder".to_string()));
    assert!(
        engine
            .list_holders(&theirs, None)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(balance(&engine, &mine, a).await, 70);
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let scope = scope();
    let a = account(&engine, &scope, "Main", 1_000).await;
    let food = engine
        .new_category(&scope, NewCategoryCmd::new(CategoryKind::Expense, "Food"))
        .await
        .unwrap()
        .id;
    for amount in [10, 20, 30] {
        engine
            .record_entry(
                &scope,
                EntryCmd::new(a, EntryTag::Expense, amount, day(6)).category_id(food),
            )
            .await
            .unwrap();
    }

    let err = engine.delete_category(&scope, food).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Conflict("cannot delete category Food: it is used in 3 entries".to_string())
    );
    assert!(engine.category(&scope, food).await.is_ok());
    let filed = engine
        .list_entries(&scope, &EntryFilter::new().category_id(food))
        .await
        .unwrap();
    assert_eq!(filed.len(), 3);

    let usage = engine
        .list_categories(&scope, Some(CategoryKind::Expense))
        .await
        .unwrap();
    assert_eq!(usage[0].entries, 3);
}

#[tokio::test]
async fn holder_in_use_cannot_be_deleted() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let scope = scope();
    let wallet = account(&engine, &scope, "Cash", 500).await;
    let contact = engine
        .new_holder(&scope, NewHolderCmd::new(HolderKind::Contact, "Nadia"))
        .await
        .unwrap()
        .id;
    let entry = engine
        .record_entry(
            &scope,
            EntryCmd::new(contact, EntryTag::Give, 100, day(7)).wallet_id(wallet),
        )
        .await
        .unwrap();

    // The wallet is only referenced as the funding side.
    let err = engine.delete_holder(&scope, wallet).await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);

    engine.delete_entry(&scope, entry.id).await.unwrap();
    engine.delete_holder(&scope, wallet).await.unwrap();
    engine.delete_holder(&scope, contact).await.unwrap();
    assert!(engine.list_holders(&scope, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn holder_names_are_unique_per_kind() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let scope = scope();
    account(&engine, &scope, "Café", 0).await;

    let err = engine
        .new_holder(&scope, NewHolderCmd::new(HolderKind::Account, "  cafe "))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Café".to_string()));

    // A contact may share the name of an account.
    engine
        .new_holder(&scope, NewHolderCmd::new(HolderKind::Contact, "Cafe"))
        .await
        .unwrap();
}

#[tokio::test]
async fn recompute_repairs_drifted_balances() {
    use sea_orm::{ConnectionTrait, Statement};

    let (engine, db) = engine_with_db(ReconcileMode::Incremental).await;
    let scope = scope();
    let a = account(&engine, &scope, "Main", 100).await;
    engine
        .record_entry(&scope, EntryCmd::new(a, EntryTag::Income, 50, day(8)))
        .await
        .unwrap();

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE holders SET balance_minor = ? WHERE id = ?",
        vec![999i64.into(), a.to_string().into()],
    ))
    .await
    .unwrap();

    let drift = engine.audit_balances(&scope).await.unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].cached_minor, 999);
    assert_eq!(drift[0].derived_minor, 150);

    assert_eq!(engine.recompute_balances(&scope).await.unwrap(), 1);
    assert_eq!(balance(&engine, &scope, a).await, 150);
    assert_eq!(engine.recompute_balances(&scope).await.unwrap(), 0);
}

#[tokio::test]
async fn list_entries_is_newest_first_and_filtered() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let scope = scope();
    let a = account(&engine, &scope, "Main", 0).await;
    let b = account(&engine, &scope, "Other", 0).await;
    for (holder, d) in [(a, 1), (a, 3), (b, 2), (a, 2)] {
        engine
            .record_entry(&scope, EntryCmd::new(holder, EntryTag::Income, 10, day(d)))
            .await
            .unwrap();
    }

    let listed = engine
        .list_entries(&scope, &EntryFilter::new().holder_id(a))
        .await
        .unwrap();
    let days: Vec<_> = listed.iter().map(|e| e.occurred_on).collect();
    assert_eq!(days, vec![day(3), day(2), day(1)]);

    let limited = engine
        .list_entries(&scope, &EntryFilter::new().between(day(2), day(3)).limit(2))
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].occurred_on, day(3));
}

#[tokio::test]
async fn updates_change_metadata_but_never_balances() {
    let (engine, _db) = engine_with_db(ReconcileMode::default()).await;
    let scope = scope();
    let bank = account(&engine, &scope, "Bank", 500).await;
    account(&engine, &scope, "Cash", 0).await;
    let food = engine
        .new_category(&scope, NewCategoryCmd::new(CategoryKind::Expense, "Food"))
        .await
        .unwrap()
        .id;
    let spare = engine
        .new_category(&scope, NewCategoryCmd::new(CategoryKind::Expense, "Spare"))
        .await
        .unwrap()
        .id;
    engine
        .record_entry(
            &scope,
            EntryCmd::new(bank, EntryTag::Expense, 100, day(1)).category_id(food),
        )
        .await
        .unwrap();

    let err = engine
        .update_holder(&scope, bank, HolderUpdate::new().name("  cash "))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Cash".to_string()));

    let renamed = engine
        .update_holder(&scope, bank, HolderUpdate::new().name("Main bank").notes("salary"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Main bank");
    assert_eq!(renamed.balance_minor, 400);

    let err = engine
        .update_holder(&scope, bank, HolderUpdate::new().phone("555"))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Validation);

    let err = engine
        .update_category(&scope, food, CategoryUpdate::new().kind(CategoryKind::Income))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);

    let moved = engine
        .update_category(
            &scope,
            spare,
            CategoryUpdate::new().kind(CategoryKind::Income).color("#00aa00"),
        )
        .await
        .unwrap();
    assert_eq!(moved.kind, CategoryKind::Income);
    assert_eq!(moved.color.as_deref(), Some("#00aa00"));
}

#[tokio::test]
async fn balance_overflow_is_refused_and_rolled_back() {
    for mode in MODES {
        let (engine, _db) = engine_with_db(mode).await;
        let scope = scope();
        let a = account(&engine, &scope, "Main", 100).await;

        let err = engine
            .record_entry(&scope, EntryCmd::new(a, EntryTag::Income, i64::MAX, day(1)))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Validation, "{mode:?}");
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount too large".to_string())
        );
        assert_eq!(balance(&engine, &scope, a).await, 100, "{mode:?}");
        assert!(
            engine
                .list_entries(&scope, &EntryFilter::new())
                .await
                .unwrap()
                .is_empty()
        );
    }
}

#[tokio::test]
async fn failed_holder_write_leaves_no_entry_behind() {
    use sea_orm::ConnectionTrait;

    for mode in MODES {
        let (engine, db) = engine_with_db(mode).await;
        let scope = scope();
        let a = account(&engine, &scope, "Main", 100).await;

        db.execute_unprepared(
            "CREATE TRIGGER holders_locked BEFORE UPDATE ON holders \
             BEGIN SELECT RAISE(ABORT, 'holders are locked'); END;",
        )
        .await
        .unwrap();

        let err = engine
            .record_entry(&scope, EntryCmd::new(a, EntryTag::Expense, 40, day(2)))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Persistence, "{mode:?}");
        assert!(!err.user_message().contains("locked"));

        db.execute_unprepared("DROP TRIGGER holders_locked;")
            .await
            .unwrap();
        assert_eq!(balance(&engine, &scope, a).await, 100, "{mode:?}");
        assert!(
            engine
                .list_entries(&scope, &EntryFilter::new())
                .await
                .unwrap()
                .is_empty(),
            "{mode:?}"
        );
    }
}
