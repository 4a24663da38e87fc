use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError, PAGE_SIZE, Period, TxKind, period};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[tokio::test]
async fn default_categories_seed_once() {
    let (engine, _db) = engine_with_db().await;

    engine.ensure_default_categories().await.unwrap();
    engine.ensure_default_categories().await.unwrap();

    let incomes = engine.categories(TxKind::Income).await.unwrap();
    let expenses = engine.categories(TxKind::Expense).await.unwrap();
    assert_eq!(incomes.len(), 6);
    assert_eq!(expenses.len(), 10);
    assert!(incomes.iter().any(|c| c.name == "💼 Ish haqi"));
    assert!(expenses.iter().any(|c| c.name == "🍕 Oziq-ovqat"));
}

#[tokio::test]
async fn upsert_user_refreshes_profile_fields() {
    let (engine, _db) = engine_with_db().await;

    let created = engine
        .upsert_user(42, Some("Ali"), Some("ali"))
        .await
        .unwrap();
    let updated = engine
        .upsert_user(42, Some("Aliyor"), Some("ali"))
        .await
        .unwrap();

    assert_eq!(created.id, updated.id);
    assert_eq!(updated.name.as_deref(), Some("Aliyor"));

    let found = engine.user_by_chat(42).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
}

#[tokio::test]
async fn transaction_keeps_caller_supplied_date() {
    let (engine, _db) = engine_with_db().await;
    engine.ensure_default_categories().await.unwrap();
    let user = engine.upsert_user(1, Some("Ali"), None).await.unwrap();
    let category = engine
        .category_by_name("🍕 Oziq-ovqat", TxKind::Expense)
        .await
        .unwrap()
        .unwrap();

    let picked = at(2025, 3, 10, 23, 59);
    let tx = engine
        .add_transaction(user.id, category.id, TxKind::Expense, 50_000, None, picked)
        .await
        .unwrap();

    assert_eq!(tx.created_at, picked);
    assert_eq!(tx.amount, 50_000);
    assert_eq!(tx.description, None);
}

#[tokio::test]
async fn transaction_rejects_non_positive_amounts() {
    let (engine, _db) = engine_with_db().await;
    engine.ensure_default_categories().await.unwrap();
    let user = engine.upsert_user(1, None, None).await.unwrap();
    let category = engine
        .category_by_name("💼 Ish haqi", TxKind::Income)
        .await
        .unwrap()
        .unwrap();

    let err = engine
        .add_transaction(
            user.id,
            category.id,
            TxKind::Income,
            0,
            None,
            at(2025, 3, 10, 12, 0),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidAmount("0".to_string()));
}

#[tokio::test]
async fn transaction_rejects_category_of_other_kind() {
    let (engine, _db) = engine_with_db().await;
    engine.ensure_default_categories().await.unwrap();
    let user = engine.upsert_user(1, None, None).await.unwrap();
    let income_cat = engine
        .category_by_name("💼 Ish haqi", TxKind::Income)
        .await
        .unwrap()
        .unwrap();

    let err = engine
        .add_transaction(
            user.id,
            income_cat.id,
            TxKind::Expense,
            1000,
            None,
            at(2025, 3, 10, 12, 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn statistics_groups_by_category_and_skips_other_users() {
    let (engine, _db) = engine_with_db().await;
    engine.ensure_default_categories().await.unwrap();
    let ali = engine.upsert_user(1, Some("Ali"), None).await.unwrap();
    let vali = engine.upsert_user(2, Some("Vali"), None).await.unwrap();

    let salary = engine
        .category_by_name("💼 Ish haqi", TxKind::Income)
        .await
        .unwrap()
        .unwrap();
    let food = engine
        .category_by_name("🍕 Oziq-ovqat", TxKind::Expense)
        .await
        .unwrap()
        .unwrap();
    let transport = engine
        .category_by_name("🚗 Transport", TxKind::Expense)
        .await
        .unwrap()
        .unwrap();

    let day = at(2025, 3, 15, 10, 0);
    for (user, cat, kind, amount) in [
        (&ali, &salary, TxKind::Income, 1_000_000),
        (&ali, &food, TxKind::Expense, 30_000),
        (&ali, &food, TxKind::Expense, 20_000),
        (&ali, &transport, TxKind::Expense, 10_000),
        (&vali, &food, TxKind::Expense, 999_999),
    ] {
        engine
            .add_transaction(user.id, cat.id, kind, amount, None, day)
            .await
            .unwrap();
    }

    let range = period::resolve(Period::Today, None, at(2025, 3, 15, 18, 0));
    let report = engine.statistics(ali.id, range).await.unwrap();

    assert_eq!(report.total_income, 1_000_000);
    assert_eq!(report.total_expense, 60_000);
    assert_eq!(report.balance(), 940_000);
    assert_eq!(report.incomes.len(), 1);
    assert_eq!(report.expenses.len(), 2);
    // Biggest sums first.
    assert_eq!(report.expenses[0].category, "🍕 Oziq-ovqat");
    assert_eq!(report.expenses[0].total, 50_000);
    assert_eq!(report.expenses[1].total, 10_000);
}

#[tokio::test]
async fn statistics_outside_range_is_empty() {
    let (engine, _db) = engine_with_db().await;
    engine.ensure_default_categories().await.unwrap();
    let user = engine.upsert_user(1, None, None).await.unwrap();
    let food = engine
        .category_by_name("🍕 Oziq-ovqat", TxKind::Expense)
        .await
        .unwrap()
        .unwrap();

    engine
        .add_transaction(
            user.id,
            food.id,
            TxKind::Expense,
            5000,
            None,
            at(2025, 2, 28, 12, 0),
        )
        .await
        .unwrap();

    let range = period::resolve(Period::ThisMonth, None, at(2025, 3, 15, 12, 0));
    let report = engine.statistics(user.id, range).await.unwrap();
    assert!(report.incomes.is_empty());
    assert!(report.expenses.is_empty());
    assert_eq!(report.balance(), 0);
}

#[tokio::test]
async fn transaction_pages_are_ten_rows_newest_first() {
    let (engine, _db) = engine_with_db().await;
    engine.ensure_default_categories().await.unwrap();
    let user = engine.upsert_user(1, None, None).await.unwrap();
    let food = engine
        .category_by_name("🍕 Oziq-ovqat", TxKind::Expense)
        .await
        .unwrap()
        .unwrap();

    for day in 1..=25u32 {
        engine
            .add_transaction(
                user.id,
                food.id,
                TxKind::Expense,
                1000 + i64::from(day),
                Some("kafe"),
                at(2025, 3, day, 12, 0),
            )
            .await
            .unwrap();
    }

    let range = period::resolve(Period::ThisMonth, None, at(2025, 3, 28, 12, 0));
    let first = engine
        .transactions_page(user.id, TxKind::Expense, range, 1)
        .await
        .unwrap();
    assert_eq!(first.total, 25);
    assert_eq!(first.pages, 3);
    assert_eq!(first.items.len() as u64, PAGE_SIZE);
    // Newest first.
    assert_eq!(first.items[0].0.created_at, at(2025, 3, 25, 12, 0));
    assert_eq!(first.items[0].1, "🍕 Oziq-ovqat");

    let last = engine
        .transactions_page(user.id, TxKind::Expense, range, 3)
        .await
        .unwrap();
    assert_eq!(last.items.len(), 5);

    let beyond = engine
        .transactions_page(user.id, TxKind::Expense, range, 4)
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
}
