// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use splitpay::db;
use splitpay::engine::MAX_INSTALLMENTS;
use splitpay::models::{EntryKind, NewExpense};
use splitpay::store::{RecordFilter, RecordStore, SqliteStore};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

struct Ids {
    food: i64,
    groceries: i64,
    restaurant: i64,
    card: i64,
    cash: i64,
}

fn seed(store: &SqliteStore<'_>) -> Ids {
    let food = store.add_category(EntryKind::Expense, "Food", None).unwrap();
    let groceries = store
        .add_type(EntryKind::Expense, "Groceries", Some("weekly shop"), Some(food))
        .unwrap();
    let restaurant = store
        .add_type(EntryKind::Expense, "Restaurant", None, Some(food))
        .unwrap();
    let card = store.add_payment_method("Card", None).unwrap();
    let cash = store.add_payment_method("Cash", None).unwrap();
    Ids {
        food,
        groceries,
        restaurant,
        card,
        cash,
    }
}

fn expense(date: &str, value: &str, installments: u32, type_id: i64, payment: i64) -> NewExpense {
    NewExpense {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        unit_value: value.parse().unwrap(),
        installment_count: installments,
        description: format!("bought on {}", date),
        type_id,
        payment_method_id: payment,
    }
}

#[test]
fn records_join_their_dimension_names() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ids = seed(&store);
    let id = store
        .add_expense(&expense("2024-03-02", "120.50", 3, ids.groceries, ids.card))
        .unwrap();

    let r = store.get_record(id).unwrap().unwrap();
    assert_eq!(r.purchase_date, "2024-03-02");
    assert_eq!(r.unit_value, "120.50".parse::<Decimal>().unwrap());
    assert_eq!(r.installment_count, 3);
    assert_eq!(r.category.as_deref(), Some("Food"));
    assert_eq!(r.category_id, Some(ids.food));
    assert_eq!(r.expense_type.as_deref(), Some("Groceries"));
    assert_eq!(r.payment_method.as_deref(), Some("Card"));
    assert!(store.get_record(id + 100).unwrap().is_none());
}

#[test]
fn every_mutation_bumps_the_version() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    assert_eq!(store.version().unwrap(), 0);
    let ids = seed(&store);
    let after_seed = store.version().unwrap();
    assert_eq!(after_seed, 5);

    let id = store
        .add_expense(&expense("2024-03-02", "10", 0, ids.groceries, ids.card))
        .unwrap();
    store
        .update_expense(id, &expense("2024-03-03", "11", 0, ids.groceries, ids.cash))
        .unwrap();
    store.delete_expense(id).unwrap();
    assert_eq!(store.version().unwrap(), after_seed + 3);

    assert!(store.delete_expense(id).is_err());
    assert_eq!(store.version().unwrap(), after_seed + 3);
}

#[test]
fn snapshot_reads_version_with_records() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ids = seed(&store);
    store
        .add_expense(&expense("2024-03-02", "10", 0, ids.groceries, ids.card))
        .unwrap();
    let snap = store.snapshot().unwrap();
    assert_eq!(snap.version, store.version().unwrap());
    assert_eq!(snap.records.len(), 1);
    assert!(snap.rejected.is_empty());
}

#[test]
fn deleting_a_category_cascades_to_types_and_expenses() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ids = seed(&store);
    let other = store.add_category(EntryKind::Expense, "Home", None).unwrap();
    let furniture = store
        .add_type(EntryKind::Expense, "Furniture", None, Some(other))
        .unwrap();
    store
        .add_expense(&expense("2024-03-02", "10", 0, ids.groceries, ids.card))
        .unwrap();
    store
        .add_expense(&expense("2024-03-04", "20", 2, ids.restaurant, ids.cash))
        .unwrap();
    store
        .add_expense(&expense("2024-03-05", "99", 0, furniture, ids.cash))
        .unwrap();

    let report = store.delete_category(ids.food).unwrap();
    assert_eq!(report.categories, 1);
    assert_eq!(report.types, 2);
    assert_eq!(report.expenses, 2);

    let left = store.list_records(&RecordFilter::default()).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].expense_type.as_deref(), Some("Furniture"));
    assert_eq!(store.list_types().unwrap().len(), 1);
}

#[test]
fn deleting_a_type_or_payment_method_removes_its_expenses() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ids = seed(&store);
    store
        .add_expense(&expense("2024-03-02", "10", 0, ids.groceries, ids.card))
        .unwrap();
    store
        .add_expense(&expense("2024-03-04", "20", 0, ids.restaurant, ids.card))
        .unwrap();
    store
        .add_expense(&expense("2024-03-05", "30", 0, ids.restaurant, ids.cash))
        .unwrap();

    let by_type = store.delete_type(ids.groceries).unwrap();
    assert_eq!(by_type.expenses, 1);
    let by_payment = store.delete_payment_method(ids.card).unwrap();
    assert_eq!(by_payment.payment_methods, 1);
    assert_eq!(by_payment.expenses, 1);

    let left = store.list_records(&RecordFilter::default()).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].payment_method.as_deref(), Some("Cash"));
    assert_eq!(store.list_categories().unwrap().len(), 1);
}

#[test]
fn duplicate_names_are_rejected() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    seed(&store);
    assert!(store.add_category(EntryKind::Expense, "Food", None).is_err());
    assert!(store.add_category(EntryKind::Income, "Food", None).is_ok());
    assert!(store.add_payment_method("Card", None).is_err());
}

#[test]
fn unparseable_stored_amount_is_rejected_not_fatal() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ids = seed(&store);
    store
        .add_expense(&expense("2024-03-02", "10", 0, ids.groceries, ids.card))
        .unwrap();
    conn.execute(
        "INSERT INTO expenses(date, amount, description, type_id, payment_method_id, installments)
         VALUES ('2024-03-03', 'abc', 'broken', ?1, ?2, 0)",
        [ids.groceries, ids.card],
    )
    .unwrap();

    let snap = store.snapshot().unwrap();
    assert_eq!(snap.records.len(), 1);
    assert_eq!(snap.rejected.len(), 1);
    assert!(snap.rejected[0].reason.contains("abc"));
}

#[test]
fn list_records_filters_by_month_and_names() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ids = seed(&store);
    for (date, ty, pay) in [
        ("2024-03-02", ids.groceries, ids.card),
        ("2024-03-20", ids.restaurant, ids.card),
        ("2024-04-01", ids.groceries, ids.cash),
    ] {
        store.add_expense(&expense(date, "10", 0, ty, pay)).unwrap();
    }

    let march = RecordFilter {
        month: Some("2024-03".into()),
        ..Default::default()
    };
    let rows = store.list_records(&march).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].purchase_date, "2024-03-20");

    let groceries_cash = RecordFilter {
        expense_type: Some("Groceries".into()),
        payment_method: Some("Cash".into()),
        ..Default::default()
    };
    assert_eq!(store.list_records(&groceries_cash).unwrap().len(), 1);

    let limited = RecordFilter {
        limit: Some(1),
        ..Default::default()
    };
    assert_eq!(store.list_records(&limited).unwrap().len(), 1);
}

#[test]
fn seeding_twice_adds_nothing_the_second_time() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let first = store.seed_defaults().unwrap();
    assert_eq!(first, 14);
    let version = store.version().unwrap();
    assert_eq!(store.seed_defaults().unwrap(), 0);
    assert_eq!(store.version().unwrap(), version);
    let types = store.list_types().unwrap();
    assert!(types.iter().all(|t| t.category_id.is_some()));
}

#[test]
fn installment_count_over_the_maximum_is_rejected() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let ids = seed(&store);
    let id = store
        .add_expense(&expense("2024-03-02", "10", 12, ids.groceries, ids.card))
        .unwrap();
    let version = store.version().unwrap();

    let too_long = expense("2024-03-02", "10", MAX_INSTALLMENTS + 1, ids.groceries, ids.card);
    assert!(store.add_expense(&too_long).is_err());
    let absurd = expense("2024-03-02", "10", u32::MAX, ids.groceries, ids.card);
    assert!(store.add_expense(&absurd).is_err());
    assert!(store.update_expense(id, &too_long).is_err());
    assert_eq!(store.version().unwrap(), version);

    let longest = expense("2024-03-02", "10", MAX_INSTALLMENTS, ids.groceries, ids.card);
    store.update_expense(id, &longest).unwrap();
    assert_eq!(store.version().unwrap(), version + 1);
}
