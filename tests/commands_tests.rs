// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use splitpay::commands::{doctor, expenses, exporter, reports};
use splitpay::engine::{DayRange, GroupKey, ReportCache, month_label};
use splitpay::models::{EntryKind, NewExpense};
use splitpay::store::{RecordStore, SqliteStore};
use splitpay::{cli, db};
use tempfile::tempdir;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let store = SqliteStore::new(&conn);
    let food = store.add_category(EntryKind::Expense, "Food", None).unwrap();
    let groceries = store
        .add_type(EntryKind::Expense, "Groceries", None, Some(food))
        .unwrap();
    let card = store.add_payment_method("Card", None).unwrap();
    for (date, value, n) in [("2024-01-10", "30", 0), ("2024-01-20", "35", 2), ("2024-02-05", "12.5", 0)] {
        store
            .add_expense(&NewExpense {
                date: date.parse().unwrap(),
                unit_value: value.parse().unwrap(),
                installment_count: n,
                description: "groceries".into(),
                type_id: groceries,
                payment_method_id: card,
            })
            .unwrap();
    }
    conn
}

fn sub_matches(args: &[&str]) -> clap::ArgMatches {
    let matches = cli::build_cli().get_matches_from(args);
    let (_, group) = matches.subcommand().unwrap();
    let (_, leaf) = group.subcommand().unwrap();
    leaf.clone()
}

#[test]
fn expense_rows_derive_total_and_last_installment() {
    let conn = setup();
    let m = sub_matches(&["splitpay", "expense", "list", "--month", "2024-01"]);
    let rows = expenses::query_rows(&conn, &m).unwrap();
    assert_eq!(rows.len(), 2);
    let split = rows.iter().find(|r| r.installments == 2).unwrap();
    assert_eq!(split.total, "70".parse().unwrap());
    assert_eq!(split.last_installment, "2024-02");
    let single = rows.iter().find(|r| r.installments == 0).unwrap();
    assert_eq!(single.total, "30".parse().unwrap());
    assert_eq!(single.last_installment, "");
    assert_eq!(single.category, "Food");
}

#[test]
fn expense_list_limit_respected() {
    let conn = setup();
    let m = sub_matches(&["splitpay", "expense", "list", "--limit", "1"]);
    let rows = expenses::query_rows(&conn, &m).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2024-02-05");
}

#[test]
fn explicit_range_overrides_window() {
    let conn = setup();
    let m = sub_matches(&[
        "splitpay", "report", "monthly", "--from", "2024-01", "--to", "2024-03", "--by", "category",
        "--by", "kind",
    ]);
    let range = reports::resolve_month_range(&conn, &m).unwrap();
    assert_eq!(month_label(range.start()), "2024-01");
    assert_eq!(month_label(range.end()), "2024-03");
    assert_eq!(
        reports::group_keys(&m).unwrap(),
        vec![GroupKey::Category, GroupKey::PaymentKind]
    );

    let backwards = sub_matches(&["splitpay", "report", "monthly", "--from", "2024-05", "--to", "2024-03"]);
    assert!(reports::resolve_month_range(&conn, &backwards).is_err());
}

#[test]
fn default_range_spans_configured_window() {
    let conn = setup();
    splitpay::commands::settings::set(&conn, "window_months", "3").unwrap();
    let m = sub_matches(&["splitpay", "report", "monthly", "--to", "2024-03"]);
    let range = reports::resolve_month_range(&conn, &m).unwrap();
    assert_eq!(month_label(range.start()), "2024-01");
    assert_eq!(month_label(range.end()), "2024-03");
}

#[test]
fn dashboard_reuses_cached_views_until_the_store_changes() {
    let conn = setup();
    let m = sub_matches(&["splitpay", "report", "dashboard", "--from", "2024-01", "--to", "2024-02"]);
    let range = reports::resolve_month_range(&conn, &m).unwrap();
    let days = DayRange::new(range.start(), "2024-02-29".parse().unwrap()).unwrap();
    assert_eq!(reports::dashboard_queries(range, days, false).len(), 5);

    let store = SqliteStore::new(&conn);
    let snapshot = store.snapshot().unwrap();
    let mut cache = ReportCache::new();
    let first = reports::build_dashboard(&mut cache, &snapshot, range, days, false).unwrap();
    assert_eq!(first.len(), 5);
    assert!(first.iter().all(|(_, report)| !report.is_empty()));
    assert_eq!((cache.hits(), cache.misses()), (0, 5));

    let again = reports::build_dashboard(&mut cache, &snapshot, range, days, false).unwrap();
    assert_eq!((cache.hits(), cache.misses()), (5, 5));
    assert_eq!(again, first);

    let groceries = store.list_types().unwrap()[0].id;
    let card = store.list_payment_methods().unwrap()[0].id;
    store
        .add_expense(&NewExpense {
            date: "2024-02-10".parse().unwrap(),
            unit_value: "7".parse().unwrap(),
            installment_count: 0,
            description: "snack".into(),
            type_id: groceries,
            payment_method_id: card,
        })
        .unwrap();
    let fresh = store.snapshot().unwrap();
    let after = reports::build_dashboard(&mut cache, &fresh, range, days, false).unwrap();
    assert_eq!((cache.hits(), cache.misses()), (5, 10));
    assert_ne!(after[0].1, first[0].1);
}

#[test]
fn installment_count_is_bounded_on_the_command_line() {
    let args = |n: &str| {
        cli::build_cli().try_get_matches_from([
            "splitpay", "expense", "add", "--date", "2024-01-10", "--amount", "10", "--type",
            "Groceries", "--payment", "Card", "--description", "tv", "--installments", n,
        ])
    };
    assert!(args("600").is_ok());
    assert!(args("601").is_err());
    assert!(args("4294967295").is_err());
}

#[test]
fn export_schedule_writes_one_row_per_payment() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("schedule.csv");
    let out_s = out.to_str().unwrap();
    let matches = cli::build_cli().get_matches_from([
        "splitpay", "export", "schedule", "--from", "2024-01", "--to", "2024-12", "--out", out_s,
    ]);
    let (_, export_m) = matches.subcommand().unwrap();
    exporter::handle(&conn, export_m).unwrap();

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "month");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][0], "2024-01");
    assert_eq!(&rows[3][0], "2024-02");
    let installments = rows.iter().filter(|r| &r[2] == "Installment").count();
    assert_eq!(installments, 2);
}

#[test]
fn export_schedule_as_json() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("schedule.json");
    let out_s = out.to_str().unwrap();
    let matches = cli::build_cli().get_matches_from([
        "splitpay", "export", "schedule", "--from", "2024-02", "--to", "2024-02", "--single-only",
        "--format", "json", "--out", out_s,
    ]);
    let (_, export_m) = matches.subcommand().unwrap();
    exporter::handle(&conn, export_m).unwrap();

    let body = std::fs::read_to_string(&out).unwrap();
    let items: serde_json::Value = serde_json::from_str(&body).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["amount"], "12.5");
    assert_eq!(items[0]["kind"], "Single");
}

#[test]
fn doctor_flags_rejected_and_orphaned_records() {
    let conn = setup();
    assert!(doctor::diagnose(&conn).unwrap().is_empty());

    conn.execute("INSERT INTO types(kind, name) VALUES ('expense', 'Loose')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO expenses(date, amount, description, type_id, payment_method_id, installments)
         VALUES ('2024-01-01', '10', 'no refs', NULL, NULL, 0)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO expenses(date, amount, description, type_id, payment_method_id, installments)
         VALUES ('01/01/2024', '10', 'bad date', 1, 1, 0)",
        [],
    )
    .unwrap();

    let issues = doctor::diagnose(&conn).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&"invalid_record"));
    assert!(kinds.contains(&"expense_without_type"));
    assert!(kinds.contains(&"expense_without_payment"));
    assert!(kinds.contains(&"type_without_category"));
}
