// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use splitpay::engine::{
    DayRange, DimensionOrder, GroupKey, MonthRange, ReportCache, ReportOutput, ReportQuery,
    ReportView, build_report, month_label,
};
use splitpay::error::SkippedRecord;
use splitpay::models::{PurchaseRecord, Snapshot};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn ymd(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn record(id: i64, date: &str, value: &str, installments: i64, cat: &str) -> PurchaseRecord {
    PurchaseRecord {
        id,
        purchase_date: date.into(),
        unit_value: d(value),
        installment_count: installments,
        category_id: Some(1),
        type_id: Some(1),
        payment_method_id: Some(1),
        description: String::new(),
        category: Some(cat.into()),
        expense_type: Some("Any".into()),
        payment_method: Some("Card".into()),
    }
}

fn snapshot(version: u64) -> Snapshot {
    Snapshot {
        version,
        records: vec![
            record(1, "2023-11-15", "100", 6, "Home"),
            record(2, "2024-01-03", "40", 0, "Food"),
            record(3, "2024-02-30", "5", 0, "Food"),
            record(4, "2024-02-10", "25", 0, "Food"),
        ],
        rejected: vec![SkippedRecord {
            id: 9,
            reason: "stored amount 'x' is not a decimal".into(),
        }],
    }
}

fn q1() -> MonthRange {
    MonthRange::new(ymd(2024, 1, 1), ymd(2024, 3, 1)).unwrap()
}

#[test]
fn monthly_report_includes_installments_of_earlier_purchases() {
    let snap = snapshot(1);
    let query = ReportQuery::new(ReportView::Monthly {
        keys: vec![],
        order: DimensionOrder::Alphabetic,
    })
    .with_range(q1());
    let report = build_report(&snap, &query).unwrap();
    let ReportOutput::Monthly(agg) = &report.output else {
        panic!("expected monthly output");
    };
    let rows: Vec<(String, Decimal)> = agg
        .buckets
        .iter()
        .map(|b| (month_label(b.month), b.total))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2024-01".to_string(), d("140")),
            ("2024-02".to_string(), d("125")),
            ("2024-03".to_string(), d("100")),
        ]
    );
    let mut skipped: Vec<i64> = report.skipped.iter().map(|s| s.id).collect();
    skipped.sort();
    assert_eq!(skipped, vec![3, 9]);
    assert_eq!(report.version, 1);
}

#[test]
fn skipped_records_carry_their_reason() {
    let mut snap = snapshot(1);
    snap.records[3].installment_count = -4;
    let report = build_report(&snap, &ReportQuery::new(ReportView::InstallmentSchedule)).unwrap();
    let negative = report.skipped.iter().find(|s| s.id == 4).unwrap();
    assert!(negative.reason.contains("-4"));
    let bad_date = report.skipped.iter().find(|s| s.id == 3).unwrap();
    assert!(bad_date.reason.contains("2024-02-30"));
}

#[test]
fn single_only_drops_installment_events() {
    let snap = snapshot(1);
    let query = ReportQuery::new(ReportView::Breakdown {
        key: GroupKey::Category,
        order: DimensionOrder::TotalDescending,
    })
    .with_range(q1())
    .single_only();
    let report = build_report(&snap, &query).unwrap();
    let ReportOutput::Breakdown(r) = &report.output else {
        panic!("expected breakdown output");
    };
    assert_eq!(r.rows.len(), 1);
    assert_eq!(r.rows[0].value, "Food");
    assert_eq!(r.grand_installment, Decimal::ZERO);
    assert_eq!(r.grand_total, d("65"));
}

#[test]
fn installment_schedule_ignores_range_and_single_payments() {
    let snap = snapshot(1);
    let query = ReportQuery::new(ReportView::InstallmentSchedule).with_range(q1());
    let report = build_report(&snap, &query).unwrap();
    let ReportOutput::InstallmentSchedule(agg) = &report.output else {
        panic!("expected schedule output");
    };
    assert_eq!(agg.buckets.len(), 6);
    assert_eq!(month_label(agg.buckets[0].month), "2023-11");
    assert_eq!(month_label(agg.buckets[5].month), "2024-04");
    assert!(agg.buckets.iter().all(|b| b.single.is_zero()));
}

#[test]
fn empty_range_gives_empty_report() {
    let snap = snapshot(1);
    let query = ReportQuery::new(ReportView::Monthly {
        keys: vec![GroupKey::Category],
        order: DimensionOrder::Alphabetic,
    })
    .with_range(MonthRange::new(ymd(2030, 1, 1), ymd(2030, 6, 1)).unwrap());
    let report = build_report(&snap, &query).unwrap();
    assert!(report.is_empty());
}

#[test]
fn daily_report_counts_purchases_once() {
    let snap = snapshot(1);
    let range = DayRange::new(ymd(2023, 11, 1), ymd(2024, 2, 29)).unwrap();
    let query = ReportQuery::new(ReportView::Daily {
        range,
        keys: vec![GroupKey::Category],
        order: DimensionOrder::Alphabetic,
    });
    let report = build_report(&snap, &query).unwrap();
    let ReportOutput::Daily(daily) = &report.output else {
        panic!("expected daily output");
    };
    let total: Decimal = daily.buckets.iter().map(|b| b.total).sum();
    assert_eq!(total, d("165"));
}

#[test]
fn cache_reuses_reports_until_version_changes() {
    let query = ReportQuery::new(ReportView::Breakdown {
        key: GroupKey::Category,
        order: DimensionOrder::Alphabetic,
    })
    .with_range(q1());
    let mut cache = ReportCache::new();

    let first = cache.get_or_build(&snapshot(1), &query).unwrap();
    let second = cache.get_or_build(&snapshot(1), &query).unwrap();
    assert_eq!(first, second);
    assert_eq!((cache.hits(), cache.misses()), (1, 1));

    let mut changed = snapshot(2);
    changed.records.push(record(5, "2024-03-01", "1000", 0, "Travel"));
    let third = cache.get_or_build(&changed, &query).unwrap();
    assert_eq!(cache.misses(), 2);
    assert_eq!(third.version, 2);
    assert_ne!(first, third);
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_keys_include_query_parameters() {
    let mut cache = ReportCache::new();
    let snap = snapshot(3);
    let all = ReportQuery::new(ReportView::Monthly {
        keys: vec![],
        order: DimensionOrder::Alphabetic,
    })
    .with_range(q1());
    let single = all.clone().single_only();
    cache.get_or_build(&snap, &all).unwrap();
    cache.get_or_build(&snap, &single).unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.hits(), 0);
}
