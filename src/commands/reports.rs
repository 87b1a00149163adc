// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{
    DayRange, DimensionOrder, GroupKey, MonthRange, Report, ReportCache, ReportOutput,
    ReportQuery, ReportView, add_months, build_report, month_label, month_start, monthly_totals,
};
use crate::models::Snapshot;
use crate::store::{RecordStore, SqliteStore};
use crate::utils::{
    fmt_brl, fmt_day, fmt_percentage, get_window_months, maybe_print_json, parse_date,
    parse_month, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use chrono::{Months, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::warn;

pub const EMPTY_STATE: &str = "No expenses found for the selected period.";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("monthly", sub)) => monthly(conn, sub)?,
        Some(("breakdown", sub)) => breakdown(conn, sub)?,
        Some(("installments", sub)) => installments(conn, sub)?,
        Some(("daily", sub)) => daily(conn, sub)?,
        Some(("dashboard", sub)) => dashboard(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn window_start(conn: &Connection, end: NaiveDate) -> Result<NaiveDate> {
    let months = get_window_months(conn)?.max(1);
    month_start(end)
        .checked_sub_months(Months::new(months - 1))
        .ok_or_else(|| anyhow!("Report window of {} months is out of range", months))
}

/// Reads `--from`/`--to` as months, defaulting to the configured window
/// ending in the current month.
pub fn resolve_month_range(conn: &Connection, sub: &clap::ArgMatches) -> Result<MonthRange> {
    let end = match sub.get_one::<String>("to") {
        Some(s) => parse_month(s)?,
        None => month_start(today()),
    };
    let start = match sub.get_one::<String>("from") {
        Some(s) => parse_month(s)?,
        None => window_start(conn, end)?,
    };
    MonthRange::new(start, end)
}

/// Reads `--from`/`--to` as days for the by-day view.
pub fn resolve_day_range(conn: &Connection, sub: &clap::ArgMatches) -> Result<DayRange> {
    let end = match sub.get_one::<String>("to") {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let start = match sub.get_one::<String>("from") {
        Some(s) => parse_date(s)?,
        None => window_start(conn, end)?,
    };
    DayRange::new(start, end)
}

pub fn group_keys(sub: &clap::ArgMatches) -> Result<Vec<GroupKey>> {
    match sub.get_many::<String>("by") {
        Some(values) => values.map(|v| GroupKey::parse(v)).collect(),
        None => Ok(Vec::new()),
    }
}

pub fn dimension_order(sub: &clap::ArgMatches) -> DimensionOrder {
    match sub.get_one::<String>("order").map(String::as_str) {
        Some("total") => DimensionOrder::TotalDescending,
        _ => DimensionOrder::Alphabetic,
    }
}

fn with_options(query: ReportQuery, sub: &clap::ArgMatches) -> ReportQuery {
    if sub.get_flag("single_only") {
        query.single_only()
    } else {
        query
    }
}

/// Builds one report from a fresh snapshot of the store.
pub fn run_query(conn: &Connection, query: &ReportQuery) -> Result<Report> {
    let snapshot = SqliteStore::new(conn).snapshot()?;
    build_report(&snapshot, query).context("Failed to build report")
}

fn emit(report: &Report, sub: &clap::ArgMatches, title: &str) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), report)? {
        return Ok(());
    }
    render(report, title);
    Ok(())
}

fn monthly(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let query = ReportQuery::new(ReportView::Monthly {
        keys: group_keys(sub)?,
        order: dimension_order(sub),
    })
    .with_range(resolve_month_range(conn, sub)?);
    let report = run_query(conn, &with_options(query, sub))?;
    emit(&report, sub, "Expenses per month")
}

fn breakdown(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let key = GroupKey::parse(sub.get_one::<String>("by").unwrap())?;
    let query = ReportQuery::new(ReportView::Breakdown {
        key,
        order: dimension_order(sub),
    })
    .with_range(resolve_month_range(conn, sub)?);
    let report = run_query(conn, &with_options(query, sub))?;
    emit(&report, sub, &format!("Expenses by {}", key.label()))
}

fn installments(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let report = run_query(conn, &ReportQuery::new(ReportView::InstallmentSchedule))?;
    emit(&report, sub, "Installments per month")
}

fn daily(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let query = ReportQuery::new(ReportView::Daily {
        range: resolve_day_range(conn, sub)?,
        keys: group_keys(sub)?,
        order: dimension_order(sub),
    });
    let report = run_query(conn, &with_options(query, sub))?;
    emit(&report, sub, "Expenses per day")
}

/// The dashboard views, computed from one snapshot.
pub fn dashboard_queries(
    range: MonthRange,
    day_range: DayRange,
    single_only: bool,
) -> Vec<(String, ReportQuery)> {
    let opts = |q: ReportQuery| if single_only { q.single_only() } else { q };
    vec![
        (
            "Expenses per month (single + installments)".to_string(),
            opts(
                ReportQuery::new(ReportView::Monthly {
                    keys: vec![GroupKey::PaymentKind],
                    order: DimensionOrder::Alphabetic,
                })
                .with_range(range),
            ),
        ),
        (
            "Expenses per month and type".to_string(),
            opts(
                ReportQuery::new(ReportView::Monthly {
                    keys: vec![GroupKey::ExpenseType],
                    order: DimensionOrder::Alphabetic,
                })
                .with_range(range),
            ),
        ),
        (
            "Expenses per day and type".to_string(),
            opts(ReportQuery::new(ReportView::Daily {
                range: day_range,
                keys: vec![GroupKey::ExpenseType],
                order: DimensionOrder::Alphabetic,
            })),
        ),
        (
            "Expenses by category".to_string(),
            opts(
                ReportQuery::new(ReportView::Breakdown {
                    key: GroupKey::Category,
                    order: DimensionOrder::TotalDescending,
                })
                .with_range(range),
            ),
        ),
        (
            "Installments per month".to_string(),
            ReportQuery::new(ReportView::InstallmentSchedule),
        ),
    ]
}

fn dashboard(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let range = resolve_month_range(conn, sub)?;
    let last_day = add_months(range.end(), 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(range.end());
    let day_range = DayRange::new(range.start(), last_day)?;

    let snapshot = SqliteStore::new(conn).snapshot()?;
    let mut cache = ReportCache::new();
    let views = build_dashboard(
        &mut cache,
        &snapshot,
        range,
        day_range,
        sub.get_flag("single_only"),
    )?;
    for (title, report) in views {
        render(&report, &title);
        println!();
    }
    Ok(())
}

/// Builds every dashboard view through `cache`.
///
/// The cache only pays off when it outlives one call: a CLI run builds each
/// view once, so hits come from callers that keep a `ReportCache` across
/// refreshes. A snapshot with a new version clears whatever was cached.
pub fn build_dashboard(
    cache: &mut ReportCache,
    snapshot: &Snapshot,
    range: MonthRange,
    day_range: DayRange,
    single_only: bool,
) -> Result<Vec<(String, Report)>> {
    dashboard_queries(range, day_range, single_only)
        .into_iter()
        .map(|(title, query)| Ok((title, cache.get_or_build(snapshot, &query)?)))
        .collect()
}

fn amount_cols(single: &Decimal, installment: &Decimal, total: &Decimal) -> Vec<String> {
    vec![fmt_brl(single), fmt_brl(installment), fmt_brl(total)]
}

/// Prints a report as tables, or the empty-state message when there is no data.
pub fn render(report: &Report, title: &str) {
    println!("{}", title);
    if report.is_empty() {
        println!("{}", EMPTY_STATE);
    } else {
        match &report.output {
            ReportOutput::Monthly(agg) => {
                let width = agg.buckets.first().map(|b| b.dimensions.len()).unwrap_or(0);
                let mut headers = vec!["Month"];
                headers.extend(std::iter::repeat_n("Group", width));
                headers.extend(["Single", "Installment", "Total"]);
                let rows = agg
                    .buckets
                    .iter()
                    .map(|b| {
                        let mut row = vec![month_label(b.month)];
                        row.extend(b.dimensions.iter().cloned());
                        row.extend(amount_cols(&b.single, &b.installment, &b.total));
                        row
                    })
                    .collect();
                println!("{}", pretty_table(&headers, rows));
                if width > 0 {
                    let totals = monthly_totals(&agg.buckets)
                        .into_iter()
                        .map(|t| {
                            let mut row = vec![month_label(t.month)];
                            row.extend(amount_cols(&t.single, &t.installment, &t.total));
                            row
                        })
                        .collect();
                    println!(
                        "{}",
                        pretty_table(&["Month", "Single", "Installment", "Total"], totals)
                    );
                }
                if !agg.excluded.is_empty() {
                    println!(
                        "{} payments without a value for the grouping were left out",
                        agg.excluded.len()
                    );
                }
            }
            ReportOutput::Breakdown(r) => {
                let mut rows: Vec<Vec<String>> = r
                    .rows
                    .iter()
                    .map(|row| {
                        let mut cols = vec![row.value.clone()];
                        cols.extend(amount_cols(&row.single, &row.installment, &row.total));
                        cols.push(fmt_percentage(row.percentage));
                        cols
                    })
                    .collect();
                let mut total_row = vec!["Total".to_string()];
                total_row.extend(amount_cols(
                    &r.grand_single,
                    &r.grand_installment,
                    &r.grand_total,
                ));
                let share = if r.grand_total.is_zero() { "n/a" } else { "100.00%" };
                total_row.push(share.to_string());
                rows.push(total_row);
                println!(
                    "{}",
                    pretty_table(&[r.key.label(), "Single", "Installment", "Total", "Share"], rows)
                );
                if !r.excluded.is_empty() {
                    println!(
                        "{} payments without a {} were left out ({})",
                        r.excluded.len(),
                        r.key.label().to_lowercase(),
                        fmt_brl(&r.excluded_total())
                    );
                }
            }
            ReportOutput::InstallmentSchedule(agg) => {
                let rows = agg
                    .buckets
                    .iter()
                    .map(|b| vec![month_label(b.month), fmt_brl(&b.installment)])
                    .collect();
                println!("{}", pretty_table(&["Month", "Installments"], rows));
            }
            ReportOutput::Daily(d) => {
                let width = d.buckets.first().map(|b| b.dimensions.len()).unwrap_or(0);
                let mut headers = vec!["Day"];
                headers.extend(std::iter::repeat_n("Group", width));
                headers.extend(["Single", "Installment", "Total"]);
                let rows = d
                    .buckets
                    .iter()
                    .map(|b| {
                        let mut row = vec![fmt_day(b.day)];
                        row.extend(b.dimensions.iter().cloned());
                        row.extend(amount_cols(&b.single, &b.installment, &b.total));
                        row
                    })
                    .collect();
                println!("{}", pretty_table(&headers, rows));
            }
        }
    }
    if !report.skipped.is_empty() {
        warn!(count = report.skipped.len(), "records skipped in report");
        let rows = report
            .skipped
            .iter()
            .map(|s| vec![s.id.to_string(), s.reason.clone()])
            .collect();
        eprintln!("Skipped {} record(s):", report.skipped.len());
        eprintln!("{}", pretty_table(&["Expense", "Reason"], rows));
    }
}
