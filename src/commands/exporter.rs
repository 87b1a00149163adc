// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reports::resolve_month_range;
use crate::engine::{CashFlowEvent, MonthRange, PaymentKind, expand_all, filter, month_label};
use crate::error::SkippedRecord;
use crate::store::{RecordStore, SqliteStore};
use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("schedule", sub)) => export_schedule(conn, sub),
        _ => Ok(()),
    }
}

/// Expanded events inside `range`, ordered by month then record.
pub fn schedule_events(
    conn: &Connection,
    range: &MonthRange,
    include_installments: bool,
) -> Result<(Vec<CashFlowEvent>, Vec<SkippedRecord>)> {
    let snapshot = SqliteStore::new(conn).snapshot()?;
    let expansion = expand_all(&snapshot.records)?;
    let mut events: Vec<CashFlowEvent> = filter(expansion.events, range)
        .into_iter()
        .filter(|e| include_installments || e.payment_kind == PaymentKind::Single)
        .collect();
    events.sort_by(|a, b| {
        (a.occurrence_month, a.source_record_id, a.sequence).cmp(&(
            b.occurrence_month,
            b.source_record_id,
            b.sequence,
        ))
    });
    let mut skipped = snapshot.rejected;
    skipped.extend(expansion.skipped);
    Ok((events, skipped))
}

fn export_schedule(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let range = resolve_month_range(conn, sub)?;
    let (events, skipped) = schedule_events(conn, &range, !sub.get_flag("single_only"))?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "month", "expense_id", "kind", "installment", "of", "amount", "category", "type",
                "payment",
            ])?;
            for e in &events {
                wtr.write_record([
                    month_label(e.occurrence_month),
                    e.source_record_id.to_string(),
                    e.payment_kind.label().to_string(),
                    e.sequence.to_string(),
                    e.of.to_string(),
                    e.amount.to_string(),
                    e.category.clone().unwrap_or_default(),
                    e.expense_type.clone().unwrap_or_default(),
                    e.payment_method.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = events
                .iter()
                .map(|e| {
                    json!({
                        "month": month_label(e.occurrence_month),
                        "expense_id": e.source_record_id,
                        "kind": e.payment_kind.label(),
                        "installment": e.sequence,
                        "of": e.of,
                        "amount": e.amount.to_string(),
                        "category": e.category,
                        "type": e.expense_type,
                        "payment": e.payment_method,
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    info!(events = events.len(), skipped = skipped.len(), out = %out, "schedule exported");
    println!("Exported {} payments to {}", events.len(), out);
    if !skipped.is_empty() {
        eprintln!("{} record(s) skipped; run `splitpay doctor` for details", skipped.len());
    }
    Ok(())
}
