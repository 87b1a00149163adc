// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::expand_all;
use crate::store::{RecordStore, SqliteStore};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

fn push(issues: &mut Vec<Issue>, kind: &'static str, detail: String) {
    issues.push(Issue { kind, detail });
}

/// Everything that would make a report silently smaller than the data.
pub fn diagnose(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Records the engine rejects
    let snapshot = SqliteStore::new(conn).snapshot()?;
    let expansion = expand_all(&snapshot.records)?;
    for s in snapshot.rejected.iter().chain(expansion.skipped.iter()) {
        push(&mut issues, "invalid_record", format!("#{}: {}", s.id, s.reason));
    }

    // 2) Expenses pointing at missing types or payment methods
    let mut stmt = conn.prepare(
        "SELECT e.id, e.type_id, t.id, e.payment_method_id, p.id FROM expenses e
         LEFT JOIN types t ON e.type_id=t.id
         LEFT JOIN payment_methods p ON e.payment_method_id=p.id
         WHERE t.id IS NULL OR p.id IS NULL
         ORDER BY e.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let type_ref: Option<i64> = r.get(1)?;
        let type_found: Option<i64> = r.get(2)?;
        let payment_ref: Option<i64> = r.get(3)?;
        let payment_found: Option<i64> = r.get(4)?;
        if type_found.is_none() {
            let detail = match type_ref {
                Some(t) => format!("#{} references missing type #{}", id, t),
                None => format!("#{} has no type", id),
            };
            push(&mut issues, "expense_without_type", detail);
        }
        if payment_found.is_none() {
            let detail = match payment_ref {
                Some(p) => format!("#{} references missing payment method #{}", id, p),
                None => format!("#{} has no payment method", id),
            };
            push(&mut issues, "expense_without_payment", detail);
        }
    }

    // 3) Types outside any category; their expenses drop out of category views
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name FROM types t
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE c.id IS NULL
         ORDER BY t.name",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        push(&mut issues, "type_without_category", format!("#{} '{}'", id, name));
    }

    Ok(issues)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = diagnose(conn)?;
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
