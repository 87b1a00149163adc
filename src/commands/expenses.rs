// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{final_installment_month, month_label};
use crate::models::{NewExpense, PurchaseRecord};
use crate::store::{RecordFilter, RecordStore, SqliteStore};
use crate::utils::{
    fmt_brl, id_for_payment, id_for_type, maybe_print_json, parse_amount, parse_date,
    parse_month, pretty_table,
};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            SqliteStore::new(conn).delete_expense(id)?;
            println!("Removed expense #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn required_description(s: &str) -> Result<String> {
    let d = s.trim();
    if d.is_empty() {
        return Err(anyhow!("Description must not be empty"));
    }
    Ok(d.to_string())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let unit_value = parse_amount(sub.get_one::<String>("amount").unwrap())?;
    let type_id = id_for_type(conn, sub.get_one::<String>("type").unwrap().trim())?;
    let payment_method_id = id_for_payment(conn, sub.get_one::<String>("payment").unwrap().trim())?;
    let description = required_description(sub.get_one::<String>("description").unwrap())?;
    let installment_count = *sub.get_one::<u32>("installments").unwrap_or(&0);

    let expense = NewExpense {
        date,
        unit_value,
        installment_count,
        description,
        type_id,
        payment_method_id,
    };
    let id = SqliteStore::new(conn).add_expense(&expense)?;
    if installment_count > 0 {
        println!(
            "Recorded #{}: {} x {} from {} ('{}')",
            id,
            installment_count,
            fmt_brl(&unit_value),
            date,
            expense.description
        );
    } else {
        println!(
            "Recorded #{}: {} on {} ('{}')",
            id,
            fmt_brl(&unit_value),
            date,
            expense.description
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = store
        .get_record(id)?
        .with_context(|| format!("Expense #{} not found", id))?;

    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => parse_date(&current.purchase_date)?,
    };
    let unit_value = match sub.get_one::<String>("amount") {
        Some(a) => parse_amount(a)?,
        None => current.unit_value,
    };
    let type_id = match sub.get_one::<String>("type") {
        Some(t) => id_for_type(conn, t.trim())?,
        None => current
            .type_id
            .with_context(|| format!("Expense #{} has no type; pass --type", id))?,
    };
    let payment_method_id = match sub.get_one::<String>("payment") {
        Some(p) => id_for_payment(conn, p.trim())?,
        None => current
            .payment_method_id
            .with_context(|| format!("Expense #{} has no payment method; pass --payment", id))?,
    };
    let description = match sub.get_one::<String>("description") {
        Some(d) => required_description(d)?,
        None => current.description.clone(),
    };
    let installment_count = match sub.get_one::<u32>("installments") {
        Some(n) => *n,
        None => u32::try_from(current.installment_count)
            .map_err(|_| anyhow!("Expense #{} has an invalid installment count", id))?,
    };

    store.update_expense(
        id,
        &NewExpense {
            date,
            unit_value,
            installment_count,
            description,
            type_id,
            payment_method_id,
        },
    )?;
    println!("Updated expense #{}", id);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.description.clone(),
                    r.expense_type.clone(),
                    r.category.clone(),
                    r.payment.clone(),
                    fmt_brl(&r.amount),
                    r.installments.to_string(),
                    fmt_brl(&r.total),
                    r.last_installment.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "ID",
                    "Date",
                    "Description",
                    "Type",
                    "Category",
                    "Payment",
                    "Amount",
                    "Installments",
                    "Total",
                    "Last installment",
                ],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub expense_type: String,
    pub category: String,
    pub payment: String,
    pub amount: Decimal,
    pub installments: i64,
    /// `amount * installments`, or `amount` for single payments.
    pub total: Decimal,
    pub last_installment: String,
}

impl From<PurchaseRecord> for ExpenseRow {
    fn from(r: PurchaseRecord) -> Self {
        let total = if r.installment_count > 0 {
            r.unit_value * Decimal::from(r.installment_count)
        } else {
            r.unit_value
        };
        let last_installment = if r.installment_count > 0 {
            final_installment_month(&r)
                .map(month_label)
                .unwrap_or_else(|_| "invalid".to_string())
        } else {
            String::new()
        };
        ExpenseRow {
            id: r.id,
            date: r.purchase_date,
            description: r.description,
            expense_type: r.expense_type.unwrap_or_default(),
            category: r.category.unwrap_or_default(),
            payment: r.payment_method.unwrap_or_default(),
            amount: r.unit_value,
            installments: r.installment_count,
            total,
            last_installment,
        }
    }
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<ExpenseRow>> {
    let month = match sub.get_one::<String>("month") {
        Some(m) => Some(parse_month(m)?.format("%Y-%m").to_string()),
        None => None,
    };
    let filter = RecordFilter {
        month,
        category: sub.get_one::<String>("category").cloned(),
        expense_type: sub.get_one::<String>("type").cloned(),
        payment_method: sub.get_one::<String>("payment").cloned(),
        limit: sub.get_one::<usize>("limit").copied(),
        ..Default::default()
    };
    let records = SqliteStore::new(conn).list_records(&filter)?;
    Ok(records.into_iter().map(ExpenseRow::from).collect())
}
