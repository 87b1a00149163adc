// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::models::EntryKind;

pub const DEFAULT_WINDOW_MONTHS: u32 = 12;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

static BRL_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(\.\d{3})+(,\d{1,2})?$").expect("valid regex"));
static BRL_PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(,\d{1,2})?$").expect("valid regex"));

/// Parses a Brazilian-formatted amount such as `R$ 1.234,56` or `1234,56`.
pub fn parse_brl(s: &str) -> Result<Decimal> {
    let body: String = s
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if !BRL_GROUPED.is_match(&body) && !BRL_PLAIN.is_match(&body) {
        return Err(anyhow!("Invalid amount '{}', expected e.g. R$ 1.234,56", s));
    }
    let normalized = body.replace('.', "").replace(',', ".");
    normalized
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount '{}'", s))
}

/// Accepts either a BRL-formatted amount or a plain decimal like `1234.56`.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    if s.contains("R$") || s.contains(',') {
        parse_brl(s)
    } else {
        parse_decimal(s)
    }
}

/// Formats an amount as `R$1.234,56`. Negative values render as `R$-1.234,56`.
pub fn fmt_brl(d: &Decimal) -> String {
    let fixed = format!("{:.2}", d.round_dp(2).abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }
    let sign = if d.round_dp(2).is_sign_negative() && !d.round_dp(2).is_zero() {
        "-"
    } else {
        ""
    };
    format!("R${}{},{}", sign, grouped, frac_part)
}

pub fn fmt_percentage(p: Option<Decimal>) -> String {
    match p {
        Some(p) => format!("{:.2}%", p.round_dp(2)),
        None => "n/a".to_string(),
    }
}

pub fn fmt_day(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_category(conn: &Connection, kind: EntryKind, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE kind=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![kind.as_str(), name], |r| r.get(0))
        .with_context(|| format!("Category '{}' ({}) not found", name, kind))?;
    Ok(id)
}

pub fn id_for_type(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM types WHERE name=?1 ORDER BY kind='expense' DESC")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Type '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_payment(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM payment_methods WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Payment method '{}' not found", name))?;
    Ok(id)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Number of months a report covers when no explicit range is given.
pub fn get_window_months(conn: &Connection) -> Result<u32> {
    match get_setting(conn, "window_months")? {
        Some(s) => s
            .parse::<u32>()
            .with_context(|| format!("Invalid window_months setting '{}'", s)),
        None => Ok(DEFAULT_WINDOW_MONTHS),
    }
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
