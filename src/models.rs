// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::anyhow;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SkippedRecord;

/// What a category or type classifies: spending, earnings or savings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Expense,
    Income,
    Investment,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Expense => "expense",
            EntryKind::Income => "income",
            EntryKind::Investment => "investment",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(EntryKind::Expense),
            "income" => Ok(EntryKind::Income),
            "investment" => Ok(EntryKind::Investment),
            other => Err(anyhow!(
                "Invalid kind '{}', expected expense|income|investment",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub kind: EntryKind,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseType {
    pub id: i64,
    pub kind: EntryKind,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// An expense as stored, joined with its category, type and payment names.
///
/// `purchase_date` is kept as the stored text; the expander validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: i64,
    pub purchase_date: String,
    pub unit_value: Decimal,
    pub installment_count: i64,
    pub category_id: Option<i64>,
    pub type_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub description: String,
    pub category: Option<String>,
    pub expense_type: Option<String>,
    pub payment_method: Option<String>,
}

/// Input for creating or updating an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub unit_value: Decimal,
    pub installment_count: u32,
    pub description: String,
    pub type_id: i64,
    pub payment_method_id: i64,
}

/// Everything the engine needs from the store for one report.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub version: u64,
    pub records: Vec<PurchaseRecord>,
    pub rejected: Vec<SkippedRecord>,
}

/// Counts of rows removed by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub categories: usize,
    pub types: usize,
    pub payment_methods: usize,
    pub expenses: usize,
}
