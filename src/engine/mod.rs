// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Installment expansion and month-bucketed aggregation.
//!
//! Every stage is a pure function over a record snapshot:
//! expand -> filter -> aggregate / rollup.

pub mod aggregate;
pub mod cache;
pub mod expand;
pub mod filter;
pub mod report;
pub mod rollup;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::fmt;

pub use aggregate::{
    Aggregation, DailyAggregation, DailyBucket, MonthlyBucket, MonthlyTotal, aggregate,
    aggregate_by_day, monthly_totals,
};
pub use cache::ReportCache;
pub use expand::{MAX_INSTALLMENTS, Expansion, expand, expand_all, final_installment_month};
pub use filter::{DayRange, MonthRange, filter, filter_days};
pub use report::{Report, ReportOutput, ReportQuery, ReportView, build_report};
pub use rollup::{Rollup, RollupRow, rollup};

/// How a purchase is paid: in full, or as one of N installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PaymentKind {
    Single,
    Installment,
}

impl PaymentKind {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentKind::Single => "Single",
            PaymentKind::Installment => "Installment",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One dated amount attributable to a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlowEvent {
    pub source_record_id: i64,
    pub occurrence_month: NaiveDate,
    pub amount: rust_decimal::Decimal,
    pub payment_kind: PaymentKind,
    /// 1-based installment number; 1 for single payments.
    pub sequence: u32,
    pub of: u32,
    pub category: Option<String>,
    pub expense_type: Option<String>,
    pub payment_method: Option<String>,
}

impl CashFlowEvent {
    pub fn dimension(&self, key: GroupKey) -> Option<String> {
        match key {
            GroupKey::Category => self.category.clone(),
            GroupKey::ExpenseType => self.expense_type.clone(),
            GroupKey::PaymentMethod => self.payment_method.clone(),
            GroupKey::PaymentKind => Some(self.payment_kind.label().to_string()),
        }
    }
}

/// A categorical dimension events can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupKey {
    Category,
    ExpenseType,
    PaymentMethod,
    PaymentKind,
}

impl GroupKey {
    pub fn label(&self) -> &'static str {
        match self {
            GroupKey::Category => "Category",
            GroupKey::ExpenseType => "Type",
            GroupKey::PaymentMethod => "Payment",
            GroupKey::PaymentKind => "Kind",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "category" => Ok(GroupKey::Category),
            "type" => Ok(GroupKey::ExpenseType),
            "payment" => Ok(GroupKey::PaymentMethod),
            "kind" => Ok(GroupKey::PaymentKind),
            other => Err(anyhow::anyhow!(
                "Unknown dimension '{}', expected category|type|payment|kind",
                other
            )),
        }
    }
}

/// Ordering of dimension values inside one month (or one rollup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DimensionOrder {
    #[default]
    Alphabetic,
    TotalDescending,
}

/// Splits events into those carrying a value for every key and those that don't.
///
/// This is the only place events are dropped for a missing dimension; callers
/// keep the excluded half so totals can be reconciled.
pub fn partition_by_dimension(
    events: Vec<CashFlowEvent>,
    keys: &[GroupKey],
) -> (Vec<CashFlowEvent>, Vec<CashFlowEvent>) {
    events
        .into_iter()
        .partition(|e| keys.iter().all(|k| e.dimension(*k).is_some()))
}

pub fn month_start(d: NaiveDate) -> NaiveDate {
    // day 1 exists in every month
    d.with_day(1).unwrap_or(d)
}

pub fn add_months(month: NaiveDate, n: u32) -> Option<NaiveDate> {
    month_start(month).checked_add_months(Months::new(n))
}

pub fn month_label(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}
