// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::expand::{installment_count, purchase_date};
use super::filter::{DayRange, filter_days};
use super::{CashFlowEvent, DimensionOrder, GroupKey, PaymentKind, partition_by_dimension};
use crate::error::{EngineError, Result, SkippedRecord};
use crate::models::PurchaseRecord;

/// Running Single / Installment sums for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Split {
    pub single: Decimal,
    pub installment: Decimal,
}

impl Split {
    pub fn add(&mut self, kind: PaymentKind, amount: Decimal) {
        match kind {
            PaymentKind::Single => self.single += amount,
            PaymentKind::Installment => self.installment += amount,
        }
    }

    pub fn total(&self) -> Decimal {
        self.single + self.installment
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    pub month: NaiveDate,
    /// One value per requested group key, in key order.
    pub dimensions: Vec<String>,
    pub total: Decimal,
    pub single: Decimal,
    pub installment: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub buckets: Vec<MonthlyBucket>,
    /// Events dropped because a requested dimension was missing.
    pub excluded: Vec<CashFlowEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub month: NaiveDate,
    pub total: Decimal,
    pub single: Decimal,
    pub installment: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    pub day: NaiveDate,
    pub dimensions: Vec<String>,
    pub total: Decimal,
    pub single: Decimal,
    pub installment: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyAggregation {
    pub buckets: Vec<DailyBucket>,
    pub skipped: Vec<SkippedRecord>,
    /// Ids of records dropped because a requested dimension was missing.
    pub excluded_records: Vec<i64>,
}

/// Rejects events that expansion could never have produced.
pub(crate) fn check_event(e: &CashFlowEvent) -> Result<()> {
    if e.occurrence_month.day() != 1 {
        return Err(EngineError::Aggregation(format!(
            "event of record #{} dated {} is not month-aligned",
            e.source_record_id, e.occurrence_month
        )));
    }
    if e.sequence == 0 || e.sequence > e.of {
        return Err(EngineError::Aggregation(format!(
            "event of record #{} has installment {} of {}",
            e.source_record_id, e.sequence, e.of
        )));
    }
    if e.payment_kind == PaymentKind::Single && e.of != 1 {
        return Err(EngineError::Aggregation(format!(
            "single payment of record #{} spread over {} months",
            e.source_record_id, e.of
        )));
    }
    Ok(())
}

fn within_period(
    order: DimensionOrder,
    a: (&[String], Decimal),
    b: (&[String], Decimal),
) -> Ordering {
    match order {
        DimensionOrder::Alphabetic => a.0.cmp(b.0),
        DimensionOrder::TotalDescending => b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)),
    }
}

/// Sums events into `(month, dimensions)` buckets.
///
/// Buckets come out in ascending month order; inside a month they follow
/// `order`. With no keys there is one bucket per month.
pub fn aggregate(
    events: &[CashFlowEvent],
    keys: &[GroupKey],
    order: DimensionOrder,
) -> Result<Aggregation> {
    for e in events {
        check_event(e)?;
    }
    let (kept, excluded) = partition_by_dimension(events.to_vec(), keys);

    let mut map: BTreeMap<(NaiveDate, Vec<String>), Split> = BTreeMap::new();
    for e in &kept {
        let dims: Vec<String> = keys.iter().filter_map(|k| e.dimension(*k)).collect();
        map.entry((e.occurrence_month, dims))
            .or_default()
            .add(e.payment_kind, e.amount);
    }

    let mut buckets: Vec<MonthlyBucket> = map
        .into_iter()
        .map(|((month, dimensions), split)| MonthlyBucket {
            month,
            dimensions,
            total: split.total(),
            single: split.single,
            installment: split.installment,
        })
        .collect();
    buckets.sort_by(|a, b| {
        a.month.cmp(&b.month).then_with(|| {
            within_period(order, (&a.dimensions, a.total), (&b.dimensions, b.total))
        })
    });

    Ok(Aggregation { buckets, excluded })
}

/// Collapses dimensioned buckets into one total per month.
pub fn monthly_totals(buckets: &[MonthlyBucket]) -> Vec<MonthlyTotal> {
    let mut map: BTreeMap<NaiveDate, Split> = BTreeMap::new();
    for b in buckets {
        let split = map.entry(b.month).or_default();
        split.single += b.single;
        split.installment += b.installment;
    }
    map.into_iter()
        .map(|(month, split)| MonthlyTotal {
            month,
            total: split.total(),
            single: split.single,
            installment: split.installment,
        })
        .collect()
}

fn record_dimension(record: &PurchaseRecord, kind: PaymentKind, key: GroupKey) -> Option<String> {
    match key {
        GroupKey::Category => record.category.clone(),
        GroupKey::ExpenseType => record.expense_type.clone(),
        GroupKey::PaymentMethod => record.payment_method.clone(),
        GroupKey::PaymentKind => Some(kind.label().to_string()),
    }
}

/// Sums records by purchase day without expanding installments.
///
/// Each record contributes its `unit_value` once, on the day it was bought.
pub fn aggregate_by_day(
    records: &[PurchaseRecord],
    range: Option<&DayRange>,
    keys: &[GroupKey],
    order: DimensionOrder,
) -> Result<DailyAggregation> {
    let mut out = DailyAggregation::default();
    let mut dated = Vec::with_capacity(records.len());
    for record in records {
        let parsed = purchase_date(record).and_then(|d| installment_count(record).map(|n| (d, n)));
        match parsed {
            Ok((day, n)) => {
                let kind = if n == 0 {
                    PaymentKind::Single
                } else {
                    PaymentKind::Installment
                };
                dated.push((day, (record, kind)));
            }
            Err(err) => out.skipped.push(SkippedRecord::from_error(err)?),
        }
    }
    if let Some(range) = range {
        dated = filter_days(dated, range);
    }

    let mut map: BTreeMap<(NaiveDate, Vec<String>), Split> = BTreeMap::new();
    for (day, (record, kind)) in dated {
        let dims: Vec<Option<String>> = keys
            .iter()
            .map(|k| record_dimension(record, kind, *k))
            .collect();
        if dims.iter().any(Option::is_none) {
            out.excluded_records.push(record.id);
            continue;
        }
        map.entry((day, dims.into_iter().flatten().collect()))
            .or_default()
            .add(kind, record.unit_value);
    }

    out.buckets = map
        .into_iter()
        .map(|((day, dimensions), split)| DailyBucket {
            day,
            dimensions,
            total: split.total(),
            single: split.single,
            installment: split.installment,
        })
        .collect();
    out.buckets.sort_by(|a, b| {
        a.day.cmp(&b.day).then_with(|| {
            within_period(order, (&a.dimensions, a.total), (&b.dimensions, b.total))
        })
    });
    Ok(out)
}
