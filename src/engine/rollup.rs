// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::aggregate::{Split, check_event};
use super::{CashFlowEvent, DimensionOrder, GroupKey, partition_by_dimension};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupRow {
    pub value: String,
    pub single: Decimal,
    pub installment: Decimal,
    pub total: Decimal,
    /// Share of the grand total in percent; `None` when the grand total is zero.
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rollup {
    pub key: GroupKey,
    pub rows: Vec<RollupRow>,
    pub grand_total: Decimal,
    pub grand_single: Decimal,
    pub grand_installment: Decimal,
    /// Sum over every event passed in, before the missing-dimension exclusion.
    pub total_before_exclusion: Decimal,
    pub excluded: Vec<CashFlowEvent>,
}

impl Rollup {
    pub fn excluded_total(&self) -> Decimal {
        self.excluded.iter().map(|e| e.amount).sum()
    }
}

/// Breaks events down by one dimension with Single / Installment subtotals
/// and each value's share of the grand total.
pub fn rollup(events: &[CashFlowEvent], key: GroupKey, order: DimensionOrder) -> Result<Rollup> {
    for e in events {
        check_event(e)?;
    }
    let total_before_exclusion: Decimal = events.iter().map(|e| e.amount).sum();
    let (kept, excluded) = partition_by_dimension(events.to_vec(), &[key]);

    let mut map: BTreeMap<String, Split> = BTreeMap::new();
    for e in &kept {
        if let Some(value) = e.dimension(key) {
            map.entry(value).or_default().add(e.payment_kind, e.amount);
        }
    }

    let grand = map.values().fold(Split::default(), |mut acc, s| {
        acc.single += s.single;
        acc.installment += s.installment;
        acc
    });
    let grand_total = grand.total();
    let hundred = Decimal::ONE_HUNDRED;

    let mut rows: Vec<RollupRow> = map
        .into_iter()
        .map(|(value, split)| {
            let total = split.total();
            let percentage = if grand_total.is_zero() {
                None
            } else {
                Some(total / grand_total * hundred)
            };
            RollupRow {
                value,
                single: split.single,
                installment: split.installment,
                total,
                percentage,
            }
        })
        .collect();
    if order == DimensionOrder::TotalDescending {
        rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.value.cmp(&b.value)));
    }

    Ok(Rollup {
        key,
        rows,
        grand_total,
        grand_single: grand.single,
        grand_installment: grand.installment,
        total_before_exclusion,
        excluded,
    })
}
