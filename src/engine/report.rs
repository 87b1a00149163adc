// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::Serialize;
use tracing::debug;

use super::aggregate::{Aggregation, DailyAggregation, aggregate, aggregate_by_day};
use super::expand::expand_all;
use super::filter::{DayRange, MonthRange, filter};
use super::rollup::{Rollup, rollup};
use super::{CashFlowEvent, DimensionOrder, GroupKey, PaymentKind};
use crate::error::{Result, SkippedRecord};
use crate::models::{PurchaseRecord, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ReportView {
    /// Month buckets crossed with zero or more dimensions.
    Monthly {
        keys: Vec<GroupKey>,
        order: DimensionOrder,
    },
    /// One row per dimension value with percentage shares.
    Breakdown { key: GroupKey, order: DimensionOrder },
    /// Installment amounts per month over the whole schedule; ignores the range.
    InstallmentSchedule,
    /// Purchase-day buckets, without installment expansion.
    Daily {
        range: DayRange,
        keys: Vec<GroupKey>,
        order: DimensionOrder,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReportQuery {
    pub view: ReportView,
    pub range: Option<MonthRange>,
    /// When false only single payments are reported.
    pub include_installments: bool,
}

impl ReportQuery {
    pub fn new(view: ReportView) -> Self {
        ReportQuery {
            view,
            range: None,
            include_installments: true,
        }
    }

    pub fn with_range(mut self, range: MonthRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn single_only(mut self) -> Self {
        self.include_installments = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReportOutput {
    Monthly(Aggregation),
    Breakdown(Rollup),
    InstallmentSchedule(Aggregation),
    Daily(DailyAggregation),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Record-set version the report was computed from.
    pub version: u64,
    pub output: ReportOutput,
    pub skipped: Vec<SkippedRecord>,
}

impl Report {
    /// True when there is nothing to chart; callers show an empty state.
    pub fn is_empty(&self) -> bool {
        match &self.output {
            ReportOutput::Monthly(a) | ReportOutput::InstallmentSchedule(a) => a.buckets.is_empty(),
            ReportOutput::Breakdown(r) => r.rows.is_empty(),
            ReportOutput::Daily(d) => d.buckets.is_empty(),
        }
    }
}

fn keep_kind(events: Vec<CashFlowEvent>, kind: PaymentKind) -> Vec<CashFlowEvent> {
    events.into_iter().filter(|e| e.payment_kind == kind).collect()
}

fn expanded_events(
    snapshot: &Snapshot,
    query: &ReportQuery,
    skipped: &mut Vec<SkippedRecord>,
) -> Result<Vec<CashFlowEvent>> {
    let expansion = expand_all(&snapshot.records)?;
    skipped.extend(expansion.skipped);
    if query.include_installments {
        Ok(expansion.events)
    } else {
        Ok(keep_kind(expansion.events, PaymentKind::Single))
    }
}

fn in_range(events: Vec<CashFlowEvent>, range: Option<&MonthRange>) -> Vec<CashFlowEvent> {
    match range {
        Some(range) => filter(events, range),
        None => events,
    }
}

/// Runs expand -> filter -> aggregate / rollup over one snapshot.
pub fn build_report(snapshot: &Snapshot, query: &ReportQuery) -> Result<Report> {
    let mut skipped = snapshot.rejected.clone();

    let output = match &query.view {
        ReportView::Monthly { keys, order } => {
            let events = expanded_events(snapshot, query, &mut skipped)?;
            let events = in_range(events, query.range.as_ref());
            ReportOutput::Monthly(aggregate(&events, keys, *order)?)
        }
        ReportView::Breakdown { key, order } => {
            let events = expanded_events(snapshot, query, &mut skipped)?;
            let events = in_range(events, query.range.as_ref());
            ReportOutput::Breakdown(rollup(&events, *key, *order)?)
        }
        ReportView::InstallmentSchedule => {
            let events = expanded_events(snapshot, query, &mut skipped)?;
            let events = keep_kind(events, PaymentKind::Installment);
            ReportOutput::InstallmentSchedule(aggregate(&events, &[], DimensionOrder::Alphabetic)?)
        }
        ReportView::Daily { range, keys, order } => {
            let records: Vec<PurchaseRecord> = snapshot
                .records
                .iter()
                .filter(|r| query.include_installments || r.installment_count == 0)
                .cloned()
                .collect();
            let daily = aggregate_by_day(&records, Some(range), keys, *order)?;
            skipped.extend(daily.skipped.iter().cloned());
            ReportOutput::Daily(daily)
        }
    };

    debug!(
        version = snapshot.version,
        records = snapshot.records.len(),
        skipped = skipped.len(),
        "report built"
    );
    Ok(Report {
        version: snapshot.version,
        output,
        skipped,
    })
}
