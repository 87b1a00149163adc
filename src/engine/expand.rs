// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use tracing::debug;

use super::{CashFlowEvent, PaymentKind, add_months, month_start};
use crate::error::{EngineError, Result, SkippedRecord};
use crate::models::PurchaseRecord;

/// Events produced from a batch of records, plus the records that were rejected.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub events: Vec<CashFlowEvent>,
    pub skipped: Vec<SkippedRecord>,
}

pub(crate) fn purchase_date(record: &PurchaseRecord) -> Result<NaiveDate> {
    let raw = record.purchase_date.trim();
    if raw.is_empty() {
        return Err(EngineError::invalid(record.id, "missing purchase date"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        EngineError::invalid(
            record.id,
            format!("unparseable purchase date '{}', expected YYYY-MM-DD", raw),
        )
    })
}

/// Longest installment plan a record may carry (50 years of monthly payments).
pub const MAX_INSTALLMENTS: u32 = 600;

pub(crate) fn installment_count(record: &PurchaseRecord) -> Result<u32> {
    if record.installment_count < 0 {
        return Err(EngineError::invalid(
            record.id,
            format!("negative installment count {}", record.installment_count),
        ));
    }
    match u32::try_from(record.installment_count) {
        Ok(n) if n <= MAX_INSTALLMENTS => Ok(n),
        _ => Err(EngineError::invalid(
            record.id,
            format!(
                "installment count {} exceeds the maximum of {}",
                record.installment_count, MAX_INSTALLMENTS
            ),
        )),
    }
}

/// Turns one purchase into its dated cash-flow events.
///
/// A single payment lands in the purchase month. An N-installment purchase
/// yields N events of `unit_value` in consecutive months, the first one in
/// the purchase month.
pub fn expand(record: &PurchaseRecord) -> Result<Vec<CashFlowEvent>> {
    let date = purchase_date(record)?;
    let count = installment_count(record)?;
    let anchor = month_start(date);

    let event = |month: NaiveDate, kind: PaymentKind, sequence: u32, of: u32| CashFlowEvent {
        source_record_id: record.id,
        occurrence_month: month,
        amount: record.unit_value,
        payment_kind: kind,
        sequence,
        of,
        category: record.category.clone(),
        expense_type: record.expense_type.clone(),
        payment_method: record.payment_method.clone(),
    };

    if count == 0 {
        return Ok(vec![event(anchor, PaymentKind::Single, 1, 1)]);
    }

    // the whole schedule must fit the calendar before anything is allocated
    if add_months(anchor, count - 1).is_none() {
        return Err(EngineError::invalid(
            record.id,
            format!("last of {} installments falls outside the calendar", count),
        ));
    }
    let mut events = Vec::with_capacity(count as usize);
    for i in 0..count {
        let month = add_months(anchor, i).ok_or_else(|| {
            EngineError::invalid(
                record.id,
                format!("installment {} of {} falls outside the calendar", i + 1, count),
            )
        })?;
        events.push(event(month, PaymentKind::Installment, i + 1, count));
    }
    Ok(events)
}

/// Month of the last installment, derived from the purchase date and count.
///
/// Single payments return the purchase month.
pub fn final_installment_month(record: &PurchaseRecord) -> Result<NaiveDate> {
    let anchor = month_start(purchase_date(record)?);
    let count = installment_count(record)?;
    add_months(anchor, count.saturating_sub(1)).ok_or_else(|| {
        EngineError::invalid(record.id, "final installment falls outside the calendar")
    })
}

/// Expands every record, collecting rejected ones instead of failing the batch.
pub fn expand_all(records: &[PurchaseRecord]) -> Result<Expansion> {
    let mut out = Expansion::default();
    for record in records {
        match expand(record) {
            Ok(mut events) => out.events.append(&mut events),
            Err(err) => {
                let skipped = SkippedRecord::from_error(err)?;
                debug!(id = skipped.id, reason = %skipped.reason, "skipping record");
                out.skipped.push(skipped);
            }
        }
    }
    Ok(out)
}
