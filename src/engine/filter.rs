// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::Serialize;

use super::{CashFlowEvent, month_start};

/// An inclusive window of calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MonthRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthRange {
    /// Both ends are truncated to the first of their month.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let (start, end) = (month_start(start), month_start(end));
        if start > end {
            return Err(anyhow!(
                "Range start {} is after range end {}",
                start.format("%Y-%m"),
                end.format("%Y-%m")
            ));
        }
        Ok(MonthRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, month: NaiveDate) -> bool {
        let m = month_start(month);
        self.start <= m && m <= self.end
    }
}

/// An inclusive window of days, for the by-day view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(anyhow!("Range start {} is after range end {}", start, end));
        }
        Ok(DayRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Keeps events whose month lies inside `range`.
///
/// Must run on expanded events: a purchase made before the window can still
/// have installments inside it.
pub fn filter(events: Vec<CashFlowEvent>, range: &MonthRange) -> Vec<CashFlowEvent> {
    events
        .into_iter()
        .filter(|e| range.contains(e.occurrence_month))
        .collect()
}

/// Keeps `(day, item)` pairs whose day lies inside `range`.
pub fn filter_days<T>(items: Vec<(NaiveDate, T)>, range: &DayRange) -> Vec<(NaiveDate, T)> {
    items
        .into_iter()
        .filter(|(day, _)| range.contains(*day))
        .collect()
}
