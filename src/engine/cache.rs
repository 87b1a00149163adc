// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use tracing::debug;

use super::report::{Report, ReportQuery, build_report};
use crate::error::Result;
use crate::models::Snapshot;

/// Memoized reports for one record-set version.
///
/// Entries are dropped as soon as a snapshot with a different version is seen,
/// so any store mutation invalidates everything computed before it.
#[derive(Debug, Default)]
pub struct ReportCache {
    version: Option<u64>,
    entries: HashMap<ReportQuery, Report>,
    hits: u64,
    misses: u64,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, snapshot: &Snapshot, query: &ReportQuery) -> Result<Report> {
        if self.version != Some(snapshot.version) {
            if !self.entries.is_empty() {
                debug!(
                    old = ?self.version,
                    new = snapshot.version,
                    dropped = self.entries.len(),
                    "record set changed, clearing report cache"
                );
            }
            self.entries.clear();
            self.version = Some(snapshot.version);
        }
        if let Some(report) = self.entries.get(query) {
            self.hits += 1;
            debug!(version = snapshot.version, "report cache hit");
            return Ok(report.clone());
        }
        self.misses += 1;
        let report = build_report(snapshot, query)?;
        self.entries.insert(query.clone(), report.clone());
        Ok(report)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
