// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Engine error types

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the cash-flow engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A purchase record that cannot be expanded. Recovered per record.
    #[error("Invalid record #{id}: {reason}")]
    InvalidRecord { id: i64, reason: String },

    /// An expansion invariant broken past validation. Not recoverable.
    #[error("Aggregation invariant violated: {0}")]
    Aggregation(String),
}

impl EngineError {
    pub fn invalid(id: i64, reason: impl Into<String>) -> Self {
        EngineError::InvalidRecord {
            id,
            reason: reason.into(),
        }
    }
}

/// A record left out of a report, with the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub id: i64,
    pub reason: String,
}

impl SkippedRecord {
    /// Converts a recoverable error into a skip entry; logic errors are handed back.
    pub fn from_error(err: EngineError) -> std::result::Result<Self, EngineError> {
        match err {
            EngineError::InvalidRecord { id, reason } => Ok(SkippedRecord { id, reason }),
            other => Err(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
