// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to `{data_dir}/splitpay.log`.
///
/// `RUST_LOG` wins over `level` when set. Stdout stays reserved for command
/// output (tables, JSON).
pub fn init_logging(data_dir: &Path, level: &str) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let log_path = data_dir.join("splitpay.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let default_filter = format!("splitpay={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    tracing::debug!("logging initialized (log_path={})", log_path.display());
    Ok(())
}
