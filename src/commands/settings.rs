// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{DEFAULT_WINDOW_MONTHS, get_setting, set_setting};
use anyhow::{Result, bail};
use rusqlite::Connection;

const KNOWN_KEYS: &[&str] = &["window_months"];

/// Validates and stores one user-facing setting.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    match key {
        "window_months" => {
            let months: u32 = value
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("window_months must be a positive integer"))?;
            if months == 0 {
                bail!("window_months must be at least 1");
            }
            set_setting(conn, key, &months.to_string())
        }
        _ => bail!("Unknown setting '{}' (known: {})", key, KNOWN_KEYS.join(", ")),
    }
}

pub fn get(conn: &Connection, key: &str) -> Result<String> {
    match key {
        "window_months" => Ok(get_setting(conn, key)?
            .unwrap_or_else(|| DEFAULT_WINDOW_MONTHS.to_string())),
        _ => bail!("Unknown setting '{}' (known: {})", key, KNOWN_KEYS.join(", ")),
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            println!("{}", get(conn, key)?);
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap();
            let value = sub.get_one::<String>("value").unwrap();
            set(conn, key, value)?;
            println!("{} = {}", key, value.trim());
        }
        _ => {}
    }
    Ok(())
}
