// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{RecordStore, SqliteStore};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let description = sub.get_one::<String>("description").map(|s| s.trim());
            let id = store.add_payment_method(name, description)?;
            println!("Added payment method '{}' as #{}", name, id);
        }
        Some(("list", sub)) => {
            let methods = store.list_payment_methods()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &methods)? {
                let data = methods
                    .into_iter()
                    .map(|p| vec![p.id.to_string(), p.name, p.description.unwrap_or_default()])
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Payment method", "Description"], data)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let current = store
                .list_payment_methods()?
                .into_iter()
                .find(|p| p.id == id)
                .with_context(|| format!("Payment method #{} not found", id))?;
            let name = sub
                .get_one::<String>("name")
                .map(|s| s.trim().to_string())
                .unwrap_or(current.name);
            let description = sub
                .get_one::<String>("description")
                .map(|s| s.trim().to_string())
                .or(current.description);
            store.update_payment_method(id, &name, description.as_deref())?;
            println!("Updated payment method #{} -> '{}'", id, name);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let report = store.delete_payment_method(id)?;
            println!(
                "Removed payment method #{} ({} expenses removed with it)",
                id, report.expenses
            );
        }
        _ => {}
    }
    Ok(())
}
