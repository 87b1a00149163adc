// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Category, EntryKind};
use crate::store::{RecordStore, SqliteStore};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind: EntryKind = sub.get_one::<String>("kind").unwrap().parse()?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            let description = sub.get_one::<String>("description").map(|s| s.trim());
            let id = store.add_category(kind, name, description)?;
            println!("Added category '{}' ({}) as #{}", name, kind, id);
        }
        Some(("list", sub)) => {
            let kind = match sub.get_one::<String>("kind") {
                Some(k) => Some(k.parse::<EntryKind>()?),
                None => None,
            };
            let cats: Vec<Category> = store
                .list_categories()?
                .into_iter()
                .filter(|c| kind.is_none_or(|k| c.kind == k))
                .collect();
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &cats)? {
                let data = cats
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            c.kind.to_string(),
                            c.name,
                            c.description.unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Kind", "Category", "Description"], data)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let current = store
                .list_categories()?
                .into_iter()
                .find(|c| c.id == id)
                .with_context(|| format!("Category #{} not found", id))?;
            let name = sub
                .get_one::<String>("name")
                .map(|s| s.trim().to_string())
                .unwrap_or(current.name);
            let description = sub
                .get_one::<String>("description")
                .map(|s| s.trim().to_string())
                .or(current.description);
            store.update_category(id, &name, description.as_deref())?;
            println!("Updated category #{} -> '{}'", id, name);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let report = store.delete_category(id)?;
            println!(
                "Removed category #{} ({} types, {} expenses removed with it)",
                id, report.types, report.expenses
            );
        }
        _ => {}
    }
    Ok(())
}
