// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::EntryKind;
use crate::store::{RecordStore, SqliteStore};
use crate::utils::{id_for_category, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
pub struct TypeRow {
    pub id: i64,
    pub kind: String,
    pub name: String,
    pub category: String,
    pub description: String,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    match m.subcommand() {
        Some(("add", sub)) => {
            let kind: EntryKind = sub.get_one::<String>("kind").unwrap().parse()?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            let description = sub.get_one::<String>("description").map(|s| s.trim());
            let category_id = match sub.get_one::<String>("category") {
                Some(c) => Some(id_for_category(conn, kind, c.trim())?),
                None => None,
            };
            let id = store.add_type(kind, name, description, category_id)?;
            println!("Added type '{}' ({}) as #{}", name, kind, id);
        }
        Some(("list", sub)) => {
            let rows = list_rows(&store)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
                let data = rows
                    .into_iter()
                    .map(|r| vec![r.id.to_string(), r.kind, r.name, r.category, r.description])
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Kind", "Type", "Category", "Description"], data)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let current = store
                .list_types()?
                .into_iter()
                .find(|t| t.id == id)
                .with_context(|| format!("Type #{} not found", id))?;
            let name = sub
                .get_one::<String>("name")
                .map(|s| s.trim().to_string())
                .unwrap_or(current.name);
            let description = sub
                .get_one::<String>("description")
                .map(|s| s.trim().to_string())
                .or(current.description);
            let category_id = match sub.get_one::<String>("category") {
                Some(c) => Some(id_for_category(conn, current.kind, c.trim())?),
                None => current.category_id,
            };
            store.update_type(id, &name, description.as_deref(), category_id)?;
            println!("Updated type #{} -> '{}'", id, name);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let report = store.delete_type(id)?;
            println!(
                "Removed type #{} ({} expenses removed with it)",
                id, report.expenses
            );
        }
        _ => {}
    }
    Ok(())
}

pub fn list_rows(store: &SqliteStore<'_>) -> Result<Vec<TypeRow>> {
    let categories: HashMap<i64, String> = store
        .list_categories()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    Ok(store
        .list_types()?
        .into_iter()
        .map(|t| TypeRow {
            id: t.id,
            kind: t.kind.to_string(),
            category: t
                .category_id
                .and_then(|id| categories.get(&id).cloned())
                .unwrap_or_default(),
            name: t.name,
            description: t.description.unwrap_or_default(),
        })
        .collect())
}
