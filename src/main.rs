// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use splitpay::store::SqliteStore;
use splitpay::{cli, commands, db, logging};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "warn" };
    logging::init_logging(&db::data_dir()?, level)?;

    let conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            if sub.get_flag("seed") {
                let added = SqliteStore::new(&conn).seed_defaults()?;
                println!("Seeded {} default records", added);
            }
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("type", sub)) => commands::types::handle(&conn, sub)?,
        Some(("payment", sub)) => commands::payments::handle(&conn, sub)?,
        Some(("expense", sub)) => commands::expenses::handle(&conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        Some(("config", sub)) => commands::settings::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
