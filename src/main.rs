// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use jokermarket::{cli, commands, db};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("item", sub)) => commands::items::handle(&conn, sub)?,
        Some(("provider", sub)) => commands::providers::handle(&conn, sub)?,
        Some(("cash", sub)) => commands::entries::handle_cash(&conn, sub)?,
        Some(("airtime", sub)) => commands::entries::handle_airtime(&conn, sub)?,
        Some(("momo", sub)) => commands::entries::handle_momo(&conn, sub)?,
        Some(("stock", sub)) => commands::entries::handle_stock(&mut conn, sub)?,
        Some(("pos", sub)) => commands::pos::handle(&mut conn, sub)?,
        Some(("entry", sub)) => commands::entries::handle_entry(&conn, sub)?,
        Some(("closing", sub)) => commands::closing::handle(&mut conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("rules", sub)) => commands::rules::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
