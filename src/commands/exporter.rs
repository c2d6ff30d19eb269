// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{chronological, format_timestamp};
use crate::store::all_entries;
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;

pub const CSV_HEADER: [&str; 7] = [
    "date", "domain", "subtype", "amount", "account", "category", "note",
];

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("entries", sub)) => export_entries(conn, sub),
        _ => Ok(()),
    }
}

fn export_entries(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
    }

    let entries = chronological(&all_entries(conn)?);
    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record(CSV_HEADER)?;
        for e in &entries {
            wtr.write_record([
                format_timestamp(&e.date),
                e.domain.to_string(),
                e.subtype.to_string(),
                e.amount.to_string(),
                e.account_key.clone(),
                e.category.clone().unwrap_or_default(),
                e.note.clone().unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
    } else {
        let items: Vec<_> = entries
            .iter()
            .map(|e| {
                json!({
                    "date": format_timestamp(&e.date),
                    "domain": e.domain,
                    "subtype": e.subtype,
                    "amount": e.amount.to_string(),
                    "account": e.account_key,
                    "category": e.category,
                    "note": e.note
                })
            })
            .collect();
        std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
    }
    println!("Exported {} entries to {}", entries.len(), out);
    Ok(())
}
