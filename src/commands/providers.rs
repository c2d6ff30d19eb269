// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Domain;
use crate::store::{account_balance, entries_for};
use crate::utils::{list_providers, maybe_print_json, parse_decimal, pretty_table, provider_by_name};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let kind = sub.get_one::<String>("kind").unwrap().parse::<Domain>()?;
            let low = sub
                .get_one::<String>("low_float")
                .map(|s| parse_decimal(s))
                .transpose()?;
            conn.execute(
                "INSERT INTO providers(name, kind, low_float_threshold) VALUES (?1, ?2, ?3)",
                params![name, kind.as_str(), low.map(|d| d.to_string())],
            )?;
            println!("Added {} provider '{}'", kind, name);
        }
        Some(("list", sub)) => {
            let data = provider_rows(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        vec![
                            r.name.clone(),
                            r.kind.to_string(),
                            format!("{:.2}", r.float),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Provider", "Kind", "Float"], rows));
            }
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let p = provider_by_name(conn, name)?;
            if !entries_for(conn, p.kind, &p.name)?.is_empty() {
                return Err(anyhow!(
                    "Provider '{}' has float history and cannot be removed",
                    name
                ));
            }
            conn.execute("DELETE FROM providers WHERE id=?1", params![p.id])?;
            println!("Removed provider '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct ProviderRow {
    pub name: String,
    pub kind: Domain,
    pub float: Decimal,
}

pub fn provider_rows(conn: &Connection) -> Result<Vec<ProviderRow>> {
    let mut data = Vec::new();
    for p in list_providers(conn)? {
        let float = account_balance(conn, p.kind, &p.name)?;
        data.push(ProviderRow {
            name: p.name,
            kind: p.kind,
            float,
        });
    }
    Ok(data)
}
