// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{Domain, Subtype, TILL, parse_amount, parse_timestamp};
use crate::store::{NewEntry, append_entry};
use crate::utils::apply_expense_rules;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::Connection;
use tracing::info;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("entries", sub)) => {
            let path = sub.get_one::<String>("path").unwrap().trim();
            let n = import_entries(conn, path)?;
            println!("Imported {} entries from {}", n, path);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Loads `date,domain,subtype,amount,account,category,note` rows. Rows are
/// appended in file order through the normal validation; one bad row rolls
/// back the whole file.
pub fn import_entries(conn: &mut Connection, path: &str) -> Result<usize> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let tx = conn.transaction()?;
    let mut count = 0usize;
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let rec = result.with_context(|| format!("line {}", line))?;
        let date_raw = rec.get(0).context("date missing")?;
        let domain_raw = rec.get(1).context("domain missing")?;
        let subtype_raw = rec.get(2).context("subtype missing")?;
        let amount_raw = rec.get(3).context("amount missing")?;

        let date = parse_timestamp(date_raw).with_context(|| format!("line {}", line))?;
        let domain = domain_raw
            .parse::<Domain>()
            .with_context(|| format!("line {}", line))?;
        let subtype = subtype_raw
            .parse::<Subtype>()
            .with_context(|| format!("line {}", line))?;
        let amount = parse_amount(amount_raw).with_context(|| format!("line {}", line))?;
        let account = non_empty(rec.get(4)).unwrap_or_else(|| TILL.to_string());
        let note = non_empty(rec.get(6));
        let mut category = non_empty(rec.get(5));
        if subtype == Subtype::Expense && category.is_none() {
            if let Some(text) = &note {
                category = apply_expense_rules(&tx, text)?;
            }
        }

        append_entry(
            &tx,
            &NewEntry::new(date, domain, subtype, amount, account)
                .with_category(category)
                .with_note(note),
        )
        .with_context(|| format!("line {}", line))?;
        count += 1;
    }
    tx.commit()?;
    info!(path, count, "imported entries");
    Ok(count)
}
