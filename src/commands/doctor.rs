// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{Domain, Subtype, parse_amount, parse_timestamp};
use crate::store::account_balance;
use crate::utils::{find_item, list_items, list_providers, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Ledger consistency findings as `(issue, detail)` pairs.
pub fn diagnose(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();

    // 1) Rows the reconciler would refuse to read
    let mut stmt = conn.prepare("SELECT id, date, domain, subtype, amount FROM entries ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let domain: String = r.get(2)?;
        let subtype: String = r.get(3)?;
        let amount: String = r.get(4)?;
        if parse_timestamp(&date).is_err() {
            rows.push(("bad_date".into(), format!("entry {}: '{}'", id, date)));
        }
        if parse_amount(&amount).is_err() {
            rows.push(("bad_amount".into(), format!("entry {}: '{}'", id, amount)));
        }
        match (domain.parse::<Domain>(), subtype.parse::<Subtype>()) {
            (Ok(d), Ok(s)) if !d.allows(s) => {
                rows.push(("bad_subtype".into(), format!("entry {}: {} {}", id, d, s)));
            }
            (Ok(_), Ok(_)) => {}
            _ => rows.push((
                "bad_type".into(),
                format!("entry {}: '{}' '{}'", id, domain, subtype),
            )),
        }
    }
    if !rows.is_empty() {
        // Balances below would fail on the same rows
        return Ok(rows);
    }

    // 2) Pack relations pointing nowhere
    for it in list_items(conn)? {
        if let Some(parent) = &it.parent_item {
            if find_item(conn, parent)?.is_none() {
                rows.push(("missing_pack".into(), format!("{} -> {}", it.name, parent)));
            }
        }
        let stock = account_balance(conn, Domain::Inventory, &it.name)?;
        if stock < Decimal::ZERO {
            rows.push(("negative_stock".into(), format!("{}: {}", it.name, stock)));
        }
    }

    // 3) Overdrawn floats
    for p in list_providers(conn)? {
        let float = account_balance(conn, p.kind, &p.name)?;
        if float < Decimal::ZERO {
            rows.push(("negative_float".into(), format!("{}: {}", p.name, float)));
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = diagnose(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        let data = rows.into_iter().map(|(a, b)| vec![a, b]).collect();
        println!("{}", pretty_table(&["Issue", "Detail"], data));
    }
    Ok(())
}
