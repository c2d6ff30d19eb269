// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Domain;
use crate::store::{account_balance, entries_for};
use crate::utils::{find_item, item_by_name, list_items, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn opt_arg(sub: &clap::ArgMatches, id: &str) -> Result<Option<Decimal>> {
    sub.get_one::<String>(id)
        .map(|s| parse_decimal(s))
        .transpose()
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let price = parse_decimal(sub.get_one::<String>("price").unwrap())?;
    let cost = opt_arg(sub, "cost")?.unwrap_or(Decimal::ZERO);
    let low = opt_arg(sub, "low_stock")?;
    let parent = sub
        .get_one::<String>("parent")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let per = opt_arg(sub, "units_per_parent")?;

    if price < Decimal::ZERO || cost < Decimal::ZERO {
        return Err(anyhow!("Prices cannot be negative"));
    }
    if let Some(p) = &parent {
        if p == name {
            return Err(anyhow!("Item '{}' cannot be its own pack", name));
        }
        item_by_name(conn, p)?;
        match per {
            Some(n) if n > Decimal::ZERO && n.fract().is_zero() => {}
            _ => return Err(anyhow!("--units-per-parent must be a positive whole number")),
        }
    }

    conn.execute(
        "INSERT INTO items(name, unit_price, cost_price, parent_item, units_per_parent, low_stock_threshold)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            price.to_string(),
            cost.to_string(),
            parent,
            per.map(|d| d.to_string()),
            low.map(|d| d.to_string())
        ],
    )?;
    match &parent {
        Some(p) => println!(
            "Added item '{}' at {} ({} per '{}')",
            name,
            price,
            per.unwrap_or_default(),
            p
        ),
        None => println!("Added item '{}' at {}", name, price),
    }
    Ok(())
}

#[derive(Serialize)]
pub struct ItemRow {
    pub name: String,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub stock: Decimal,
    pub pack: String,
}

pub fn item_rows(conn: &Connection) -> Result<Vec<ItemRow>> {
    let mut data = Vec::new();
    for it in list_items(conn)? {
        let stock = account_balance(conn, Domain::Inventory, &it.name)?;
        let pack = match (&it.parent_item, it.units_per_parent) {
            (Some(p), Some(n)) => format!("{} x {}", n, p),
            _ => String::new(),
        };
        data.push(ItemRow {
            name: it.name,
            unit_price: it.unit_price,
            cost_price: it.cost_price,
            stock,
            pack,
        });
    }
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = item_rows(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    format!("{:.2}", r.unit_price),
                    format!("{:.2}", r.cost_price),
                    r.stock.to_string(),
                    r.pack.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Item", "Price", "Cost", "Stock", "Pack"], rows)
        );
    }
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    if find_item(conn, name)?.is_none() {
        return Err(anyhow!("Item '{}' not found", name));
    }
    // Entries reference items by name
    if !entries_for(conn, Domain::Inventory, name)?.is_empty() {
        return Err(anyhow!("Item '{}' has stock history and cannot be removed", name));
    }
    conn.execute(
        "UPDATE items SET parent_item=NULL, units_per_parent=NULL WHERE parent_item=?1",
        params![name],
    )?;
    conn.execute("DELETE FROM items WHERE name=?1", params![name])?;
    println!("Removed item '{}'", name);
    Ok(())
}
