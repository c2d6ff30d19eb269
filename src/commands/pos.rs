// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{break_pack, receive_item, sell_item};
use crate::utils::{get_currency, parse_decimal, parse_when};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("sell", sub)) => sell(conn, sub)?,
        Some(("receive", sub)) => receive(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn sell(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let item = sub.get_one::<String>("item").unwrap().trim();
    let qty = parse_decimal(sub.get_one::<String>("qty").unwrap())?;
    let amount = sub
        .get_one::<String>("amount")
        .map(|s| parse_decimal(s))
        .transpose()?;
    let date = parse_when(sub.get_one::<String>("date"))?;
    let (stock, cash) = sell_item(conn, item, qty, amount, date)?;
    println!(
        "Sold {} x {} for {} {}",
        stock.amount,
        stock.account_key,
        cash.amount,
        get_currency(conn)?
    );
    Ok(())
}

fn receive(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let item = sub.get_one::<String>("item").unwrap().trim();
    let qty = parse_decimal(sub.get_one::<String>("qty").unwrap())?;
    let cost = sub
        .get_one::<String>("cost")
        .map(|s| parse_decimal(s))
        .transpose()?;
    let date = parse_when(sub.get_one::<String>("date"))?;
    let (stock, cash) = receive_item(conn, item, qty, cost, date)?;
    println!(
        "Received {} x {} for {} {}",
        stock.amount,
        stock.account_key,
        cash.amount,
        get_currency(conn)?
    );
    Ok(())
}

pub fn break_packs(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let parent = sub.get_one::<String>("parent").unwrap().trim();
    let into = sub.get_one::<String>("into").map(|s| s.trim());
    let packs = parse_decimal(sub.get_one::<String>("packs").unwrap())?;
    let date = parse_when(sub.get_one::<String>("date"))?;
    let done = break_pack(conn, parent, into, packs, date)?;
    println!(
        "Opened {} x {} into {} x {} (stock now {} / {})",
        done.packs, done.parent, done.units, done.child, done.parent_stock, done.child_stock
    );
    Ok(())
}
