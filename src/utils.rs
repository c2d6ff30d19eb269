// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, Domain};
use crate::models::{Item, Provider};
use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, NaiveDateTime};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

pub const SETTING_CURRENCY: &str = "currency";
pub const SETTING_LOW_FLOAT: &str = "low_float_threshold";
pub const SETTING_LOW_STOCK: &str = "low_stock_threshold";

pub const KNOWN_SETTINGS: [(&str, &str); 3] = [
    (SETTING_CURRENCY, "XAF"),
    (SETTING_LOW_FLOAT, "10000"),
    (SETTING_LOW_STOCK, "5"),
];

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Timestamp from an optional CLI value; missing means now.
pub fn parse_when(raw: Option<&String>) -> Result<NaiveDateTime> {
    match raw {
        Some(s) => Ok(ledger::parse_timestamp(s)?),
        None => Ok(now()),
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    Ok(ledger::parse_amount(s)?)
}

pub fn end_of_day(d: NaiveDate) -> Result<NaiveDateTime> {
    d.and_hms_opt(23, 59, 59)
        .ok_or_else(|| anyhow!("Invalid day {}", d))
}

pub fn month_bounds(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}'", month))?;
    let next = first
        .checked_add_months(chrono::Months::new(1))
        .ok_or_else(|| anyhow!("Invalid month '{}'", month))?;
    let last = next
        .pred_opt()
        .ok_or_else(|| anyhow!("Invalid month '{}'", month))?;
    Ok((first, last))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

fn opt_decimal(raw: Option<String>, what: &str) -> Result<Option<Decimal>> {
    raw.map(|s| {
        s.parse::<Decimal>()
            .with_context(|| format!("Invalid {} '{}'", what, s))
    })
    .transpose()
}

fn req_decimal(raw: String, what: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}'", what, raw))
}

pub fn find_item(conn: &Connection, name: &str) -> Result<Option<Item>> {
    let row = conn
        .query_row(
            "SELECT id, name, unit_price, cost_price, parent_item, units_per_parent, low_stock_threshold
             FROM items WHERE name=?1",
            params![name],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<String>>(4)?,
                    r.get::<_, Option<String>>(5)?,
                    r.get::<_, Option<String>>(6)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, price, cost, parent, per, low)) = row else {
        return Ok(None);
    };
    Ok(Some(Item {
        id,
        unit_price: req_decimal(price, "unit price")?,
        cost_price: req_decimal(cost, "cost price")?,
        parent_item: parent,
        units_per_parent: opt_decimal(per, "units per parent")?,
        low_stock_threshold: opt_decimal(low, "low stock threshold")?,
        name,
    }))
}

pub fn item_by_name(conn: &Connection, name: &str) -> Result<Item> {
    find_item(conn, name)?.ok_or_else(|| anyhow!("Item '{}' not found", name))
}

pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT name FROM items ORDER BY name")?;
    let names = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    names.iter().map(|n| item_by_name(conn, n)).collect()
}

/// Items that declare `parent` as their pack.
pub fn children_of(conn: &Connection, parent: &str) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare("SELECT name FROM items WHERE parent_item=?1 ORDER BY id")?;
    let names = stmt
        .query_map(params![parent], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    names.iter().map(|n| item_by_name(conn, n)).collect()
}

pub fn provider_by_name(conn: &Connection, name: &str) -> Result<Provider> {
    let (id, name, kind, low): (i64, String, String, Option<String>) = conn
        .query_row(
            "SELECT id, name, kind, low_float_threshold FROM providers WHERE name=?1",
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .with_context(|| format!("Provider '{}' not found", name))?;
    Ok(Provider {
        id,
        name,
        kind: kind.parse::<Domain>()?,
        low_float_threshold: opt_decimal(low, "low float threshold")?,
    })
}

pub fn list_providers(conn: &Connection) -> Result<Vec<Provider>> {
    let mut stmt = conn.prepare("SELECT name FROM providers ORDER BY kind, name")?;
    let names = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    names.iter().map(|n| provider_by_name(conn, n)).collect()
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<String> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    if let Some(v) = v {
        return Ok(v);
    }
    KNOWN_SETTINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, d)| d.to_string())
        .ok_or_else(|| anyhow!("Unknown setting '{}'", key))
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KNOWN_SETTINGS.iter().any(|(k, _)| *k == key) {
        return Err(anyhow!(
            "Unknown setting '{}' (expected one of: {})",
            key,
            KNOWN_SETTINGS
                .iter()
                .map(|(k, _)| *k)
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if key != SETTING_CURRENCY {
        parse_decimal(value).with_context(|| format!("Setting '{}' must be a number", key))?;
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_currency(conn: &Connection) -> Result<String> {
    get_setting(conn, SETTING_CURRENCY)
}

pub fn get_threshold(conn: &Connection, key: &str) -> Result<Decimal> {
    let raw = get_setting(conn, key)?;
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid value '{}' for setting {}", raw, key))
}

static RULE_CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Drops compiled rule patterns. Called whenever the rules table changes.
pub fn invalidate_rule_cache() {
    rule_cache().clear();
}

fn rule_cache() -> MutexGuard<'static, HashMap<String, Regex>> {
    RULE_CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Category of the newest expense rule matching `text`.
pub fn apply_expense_rules(conn: &Connection, text: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT pattern, category FROM rules ORDER BY id DESC")?;
    let rules = stmt
        .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut cache = rule_cache();
    for (pat, cat) in rules {
        if !cache.contains_key(&pat) {
            match Regex::new(&pat) {
                Ok(re) => {
                    cache.insert(pat.clone(), re);
                }
                Err(err) => {
                    warn!(pattern = %pat, %err, "skipping invalid expense rule");
                    continue;
                }
            }
        }
        if cache.get(&pat).is_some_and(|re| re.is_match(text)) {
            return Ok(Some(cat));
        }
    }
    Ok(None)
}
