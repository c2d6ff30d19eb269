// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::ExpenseRule;
use crate::utils::{invalidate_rule_cache, pretty_table};
use anyhow::{Result, anyhow};
use regex::Regex;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let pattern = sub.get_one::<String>("pattern").unwrap().trim();
            Regex::new(pattern)
                .map_err(|err| anyhow!("Invalid regex pattern '{}': {}", pattern, err))?;
            let category = sub.get_one::<String>("category").unwrap().trim();
            if category.is_empty() {
                return Err(anyhow!("Category cannot be empty"));
            }
            conn.execute(
                "INSERT INTO rules(pattern, category) VALUES (?1, ?2)",
                params![pattern, category],
            )?;
            invalidate_rule_cache();
            println!("Added rule: /{}/ -> {}", pattern, category);
        }
        Some(("list", _)) => {
            let data: Vec<Vec<String>> = list_rules(conn)?
                .into_iter()
                .map(|r| vec![r.id.to_string(), r.pattern, r.category])
                .collect();
            println!("{}", pretty_table(&["ID", "Pattern", "Category"], data));
        }
        Some(("rm", sub)) => {
            let raw = sub.get_one::<String>("id").unwrap();
            let id = raw.trim().parse::<i64>()?;
            if conn.execute("DELETE FROM rules WHERE id=?1", params![id])? == 0 {
                return Err(anyhow!("Rule {} not found", id));
            }
            invalidate_rule_cache();
            println!("Removed rule {}", id);
        }
        _ => {}
    }
    Ok(())
}

pub fn list_rules(conn: &Connection) -> Result<Vec<ExpenseRule>> {
    let mut stmt = conn.prepare("SELECT id, pattern, category FROM rules ORDER BY id DESC")?;
    let rows = stmt.query_map([], |r| {
        Ok(ExpenseRule {
            id: r.get(0)?,
            pattern: r.get(1)?,
            category: r.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
