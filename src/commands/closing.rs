// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::format_timestamp;
use crate::store::{close_cash, delete_closing, list_closings};
use crate::utils::{fmt_money, get_currency, maybe_print_json, parse_decimal, parse_when, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let counted = parse_decimal(sub.get_one::<String>("counted").unwrap())?;
            let date = parse_when(sub.get_one::<String>("date"))?;
            let note = sub
                .get_one::<String>("note")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            let c = close_cash(conn, date, counted, note)?;
            let ccy = get_currency(conn)?;
            println!(
                "Closed till at {}: expected {}, counted {}, variance {}",
                format_timestamp(&c.date),
                fmt_money(&c.theoretical, &ccy),
                fmt_money(&c.counted, &ccy),
                fmt_money(&c.variance, &ccy)
            );
        }
        Some(("list", sub)) => {
            let data = list_closings(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .rev()
                    .map(|c| {
                        vec![
                            c.id.to_string(),
                            format_timestamp(&c.date),
                            format!("{:.2}", c.opening),
                            format!("{:.2}", c.inflow),
                            format!("{:.2}", c.outflow),
                            format!("{:.2}", c.theoretical),
                            format!("{:.2}", c.counted),
                            format!("{:.2}", c.variance),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Date", "Opening", "In", "Out", "Expected", "Counted", "Variance"],
                        rows
                    )
                );
            }
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            delete_closing(conn, id)?;
            println!("Removed closing {}", id);
        }
        _ => {}
    }
    Ok(())
}
