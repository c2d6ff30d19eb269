// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Single-entry commands for every ledger (till, floats, stock) and the
//! running-balance views over them.

use crate::ledger::{
    self, BalancedEntry, Domain, LedgerEntry, Subtype, TILL, cash_effect, contribution,
};
use crate::store::{NewEntry, all_entries, append_entry, delete_entry, entries_for};
use crate::utils::{apply_expense_rules, maybe_print_json, parse_decimal, parse_when, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle_cash(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    handle_ledger(conn, Domain::Cash, None, "amount", m)
}

pub fn handle_airtime(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    handle_ledger(conn, Domain::Airtime, Some("provider"), "amount", m)
}

pub fn handle_momo(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    handle_ledger(conn, Domain::MobileMoney, Some("provider"), "amount", m)
}

fn handle_ledger(
    conn: &Connection,
    domain: Domain,
    account_arg: Option<&str>,
    amount_arg: &str,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("ledger", sub)) | Some(("card", sub)) => {
            let account = account_of(sub, account_arg);
            show_ledger(conn, domain, &account, sub)
        }
        Some((name, sub)) => {
            record(conn, domain, account_arg, amount_arg, name, sub)?;
            Ok(())
        }
        None => Ok(()),
    }
}

fn account_of(sub: &clap::ArgMatches, account_arg: Option<&str>) -> String {
    account_arg
        .and_then(|a| sub.get_one::<String>(a))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| TILL.to_string())
}

/// Records one entry from a `<domain> <subtype>` command.
pub fn record(
    conn: &Connection,
    domain: Domain,
    account_arg: Option<&str>,
    amount_arg: &str,
    subtype_name: &str,
    sub: &clap::ArgMatches,
) -> Result<LedgerEntry> {
    let subtype = subtype_name.parse::<Subtype>()?;
    let account = account_of(sub, account_arg);
    let amount = parse_decimal(sub.get_one::<String>(amount_arg).unwrap())?;
    let date = parse_when(sub.get_one::<String>("date"))?;
    let note = sub
        .get_one::<String>("note")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let mut category = if subtype == Subtype::Expense {
        sub.get_one::<String>("category")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    } else {
        None
    };
    if subtype == Subtype::Expense && category.is_none() {
        if let Some(text) = &note {
            category = apply_expense_rules(conn, text)?;
        }
    }

    let entry = append_entry(
        conn,
        &NewEntry::new(date, domain, subtype, amount, account)
            .with_category(category)
            .with_note(note),
    )?;
    let balance = if domain == Domain::Cash {
        ledger::current_balance(&all_entries(conn)?, cash_effect)
    } else {
        ledger::current_balance(&entries_for(conn, domain, &entry.account_key)?, contribution)
    };
    println!(
        "Recorded {} {} of {} on {} at {} (balance {})",
        domain,
        subtype,
        entry.amount,
        entry.account_key,
        ledger::format_timestamp(&entry.date),
        balance
    );
    Ok(entry)
}

/// Running balance of one account, oldest first. The till view keeps every
/// entry with a cash effect, whichever ledger it was booked in.
pub fn ledger_rows(conn: &Connection, domain: Domain, account: &str) -> Result<Vec<BalancedEntry>> {
    if domain == Domain::Cash {
        let entries: Vec<LedgerEntry> = all_entries(conn)?
            .into_iter()
            .filter(|e| !cash_effect(e).is_zero())
            .collect();
        Ok(ledger::compute_running_balances(&entries, cash_effect))
    } else {
        let entries = entries_for(conn, domain, account)?;
        Ok(ledger::compute_running_balances(&entries, contribution))
    }
}

fn show_ledger(conn: &Connection, domain: Domain, account: &str, sub: &clap::ArgMatches) -> Result<()> {
    let mut rows = ledger_rows(conn, domain, account)?;
    if sub.get_flag("desc") {
        rows.reverse();
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let rule: fn(&LedgerEntry) -> rust_decimal::Decimal = if domain == Domain::Cash {
        cash_effect
    } else {
        contribution
    };
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.entry.id.to_string(),
                ledger::format_timestamp(&r.entry.date),
                format!("{} {}", r.entry.domain, r.entry.subtype),
                rule(&r.entry).to_string(),
                r.balance_after.to_string(),
                r.entry.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Date", "Type", "Amount", "Balance", "Note"], table)
    );
    Ok(())
}

pub fn handle_stock(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("break", sub)) => crate::commands::pos::break_packs(conn, sub),
        _ => handle_ledger(conn, Domain::Inventory, Some("item"), "qty", m),
    }
}

pub fn handle_entry(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let data = query_entries(conn, sub)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|e| {
                        vec![
                            e.id.to_string(),
                            ledger::format_timestamp(&e.date),
                            e.domain.to_string(),
                            e.subtype.to_string(),
                            e.amount.to_string(),
                            e.account_key.clone(),
                            e.category.clone().unwrap_or_default(),
                            e.note.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Date", "Ledger", "Type", "Amount", "Account", "Category", "Note"],
                        rows
                    )
                );
            }
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            let e = delete_entry(conn, id)?;
            println!(
                "Removed {} {} of {} on {}",
                e.domain, e.subtype, e.amount, e.account_key
            );
        }
        _ => {}
    }
    Ok(())
}

/// Newest first, optionally filtered by ledger and account.
pub fn query_entries(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<LedgerEntry>> {
    let domain = sub
        .get_one::<String>("domain")
        .map(|d| d.parse::<Domain>())
        .transpose()?;
    let account = sub.get_one::<String>("account").map(|s| s.trim());
    let mut data: Vec<LedgerEntry> = ledger::chronological(&all_entries(conn)?)
        .into_iter()
        .filter(|e| domain.is_none_or(|d| e.domain == d))
        .filter(|e| account.is_none_or(|a| e.account_key == a))
        .collect();
    data.reverse();
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    Ok(data)
}
