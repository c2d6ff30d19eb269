// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{items::item_rows, providers::provider_rows};
use crate::ledger::{self, Domain, PeriodSummary, Subtype, cash_effect};
use crate::store::{all_entries, till_balance};
use crate::utils::{
    SETTING_LOW_FLOAT, SETTING_LOW_STOCK, end_of_day, get_threshold, list_items, list_providers,
    maybe_print_json, month_bounds, parse_date, pretty_table,
};
use anyhow::{Result, anyhow};
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balances", sub)) => balances(conn, sub)?,
        Some(("daily", sub)) => daily(conn, sub)?,
        Some(("monthly", sub)) => monthly(conn, sub)?,
        Some(("expenses", sub)) => expenses(conn, sub)?,
        Some(("alerts", sub)) => alerts(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn print_or_json<T: Serialize>(
    sub: &clap::ArgMatches,
    data: &T,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> Result<()> {
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), data)? {
        println!("{}", pretty_table(headers, rows));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BalanceRow {
    pub ledger: Domain,
    pub account: String,
    pub balance: Decimal,
}

pub fn balance_rows(conn: &Connection) -> Result<Vec<BalanceRow>> {
    let mut data = vec![BalanceRow {
        ledger: Domain::Cash,
        account: ledger::TILL.to_string(),
        balance: till_balance(conn)?,
    }];
    for p in provider_rows(conn)? {
        data.push(BalanceRow {
            ledger: p.kind,
            account: p.name,
            balance: p.float,
        });
    }
    for it in item_rows(conn)? {
        data.push(BalanceRow {
            ledger: Domain::Inventory,
            account: it.name,
            balance: it.stock,
        });
    }
    Ok(data)
}

fn balances(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = balance_rows(conn)?;
    let rows = data
        .iter()
        .map(|r| vec![r.ledger.to_string(), r.account.clone(), r.balance.to_string()])
        .collect();
    print_or_json(sub, &data, &["Ledger", "Account", "Balance"], rows)
}

/// Till summary for `[first, last]`: opening is everything booked before the
/// first day.
pub fn period_report(conn: &Connection, first: NaiveDate, last: NaiveDate) -> Result<PeriodSummary> {
    let start = first
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid day {}", first))?;
    let entries = all_entries(conn)?;
    Ok(ledger::period_summary(
        &entries,
        cash_effect,
        Some(start - Duration::seconds(1)),
        end_of_day(last)?,
    ))
}

fn summary_cells(label: String, s: &PeriodSummary) -> Vec<String> {
    vec![
        label,
        format!("{:.2}", s.opening),
        format!("{:.2}", s.inflow),
        format!("{:.2}", s.outflow),
        format!("{:.2}", s.closing),
    ]
}

fn daily(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let day = parse_date(sub.get_one::<String>("date").unwrap())?;
    let s = period_report(conn, day, day)?;
    let rows = vec![summary_cells(day.to_string(), &s)];
    print_or_json(sub, &s, &["Day", "Opening", "In", "Out", "Closing"], rows)
}

#[derive(Debug, Serialize)]
pub struct DayRow {
    pub day: NaiveDate,
    #[serde(flatten)]
    pub summary: PeriodSummary,
}

pub fn monthly_rows(conn: &Connection, month: &str) -> Result<Vec<DayRow>> {
    let (first, last) = month_bounds(month)?;
    let mut data = Vec::new();
    for day in first.iter_days().take_while(|d| *d <= last) {
        data.push(DayRow {
            day,
            summary: period_report(conn, day, day)?,
        });
    }
    Ok(data)
}

fn monthly(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month").unwrap();
    let data = monthly_rows(conn, month)?;
    let (first, last) = month_bounds(month)?;
    let total = period_report(conn, first, last)?;
    let mut rows: Vec<Vec<String>> = data
        .iter()
        .filter(|r| !(r.summary.inflow.is_zero() && r.summary.outflow.is_zero()))
        .map(|r| summary_cells(r.day.to_string(), &r.summary))
        .collect();
    rows.push(summary_cells("Total".into(), &total));
    print_or_json(sub, &data, &["Day", "Opening", "In", "Out", "Closing"], rows)
}

pub fn expenses_by_category(conn: &Connection, month: &str) -> Result<Vec<(String, Decimal)>> {
    let (first, last) = month_bounds(month)?;
    let mut agg: BTreeMap<String, Decimal> = BTreeMap::new();
    for e in all_entries(conn)?.iter().filter(|e| {
        e.domain == Domain::Cash
            && e.subtype == Subtype::Expense
            && e.date.date() >= first
            && e.date.date() <= last
    }) {
        let cat = e
            .category
            .clone()
            .unwrap_or_else(|| "(uncategorized)".to_string());
        *agg.entry(cat).or_insert(Decimal::ZERO) += e.amount;
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(items)
}

fn expenses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month").unwrap();
    let data = expenses_by_category(conn, month)?;
    let rows = data
        .iter()
        .map(|(c, a)| vec![c.clone(), format!("{:.2}", a)])
        .collect();
    print_or_json(sub, &data, &["Category", "Spent"], rows)
}

#[derive(Debug, Serialize)]
pub struct Alert {
    pub ledger: Domain,
    pub account: String,
    pub balance: Decimal,
    pub threshold: Decimal,
}

/// Items and floats at or below their low-water mark. Per-record thresholds
/// win over the shop-wide settings.
pub fn low_balance_alerts(conn: &Connection) -> Result<Vec<Alert>> {
    let default_stock = get_threshold(conn, SETTING_LOW_STOCK)?;
    let default_float = get_threshold(conn, SETTING_LOW_FLOAT)?;
    let mut out = Vec::new();
    for p in list_providers(conn)? {
        let threshold = p.low_float_threshold.unwrap_or(default_float);
        let balance = crate::store::account_balance(conn, p.kind, &p.name)?;
        if balance <= threshold {
            out.push(Alert {
                ledger: p.kind,
                account: p.name,
                balance,
                threshold,
            });
        }
    }
    for it in list_items(conn)? {
        let threshold = it.low_stock_threshold.unwrap_or(default_stock);
        let balance = crate::store::account_balance(conn, Domain::Inventory, &it.name)?;
        if balance <= threshold {
            out.push(Alert {
                ledger: Domain::Inventory,
                account: it.name,
                balance,
                threshold,
            });
        }
    }
    Ok(out)
}

fn alerts(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = low_balance_alerts(conn)?;
    if data.is_empty() && !sub.get_flag("json") && !sub.get_flag("jsonl") {
        println!("No low stock or float");
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|a| {
            vec![
                a.ledger.to_string(),
                a.account.clone(),
                a.balance.to_string(),
                a.threshold.to_string(),
            ]
        })
        .collect();
    print_or_json(sub, &data, &["Ledger", "Account", "Balance", "Threshold"], rows)
}
