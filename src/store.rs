// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The shop's repository: the only code that writes ledger rows.
//!
//! Every append is validated here before it reaches the table. Operations
//! touching more than one record (pack breaks, item sales, cash closings)
//! run inside a single `rusqlite` transaction, so a failure leaves nothing
//! behind.

use crate::error::LedgerError;
use crate::ledger::{self, Domain, LedgerEntry, Subtype, TILL};
use crate::models::CashClosing;
use crate::utils::{children_of, find_item, item_by_name};
use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDateTime, Timelike};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDateTime,
    pub domain: Domain,
    pub subtype: Subtype,
    pub amount: Decimal,
    pub account_key: String,
    pub category: Option<String>,
    pub note: Option<String>,
}

impl NewEntry {
    pub fn new(
        date: NaiveDateTime,
        domain: Domain,
        subtype: Subtype,
        amount: Decimal,
        account_key: impl Into<String>,
    ) -> Self {
        Self {
            date,
            domain,
            subtype,
            amount,
            account_key: account_key.into(),
            category: None,
            note: None,
        }
    }

    pub fn cash(date: NaiveDateTime, subtype: Subtype, amount: Decimal) -> Self {
        Self::new(date, Domain::Cash, subtype, amount, TILL)
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

const ENTRY_COLUMNS: &str = "id, date, domain, subtype, amount, account_key, category, note";

fn read_entry(r: &Row<'_>) -> rusqlite::Result<(i64, [String; 5], Option<String>, Option<String>)> {
    Ok((
        r.get(0)?,
        [r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?],
        r.get(6)?,
        r.get(7)?,
    ))
}

fn decode_entry(
    (id, [date, domain, subtype, amount, account_key], category, note): (
        i64,
        [String; 5],
        Option<String>,
        Option<String>,
    ),
) -> Result<LedgerEntry> {
    let decoded = (|| -> Result<LedgerEntry, LedgerError> {
        Ok(LedgerEntry {
            id,
            date: ledger::parse_timestamp(&date)?,
            domain: domain.parse()?,
            subtype: subtype.parse()?,
            amount: ledger::parse_amount(&amount)?,
            account_key,
            category,
            note,
        })
    })();
    decoded.with_context(|| format!("Corrupt ledger row {}", id))
}

fn query_entries(conn: &Connection, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, read_entry)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(decode_entry(row?)?);
    }
    Ok(out)
}

pub fn all_entries(conn: &Connection) -> Result<Vec<LedgerEntry>> {
    query_entries(
        conn,
        &format!("SELECT {} FROM entries ORDER BY date, id", ENTRY_COLUMNS),
        &[],
    )
}

pub fn entries_for(conn: &Connection, domain: Domain, account: &str) -> Result<Vec<LedgerEntry>> {
    let entries = query_entries(
        conn,
        &format!(
            "SELECT {} FROM entries WHERE domain=?1 AND account_key=?2 ORDER BY date, id",
            ENTRY_COLUMNS
        ),
        &[&domain.as_str(), &account],
    )?;
    debug!(%domain, account, count = entries.len(), "loaded entries");
    Ok(entries)
}

pub fn entry_by_id(conn: &Connection, id: i64) -> Result<Option<LedgerEntry>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM entries WHERE id=?1", ENTRY_COLUMNS),
            params![id],
            read_entry,
        )
        .optional()?;
    row.map(decode_entry).transpose()
}

/// Balance of one account in its own unit.
pub fn account_balance(conn: &Connection, domain: Domain, account: &str) -> Result<Decimal> {
    let entries = entries_for(conn, domain, account)?;
    Ok(ledger::current_balance(&entries, ledger::contribution))
}

/// Till balance: the cash effect of every entry in every domain.
pub fn till_balance(conn: &Connection) -> Result<Decimal> {
    let entries = all_entries(conn)?;
    Ok(ledger::current_balance(&entries, ledger::cash_effect))
}

/// Refuses when the running balance of `projection` drops below zero at or
/// after `from`. `requested` is the debit being added or the credit being
/// removed.
fn guard_projection(
    account: &str,
    projection: &[LedgerEntry],
    from: (NaiveDateTime, i64),
    requested: Decimal,
) -> Result<(), LedgerError> {
    let lowest = ledger::compute_running_balances(projection, ledger::contribution)
        .into_iter()
        .filter(|b| (b.entry.date, b.entry.id) >= from)
        .map(|b| b.balance_after)
        .min();
    match lowest {
        Some(low) if low < Decimal::ZERO => Err(LedgerError::InsufficientBalance {
            account: account.to_string(),
            available: low + requested,
            requested,
        }),
        _ => Ok(()),
    }
}

fn check_account(conn: &Connection, new: &NewEntry) -> Result<()> {
    match new.domain {
        Domain::Cash if new.account_key != TILL => Err(LedgerError::invalid(format!(
            "cash entries belong to '{}', not '{}'",
            TILL, new.account_key
        ))
        .into()),
        Domain::Cash => Ok(()),
        Domain::Airtime | Domain::MobileMoney => {
            let kind: Option<String> = conn
                .query_row(
                    "SELECT kind FROM providers WHERE name=?1",
                    params![new.account_key],
                    |r| r.get(0),
                )
                .optional()?;
            match kind {
                None => Err(anyhow!("Provider '{}' not found", new.account_key)),
                Some(k) if k != new.domain.as_str() => Err(LedgerError::invalid(format!(
                    "provider '{}' is a {} provider, not {}",
                    new.account_key, k, new.domain
                ))
                .into()),
                Some(_) => Ok(()),
            }
        }
        Domain::Inventory => {
            if find_item(conn, &new.account_key)?.is_none() {
                return Err(anyhow!("Item '{}' not found", new.account_key));
            }
            Ok(())
        }
    }
}

/// Validates and appends one entry. Debits against a float or a stock level
/// may not take it below zero; the till is allowed to go negative.
pub fn append_entry(conn: &Connection, new: &NewEntry) -> Result<LedgerEntry> {
    ledger::validate(new.domain, new.subtype, new.amount)?;
    check_account(conn, new)?;

    let mut entry = LedgerEntry {
        id: 0,
        date: new.date.with_nanosecond(0).unwrap_or(new.date),
        domain: new.domain,
        subtype: new.subtype,
        amount: new.amount,
        account_key: new.account_key.clone(),
        category: new.category.clone(),
        note: new.note.clone(),
    };

    let delta = ledger::contribution(&entry);
    if new.domain != Domain::Cash && delta < Decimal::ZERO {
        // Placed after every stored row of the same instant
        let mut projection = entries_for(conn, new.domain, &new.account_key)?;
        projection.push(LedgerEntry {
            id: i64::MAX,
            ..entry.clone()
        });
        guard_projection(&new.account_key, &projection, (entry.date, i64::MAX), -delta)?;
    }

    conn.execute(
        "INSERT INTO entries(date, domain, subtype, amount, account_key, category, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            ledger::format_timestamp(&entry.date),
            entry.domain.as_str(),
            entry.subtype.as_str(),
            entry.amount.to_string(),
            entry.account_key,
            entry.category,
            entry.note
        ],
    )?;
    entry.id = conn.last_insert_rowid();
    debug!(
        id = entry.id,
        domain = %entry.domain,
        subtype = %entry.subtype,
        amount = %entry.amount,
        account = %entry.account_key,
        "appended entry"
    );
    Ok(entry)
}

fn closing_for_adjustment(conn: &Connection, entry_id: i64) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM closings WHERE adjustment_entry_id=?1",
            params![entry_id],
            |r| r.get(0),
        )
        .optional()?)
}

/// Removes an entry outright. Closing adjustments go with their closing, and
/// a credit that later debits depend on stays.
pub fn delete_entry(conn: &Connection, id: i64) -> Result<LedgerEntry> {
    let entry = entry_by_id(conn, id)?.ok_or_else(|| anyhow!("Entry {} not found", id))?;
    if let Some(closing) = closing_for_adjustment(conn, id)? {
        return Err(anyhow!(
            "Entry {} is the variance adjustment of closing {}; remove the closing instead",
            id,
            closing
        ));
    }
    let credit = ledger::contribution(&entry);
    if entry.domain != Domain::Cash && credit > Decimal::ZERO {
        let projection: Vec<LedgerEntry> = entries_for(conn, entry.domain, &entry.account_key)?
            .into_iter()
            .filter(|e| e.id != id)
            .collect();
        guard_projection(&entry.account_key, &projection, (entry.date, entry.id), credit)
            .with_context(|| format!("Entry {} cannot be removed", id))?;
    }
    conn.execute("DELETE FROM entries WHERE id=?1", params![id])?;
    info!(id, domain = %entry.domain, account = %entry.account_key, "deleted entry");
    Ok(entry)
}

#[derive(Debug, Clone, Serialize)]
pub struct PackBreak {
    pub parent: String,
    pub child: String,
    pub packs: Decimal,
    pub units: Decimal,
    pub parent_stock: Decimal,
    pub child_stock: Decimal,
}

/// Opens `packs` packs of `parent` into their unit item. Both stock
/// movements land in one transaction or not at all.
pub fn break_pack(
    conn: &mut Connection,
    parent: &str,
    child: Option<&str>,
    packs: Decimal,
    date: NaiveDateTime,
) -> Result<PackBreak> {
    if packs <= Decimal::ZERO || !packs.fract().is_zero() {
        return Err(LedgerError::invalid(format!(
            "pack count must be a positive whole number, got {}",
            packs
        ))
        .into());
    }
    let parent_item = item_by_name(conn, parent)?;
    let child_item = match child {
        Some(name) => {
            let c = item_by_name(conn, name)?;
            if c.parent_item.as_deref() != Some(parent_item.name.as_str()) {
                return Err(anyhow!("Item '{}' is not a unit of '{}'", c.name, parent));
            }
            c
        }
        None => {
            let mut kids = children_of(conn, parent)?;
            match kids.len() {
                0 => return Err(anyhow!("Item '{}' has no unit item", parent)),
                1 => kids.remove(0),
                _ => {
                    return Err(anyhow!(
                        "Item '{}' has several unit items; pick one with --into",
                        parent
                    ));
                }
            }
        }
    };
    let per = child_item
        .units_per_parent
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| anyhow!("Item '{}' has no units-per-parent", child_item.name))?;

    let available = account_balance(conn, Domain::Inventory, &parent_item.name)?;
    if available < packs {
        return Err(LedgerError::PackBreakConflict {
            parent: parent_item.name.clone(),
            available,
            requested: packs,
        }
        .into());
    }

    let units = packs * per;
    let note = Some(format!("pack break {} -> {}", parent_item.name, child_item.name));
    let tx = conn.transaction()?;
    append_entry(
        &tx,
        &NewEntry::new(date, Domain::Inventory, Subtype::Out, packs, &parent_item.name)
            .with_note(note.clone()),
    )?;
    append_entry(
        &tx,
        &NewEntry::new(date, Domain::Inventory, Subtype::In, units, &child_item.name)
            .with_note(note),
    )?;
    let parent_stock = account_balance(&tx, Domain::Inventory, &parent_item.name)?;
    let child_stock = account_balance(&tx, Domain::Inventory, &child_item.name)?;
    tx.commit()?;
    info!(
        parent = %parent_item.name,
        child = %child_item.name,
        %packs,
        %units,
        "broke packs"
    );
    Ok(PackBreak {
        parent: parent_item.name,
        child: child_item.name,
        packs,
        units,
        parent_stock,
        child_stock,
    })
}

/// Stock out plus the matching till sale. `amount` defaults to
/// quantity times the item's unit price.
pub fn sell_item(
    conn: &mut Connection,
    item: &str,
    qty: Decimal,
    amount: Option<Decimal>,
    date: NaiveDateTime,
) -> Result<(LedgerEntry, LedgerEntry)> {
    let it = item_by_name(conn, item)?;
    if amount.is_none() && it.unit_price.is_zero() {
        return Err(anyhow!(
            "Item '{}' has no unit price; give the sale amount with --amount",
            it.name
        ));
    }
    let total = amount.unwrap_or(qty * it.unit_price);
    let note = Some(format!("{} x {}", qty, it.name));
    let tx = conn.transaction()?;
    let stock = append_entry(
        &tx,
        &NewEntry::new(date, Domain::Inventory, Subtype::Out, qty, &it.name)
            .with_note(note.clone()),
    )?;
    let cash = append_entry(&tx, &NewEntry::cash(date, Subtype::Sale, total).with_note(note))?;
    tx.commit()?;
    Ok((stock, cash))
}

/// Stock in plus the matching till purchase at cost.
pub fn receive_item(
    conn: &mut Connection,
    item: &str,
    qty: Decimal,
    cost: Option<Decimal>,
    date: NaiveDateTime,
) -> Result<(LedgerEntry, LedgerEntry)> {
    let it = item_by_name(conn, item)?;
    let total = cost.unwrap_or(qty * it.cost_price);
    let note = Some(format!("{} x {}", qty, it.name));
    let tx = conn.transaction()?;
    let stock = append_entry(
        &tx,
        &NewEntry::new(date, Domain::Inventory, Subtype::In, qty, &it.name)
            .with_note(note.clone()),
    )?;
    let cash = append_entry(
        &tx,
        &NewEntry::cash(date, Subtype::Purchase, total).with_note(note),
    )?;
    tx.commit()?;
    Ok((stock, cash))
}

const CLOSING_COLUMNS: &str =
    "id, date, opening, inflow, outflow, theoretical, counted, variance, adjustment_entry_id, note";

fn read_closing(r: &Row<'_>) -> Result<CashClosing> {
    let id: i64 = r.get(0)?;
    let dec = |i: usize| -> Result<Decimal> {
        let s: String = r.get(i)?;
        s.parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in closing {}", s, id))
    };
    let date: String = r.get(1)?;
    Ok(CashClosing {
        id,
        date: ledger::parse_timestamp(&date)
            .with_context(|| format!("Corrupt closing row {}", id))?,
        opening: dec(2)?,
        inflow: dec(3)?,
        outflow: dec(4)?,
        theoretical: dec(5)?,
        counted: dec(6)?,
        variance: dec(7)?,
        adjustment_entry_id: r.get(8)?,
        note: r.get(9)?,
    })
}

pub fn list_closings(conn: &Connection) -> Result<Vec<CashClosing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM closings ORDER BY date, id",
        CLOSING_COLUMNS
    ))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(read_closing(r)?);
    }
    Ok(out)
}

pub fn last_closing(conn: &Connection) -> Result<Option<CashClosing>> {
    Ok(list_closings(conn)?.pop())
}

/// Counts the till at `date`. The theoretical balance is the opening as of
/// the previous closing plus the flows since; a non-zero variance is booked
/// as a cash adjustment so the till then matches the count.
pub fn close_cash(
    conn: &mut Connection,
    date: NaiveDateTime,
    counted: Decimal,
    note: Option<String>,
) -> Result<CashClosing> {
    if counted < Decimal::ZERO {
        return Err(LedgerError::invalid(format!(
            "counted cash cannot be negative, got {}",
            counted
        ))
        .into());
    }
    let date = date.with_nanosecond(0).unwrap_or(date);
    let previous = last_closing(conn)?;
    if let Some(prev) = &previous {
        if prev.date >= date {
            return Err(anyhow!(
                "Closing at {} must come after the last closing at {}",
                ledger::format_timestamp(&date),
                ledger::format_timestamp(&prev.date)
            ));
        }
    }

    let entries = all_entries(conn)?;
    let summary = ledger::period_summary(
        &entries,
        ledger::cash_effect,
        previous.as_ref().map(|p| p.date),
        date,
    );
    let variance = counted - summary.closing;

    let tx = conn.transaction()?;
    let adjustment = if variance.is_zero() {
        None
    } else {
        warn!(%variance, theoretical = %summary.closing, %counted, "cash variance at closing");
        let adj = append_entry(
            &tx,
            &NewEntry::cash(date, Subtype::Adjustment, variance)
                .with_note(Some("closing variance".to_string())),
        )?;
        Some(adj.id)
    };
    tx.execute(
        "INSERT INTO closings(date, opening, inflow, outflow, theoretical, counted, variance, adjustment_entry_id, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            ledger::format_timestamp(&date),
            summary.opening.to_string(),
            summary.inflow.to_string(),
            summary.outflow.to_string(),
            summary.closing.to_string(),
            counted.to_string(),
            variance.to_string(),
            adjustment,
            note
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    info!(id, %counted, %variance, "cash closed");
    Ok(CashClosing {
        id,
        date,
        opening: summary.opening,
        inflow: summary.inflow,
        outflow: summary.outflow,
        theoretical: summary.closing,
        counted,
        variance,
        adjustment_entry_id: adjustment,
        note,
    })
}

/// Removes the latest closing together with the adjustment it synthesised.
/// Earlier closings stay, since later ones opened from them.
pub fn delete_closing(conn: &mut Connection, id: i64) -> Result<()> {
    if let Some(latest) = last_closing(conn)? {
        if latest.id != id && list_closings(conn)?.iter().any(|c| c.id == id) {
            return Err(anyhow!(
                "Closing {} is not the latest; remove closing {} first",
                id,
                latest.id
            ));
        }
    }
    let tx = conn.transaction()?;
    let adj: Option<i64> = tx
        .query_row(
            "SELECT adjustment_entry_id FROM closings WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?
        .ok_or_else(|| anyhow!("Closing {} not found", id))?;
    tx.execute("DELETE FROM closings WHERE id=?1", params![id])?;
    if let Some(entry_id) = adj {
        tx.execute("DELETE FROM entries WHERE id=?1", params![entry_id])?;
    }
    tx.commit()?;
    info!(id, "removed closing");
    Ok(())
}
