// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Running-balance reconciliation shared by the till, the airtime and
//! mobile-money floats, and item stock cards.
//!
//! Everything here is pure: callers hand in the full entry list of one
//! account and a sign rule, and get back a projection. Balances are never
//! stored; replaying the history from zero is the only way to obtain one.

use crate::error::LedgerError;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TILL: &str = "till";

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Cash,
    Airtime,
    MobileMoney,
    Inventory,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Cash => "cash",
            Domain::Airtime => "airtime",
            Domain::MobileMoney => "mobile_money",
            Domain::Inventory => "inventory",
        }
    }

    pub fn allows(self, subtype: Subtype) -> bool {
        own_sign(self, subtype).is_some()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" | "till" => Ok(Domain::Cash),
            "airtime" => Ok(Domain::Airtime),
            "mobile_money" | "mobile-money" | "momo" => Ok(Domain::MobileMoney),
            "inventory" | "stock" => Ok(Domain::Inventory),
            other => Err(LedgerError::invalid(format!("unknown domain '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtype {
    Sale,
    Purchase,
    Expense,
    Adjustment,
    Deposit,
    Withdrawal,
    Transfer,
    In,
    Out,
    Commission,
}

impl Subtype {
    pub fn as_str(self) -> &'static str {
        match self {
            Subtype::Sale => "sale",
            Subtype::Purchase => "purchase",
            Subtype::Expense => "expense",
            Subtype::Adjustment => "adjustment",
            Subtype::Deposit => "deposit",
            Subtype::Withdrawal => "withdrawal",
            Subtype::Transfer => "transfer",
            Subtype::In => "in",
            Subtype::Out => "out",
            Subtype::Commission => "commission",
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subtype {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" => Ok(Subtype::Sale),
            "purchase" => Ok(Subtype::Purchase),
            "expense" => Ok(Subtype::Expense),
            "adjustment" | "adjust" => Ok(Subtype::Adjustment),
            "deposit" => Ok(Subtype::Deposit),
            "withdrawal" => Ok(Subtype::Withdrawal),
            "transfer" => Ok(Subtype::Transfer),
            "in" => Ok(Subtype::In),
            "out" => Ok(Subtype::Out),
            "commission" => Ok(Subtype::Commission),
            other => Err(LedgerError::invalid(format!("unknown entry type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub date: NaiveDateTime,
    pub domain: Domain,
    pub subtype: Subtype,
    pub amount: Decimal,
    pub account_key: String,
    pub category: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancedEntry {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub balance_after: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PeriodSummary {
    pub opening: Decimal,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub closing: Decimal,
}

#[derive(Debug, Clone, Copy)]
enum Sign {
    Plus,
    Minus,
    Stored,
    Zero,
}

impl Sign {
    fn apply(self, amount: Decimal) -> Decimal {
        match self {
            Sign::Plus => amount.abs(),
            Sign::Minus => -amount.abs(),
            Sign::Stored => amount,
            Sign::Zero => Decimal::ZERO,
        }
    }
}

// None means the subtype does not belong to the domain.
fn own_sign(domain: Domain, subtype: Subtype) -> Option<Sign> {
    use Subtype::*;
    let sign = match (domain, subtype) {
        (_, Adjustment) => Sign::Stored,
        (Domain::Cash, Sale | Deposit) => Sign::Plus,
        (Domain::Cash, Purchase | Expense | Withdrawal) => Sign::Minus,
        (Domain::Airtime, Purchase | Commission) => Sign::Plus,
        (Domain::Airtime, Sale) => Sign::Minus,
        (Domain::MobileMoney, Purchase | Withdrawal | Commission) => Sign::Plus,
        (Domain::MobileMoney, Deposit | Transfer) => Sign::Minus,
        (Domain::Inventory, In) => Sign::Plus,
        (Domain::Inventory, Out) => Sign::Minus,
        _ => return None,
    };
    Some(sign)
}

fn cash_sign(domain: Domain, subtype: Subtype) -> Sign {
    use Subtype::*;
    match (domain, subtype) {
        (Domain::Cash, _) => own_sign(domain, subtype).unwrap_or(Sign::Zero),
        (Domain::Airtime, Sale) => Sign::Plus,
        (Domain::Airtime, Purchase) => Sign::Minus,
        (Domain::MobileMoney, Deposit | Transfer) => Sign::Plus,
        (Domain::MobileMoney, Withdrawal | Purchase) => Sign::Minus,
        _ => Sign::Zero,
    }
}

/// Signed contribution of an entry to its own account, in the account's unit
/// (money for the till and floats, units for stock).
pub fn contribution(entry: &LedgerEntry) -> Decimal {
    own_sign(entry.domain, entry.subtype)
        .unwrap_or(Sign::Zero)
        .apply(entry.amount)
}

/// Signed effect of an entry on the till, whatever domain it belongs to.
pub fn cash_effect(entry: &LedgerEntry) -> Decimal {
    cash_sign(entry.domain, entry.subtype).apply(entry.amount)
}

/// Checks an entry before it is accepted into the list. Sale-like subtypes
/// carry a positive magnitude; adjustments carry their own sign.
pub fn validate(domain: Domain, subtype: Subtype, amount: Decimal) -> Result<(), LedgerError> {
    if !domain.allows(subtype) {
        return Err(LedgerError::invalid(format!(
            "'{}' entries are not allowed in the {} ledger",
            subtype, domain
        )));
    }
    match subtype {
        Subtype::Adjustment if amount.is_zero() => {
            Err(LedgerError::invalid("adjustment amount must be non-zero"))
        }
        Subtype::Adjustment => Ok(()),
        _ if amount <= Decimal::ZERO => Err(LedgerError::invalid(format!(
            "{} amount must be positive, got {}",
            subtype, amount
        ))),
        _ => Ok(()),
    }
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, LedgerError> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| LedgerError::invalid(format!("unparsable date '{}'", s)))
}

pub fn parse_amount(s: &str) -> Result<Decimal, LedgerError> {
    let s = s.trim();
    s.parse::<Decimal>()
        .map_err(|_| LedgerError::invalid(format!("amount '{}' is not a finite decimal", s)))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Entries in ledger order: ascending date, ties by insertion id.
pub fn chronological(entries: &[LedgerEntry]) -> Vec<LedgerEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    sorted
}

/// Annotates every entry with the balance after it. The result is ascending;
/// newest-first views reverse it themselves.
pub fn compute_running_balances<F>(entries: &[LedgerEntry], rule: F) -> Vec<BalancedEntry>
where
    F: Fn(&LedgerEntry) -> Decimal,
{
    let mut balance = Decimal::ZERO;
    chronological(entries)
        .into_iter()
        .map(|entry| {
            balance += rule(&entry);
            BalancedEntry {
                entry,
                balance_after: balance,
            }
        })
        .collect()
}

pub fn current_balance<F>(entries: &[LedgerEntry], rule: F) -> Decimal
where
    F: Fn(&LedgerEntry) -> Decimal,
{
    compute_running_balances(entries, rule)
        .last()
        .map(|b| b.balance_after)
        .unwrap_or(Decimal::ZERO)
}

/// Balance including every entry dated at or before `cutoff`.
pub fn balance_as_of<F>(entries: &[LedgerEntry], rule: F, cutoff: NaiveDateTime) -> Decimal
where
    F: Fn(&LedgerEntry) -> Decimal,
{
    chronological(entries)
        .iter()
        .take_while(|e| e.date <= cutoff)
        .map(&rule)
        .sum()
}

/// Opening balance as of `after` (zero when there is no prior cutoff) plus
/// the inflow and outflow of entries in `(after, until]`.
pub fn period_summary<F>(
    entries: &[LedgerEntry],
    rule: F,
    after: Option<NaiveDateTime>,
    until: NaiveDateTime,
) -> PeriodSummary
where
    F: Fn(&LedgerEntry) -> Decimal,
{
    let opening = match after {
        Some(cutoff) => balance_as_of(entries, &rule, cutoff),
        None => Decimal::ZERO,
    };
    let mut summary = PeriodSummary {
        opening,
        ..Default::default()
    };
    for e in entries
        .iter()
        .filter(|e| after.is_none_or(|a| e.date > a) && e.date <= until)
    {
        let delta = rule(e);
        if delta > Decimal::ZERO {
            summary.inflow += delta;
        } else {
            summary.outflow -= delta;
        }
    }
    summary.closing = summary.opening + summary.inflow - summary.outflow;
    summary
}
