// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::Domain;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub cost_price: Decimal,
    pub parent_item: Option<String>,
    pub units_per_parent: Option<Decimal>,
    pub low_stock_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    pub kind: Domain, // airtime | mobile_money
    pub low_float_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashClosing {
    pub id: i64,
    pub date: NaiveDateTime,
    pub opening: Decimal,
    pub inflow: Decimal,
    pub outflow: Decimal,
    pub theoretical: Decimal,
    pub counted: Decimal,
    pub variance: Decimal,
    pub adjustment_entry_id: Option<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRule {
    pub id: i64,
    pub pattern: String,
    pub category: String,
}
