// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed failures raised when an entry is offered to the ledger.
//!
//! Handlers work in `anyhow::Result`; these survive the trip and can be
//! recovered with `downcast_ref::<LedgerError>()`.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Insufficient balance on '{account}': available {available}, requested {requested}")]
    InsufficientBalance {
        account: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Cannot break {requested} pack(s) of '{parent}': only {available} in stock")]
    PackBreakConflict {
        parent: String,
        available: Decimal,
        requested: Decimal,
    },
}

impl LedgerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::InvalidEntry(msg.into())
    }
}
