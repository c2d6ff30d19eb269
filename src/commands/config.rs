// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{KNOWN_SETTINGS, get_setting, maybe_print_json, pretty_table, set_setting};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let mut data = BTreeMap::new();
            for (key, _) in KNOWN_SETTINGS {
                data.insert(key.to_string(), get_setting(conn, key)?);
            }
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data.into_iter().map(|(k, v)| vec![k, v]).collect();
                println!("{}", pretty_table(&["Setting", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap().trim();
            set_setting(conn, key, value)?;
            println!("Set {} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
