// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use jokermarket::commands::{entries, reports, rules};
use jokermarket::ledger::{Domain, Subtype, parse_timestamp};
use jokermarket::store::{NewEntry, append_entry};
use jokermarket::{cli, db, utils};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

fn cash(conn: &Connection, when: &str, subtype: Subtype, amount: i64) {
    append_entry(
        conn,
        &NewEntry::cash(parse_timestamp(when).unwrap(), subtype, dec(amount)),
    )
    .unwrap();
}

fn run(conn: &Connection, args: &[&str]) {
    let mut full = vec!["jokermarket"];
    full.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(full);
    match matches.subcommand() {
        Some(("cash", m)) => entries::handle_cash(conn, m).unwrap(),
        Some(("airtime", m)) => entries::handle_airtime(conn, m).unwrap(),
        Some(("rules", m)) => rules::handle(conn, m).unwrap(),
        Some(("config", m)) => jokermarket::commands::config::handle(conn, m).unwrap(),
        other => panic!("unexpected command {:?}", other.map(|(n, _)| n)),
    }
}

#[test]
fn daily_report_opens_with_everything_before_the_day() {
    let conn = setup();
    cash(&conn, "2025-03-01 08:00", Subtype::Deposit, 50000);
    cash(&conn, "2025-03-01 23:59:59", Subtype::Expense, 1000);
    cash(&conn, "2025-03-02 00:00", Subtype::Sale, 20000);
    cash(&conn, "2025-03-02 18:00", Subtype::Expense, 5000);
    cash(&conn, "2025-03-03 09:00", Subtype::Sale, 700);

    let day = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
    let s = reports::period_report(&conn, day, day).unwrap();
    assert_eq!(s.opening, dec(49000));
    assert_eq!(s.inflow, dec(20000));
    assert_eq!(s.outflow, dec(5000));
    assert_eq!(s.closing, dec(64000));
}

#[test]
fn monthly_rows_chain_day_to_day() {
    let conn = setup();
    cash(&conn, "2025-02-28 10:00", Subtype::Deposit, 1000);
    cash(&conn, "2025-03-05 10:00", Subtype::Sale, 300);
    cash(&conn, "2025-03-20 10:00", Subtype::Expense, 100);

    let rows = reports::monthly_rows(&conn, "2025-03").unwrap();
    assert_eq!(rows.len(), 31);
    assert_eq!(rows[0].summary.opening, dec(1000));
    for pair in rows.windows(2) {
        assert_eq!(pair[0].summary.closing, pair[1].summary.opening);
    }
    assert_eq!(rows[30].summary.closing, dec(1200));
}

#[test]
fn expenses_take_rule_category_from_note() {
    let conn = setup();
    run(&conn, &["rules", "add", "--pattern", "(?i)taxi|moto", "--category", "Transport"]);
    run(
        &conn,
        &["cash", "expense", "--amount", "1200", "--date", "2025-03-04", "--note", "Taxi to wholesaler"],
    );
    run(
        &conn,
        &["cash", "expense", "--amount", "800", "--date", "2025-03-05", "--category", "Rent", "--note", "moto"],
    );
    run(
        &conn,
        &["cash", "expense", "--amount", "50", "--date", "2025-03-06"],
    );

    let data = reports::expenses_by_category(&conn, "2025-03").unwrap();
    assert_eq!(
        data,
        vec![
            ("Transport".to_string(), dec(1200)),
            ("Rent".to_string(), dec(800)),
            ("(uncategorized)".to_string(), dec(50)),
        ]
    );
}

#[test]
fn rules_add_rejects_invalid_regex() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "jokermarket",
        "rules",
        "add",
        "--pattern",
        " (?P< ",
        "--category",
        "Transport",
    ]);
    if let Some(("rules", m)) = matches.subcommand() {
        let err = rules::handle(&conn, m).unwrap_err();
        assert!(err.to_string().contains("Invalid regex pattern"));
    } else {
        panic!("rules command not parsed");
    }
}

#[test]
fn alerts_use_record_threshold_then_setting() {
    let conn = setup();
    conn.execute(
        "INSERT INTO providers(name, kind, low_float_threshold) VALUES ('Orange','airtime','2000'), ('Nexttel','airtime',NULL)",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO items(name, unit_price, cost_price, low_stock_threshold) VALUES ('Bread','250','200','10'), ('Rice','900','700',NULL)",
        [],
    )
    .unwrap();
    run(&conn, &["airtime", "purchase", "--provider", "Orange", "--amount", "2500"]);
    run(&conn, &["airtime", "purchase", "--provider", "Nexttel", "--amount", "9000"]);
    run(&conn, &["config", "set", "--key", "low_stock_threshold", "--value", "3"]);
    append_entry(
        &conn,
        &NewEntry::new(parse_timestamp("2025-03-01").unwrap(), Domain::Inventory, Subtype::In, dec(8), "Bread"),
    )
    .unwrap();
    append_entry(
        &conn,
        &NewEntry::new(parse_timestamp("2025-03-01").unwrap(), Domain::Inventory, Subtype::In, dec(4), "Rice"),
    )
    .unwrap();

    let accounts: Vec<String> = reports::low_balance_alerts(&conn)
        .unwrap()
        .into_iter()
        .map(|a| a.account)
        .collect();
    // Nexttel under the 10000 default, Bread under its own 10
    assert_eq!(accounts, vec!["Nexttel".to_string(), "Bread".to_string()]);
    assert_eq!(utils::get_threshold(&conn, utils::SETTING_LOW_STOCK).unwrap(), dec(3));
}

#[test]
fn unknown_settings_are_rejected() {
    let conn = setup();
    assert!(utils::set_setting(&conn, "colour", "red").is_err());
    assert!(utils::set_setting(&conn, utils::SETTING_LOW_FLOAT, "lots").is_err());
    assert_eq!(utils::get_currency(&conn).unwrap(), "XAF");
}

#[test]
fn balances_list_till_floats_and_stock() {
    let conn = setup();
    conn.execute("INSERT INTO providers(name, kind) VALUES ('Orange','airtime')", [])
        .unwrap();
    run(&conn, &["airtime", "purchase", "--provider", "Orange", "--amount", "4000", "--date", "2025-03-01"]);
    run(&conn, &["cash", "sale", "--amount", "6000", "--date", "2025-03-01"]);

    let rows = reports::balance_rows(&conn).unwrap();
    assert_eq!(rows[0].account, "till");
    assert_eq!(rows[0].balance, dec(2000));
    assert_eq!(rows[1].account, "Orange");
    assert_eq!(rows[1].balance, dec(4000));
}

#[test]
fn rule_changes_take_effect_immediately() {
    let conn = setup();
    run(&conn, &["rules", "add", "--pattern", "(?i)fuel", "--category", "Generator"]);
    assert_eq!(
        utils::apply_expense_rules(&conn, "Fuel for generator").unwrap(),
        Some("Generator".to_string())
    );

    let id = rules::list_rules(&conn).unwrap()[0].id.to_string();
    run(&conn, &["rules", "rm", "--id", &id]);
    assert_eq!(utils::apply_expense_rules(&conn, "Fuel for generator").unwrap(), None);

    run(&conn, &["rules", "add", "--pattern", "(?i)fuel", "--category", "Energy"]);
    // A broken row written behind the CLI's back is skipped, not fatal
    conn.execute("INSERT INTO rules(pattern, category) VALUES ('(', 'Broken')", [])
        .unwrap();
    utils::invalidate_rule_cache();
    assert_eq!(
        utils::apply_expense_rules(&conn, "fuel").unwrap(),
        Some("Energy".to_string())
    );
}
