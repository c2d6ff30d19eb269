// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use jokermarket::ledger::{self, Subtype, cash_effect, parse_timestamp};
use jokermarket::store::{
    NewEntry, all_entries, append_entry, close_cash, delete_closing, delete_entry, list_closings,
    till_balance,
};
use jokermarket::{cli, commands::closing, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn ts(s: &str) -> chrono::NaiveDateTime {
    parse_timestamp(s).unwrap()
}

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

fn cash(conn: &Connection, when: &str, subtype: Subtype, amount: i64) {
    append_entry(conn, &NewEntry::cash(ts(when), subtype, dec(amount))).unwrap();
}

#[test]
fn opening_from_previous_closing_carries_into_next_day() {
    let mut conn = setup();
    cash(&conn, "2025-03-01 08:00", Subtype::Deposit, 50000);
    let first = close_cash(&mut conn, ts("2025-03-01 20:00"), dec(50000), None).unwrap();
    assert_eq!(first.opening, Decimal::ZERO);
    assert_eq!(first.theoretical, dec(50000));
    assert!(first.variance.is_zero());
    assert_eq!(first.adjustment_entry_id, None);

    cash(&conn, "2025-03-02 10:00", Subtype::Sale, 20000);
    cash(&conn, "2025-03-02 11:00", Subtype::Expense, 5000);
    assert_eq!(till_balance(&conn).unwrap(), dec(65000));
    let entries = all_entries(&conn).unwrap();
    assert_eq!(
        ledger::balance_as_of(&entries, cash_effect, first.date),
        dec(50000)
    );

    let second = close_cash(&mut conn, ts("2025-03-02 20:00"), dec(65000), None).unwrap();
    assert_eq!(second.opening, dec(50000));
    assert_eq!(second.inflow, dec(20000));
    assert_eq!(second.outflow, dec(5000));
    assert_eq!(second.theoretical, dec(65000));
    assert!(second.variance.is_zero());
}

#[test]
fn variance_is_booked_and_removed_with_its_closing() {
    let mut conn = setup();
    cash(&conn, "2025-03-01 08:00", Subtype::Deposit, 10000);
    cash(&conn, "2025-03-01 09:00", Subtype::Sale, 2000);

    let c = close_cash(
        &mut conn,
        ts("2025-03-01 20:00"),
        dec(11500),
        Some("short".into()),
    )
    .unwrap();
    assert_eq!(c.theoretical, dec(12000));
    assert_eq!(c.variance, dec(-500));
    let adj = c.adjustment_entry_id.expect("variance adjustment");
    assert_eq!(till_balance(&conn).unwrap(), dec(11500));

    let err = delete_entry(&conn, adj).unwrap_err();
    assert!(err.to_string().contains("remove the closing instead"));

    delete_closing(&mut conn, c.id).unwrap();
    assert!(list_closings(&conn).unwrap().is_empty());
    assert_eq!(till_balance(&conn).unwrap(), dec(12000));
    assert_eq!(all_entries(&conn).unwrap().len(), 2);
}

#[test]
fn closings_must_move_forward_in_time() {
    let mut conn = setup();
    close_cash(&mut conn, ts("2025-03-02 20:00"), Decimal::ZERO, None).unwrap();
    let err = close_cash(&mut conn, ts("2025-03-02 20:00"), Decimal::ZERO, None).unwrap_err();
    assert!(err.to_string().contains("must come after"));
    assert!(close_cash(&mut conn, ts("2025-03-01 20:00"), Decimal::ZERO, None).is_err());
    assert_eq!(list_closings(&conn).unwrap().len(), 1);
}

#[test]
fn closing_counts_float_cash_effects() {
    let mut conn = setup();
    conn.execute(
        "INSERT INTO providers(name, kind) VALUES ('Orange','airtime')",
        [],
    )
    .unwrap();
    cash(&conn, "2025-03-01 08:00", Subtype::Deposit, 20000);
    append_entry(
        &conn,
        &NewEntry::new(
            ts("2025-03-01 08:30"),
            ledger::Domain::Airtime,
            Subtype::Purchase,
            dec(10000),
            "Orange",
        ),
    )
    .unwrap();
    append_entry(
        &conn,
        &NewEntry::new(
            ts("2025-03-01 12:00"),
            ledger::Domain::Airtime,
            Subtype::Sale,
            dec(2500),
            "Orange",
        ),
    )
    .unwrap();

    let c = close_cash(&mut conn, ts("2025-03-01 20:00"), dec(12500), None).unwrap();
    assert_eq!(c.inflow, dec(22500));
    assert_eq!(c.outflow, dec(10000));
    assert!(c.variance.is_zero());
}

#[test]
fn closing_command_parses_and_records() {
    let mut conn = setup();
    cash(&conn, "2025-03-01 08:00", Subtype::Sale, 3000);

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "jokermarket",
        "closing",
        "add",
        "--counted",
        " 3100 ",
        "--date",
        "2025-03-01 21:00",
    ]);
    if let Some(("closing", closing_m)) = matches.subcommand() {
        closing::handle(&mut conn, closing_m).unwrap();
    } else {
        panic!("closing command not parsed");
    }

    let all = list_closings(&conn).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].variance, dec(100));
    assert_eq!(till_balance(&conn).unwrap(), dec(3100));
}

#[test]
fn only_the_latest_closing_can_be_removed() {
    let mut conn = setup();
    cash(&conn, "2025-03-01 08:00", Subtype::Deposit, 9000);
    let first = close_cash(&mut conn, ts("2025-03-01 20:00"), dec(9000), None).unwrap();
    cash(&conn, "2025-03-02 10:00", Subtype::Sale, 2000);
    let second = close_cash(&mut conn, ts("2025-03-02 20:00"), dec(10000), None).unwrap();
    assert_eq!(second.opening, dec(9000));
    assert_eq!(second.variance, dec(-1000));

    let err = delete_closing(&mut conn, first.id).unwrap_err();
    assert!(err.to_string().contains("not the latest"));
    assert_eq!(list_closings(&conn).unwrap().len(), 2);
    assert_eq!(till_balance(&conn).unwrap(), dec(10000));

    delete_closing(&mut conn, second.id).unwrap();
    delete_closing(&mut conn, first.id).unwrap();
    assert!(list_closings(&conn).unwrap().is_empty());
    assert_eq!(till_balance(&conn).unwrap(), dec(11000));
    assert!(delete_closing(&mut conn, first.id).is_err());
}
