// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use jokermarket::LedgerError;
use jokermarket::ledger::Domain;
use jokermarket::store::{account_balance, all_entries, till_balance};
use jokermarket::{cli, commands::importer, db};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

fn base_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO providers(name, kind) VALUES ('Orange','airtime')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO items(name, unit_price, cost_price) VALUES ('Bread','250','200')",
        [],
    )
    .unwrap();
    conn
}

fn csv_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "date,domain,subtype,amount,account,category,note\n{}", body).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn importer_trims_cli_path_argument() {
    let mut conn = base_conn();
    let file = csv_file("2025-02-03,cash,sale,500,,,\n");

    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);
    let matches = cli::build_cli().get_matches_from(["jokermarket", "import", "entries", "--path", &padded]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    assert_eq!(till_balance(&conn).unwrap(), Decimal::from(500));
}

#[test]
fn importer_books_every_ledger() {
    let mut conn = base_conn();
    conn.execute(
        "INSERT INTO rules(pattern, category) VALUES ('(?i)fuel', 'Generator')",
        [],
    )
    .unwrap();
    let file = csv_file(
        "2025-02-03 08:00,airtime,purchase,10000,Orange,,\n\
         2025-02-03 09:00,airtime,sale,3000,Orange,,\n\
         2025-02-03 09:30,stock,in,20,Bread,,\n\
         2025-02-03 10:00,cash,expense,1500,till,,Fuel for generator\n",
    );
    let n = importer::import_entries(&mut conn, file.path().to_str().unwrap()).unwrap();
    assert_eq!(n, 4);
    assert_eq!(
        account_balance(&conn, Domain::Airtime, "Orange").unwrap(),
        Decimal::from(7000)
    );
    assert_eq!(
        account_balance(&conn, Domain::Inventory, "Bread").unwrap(),
        Decimal::from(20)
    );
    let expense = all_entries(&conn).unwrap().pop().unwrap();
    assert_eq!(expense.category.as_deref(), Some("Generator"));
}

#[test]
fn importer_rolls_back_on_bad_row() {
    let mut conn = base_conn();
    let file = csv_file(
        "2025-02-03,cash,sale,500,,,\n\
         someday,cash,sale,100,,,\n",
    );
    let err = importer::import_entries(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("line 3"));
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidEntry(_))
    ));
    assert!(all_entries(&conn).unwrap().is_empty());
}

#[test]
fn importer_enforces_float_balance() {
    let mut conn = base_conn();
    let file = csv_file(
        "2025-02-03 08:00,airtime,purchase,1000,Orange,,\n\
         2025-02-03 09:00,airtime,sale,3000,Orange,,\n",
    );
    let err = importer::import_entries(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InsufficientBalance { .. })
    ));
    assert!(all_entries(&conn).unwrap().is_empty());
}

#[test]
fn importer_reports_line_of_unreadable_record() {
    let mut conn = base_conn();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"date,domain,subtype,amount,account,category,note\n2025-02-03,cash,sale,500,,,\n2025-02-04,cash,sale,700,,,caf\xff\n")
        .unwrap();
    file.flush().unwrap();
    let err = importer::import_entries(&mut conn, file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("line 3"));
    assert!(all_entries(&conn).unwrap().is_empty());
}
