// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn date_arg() -> Arg {
    Arg::new("date")
        .long("date")
        .help("YYYY-MM-DD or YYYY-MM-DD HH:MM[:SS]; defaults to now")
}

fn note_arg() -> Arg {
    Arg::new("note").long("note")
}

fn amount_arg() -> Arg {
    Arg::new("amount")
        .long("amount")
        .required(true)
        .allow_hyphen_values(true)
}

fn movement(name: &'static str, account: &'static str, qty: &'static str) -> Command {
    Command::new(name)
        .arg(Arg::new(account).long(account).required(true))
        .arg(
            Arg::new(qty)
                .long(qty)
                .required(true)
                .allow_hyphen_values(true),
        )
        .arg(date_arg())
        .arg(note_arg())
}

fn ledger_view(account: Option<&'static str>) -> Command {
    let mut cmd = Command::new("ledger")
        .about("Entries with running balance, oldest first")
        .arg(
            Arg::new("desc")
                .long("desc")
                .action(ArgAction::SetTrue)
                .help("Newest first"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_parser(value_parser!(usize)),
        );
    if let Some(a) = account {
        cmd = cmd.arg(Arg::new(a).long(a).required(true));
    }
    json_args(cmd)
}

fn float_commands(name: &'static str, about: &'static str, subtypes: &[&'static str]) -> Command {
    let mut cmd = Command::new(name).about(about);
    for st in subtypes {
        cmd = cmd.subcommand(movement(*st, "provider", "amount"));
    }
    cmd.subcommand(ledger_view(Some("provider")))
}

pub fn build_cli() -> Command {
    Command::new("jokermarket")
        .about("Shop ledger: stock, till cash, airtime and mobile-money floats")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("config")
                .about("Shop settings")
                .subcommand(json_args(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").long("key").required(true))
                        .arg(Arg::new("value").long("value").required(true)),
                ),
        )
        .subcommand(
            Command::new("item")
                .about("Inventory items")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("price").long("price").required(true))
                        .arg(Arg::new("cost").long("cost"))
                        .arg(
                            Arg::new("parent")
                                .long("parent")
                                .requires("units_per_parent")
                                .help("Pack item this item is a unit of"),
                        )
                        .arg(
                            Arg::new("units_per_parent")
                                .long("units-per-parent")
                                .requires("parent"),
                        )
                        .arg(Arg::new("low_stock").long("low-stock")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand(
            Command::new("provider")
                .about("Airtime and mobile-money float providers")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .value_parser(["airtime", "mobile-money"]),
                        )
                        .arg(Arg::new("low_float").long("low-float")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("name").long("name").required(true))),
        )
        .subcommand({
            let mut cash = Command::new("cash").about("Till entries");
            for st in ["sale", "purchase", "expense", "deposit", "withdrawal", "adjust"] {
                let mut c = Command::new(st).arg(amount_arg()).arg(date_arg()).arg(note_arg());
                if st == "expense" {
                    c = c.arg(Arg::new("category").long("category"));
                }
                cash = cash.subcommand(c);
            }
            cash.subcommand(ledger_view(None))
        })
        .subcommand(float_commands(
            "airtime",
            "Airtime float",
            &["purchase", "sale", "commission", "adjust"],
        ))
        .subcommand(float_commands(
            "momo",
            "Mobile-money float",
            &["purchase", "deposit", "withdrawal", "transfer", "commission", "adjust"],
        ))
        .subcommand(
            Command::new("stock")
                .about("Stock movements")
                .subcommand(movement("in", "item", "qty"))
                .subcommand(movement("out", "item", "qty"))
                .subcommand(movement("adjust", "item", "qty"))
                .subcommand(ledger_view(Some("item")).name("card"))
                .subcommand(
                    Command::new("break")
                        .about("Open packs into their unit item")
                        .arg(Arg::new("parent").long("parent").required(true))
                        .arg(Arg::new("into").long("into"))
                        .arg(Arg::new("packs").long("packs").required(true))
                        .arg(date_arg()),
                ),
        )
        .subcommand(
            Command::new("pos")
                .about("Point of sale")
                .subcommand(
                    Command::new("sell")
                        .arg(Arg::new("item").long("item").required(true))
                        .arg(Arg::new("qty").long("qty").required(true))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(date_arg()),
                )
                .subcommand(
                    Command::new("receive")
                        .arg(Arg::new("item").long("item").required(true))
                        .arg(Arg::new("qty").long("qty").required(true))
                        .arg(Arg::new("cost").long("cost"))
                        .arg(date_arg()),
                ),
        )
        .subcommand(
            Command::new("entry")
                .about("Raw ledger entries")
                .subcommand(json_args(
                    Command::new("list")
                        .arg(Arg::new("domain").long("domain"))
                        .arg(Arg::new("account").long("account"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("closing")
                .about("Cash closings")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("counted").long("counted").required(true))
                        .arg(date_arg())
                        .arg(note_arg()),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand(json_args(Command::new("balances")))
                .subcommand(json_args(
                    Command::new("daily").arg(Arg::new("date").long("date").required(true)),
                ))
                .subcommand(json_args(
                    Command::new("monthly").arg(Arg::new("month").long("month").required(true)),
                ))
                .subcommand(json_args(
                    Command::new("expenses").arg(Arg::new("month").long("month").required(true)),
                ))
                .subcommand(json_args(Command::new("alerts"))),
        )
        .subcommand(
            Command::new("export").subcommand(
                Command::new("entries")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv|json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("import").subcommand(
                Command::new("entries").arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(
            Command::new("rules")
                .about("Expense categorisation rules")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("pattern").long("pattern").required(true))
                        .arg(Arg::new("category").long("category").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(Arg::new("id").long("id").required(true))),
        )
        .subcommand(Command::new("doctor").about("Check ledger consistency"))
}
