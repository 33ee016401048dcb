// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn id(name: &'static str) -> Arg {
    Arg::new(name).required(true).value_parser(value_parser!(i64))
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn opt_id(name: &'static str) -> Arg {
    Arg::new(name).long(name).value_parser(value_parser!(i64))
}

fn date_opt(name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help("RFC 3339 timestamp or YYYY-MM-DD")
}

fn trade(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(id("investment"))
        .arg(opt("quantity").required(true))
        .arg(opt("price").required(true).help("Price per unit"))
        .arg(opt("fee").default_value("0"))
        .arg(date_opt("date"))
        .arg(opt("notes").default_value(""))
}

pub fn build_cli() -> Command {
    Command::new("kuberan")
        .about("Personal finance ledger: accounts, investments, budgets and net worth")
        .version(clap::crate_version!())
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("KUBERAN_USER")
                .default_value("1")
                .value_parser(value_parser!(i64))
                .help("Owner whose data is read and written"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the database")
                .arg(opt("currency").help("Default currency for new accounts")),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            opt("type")
                                .required(true)
                                .value_parser(["cash", "investment", "debt", "credit_card"]),
                        )
                        .arg(opt("description").default_value(""))
                        .arg(opt("currency"))
                        .arg(opt("balance").help("Opening balance (cash) or amount owed (debt)"))
                        .arg(opt("broker"))
                        .arg(opt("account-number"))
                        .arg(opt("interest-rate").value_parser(value_parser!(f64)))
                        .arg(opt("due-date"))
                        .arg(opt("credit-limit")),
                )
                .subcommand(Command::new("list").arg(json()))
                .subcommand(
                    Command::new("show")
                        .arg(id("id"))
                        .arg(opt("limit").value_parser(value_parser!(usize)).default_value("20"))
                        .arg(json()),
                )
                .subcommand(
                    Command::new("update")
                        .arg(id("id"))
                        .arg(opt("name"))
                        .arg(opt("description"))
                        .arg(opt("active").value_parser(value_parser!(bool)))
                        .arg(opt("broker"))
                        .arg(opt("account-number"))
                        .arg(opt("interest-rate").value_parser(value_parser!(f64)))
                        .arg(opt("due-date"))
                        .arg(opt("credit-limit")),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            opt("type")
                                .value_parser(["income", "expense"])
                                .default_value("expense"),
                        ),
                )
                .subcommand(Command::new("list").arg(json())),
        )
        .subcommand(
            Command::new("tx")
                .about("Income and expense transactions")
                .subcommand(
                    Command::new("add")
                        .arg(opt_id("account").required(true))
                        .arg(
                            opt("type")
                                .required(true)
                                .value_parser(["income", "expense"]),
                        )
                        .arg(opt("amount").required(true))
                        .arg(opt_id("category"))
                        .arg(opt("description").default_value(""))
                        .arg(date_opt("date")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(date_opt("from"))
                        .arg(date_opt("to"))
                        .arg(opt("type").value_parser(["income", "expense", "transfer", "investment"]))
                        .arg(opt_id("category"))
                        .arg(opt("min"))
                        .arg(opt("max"))
                        .arg(opt_id("account"))
                        .arg(opt("limit").value_parser(value_parser!(usize)))
                        .arg(json()),
                )
                .subcommand(
                    Command::new("update")
                        .arg(id("id"))
                        .arg(opt_id("account"))
                        .arg(opt("type").value_parser(["income", "expense", "transfer", "investment"]))
                        .arg(opt("amount"))
                        .arg(opt_id("category").conflicts_with("clear-category"))
                        .arg(
                            Arg::new("clear-category")
                                .long("clear-category")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(opt("description"))
                        .arg(date_opt("date")),
                )
                .subcommand(Command::new("rm").arg(id("id"))),
        )
        .subcommand(
            Command::new("transfer")
                .about("Move money between two accounts")
                .arg(opt_id("from").required(true))
                .arg(opt_id("to").required(true))
                .arg(opt("amount").required(true))
                .arg(opt("description").default_value(""))
                .arg(date_opt("date")),
        )
        .subcommand(
            Command::new("security")
                .about("Securities and their prices")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("symbol").required(true))
                        .arg(opt("name").required(true))
                        .arg(
                            opt("asset-type")
                                .value_parser(["stock", "etf", "bond", "crypto", "reit"])
                                .default_value("stock"),
                        )
                        .arg(opt("currency"))
                        .arg(opt("exchange")),
                )
                .subcommand(Command::new("list").arg(json()))
                .subcommand(
                    Command::new("price")
                        .arg(id("id"))
                        .arg(Arg::new("price").required(true))
                        .arg(date_opt("at")),
                )
                .subcommand(
                    Command::new("prices")
                        .about("Price history of a security")
                        .arg(id("id"))
                        .arg(date_opt("from"))
                        .arg(date_opt("to"))
                        .arg(json()),
                ),
        )
        .subcommand(
            Command::new("invest")
                .about("Investment holdings and lot events")
                .subcommand(
                    Command::new("add")
                        .arg(opt_id("account").required(true))
                        .arg(opt_id("security").required(true))
                        .arg(opt("quantity").required(true))
                        .arg(opt("price").required(true).help("Purchase price per unit"))
                        .arg(opt("fee").default_value("0"))
                        .arg(opt("wallet"))
                        .arg(date_opt("date"))
                        .arg(opt("notes")),
                )
                .subcommand(trade("buy", "Add units to a holding"))
                .subcommand(trade("sell", "Sell units from a holding"))
                .subcommand(
                    Command::new("dividend")
                        .arg(id("investment"))
                        .arg(opt("amount").required(true))
                        .arg(opt("dividend-type").default_value("cash"))
                        .arg(date_opt("date"))
                        .arg(opt("notes").default_value("")),
                )
                .subcommand(
                    Command::new("split")
                        .arg(id("investment"))
                        .arg(opt("ratio").required(true).value_parser(value_parser!(f64)))
                        .arg(date_opt("date"))
                        .arg(opt("notes").default_value("")),
                )
                .subcommand(Command::new("list").arg(opt_id("account")).arg(json()))
                .subcommand(Command::new("history").arg(id("investment")).arg(json()))
                .subcommand(Command::new("portfolio").arg(json())),
        )
        .subcommand(
            Command::new("budget")
                .about("Budgets and progress")
                .subcommand(
                    Command::new("add")
                        .arg(opt_id("category").required(true))
                        .arg(opt("name").required(true))
                        .arg(opt("amount").required(true))
                        .arg(
                            opt("period")
                                .value_parser(["monthly", "yearly"])
                                .default_value("monthly"),
                        )
                        .arg(opt("start").required(true))
                        .arg(opt("end")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Include inactive budgets"),
                        )
                        .arg(json()),
                )
                .subcommand(Command::new("progress").arg(id("id")).arg(json())),
        )
        .subcommand(
            Command::new("report")
                .about("Spending and income rollups")
                .subcommand(
                    Command::new("by-category")
                        .arg(date_opt("from").required(true))
                        .arg(date_opt("to").required(true))
                        .arg(json()),
                )
                .subcommand(
                    Command::new("monthly")
                        .arg(opt("months").value_parser(value_parser!(u32)).default_value("12"))
                        .arg(json()),
                )
                .subcommand(
                    Command::new("daily")
                        .arg(opt("from").required(true).help("YYYY-MM-DD"))
                        .arg(opt("to").required(true).help("YYYY-MM-DD"))
                        .arg(json()),
                ),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Net-worth snapshots")
                .subcommand(
                    Command::new("record")
                        .about("Record a snapshot for every owner with active accounts")
                        .arg(date_opt("at")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(date_opt("from"))
                        .arg(date_opt("to"))
                        .arg(json()),
                ),
        )
}
