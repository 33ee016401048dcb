// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use kuberan::{CoreError, cli, commands, db, utils};

fn run() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let owner = *matches
        .get_one::<i64>("user")
        .context("Missing --user")?;

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            if let Some(ccy) = sub.get_one::<String>("currency") {
                utils::set_default_currency(&conn, ccy)?;
            }
            println!(
                "Database initialized at {} (default currency {})",
                db::db_path()?.display(),
                utils::default_currency(&conn)?
            );
        }
        Some(("account", sub)) => commands::accounts::handle(&mut conn, owner, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, owner, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, owner, sub)?,
        Some(("transfer", sub)) => commands::transactions::transfer(&mut conn, owner, sub)?,
        Some(("security", sub)) => commands::securities::handle(&conn, sub)?,
        Some(("invest", sub)) => commands::investments::handle(&mut conn, owner, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, owner, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, owner, sub)?,
        Some(("snapshot", sub)) => commands::snapshots::handle(&conn, owner, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() {
    kuberan::init();
    if let Err(err) = run() {
        match err.downcast_ref::<CoreError>() {
            Some(core) => eprintln!("error[{}]: {}", core.code(), core),
            None => eprintln!("error: {:#}", err),
        }
        std::process::exit(1);
    }
}
