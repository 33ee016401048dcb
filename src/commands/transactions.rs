// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{choice, minor, opt_datetime, opt_minor, required, text};
use crate::clock::SystemClock;
use crate::engine::transactions::{
    NewTransaction, NewTransfer, TransactionFilter, TransactionUpdate, create_transaction,
    create_transfer, delete_transaction, list_transactions, update_transaction,
};
use crate::models::TransactionType;
use crate::utils::{fmt_minor, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("update", sub)) => update(conn, owner, sub)?,
        Some(("rm", sub)) => {
            let id = *required::<i64>(sub, "id")?;
            delete_transaction(conn, owner, id)?;
            println!("Removed transaction #{} and reversed its balance effect", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let kind = choice::<TransactionType>(sub, "type")?.context("Missing --type")?;
    let tx = create_transaction(
        conn,
        &SystemClock,
        owner,
        NewTransaction {
            account_id: *required::<i64>(sub, "account")?,
            category_id: sub.get_one::<i64>("category").copied(),
            r#type: kind,
            amount: minor(sub, "amount")?,
            description: text(sub, "description").unwrap_or_default(),
            date: opt_datetime(sub, "date")?,
        },
    )?;
    println!(
        "Recorded {} #{} of {} on account #{}",
        tx.r#type,
        tx.id,
        fmt_minor(tx.amount),
        tx.account_id
    );
    Ok(())
}

fn list(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let filter = TransactionFilter {
        from: opt_datetime(sub, "from")?,
        to: opt_datetime(sub, "to")?,
        r#type: choice(sub, "type")?,
        category_id: sub.get_one::<i64>("category").copied(),
        min_amount: opt_minor(sub, "min")?,
        max_amount: opt_minor(sub, "max")?,
        account_id: sub.get_one::<i64>("account").copied(),
        limit: sub.get_one::<usize>("limit").copied(),
    };
    let txs = list_transactions(conn, owner, &filter)?;
    if maybe_print_json(sub.get_flag("json"), &txs)? {
        return Ok(());
    }
    let data = txs
        .into_iter()
        .map(|t| {
            let account = match t.to_account_id {
                Some(to) => format!("{} -> {}", t.account_id, to),
                None => t.account_id.to_string(),
            };
            vec![
                t.id.to_string(),
                t.date.format("%Y-%m-%d").to_string(),
                account,
                t.r#type.to_string(),
                t.category_id.map(|c| c.to_string()).unwrap_or_default(),
                fmt_minor(t.amount),
                t.description,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Account", "Type", "Category", "Amount", "Description"],
            data
        )
    );
    Ok(())
}

fn update(conn: &mut Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let id = *required::<i64>(sub, "id")?;
    let category_id = if sub.get_flag("clear-category") {
        Some(None)
    } else {
        sub.get_one::<i64>("category").copied().map(Some)
    };
    let tx = update_transaction(
        conn,
        owner,
        id,
        TransactionUpdate {
            account_id: sub.get_one::<i64>("account").copied(),
            category_id,
            r#type: choice(sub, "type")?,
            amount: opt_minor(sub, "amount")?,
            description: text(sub, "description"),
            date: opt_datetime(sub, "date")?,
        },
    )?;
    println!(
        "Updated transaction #{}: {} {} on account #{}",
        tx.id,
        tx.r#type,
        fmt_minor(tx.amount),
        tx.account_id
    );
    Ok(())
}

pub fn transfer(conn: &mut Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let tx = create_transfer(
        conn,
        &SystemClock,
        owner,
        NewTransfer {
            from_account_id: *required::<i64>(sub, "from")?,
            to_account_id: *required::<i64>(sub, "to")?,
            amount: minor(sub, "amount")?,
            description: text(sub, "description").unwrap_or_default(),
            date: opt_datetime(sub, "date")?,
        },
    )?;
    println!(
        "Transferred {} from account #{} to #{} (transaction #{})",
        fmt_minor(tx.amount),
        tx.account_id,
        tx.to_account_id.unwrap_or_default(),
        tx.id
    );
    Ok(())
}
