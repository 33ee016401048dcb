// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{choice, opt_date, opt_minor, required, text};
use crate::clock::SystemClock;
use crate::engine::accounts::{
    AccountDetails, AccountDetailsUpdate, AccountUpdate, NewAccount, create_account, get_account,
    list_accounts, update_account,
};
use crate::engine::transactions::{TransactionFilter, list_account_transactions};
use crate::models::{Account, AccountType};
use crate::prices::SqlitePriceSource;
use crate::utils::{fmt_minor, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("show", sub)) => show(conn, owner, sub)?,
        Some(("update", sub)) => update(conn, owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let kind = choice::<AccountType>(sub, "type")?.context("Missing --type")?;
    let balance = opt_minor(sub, "balance")?.unwrap_or(0);
    let interest_rate = sub.get_one::<f64>("interest-rate").copied();
    let details = match kind {
        AccountType::Cash => AccountDetails::Cash {
            initial_balance: balance,
        },
        AccountType::Investment => AccountDetails::Investment {
            broker: text(sub, "broker"),
            account_number: text(sub, "account-number"),
        },
        AccountType::Debt => AccountDetails::Debt {
            balance,
            interest_rate,
        },
        AccountType::CreditCard => AccountDetails::CreditCard {
            credit_limit: opt_minor(sub, "credit-limit")?.unwrap_or(0),
            interest_rate,
            due_date: opt_date(sub, "due-date")?,
        },
    };
    let account = create_account(
        conn,
        &SystemClock,
        owner,
        NewAccount {
            name: required::<String>(sub, "name")?.clone(),
            description: text(sub, "description").unwrap_or_default(),
            currency: text(sub, "currency"),
            details,
        },
    )?;
    println!(
        "Added account #{} '{}' ({}, {})",
        account.id, account.name, account.r#type, account.currency
    );
    Ok(())
}

fn rows(accounts: &[Account]) -> Vec<Vec<String>> {
    accounts
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.name.clone(),
                a.r#type.to_string(),
                a.currency.clone(),
                fmt_minor(a.balance),
            ]
        })
        .collect()
}

fn list(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let accounts = list_accounts(conn, &SqlitePriceSource::new(conn), owner)?;
    if !maybe_print_json(sub.get_flag("json"), &accounts)? {
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Type", "CCY", "Balance"], rows(&accounts))
        );
    }
    Ok(())
}

fn show(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let id = *required::<i64>(sub, "id")?;
    let account = get_account(conn, owner, id)?;
    let filter = TransactionFilter {
        limit: sub.get_one::<usize>("limit").copied(),
        ..Default::default()
    };
    let recent = list_account_transactions(conn, owner, id, &filter)?;
    if maybe_print_json(
        sub.get_flag("json"),
        &serde_json::json!({ "account": account, "transactions": recent }),
    )? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Type", "CCY", "Balance"],
            rows(std::slice::from_ref(&account))
        )
    );
    let data = recent
        .into_iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date.format("%Y-%m-%d").to_string(),
                t.r#type.to_string(),
                fmt_minor(t.amount),
                t.description,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Date", "Type", "Amount", "Description"], data)
    );
    Ok(())
}

fn update(conn: &mut Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let id = *required::<i64>(sub, "id")?;
    let broker = text(sub, "broker");
    let account_number = text(sub, "account-number");
    let interest_rate = sub.get_one::<f64>("interest-rate").copied();
    let due_date = opt_date(sub, "due-date")?;
    let credit_limit = opt_minor(sub, "credit-limit")?;

    let details = if broker.is_some() || account_number.is_some() {
        Some(AccountDetailsUpdate::Investment {
            broker,
            account_number,
        })
    } else if interest_rate.is_some() || due_date.is_some() || credit_limit.is_some() {
        Some(AccountDetailsUpdate::CreditCard {
            interest_rate,
            due_date,
            credit_limit,
        })
    } else {
        None
    };
    let account = update_account(
        conn,
        owner,
        id,
        AccountUpdate {
            name: text(sub, "name"),
            description: text(sub, "description"),
            is_active: sub.get_one::<bool>("active").copied(),
            details,
        },
    )?;
    println!("Updated account #{} '{}'", account.id, account.name);
    Ok(())
}
