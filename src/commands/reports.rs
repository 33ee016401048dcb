// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{opt_datetime, required};
use crate::clock::SystemClock;
use crate::engine::aggregation::{daily_spending, monthly_summary, spending_by_category};
use crate::utils::{fmt_minor, maybe_print_json, parse_date, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("by-category", sub)) => by_category(conn, owner, sub)?,
        Some(("monthly", sub)) => monthly(conn, owner, sub)?,
        Some(("daily", sub)) => daily(conn, owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn by_category(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let from = opt_datetime(sub, "from")?.context("Missing --from")?;
    let to = opt_datetime(sub, "to")?.context("Missing --to")?;
    let report = spending_by_category(conn, owner, from, to)?;
    if maybe_print_json(sub.get_flag("json"), &report)? {
        return Ok(());
    }
    let mut data: Vec<Vec<String>> = report
        .items
        .into_iter()
        .map(|i| vec![i.category_name, fmt_minor(i.total)])
        .collect();
    data.push(vec!["Total".into(), fmt_minor(report.total_spent)]);
    println!("{}", pretty_table(&["Category", "Spent"], data));
    Ok(())
}

fn monthly(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let months = *required::<u32>(sub, "months")?;
    let summary = monthly_summary(conn, &SystemClock, owner, months)?;
    if maybe_print_json(sub.get_flag("json"), &summary)? {
        return Ok(());
    }
    let data = summary
        .into_iter()
        .map(|m| {
            vec![
                m.month,
                fmt_minor(m.income),
                fmt_minor(m.expenses),
                fmt_minor(m.net),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Income", "Expenses", "Net"], data)
    );
    Ok(())
}

fn daily(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let from = parse_date(required::<String>(sub, "from")?)?;
    let to = parse_date(required::<String>(sub, "to")?)?;
    let days = daily_spending(conn, owner, from, to)?;
    if maybe_print_json(sub.get_flag("json"), &days)? {
        return Ok(());
    }
    let data = days
        .into_iter()
        .map(|d| vec![d.date.to_string(), fmt_minor(d.total)])
        .collect();
    println!("{}", pretty_table(&["Day", "Spent"], data));
    Ok(())
}
