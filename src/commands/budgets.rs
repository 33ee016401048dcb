// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{choice, minor, opt_date, required};
use crate::clock::SystemClock;
use crate::engine::aggregation::budget_progress;
use crate::engine::budgets::{NewBudget, create_budget, list_budgets};
use crate::models::BudgetPeriod;
use crate::utils::{fmt_minor, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("progress", sub)) => progress(conn, owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let budget = create_budget(
        conn,
        owner,
        NewBudget {
            category_id: *required::<i64>(sub, "category")?,
            name: required::<String>(sub, "name")?.clone(),
            amount: minor(sub, "amount")?,
            period: choice::<BudgetPeriod>(sub, "period")?.unwrap_or(BudgetPeriod::Monthly),
            start_date: parse_date(required::<String>(sub, "start")?)?,
            end_date: opt_date(sub, "end")?,
        },
    )?;
    println!(
        "Budget #{} '{}' set to {} {}",
        budget.id,
        budget.name,
        fmt_minor(budget.amount),
        budget.period
    );
    Ok(())
}

fn list(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let budgets = list_budgets(conn, owner, !sub.get_flag("all"))?;
    if maybe_print_json(sub.get_flag("json"), &budgets)? {
        return Ok(());
    }
    let data = budgets
        .into_iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                b.name,
                b.category_id.to_string(),
                fmt_minor(b.amount),
                b.period.to_string(),
                b.start_date.to_string(),
                b.end_date.map(|d| d.to_string()).unwrap_or_default(),
                if b.is_active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Name", "Category", "Amount", "Period", "Start", "End", "Active"],
            data
        )
    );
    Ok(())
}

fn progress(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let id = *required::<i64>(sub, "id")?;
    let p = budget_progress(conn, &SystemClock, owner, id)?;
    if maybe_print_json(sub.get_flag("json"), &p)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Budget", "Period", "Budgeted", "Spent", "Remaining", "%"],
            vec![vec![
                p.name,
                format!("{} .. {}", p.period_start, p.period_end),
                fmt_minor(p.budgeted),
                fmt_minor(p.spent),
                fmt_minor(p.remaining),
                p.percentage.to_string(),
            ]]
        )
    );
    Ok(())
}
