// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{minor, opt_datetime, required, text};
use crate::clock::{Clock, SystemClock};
use crate::engine::investments::{
    Dividend, NewInvestment, Trade, add_investment, get_portfolio, list_holdings,
    list_investment_transactions, record_buy, record_dividend, record_sell, record_split,
};
use crate::prices::SqlitePriceSource;
use crate::utils::{fmt_minor, maybe_print_json, parse_quantity, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    let clock = SystemClock;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &clock, owner, sub)?,
        Some(("buy", sub)) => trade(conn, &clock, owner, sub, Side::Buy)?,
        Some(("sell", sub)) => trade(conn, &clock, owner, sub, Side::Sell)?,
        Some(("dividend", sub)) => {
            let id = *required::<i64>(sub, "investment")?;
            let div = record_dividend(
                conn,
                &clock,
                owner,
                id,
                Dividend {
                    amount: minor(sub, "amount")?,
                    dividend_type: text(sub, "dividend-type").unwrap_or_default(),
                    date: opt_datetime(sub, "date")?,
                    notes: text(sub, "notes").unwrap_or_default(),
                },
            )?;
            println!(
                "Recorded {} dividend of {} on holding #{}",
                div.dividend_type.unwrap_or_default(),
                fmt_minor(div.total_amount),
                id
            );
        }
        Some(("split", sub)) => {
            let id = *required::<i64>(sub, "investment")?;
            let ratio = *required::<f64>(sub, "ratio")?;
            record_split(
                conn,
                &clock,
                owner,
                id,
                ratio,
                opt_datetime(sub, "date")?,
                text(sub, "notes").unwrap_or_default(),
            )?;
            println!("Applied {}:1 split to holding #{}", ratio, id);
        }
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("history", sub)) => history(conn, owner, sub)?,
        Some(("portfolio", sub)) => portfolio(conn, owner, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

fn add(conn: &mut Connection, clock: &dyn Clock, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let holding = add_investment(
        conn,
        clock,
        owner,
        NewInvestment {
            account_id: *required::<i64>(sub, "account")?,
            security_id: *required::<i64>(sub, "security")?,
            quantity: parse_quantity(required::<String>(sub, "quantity")?)?,
            purchase_price: minor(sub, "price")?,
            fee: minor(sub, "fee")?,
            wallet_address: text(sub, "wallet"),
            date: opt_datetime(sub, "date")?,
            notes: text(sub, "notes"),
        },
    )?;
    println!(
        "Holding #{}: {} units, cost basis {}",
        holding.id,
        holding.quantity,
        fmt_minor(holding.cost_basis)
    );
    Ok(())
}

fn trade(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    sub: &clap::ArgMatches,
    side: Side,
) -> Result<()> {
    let id = *required::<i64>(sub, "investment")?;
    let trade = Trade {
        quantity: parse_quantity(required::<String>(sub, "quantity")?)?,
        price_per_unit: minor(sub, "price")?,
        fee: minor(sub, "fee")?,
        date: opt_datetime(sub, "date")?,
        notes: text(sub, "notes").unwrap_or_default(),
    };
    match side {
        Side::Buy => {
            let buy = record_buy(conn, clock, owner, id, trade)?;
            println!(
                "Bought {} units for {} on holding #{}",
                buy.quantity,
                fmt_minor(buy.total_amount),
                id
            );
        }
        Side::Sell => {
            let sell = record_sell(conn, clock, owner, id, trade)?;
            println!(
                "Sold {} units for {} on holding #{} (realized {})",
                sell.quantity,
                fmt_minor(sell.total_amount),
                id,
                fmt_minor(sell.realized_gain.unwrap_or(0))
            );
        }
    }
    Ok(())
}

fn list(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let account = sub.get_one::<i64>("account").copied();
    let holdings = list_holdings(conn, &SqlitePriceSource::new(conn), owner, account)?;
    if maybe_print_json(sub.get_flag("json"), &holdings)? {
        return Ok(());
    }
    let data = holdings
        .into_iter()
        .map(|h| {
            vec![
                h.investment.id.to_string(),
                h.investment.account_id.to_string(),
                h.symbol,
                h.asset_type.to_string(),
                h.investment.quantity.to_string(),
                fmt_minor(h.investment.cost_basis),
                h.current_price.map(fmt_minor).unwrap_or_else(|| "-".into()),
                fmt_minor(h.current_value),
                fmt_minor(h.gain_loss),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Account", "Symbol", "Type", "Qty", "Cost", "Price", "Value", "Gain"],
            data
        )
    );
    Ok(())
}

fn history(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let id = *required::<i64>(sub, "investment")?;
    let events = list_investment_transactions(conn, owner, id)?;
    if maybe_print_json(sub.get_flag("json"), &events)? {
        return Ok(());
    }
    let data = events
        .into_iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.date.format("%Y-%m-%d").to_string(),
                e.r#type.to_string(),
                e.quantity.to_string(),
                fmt_minor(e.price_per_unit),
                fmt_minor(e.fee),
                fmt_minor(e.total_amount),
                e.realized_gain.map(fmt_minor).unwrap_or_default(),
                e.notes,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Type", "Qty", "Price", "Fee", "Total", "Realized", "Notes"],
            data
        )
    );
    Ok(())
}

fn portfolio(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let summary = get_portfolio(conn, &SqlitePriceSource::new(conn), owner)?;
    if maybe_print_json(sub.get_flag("json"), &summary)? {
        return Ok(());
    }
    let data = summary
        .holdings_by_type
        .iter()
        .map(|(t, s)| vec![t.to_string(), s.count.to_string(), fmt_minor(s.value)])
        .collect();
    println!("{}", pretty_table(&["Asset type", "Holdings", "Value"], data));
    println!(
        "Value {}  Cost {}  Gain {} ({}%)",
        fmt_minor(summary.total_value),
        fmt_minor(summary.total_cost_basis),
        fmt_minor(summary.total_gain_loss),
        summary.gain_loss_pct
    );
    Ok(())
}
