// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Lot accounting: one holding (quantity + aggregate cost basis) per
//! account/security pair, plus an append-only log of the events that moved it.
//!
//! Cost basis and the event log are written in the same immediate SQLite
//! transaction. Money is integer minor units; only quantity is floating point.
//! Every float-to-integer conversion truncates toward zero.

use crate::clock::Clock;
use crate::engine::accounts::get_account;
use crate::engine::aggregation::percentage;
use crate::engine::securities::get_security;
use crate::errors::{CoreError, Result, not_found_as};
use crate::models::{AccountType, AssetType, Investment, InvestmentTransaction, InvestmentTransactionType};
use crate::prices::{PriceSource, holding_value};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub account_id: i64,
    pub security_id: i64,
    pub quantity: f64,
    pub purchase_price: i64,
    pub fee: i64,
    pub wallet_address: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Trade {
    pub quantity: f64,
    pub price_per_unit: i64,
    pub fee: i64,
    pub date: Option<DateTime<Utc>>,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct Dividend {
    pub amount: i64,
    pub dividend_type: String,
    pub date: Option<DateTime<Utc>>,
    pub notes: String,
}

/// Result of selling part or all of a lot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellOutcome {
    /// Proceeds net of fee.
    pub total: i64,
    pub cost_basis_reduction: i64,
    pub realized_gain: i64,
    pub quantity: f64,
    pub cost_basis: i64,
}

fn out_of_range() -> CoreError {
    CoreError::invalid("amount is out of range")
}

/// Truncates a float amount to minor units, rejecting anything `i64` cannot hold.
fn to_minor(value: f64) -> Result<i64> {
    const LIMIT: f64 = i64::MAX as f64;
    if !value.is_finite() || value >= LIMIT || value < -LIMIT {
        return Err(out_of_range());
    }
    Ok(value as i64)
}

/// Gross cost of a purchase including fee.
pub fn purchase_total(quantity: f64, price_per_unit: i64, fee: i64) -> Result<i64> {
    to_minor(quantity * price_per_unit as f64)?
        .checked_add(fee)
        .ok_or_else(out_of_range)
}

/// Shrinks a lot proportionally to the sold fraction. A sale within float
/// rounding of the held quantity counts as selling the whole lot.
pub fn compute_sell(
    held_quantity: f64,
    cost_basis: i64,
    sold: f64,
    price_per_unit: i64,
    fee: i64,
) -> Result<SellOutcome> {
    let closes_lot = (sold - held_quantity).abs() <= f64::EPSILON * held_quantity.abs().max(1.0);
    if sold > held_quantity && !closes_lot {
        return Err(CoreError::InsufficientShares);
    }
    let total = to_minor(sold * price_per_unit as f64)?
        .checked_sub(fee)
        .ok_or_else(out_of_range)?;
    let (cost_basis_reduction, quantity) = if closes_lot {
        (cost_basis, 0.0)
    } else {
        (
            to_minor(cost_basis as f64 * (sold / held_quantity))?,
            held_quantity - sold,
        )
    };
    Ok(SellOutcome {
        total,
        cost_basis_reduction,
        realized_gain: total
            .checked_sub(cost_basis_reduction)
            .ok_or_else(out_of_range)?,
        quantity,
        cost_basis: cost_basis - cost_basis_reduction,
    })
}

fn validate_trade(quantity: f64, price_per_unit: i64, fee: i64) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(CoreError::invalid("quantity must be greater than zero"));
    }
    if price_per_unit < 0 {
        return Err(CoreError::invalid("price per unit cannot be negative"));
    }
    if fee < 0 {
        return Err(CoreError::invalid("fee cannot be negative"));
    }
    Ok(())
}

/// Holding whose parent account belongs to `owner`.
pub fn get_investment(conn: &Connection, owner: i64, investment_id: i64) -> Result<Investment> {
    let sql = format!(
        "SELECT {} FROM investments i JOIN accounts a ON a.id = i.account_id
         WHERE i.id = ?1 AND a.user_id = ?2",
        Investment::COLUMNS
    );
    conn.query_row(&sql, params![investment_id, owner], Investment::from_row)
        .map_err(|e| not_found_as(e, CoreError::InvestmentNotFound))
}

fn insert_event(conn: &Connection, mut event: InvestmentTransaction) -> Result<InvestmentTransaction> {
    conn.execute(
        "INSERT INTO investment_transactions(investment_id, type, date, quantity, price_per_unit, total_amount, fee, notes, split_ratio, dividend_type, realized_gain)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            event.investment_id,
            event.r#type,
            event.date,
            event.quantity,
            event.price_per_unit,
            event.total_amount,
            event.fee,
            event.notes,
            event.split_ratio,
            event.dividend_type,
            event.realized_gain
        ],
    )?;
    event.id = conn.last_insert_rowid();
    Ok(event)
}

fn store_lot(conn: &Connection, investment_id: i64, quantity: f64, cost_basis: i64) -> Result<()> {
    conn.execute(
        "UPDATE investments SET quantity = ?1, cost_basis = ?2 WHERE id = ?3",
        params![quantity, cost_basis, investment_id],
    )?;
    Ok(())
}

fn event(
    investment_id: i64,
    r#type: InvestmentTransactionType,
    date: DateTime<Utc>,
    notes: String,
) -> InvestmentTransaction {
    InvestmentTransaction {
        id: 0,
        investment_id,
        r#type,
        date,
        quantity: 0.0,
        price_per_unit: 0,
        total_amount: 0,
        fee: 0,
        notes,
        split_ratio: None,
        dividend_type: None,
        realized_gain: None,
    }
}

/// Opens a holding with its initial buy. A pair that already has a holding
/// takes the purchase as a buy on that holding instead.
pub fn add_investment(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    new: NewInvestment,
) -> Result<Investment> {
    validate_trade(new.quantity, new.purchase_price, new.fee)?;
    let date = new.date.unwrap_or_else(|| clock.now());
    let notes = new
        .notes
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Initial purchase".to_string());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let account = get_account(&tx, owner, new.account_id)?;
    if account.r#type != AccountType::Investment {
        return Err(CoreError::invalid("Account is not an investment account"));
    }
    get_security(&tx, new.security_id)?;

    let cost = purchase_total(new.quantity, new.purchase_price, new.fee)?;
    let existing = tx
        .query_row(
            "SELECT id, quantity, cost_basis FROM investments WHERE account_id = ?1 AND security_id = ?2",
            params![account.id, new.security_id],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, f64>(1)?, r.get::<_, i64>(2)?)),
        )
        .optional()?;
    let investment_id = match existing {
        Some((id, quantity, cost_basis)) => {
            let cost_basis = cost_basis.checked_add(cost).ok_or_else(out_of_range)?;
            store_lot(&tx, id, quantity + new.quantity, cost_basis)?;
            id
        }
        None => {
            tx.execute(
                "INSERT INTO investments(account_id, security_id, quantity, cost_basis, wallet_address)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![account.id, new.security_id, new.quantity, cost, new.wallet_address],
            )?;
            tx.last_insert_rowid()
        }
    };

    let mut buy = event(investment_id, InvestmentTransactionType::Buy, date, notes);
    buy.quantity = new.quantity;
    buy.price_per_unit = new.purchase_price;
    buy.total_amount = cost;
    buy.fee = new.fee;
    insert_event(&tx, buy)?;

    let investment = get_investment(&tx, owner, investment_id)?;
    tx.commit()?;

    tracing::info!(
        investment_id,
        account_id = account.id,
        security_id = new.security_id,
        cost_basis = investment.cost_basis,
        "holding opened"
    );
    Ok(investment)
}

pub fn record_buy(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    investment_id: i64,
    trade: Trade,
) -> Result<InvestmentTransaction> {
    validate_trade(trade.quantity, trade.price_per_unit, trade.fee)?;
    let date = trade.date.unwrap_or_else(|| clock.now());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let holding = get_investment(&tx, owner, investment_id)?;
    let total = purchase_total(trade.quantity, trade.price_per_unit, trade.fee)?;
    let cost_basis = holding.cost_basis.checked_add(total).ok_or_else(out_of_range)?;

    let mut buy = event(holding.id, InvestmentTransactionType::Buy, date, trade.notes);
    buy.quantity = trade.quantity;
    buy.price_per_unit = trade.price_per_unit;
    buy.total_amount = total;
    buy.fee = trade.fee;
    let buy = insert_event(&tx, buy)?;
    store_lot(&tx, holding.id, holding.quantity + trade.quantity, cost_basis)?;
    tx.commit()?;

    tracing::info!(investment_id, quantity = trade.quantity, total, "buy recorded");
    Ok(buy)
}

pub fn record_sell(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    investment_id: i64,
    trade: Trade,
) -> Result<InvestmentTransaction> {
    validate_trade(trade.quantity, trade.price_per_unit, trade.fee)?;
    let date = trade.date.unwrap_or_else(|| clock.now());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let holding = get_investment(&tx, owner, investment_id)?;
    let outcome = compute_sell(
        holding.quantity,
        holding.cost_basis,
        trade.quantity,
        trade.price_per_unit,
        trade.fee,
    )?;

    let mut sell = event(holding.id, InvestmentTransactionType::Sell, date, trade.notes);
    sell.quantity = trade.quantity;
    sell.price_per_unit = trade.price_per_unit;
    sell.total_amount = outcome.total;
    sell.fee = trade.fee;
    sell.realized_gain = Some(outcome.realized_gain);
    let sell = insert_event(&tx, sell)?;
    store_lot(&tx, holding.id, outcome.quantity, outcome.cost_basis)?;
    tx.commit()?;

    tracing::info!(
        investment_id,
        quantity = trade.quantity,
        realized_gain = outcome.realized_gain,
        "sell recorded"
    );
    Ok(sell)
}

/// Cash event only; the lot is untouched.
pub fn record_dividend(
    conn: &Connection,
    clock: &dyn Clock,
    owner: i64,
    investment_id: i64,
    dividend: Dividend,
) -> Result<InvestmentTransaction> {
    if dividend.amount <= 0 {
        return Err(CoreError::invalid("dividend amount must be greater than zero"));
    }
    let holding = get_investment(conn, owner, investment_id)?;
    let kind = match dividend.dividend_type.trim() {
        "" => "cash".to_string(),
        other => other.to_lowercase(),
    };

    let mut div = event(
        holding.id,
        InvestmentTransactionType::Dividend,
        dividend.date.unwrap_or_else(|| clock.now()),
        dividend.notes,
    );
    div.total_amount = dividend.amount;
    div.dividend_type = Some(kind);
    let div = insert_event(conn, div)?;

    tracing::info!(investment_id, amount = dividend.amount, "dividend recorded");
    Ok(div)
}

/// Multiplies quantity by `split_ratio`; cost basis is conserved.
pub fn record_split(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    investment_id: i64,
    split_ratio: f64,
    date: Option<DateTime<Utc>>,
    notes: String,
) -> Result<InvestmentTransaction> {
    if !split_ratio.is_finite() || split_ratio <= 0.0 {
        return Err(CoreError::invalid("split ratio must be greater than zero"));
    }
    let date = date.unwrap_or_else(|| clock.now());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let holding = get_investment(&tx, owner, investment_id)?;
    let quantity = holding.quantity * split_ratio;
    if !quantity.is_finite() {
        return Err(CoreError::invalid("split ratio is out of range"));
    }
    let mut split = event(holding.id, InvestmentTransactionType::Split, date, notes);
    split.quantity = holding.quantity;
    split.split_ratio = Some(split_ratio);
    let split = insert_event(&tx, split)?;
    store_lot(&tx, holding.id, quantity, holding.cost_basis)?;
    tx.commit()?;

    tracing::info!(investment_id, split_ratio, "split recorded");
    Ok(split)
}

/// Lot events of an owned holding, newest first.
pub fn list_investment_transactions(
    conn: &Connection,
    owner: i64,
    investment_id: i64,
) -> Result<Vec<InvestmentTransaction>> {
    get_investment(conn, owner, investment_id)?;
    let sql = format!(
        "SELECT {} FROM investment_transactions WHERE investment_id = ?1 ORDER BY date DESC, id DESC",
        InvestmentTransaction::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![investment_id], InvestmentTransaction::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    #[serde(flatten)]
    pub investment: Investment,
    pub symbol: String,
    pub asset_type: AssetType,
    /// `None` when no price has been recorded.
    pub current_price: Option<i64>,
    pub current_value: i64,
    pub gain_loss: i64,
}

/// Holdings in the owner's active investment accounts, optionally narrowed
/// to one account.
pub fn list_holdings(
    conn: &Connection,
    prices: &dyn PriceSource,
    owner: i64,
    account_id: Option<i64>,
) -> Result<Vec<Holding>> {
    if let Some(id) = account_id {
        get_account(conn, owner, id)?;
    }
    let sql = format!(
        "SELECT {}, s.symbol, s.asset_type
         FROM investments i
         JOIN accounts a ON a.id = i.account_id
         JOIN securities s ON s.id = i.security_id
         WHERE a.user_id = ?1 AND a.type = 'investment' AND a.is_active = 1
           AND (?2 IS NULL OR i.account_id = ?2)
         ORDER BY s.symbol, i.id",
        Investment::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner, account_id], |r| {
        Ok((
            Investment::from_row(r)?,
            r.get::<_, String>(6)?,
            r.get::<_, AssetType>(7)?,
        ))
    })?;
    let mut raw = Vec::new();
    for row in rows {
        raw.push(row?);
    }

    let ids: Vec<i64> = raw.iter().map(|(i, _, _)| i.security_id).collect();
    let latest = prices.latest_prices(&ids)?;
    Ok(raw
        .into_iter()
        .map(|(investment, symbol, asset_type)| {
            let current_price = latest.get(&investment.security_id).copied();
            if current_price.is_none() {
                tracing::debug!(security_id = investment.security_id, "no price recorded");
            }
            let current_value = holding_value(investment.quantity, current_price.unwrap_or(0));
            Holding {
                gain_loss: current_value - investment.cost_basis,
                investment,
                symbol,
                asset_type,
                current_price,
                current_value,
            }
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub value: i64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PortfolioSummary {
    pub total_value: i64,
    pub total_cost_basis: i64,
    pub total_gain_loss: i64,
    pub gain_loss_pct: Decimal,
    pub holdings_by_type: BTreeMap<AssetType, TypeSummary>,
}

/// Value, cost basis and gain across every active investment account.
pub fn get_portfolio(
    conn: &Connection,
    prices: &dyn PriceSource,
    owner: i64,
) -> Result<PortfolioSummary> {
    let mut summary = PortfolioSummary::default();
    for h in list_holdings(conn, prices, owner, None)? {
        summary.total_value += h.current_value;
        summary.total_cost_basis += h.investment.cost_basis;
        let by_type = summary.holdings_by_type.entry(h.asset_type).or_default();
        by_type.value += h.current_value;
        by_type.count += 1;
    }
    summary.total_gain_loss = summary.total_value - summary.total_cost_basis;
    summary.gain_loss_pct = percentage(summary.total_gain_loss, summary.total_cost_basis);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_total_truncates_before_adding_fee() {
        assert_eq!(purchase_total(10.0, 10_000, 0).unwrap(), 100_000);
        assert_eq!(purchase_total(0.333, 1000, 5).unwrap(), 338);
    }

    #[test]
    fn amounts_beyond_i64_are_rejected() {
        assert_eq!(purchase_total(1e19, 100, 1).unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(purchase_total(1.0, i64::MAX, 1).unwrap_err().code(), "INVALID_INPUT");
        assert_eq!(
            compute_sell(2e18, 100, 2e18, 100, 0).unwrap_err().code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            compute_sell(1.0, 0, 1.0, 0, i64::MAX).unwrap().realized_gain,
            -i64::MAX
        );
        assert_eq!(
            compute_sell(1.0, 100, 1.0, 0, i64::MAX).map(|o| o.realized_gain).unwrap_err().code(),
            "INVALID_INPUT"
        );
    }

    #[test]
    fn sale_within_rounding_of_the_holding_closes_it() {
        let held = 0.7 + 0.2;
        assert!(held < 0.9);
        let out = compute_sell(held, 9_000, 0.9, 10_000, 0).unwrap();
        assert_eq!(out.quantity, 0.0);
        assert_eq!(out.cost_basis, 0);
        assert_eq!(out.cost_basis_reduction, 9_000);
    }

    #[test]
    fn partial_sell_reduces_basis_proportionally() {
        let out = compute_sell(10.0, 100_000, 4.0, 12_000, 300).unwrap();
        assert_eq!(out.total, 47_700);
        assert_eq!(out.cost_basis_reduction, 40_000);
        assert_eq!(out.realized_gain, 7_700);
        assert_eq!(out.quantity, 6.0);
        assert_eq!(out.cost_basis, 60_000);
    }

    #[test]
    fn selling_everything_closes_the_lot_exactly() {
        let out = compute_sell(3.0, 10_001, 3.0, 5_000, 0).unwrap();
        assert_eq!(out.quantity, 0.0);
        assert_eq!(out.cost_basis, 0);
        assert_eq!(out.realized_gain, 15_000 - 10_001);
    }

    #[test]
    fn overselling_is_rejected() {
        let err = compute_sell(1.0, 100, 1.5, 10, 0).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_SHARES");
    }

    #[test]
    fn trade_validation() {
        assert!(validate_trade(0.0, 1, 0).is_err());
        assert!(validate_trade(f64::NAN, 1, 0).is_err());
        assert!(validate_trade(1.0, -1, 0).is_err());
        assert!(validate_trade(1.0, 1, -1).is_err());
        assert!(validate_trade(0.5, 0, 0).is_ok());
    }
}
