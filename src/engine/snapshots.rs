// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Point-in-time net worth per owner.

use crate::engine::accounts::investment_account_values;
use crate::errors::Result;
use crate::models::{AccountType, PortfolioSnapshot};
use crate::prices::PriceSource;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

/// Composes the owner's net worth from active accounts. Investment accounts
/// count at market value; debt and credit-card balances are subtracted.
///
/// All reads run in one deferred transaction so the figures come from a
/// single committed state.
pub fn compute_snapshot(
    conn: &Connection,
    prices: &dyn PriceSource,
    owner: i64,
    recorded_at: DateTime<Utc>,
) -> Result<PortfolioSnapshot> {
    let tx = conn.unchecked_transaction()?;
    let snap = tally(&tx, prices, owner, recorded_at)?;
    tx.commit()?;
    Ok(snap)
}

fn tally(
    conn: &Connection,
    prices: &dyn PriceSource,
    owner: i64,
    recorded_at: DateTime<Utc>,
) -> Result<PortfolioSnapshot> {
    let investment_value: i64 = investment_account_values(conn, prices, owner)?
        .values()
        .sum();
    let mut stmt = conn.prepare(
        "SELECT type, COALESCE(SUM(balance), 0) FROM accounts
         WHERE user_id = ?1 AND is_active = 1
         GROUP BY type",
    )?;
    let rows = stmt.query_map(params![owner], |r| {
        Ok((r.get::<_, AccountType>(0)?, r.get::<_, i64>(1)?))
    })?;
    let (mut cash_balance, mut debt_balance) = (0, 0);
    for row in rows {
        match row? {
            (AccountType::Cash, sum) => cash_balance += sum,
            (AccountType::Debt | AccountType::CreditCard, sum) => debt_balance += sum,
            (AccountType::Investment, _) => {}
        }
    }

    Ok(PortfolioSnapshot {
        user_id: owner,
        recorded_at,
        total_net_worth: cash_balance + investment_value - debt_balance,
        cash_balance,
        investment_value,
        debt_balance,
    })
}

/// Computes and stores one owner's snapshot, replacing any row already
/// recorded for the same instant. The reads and the write share one
/// immediate transaction.
pub fn record_snapshot(
    conn: &Connection,
    prices: &dyn PriceSource,
    owner: i64,
    recorded_at: DateTime<Utc>,
) -> Result<PortfolioSnapshot> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let snap = tally(&tx, prices, owner, recorded_at)?;
    tx.execute(
        "INSERT INTO portfolio_snapshots(user_id, recorded_at, total_net_worth, cash_balance, investment_value, debt_balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id, recorded_at) DO UPDATE SET
             total_net_worth = excluded.total_net_worth,
             cash_balance = excluded.cash_balance,
             investment_value = excluded.investment_value,
             debt_balance = excluded.debt_balance",
        params![
            snap.user_id,
            snap.recorded_at,
            snap.total_net_worth,
            snap.cash_balance,
            snap.investment_value,
            snap.debt_balance
        ],
    )?;
    tx.commit()?;
    Ok(snap)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotBatchReport {
    pub processed: usize,
    pub failed: Vec<i64>,
}

/// Records a snapshot at `recorded_at` for every owner with an active
/// account. An owner that fails is logged and skipped; owners already
/// written stay written.
pub fn record_snapshots(
    conn: &Connection,
    prices: &dyn PriceSource,
    recorded_at: DateTime<Utc>,
) -> Result<SnapshotBatchReport> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT user_id FROM accounts WHERE is_active = 1 ORDER BY user_id",
    )?;
    let rows = stmt.query_map([], |r| r.get::<_, i64>(0))?;
    let mut owners = Vec::new();
    for row in rows {
        owners.push(row?);
    }

    let mut report = SnapshotBatchReport::default();
    for owner in owners {
        match record_snapshot(conn, prices, owner, recorded_at) {
            Ok(_) => report.processed += 1,
            Err(err) => {
                tracing::warn!(owner, error = %err, "snapshot failed; continuing");
                report.failed.push(owner);
            }
        }
    }
    tracing::info!(
        processed = report.processed,
        failed = report.failed.len(),
        %recorded_at,
        "snapshot batch finished"
    );
    Ok(report)
}

/// Owner's snapshots within the optional bounds, newest first.
pub fn list_snapshots(
    conn: &Connection,
    owner: i64,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<PortfolioSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, recorded_at, total_net_worth, cash_balance, investment_value, debt_balance
         FROM portfolio_snapshots
         WHERE user_id = ?1
           AND (?2 IS NULL OR recorded_at >= ?2)
           AND (?3 IS NULL OR recorded_at <= ?3)
         ORDER BY recorded_at DESC",
    )?;
    let rows = stmt.query_map(params![owner, from, to], |r| {
        Ok(PortfolioSnapshot {
            user_id: r.get(0)?,
            recorded_at: r.get(1)?,
            total_net_worth: r.get(2)?,
            cash_balance: r.get(3)?,
            investment_value: r.get(4)?,
            debt_balance: r.get(5)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
