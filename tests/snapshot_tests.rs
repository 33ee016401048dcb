// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, TimeZone, Utc};
use kuberan::clock::FixedClock;
use kuberan::db;
use kuberan::engine::accounts::{AccountDetails, AccountUpdate, NewAccount, create_account, update_account};
use kuberan::engine::investments::{NewInvestment, add_investment};
use kuberan::engine::securities::{NewSecurity, create_security};
use kuberan::engine::snapshots::{compute_snapshot, list_snapshots, record_snapshot, record_snapshots};
use kuberan::engine::transactions::{NewTransaction, create_transaction};
use kuberan::models::{AssetType, TransactionType};
use kuberan::prices::{FixedPrices, PriceSource};
use kuberan::CoreError;
use rusqlite::Connection;
use std::collections::HashMap;

fn ts(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, d, 0, 0, 0).unwrap()
}

fn clock() -> FixedClock {
    FixedClock(ts(1))
}

fn open(conn: &mut Connection, owner: i64, details: AccountDetails) -> i64 {
    create_account(
        conn,
        &clock(),
        owner,
        NewAccount {
            name: "acct".into(),
            description: String::new(),
            currency: None,
            details,
        },
    )
    .unwrap()
    .id
}

fn security(conn: &Connection, symbol: &str) -> i64 {
    create_security(
        conn,
        NewSecurity {
            symbol: symbol.into(),
            name: symbol.into(),
            asset_type: AssetType::Etf,
            currency: None,
            exchange: None,
        },
    )
    .unwrap()
    .id
}

fn holding(conn: &mut Connection, owner: i64, account_id: i64, security_id: i64, quantity: f64) {
    add_investment(
        conn,
        &clock(),
        owner,
        NewInvestment {
            account_id,
            security_id,
            quantity,
            purchase_price: 1_000,
            fee: 0,
            wallet_address: None,
            date: None,
            notes: None,
        },
    )
    .unwrap();
}

/// cash 1_500_000, investments 200_000, debt 500_000 + card 200_000
fn seed_owner(conn: &mut Connection, owner: i64, sec: i64) {
    open(conn, owner, AccountDetails::Cash { initial_balance: 1_000_000 });
    open(conn, owner, AccountDetails::Cash { initial_balance: 500_000 });
    let brokerage = open(
        conn,
        owner,
        AccountDetails::Investment {
            broker: None,
            account_number: None,
        },
    );
    holding(conn, owner, brokerage, sec, 10.0);
    open(
        conn,
        owner,
        AccountDetails::Debt {
            balance: 500_000,
            interest_rate: None,
        },
    );
    let card = open(
        conn,
        owner,
        AccountDetails::CreditCard {
            credit_limit: 1_000_000,
            interest_rate: None,
            due_date: None,
        },
    );
    create_transaction(
        conn,
        &clock(),
        owner,
        NewTransaction {
            account_id: card,
            category_id: None,
            r#type: TransactionType::Expense,
            amount: 200_000,
            description: "laptop".into(),
            date: None,
        },
    )
    .unwrap();
}

fn snapshot_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM portfolio_snapshots", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn net_worth_is_cash_plus_investments_minus_debt() {
    let mut conn = db::open_in_memory().unwrap();
    let sec = security(&conn, "VTI");
    seed_owner(&mut conn, 1, sec);
    let prices = FixedPrices::new().with(sec, 20_000);

    let snap = compute_snapshot(&conn, &prices, 1, ts(2)).unwrap();
    assert_eq!(snap.cash_balance, 1_500_000);
    assert_eq!(snap.investment_value, 200_000);
    assert_eq!(snap.debt_balance, 700_000);
    assert_eq!(snap.total_net_worth, 1_000_000);
}

#[test]
fn recording_twice_at_same_instant_keeps_one_row() {
    let mut conn = db::open_in_memory().unwrap();
    let sec = security(&conn, "VTI");
    seed_owner(&mut conn, 1, sec);
    let prices = FixedPrices::new().with(sec, 20_000);

    let first = record_snapshots(&conn, &prices, ts(2)).unwrap();
    let second = record_snapshots(&conn, &prices, ts(2)).unwrap();
    assert_eq!(first.processed, 1);
    assert_eq!(second.processed, 1);
    assert_eq!(snapshot_rows(&conn), 1);
    assert_eq!(list_snapshots(&conn, 1, None, None).unwrap()[0].total_net_worth, 1_000_000);

    // recomputation replaces the stored values
    let richer = FixedPrices::new().with(sec, 30_000);
    record_snapshot(&conn, &richer, 1, ts(2)).unwrap();
    assert_eq!(snapshot_rows(&conn), 1);
    let stored = list_snapshots(&conn, 1, None, None).unwrap();
    assert_eq!(stored[0].investment_value, 300_000);
    assert_eq!(stored[0].total_net_worth, 1_100_000);
}

#[test]
fn inactive_accounts_are_excluded() {
    let mut conn = db::open_in_memory().unwrap();
    let keep = open(&mut conn, 1, AccountDetails::Cash { initial_balance: 1_000 });
    let closed = open(&mut conn, 1, AccountDetails::Cash { initial_balance: 9_000 });
    update_account(
        &mut conn,
        1,
        closed,
        AccountUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .unwrap();

    let snap = compute_snapshot(&conn, &FixedPrices::new(), 1, ts(3)).unwrap();
    assert_eq!(snap.cash_balance, 1_000);
    assert_eq!(snap.total_net_worth, 1_000);
    assert!(keep > 0);
}

struct FailFor(i64);

impl PriceSource for FailFor {
    fn latest_prices(&self, security_ids: &[i64]) -> kuberan::Result<HashMap<i64, i64>> {
        if security_ids.contains(&self.0) {
            return Err(CoreError::InternalServer(rusqlite::Error::InvalidQuery));
        }
        Ok(security_ids.iter().map(|id| (*id, 100)).collect())
    }
}

#[test]
fn batch_continues_past_a_failing_owner() {
    let mut conn = db::open_in_memory().unwrap();
    let good = security(&conn, "GOOD");
    let bad = security(&conn, "BAD");
    seed_owner(&mut conn, 1, good);
    seed_owner(&mut conn, 2, bad);
    seed_owner(&mut conn, 3, good);

    let report = record_snapshots(&conn, &FailFor(bad), ts(4)).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, vec![2]);
    assert_eq!(snapshot_rows(&conn), 2);
    assert!(list_snapshots(&conn, 2, None, None).unwrap().is_empty());
}

#[test]
fn list_is_owner_scoped_newest_first_and_bounded() {
    let mut conn = db::open_in_memory().unwrap();
    open(&mut conn, 1, AccountDetails::Cash { initial_balance: 100 });
    open(&mut conn, 2, AccountDetails::Cash { initial_balance: 200 });
    for d in [5, 6, 7] {
        record_snapshots(&conn, &FixedPrices::new(), ts(d)).unwrap();
    }

    let all = list_snapshots(&conn, 1, None, None).unwrap();
    let when: Vec<_> = all.iter().map(|s| s.recorded_at).collect();
    assert_eq!(when, vec![ts(7), ts(6), ts(5)]);
    assert!(all.iter().all(|s| s.user_id == 1 && s.cash_balance == 100));

    let bounded = list_snapshots(&conn, 2, Some(ts(6)), Some(ts(6))).unwrap();
    assert_eq!(bounded.len(), 1);
    assert_eq!(bounded[0].cash_balance, 200);
}

/// Credits a cash account through a second connection while prices are
/// being looked up, i.e. in the middle of a snapshot.
struct CreditDuringLookup {
    other: Connection,
    account_id: i64,
}

impl PriceSource for CreditDuringLookup {
    fn latest_prices(&self, security_ids: &[i64]) -> kuberan::Result<HashMap<i64, i64>> {
        self.other.execute(
            "UPDATE accounts SET balance = balance + 1000 WHERE id = ?1",
            [self.account_id],
        )?;
        Ok(security_ids.iter().map(|id| (*id, 100)).collect())
    }
}

#[test]
fn snapshot_reads_one_committed_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kuberan.db");
    let mut conn = db::open_at(&path).unwrap();
    let mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))
        .unwrap();
    assert_eq!(mode, "wal");
    let wallet = open(&mut conn, 1, AccountDetails::Cash { initial_balance: 5_000 });

    let prices = CreditDuringLookup {
        other: db::open_at(&path).unwrap(),
        account_id: wallet,
    };
    let snap = compute_snapshot(&conn, &prices, 1, ts(8)).unwrap();
    assert_eq!(snap.cash_balance, 5_000);

    // The concurrent credit is committed and visible to the next snapshot.
    let after = compute_snapshot(&conn, &FixedPrices::new(), 1, ts(9)).unwrap();
    assert_eq!(after.cash_balance, 6_000);
}
