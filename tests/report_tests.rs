// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use kuberan::clock::FixedClock;
use kuberan::db;
use kuberan::engine::accounts::{AccountDetails, NewAccount, create_account};
use kuberan::engine::aggregation::{daily_spending, monthly_summary, spending_by_category};
use kuberan::engine::categories::create_category;
use kuberan::engine::transactions::{NewTransaction, create_transaction};
use kuberan::models::{CategoryType, TransactionType};
use kuberan::CoreError;
use rusqlite::Connection;

const OWNER: i64 = 1;

fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 8, 30, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn clock() -> FixedClock {
    FixedClock(ts(2025, 3, 15))
}

fn setup() -> (Connection, i64) {
    let mut conn = db::open_in_memory().unwrap();
    let id = create_account(
        &mut conn,
        &clock(),
        OWNER,
        NewAccount {
            name: "Checking".into(),
            description: String::new(),
            currency: None,
            details: AccountDetails::Cash { initial_balance: 0 },
        },
    )
    .unwrap()
    .id;
    (conn, id)
}

fn record(
    conn: &mut Connection,
    account_id: i64,
    category_id: Option<i64>,
    kind: TransactionType,
    amount: i64,
    date: DateTime<Utc>,
) {
    create_transaction(
        conn,
        &clock(),
        OWNER,
        NewTransaction {
            account_id,
            category_id,
            r#type: kind,
            amount,
            description: String::new(),
            date: Some(date),
        },
    )
    .unwrap();
}

#[test]
fn spending_by_category_sorts_and_buckets_uncategorized() {
    let (mut conn, acct) = setup();
    let food = create_category(&conn, OWNER, "Food", CategoryType::Expense).unwrap().id;
    let rent = create_category(&conn, OWNER, "Rent", CategoryType::Expense).unwrap().id;

    record(&mut conn, acct, Some(food), TransactionType::Expense, 1_500, ts(2025, 3, 2));
    record(&mut conn, acct, Some(food), TransactionType::Expense, 2_500, ts(2025, 3, 9));
    record(&mut conn, acct, Some(rent), TransactionType::Expense, 120_000, ts(2025, 3, 1));
    record(&mut conn, acct, None, TransactionType::Expense, 700, ts(2025, 3, 3));
    record(&mut conn, acct, Some(food), TransactionType::Income, 99_999, ts(2025, 3, 4));
    record(&mut conn, acct, Some(food), TransactionType::Expense, 5_000, ts(2025, 4, 1));

    let report = spending_by_category(&conn, OWNER, ts(2025, 3, 1), ts(2025, 3, 31)).unwrap();
    let rows: Vec<(Option<i64>, &str, i64)> = report
        .items
        .iter()
        .map(|i| (i.category_id, i.category_name.as_str(), i.total))
        .collect();
    assert_eq!(
        rows,
        vec![
            (Some(rent), "Rent", 120_000),
            (Some(food), "Food", 4_000),
            (None, "Uncategorized", 700),
        ]
    );
    assert_eq!(report.total_spent, 124_700);

    let err = spending_by_category(&conn, OWNER, ts(2025, 3, 31), ts(2025, 3, 1)).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[test]
fn monthly_summary_has_exactly_n_chronological_months() {
    let (mut conn, acct) = setup();
    record(&mut conn, acct, None, TransactionType::Income, 300_000, ts(2025, 1, 25));
    record(&mut conn, acct, None, TransactionType::Expense, 80_000, ts(2025, 1, 28));
    record(&mut conn, acct, None, TransactionType::Expense, 10_000, ts(2025, 3, 1));
    record(&mut conn, acct, None, TransactionType::Income, 1, ts(2024, 9, 30));

    let months = monthly_summary(&conn, &clock(), OWNER, 4).unwrap();
    let labels: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(labels, vec!["2024-12", "2025-01", "2025-02", "2025-03"]);
    assert_eq!((months[0].income, months[0].expenses), (0, 0));
    assert_eq!((months[1].income, months[1].expenses, months[1].net), (300_000, 80_000, 220_000));
    assert_eq!((months[2].income, months[2].expenses), (0, 0));
    assert_eq!(months[3].expenses, 10_000);

    let one = monthly_summary(&conn, &clock(), OWNER, 1).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].month, "2025-03");

    assert!(matches!(
        monthly_summary(&conn, &clock(), OWNER, 0),
        Err(CoreError::InvalidInput(_))
    ));
}

#[test]
fn monthly_summary_spans_year_boundaries() {
    let (conn, _) = setup();
    let months = monthly_summary(&conn, &clock(), OWNER, 15).unwrap();
    assert_eq!(months.len(), 15);
    assert_eq!(months.first().unwrap().month, "2024-01");
    assert_eq!(months.last().unwrap().month, "2025-03");
}

#[test]
fn daily_spending_zero_fills_inclusive_range() {
    let (mut conn, acct) = setup();
    record(&mut conn, acct, None, TransactionType::Expense, 400, ts(2025, 2, 27));
    record(&mut conn, acct, None, TransactionType::Expense, 600, ts(2025, 2, 27));
    record(&mut conn, acct, None, TransactionType::Expense, 900, ts(2025, 3, 2));
    record(&mut conn, acct, None, TransactionType::Income, 5_000, ts(2025, 3, 1));
    record(&mut conn, acct, None, TransactionType::Expense, 50, ts(2025, 3, 3));

    let days = daily_spending(&conn, OWNER, date(2025, 2, 27), date(2025, 3, 2)).unwrap();
    let got: Vec<(NaiveDate, i64)> = days.iter().map(|d| (d.date, d.total)).collect();
    assert_eq!(
        got,
        vec![
            (date(2025, 2, 27), 1_000),
            (date(2025, 2, 28), 0),
            (date(2025, 3, 1), 0),
            (date(2025, 3, 2), 900),
        ]
    );

    let single = daily_spending(&conn, OWNER, date(2025, 3, 3), date(2025, 3, 3)).unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].total, 50);

    assert!(matches!(
        daily_spending(&conn, OWNER, date(2025, 3, 3), date(2025, 3, 2)),
        Err(CoreError::InvalidInput(_))
    ));
}
