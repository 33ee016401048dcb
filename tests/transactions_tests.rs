// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, TimeZone, Utc};
use kuberan::clock::FixedClock;
use kuberan::db;
use kuberan::engine::accounts::{AccountDetails, NewAccount, create_account};
use kuberan::engine::categories::create_category;
use kuberan::engine::transactions::{
    NewTransaction, TransactionFilter, TransactionUpdate, create_transaction, delete_transaction,
    get_transaction, list_account_transactions, list_transactions, update_transaction,
};
use kuberan::models::{AccountType, CategoryType, TransactionType};
use kuberan::CoreError;
use rusqlite::{Connection, params};

const OWNER: i64 = 1;

fn at(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap()
}

fn clock() -> FixedClock {
    FixedClock(at(15))
}

fn account(conn: &mut Connection, owner: i64, name: &str, details: AccountDetails) -> i64 {
    create_account(
        conn,
        &clock(),
        owner,
        NewAccount {
            name: name.into(),
            description: String::new(),
            currency: None,
            details,
        },
    )
    .unwrap()
    .id
}

fn cash(conn: &mut Connection, owner: i64, opening: i64) -> i64 {
    account(conn, owner, "Wallet", AccountDetails::Cash { initial_balance: opening })
}

fn balance(conn: &Connection, id: i64) -> i64 {
    conn.query_row("SELECT balance FROM accounts WHERE id = ?1", params![id], |r| r.get(0))
        .unwrap()
}

fn entry(account_id: i64, kind: TransactionType, amount: i64, day: u32) -> NewTransaction {
    NewTransaction {
        account_id,
        category_id: None,
        r#type: kind,
        amount,
        description: String::new(),
        date: Some(at(day)),
    }
}

#[test]
fn opening_balance_is_recorded_once() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 10_000);
    assert_eq!(balance(&conn, id), 10_000);

    let rows = list_account_transactions(&conn, OWNER, id, &TransactionFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "Initial balance");
    assert_eq!(rows[0].r#type, TransactionType::Income);
}

#[test]
fn expense_edit_and_delete_round_trip_the_balance() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 10_000);

    let tx = create_transaction(&mut conn, &clock(), OWNER, entry(id, TransactionType::Expense, 3_000, 2)).unwrap();
    assert_eq!(balance(&conn, id), 7_000);

    let update = TransactionUpdate {
        amount: Some(5_000),
        ..Default::default()
    };
    update_transaction(&mut conn, OWNER, tx.id, update).unwrap();
    assert_eq!(balance(&conn, id), 5_000);

    delete_transaction(&mut conn, OWNER, tx.id).unwrap();
    assert_eq!(balance(&conn, id), 10_000);
    assert!(matches!(
        get_transaction(&conn, OWNER, tx.id),
        Err(CoreError::TransactionNotFound)
    ));
}

#[test]
fn update_can_flip_type_and_move_accounts() {
    let mut conn = db::open_in_memory().unwrap();
    let a = cash(&mut conn, OWNER, 10_000);
    let b = cash(&mut conn, OWNER, 0);

    let tx = create_transaction(&mut conn, &clock(), OWNER, entry(a, TransactionType::Expense, 2_000, 3)).unwrap();
    let updated = update_transaction(
        &mut conn,
        OWNER,
        tx.id,
        TransactionUpdate {
            account_id: Some(b),
            r#type: Some(TransactionType::Income),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(updated.account_id, b);
    assert_eq!(balance(&conn, a), 10_000);
    assert_eq!(balance(&conn, b), 2_000);
}

#[test]
fn credit_card_balance_tracks_amount_owed() {
    let mut conn = db::open_in_memory().unwrap();
    let card = account(
        &mut conn,
        OWNER,
        "Visa",
        AccountDetails::CreditCard {
            credit_limit: 500_000,
            interest_rate: Some(19.9),
            due_date: None,
        },
    );

    create_transaction(&mut conn, &clock(), OWNER, entry(card, TransactionType::Expense, 4_000, 4)).unwrap();
    assert_eq!(balance(&conn, card), 4_000);
    let payment =
        create_transaction(&mut conn, &clock(), OWNER, entry(card, TransactionType::Income, 1_500, 5)).unwrap();
    assert_eq!(balance(&conn, card), 2_500);

    delete_transaction(&mut conn, OWNER, payment.id).unwrap();
    assert_eq!(balance(&conn, card), 4_000);
}

#[test]
fn invalid_creates_leave_no_trace() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 1_000);

    for (kind, amount) in [
        (TransactionType::Expense, 0),
        (TransactionType::Income, -5),
        (TransactionType::Transfer, 100),
        (TransactionType::Investment, 100),
    ] {
        let err = create_transaction(&mut conn, &clock(), OWNER, entry(id, kind, amount, 6)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)), "{kind} {amount}");
    }
    let err = create_transaction(&mut conn, &clock(), OWNER, entry(0, TransactionType::Expense, 1, 6)).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));

    assert_eq!(balance(&conn, id), 1_000);
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0)).unwrap();
    assert_eq!(n, 1);
}

#[test]
fn date_defaults_to_clock() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 0);
    let mut new = entry(id, TransactionType::Income, 100, 1);
    new.date = None;
    let tx = create_transaction(&mut conn, &clock(), OWNER, new).unwrap();
    assert_eq!(tx.date, at(15));
}

#[test]
fn other_owners_records_look_missing() {
    let mut conn = db::open_in_memory().unwrap();
    let mine = cash(&mut conn, OWNER, 5_000);
    let theirs = cash(&mut conn, 2, 5_000);
    let their_category = create_category(&conn, 2, "Food", CategoryType::Expense).unwrap();

    let err = create_transaction(&mut conn, &clock(), OWNER, entry(theirs, TransactionType::Expense, 10, 7)).unwrap_err();
    assert!(matches!(err, CoreError::AccountNotFound));

    let mut new = entry(mine, TransactionType::Expense, 10, 7);
    new.category_id = Some(their_category.id);
    let err = create_transaction(&mut conn, &clock(), OWNER, new).unwrap_err();
    assert!(matches!(err, CoreError::CategoryNotFound));

    let tx = create_transaction(&mut conn, &clock(), 2, entry(theirs, TransactionType::Expense, 10, 7)).unwrap();
    assert!(matches!(
        delete_transaction(&mut conn, OWNER, tx.id),
        Err(CoreError::TransactionNotFound)
    ));
    assert_eq!(balance(&conn, mine), 5_000);
    assert_eq!(balance(&conn, theirs), 4_990);
}

#[test]
fn type_changes_to_transfer_are_rejected_without_side_effects() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 10_000);
    let tx = create_transaction(&mut conn, &clock(), OWNER, entry(id, TransactionType::Expense, 1_000, 8)).unwrap();

    let err = update_transaction(
        &mut conn,
        OWNER,
        tx.id,
        TransactionUpdate {
            r#type: Some(TransactionType::Transfer),
            amount: Some(9_000),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTypeChange));
    assert_eq!(balance(&conn, id), 9_000);
    assert_eq!(get_transaction(&conn, OWNER, tx.id).unwrap().amount, 1_000);
}

#[test]
fn category_can_be_set_and_cleared() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 0);
    let food = create_category(&conn, OWNER, "Food", CategoryType::Expense).unwrap();
    let tx = create_transaction(&mut conn, &clock(), OWNER, entry(id, TransactionType::Income, 500, 9)).unwrap();

    let set = TransactionUpdate {
        category_id: Some(Some(food.id)),
        ..Default::default()
    };
    assert_eq!(update_transaction(&mut conn, OWNER, tx.id, set).unwrap().category_id, Some(food.id));

    let clear = TransactionUpdate {
        category_id: Some(None),
        ..Default::default()
    };
    assert_eq!(update_transaction(&mut conn, OWNER, tx.id, clear).unwrap().category_id, None);
    assert_eq!(balance(&conn, id), 500);
}

#[test]
fn filters_combine_and_order_newest_first() {
    let mut conn = db::open_in_memory().unwrap();
    let a = cash(&mut conn, OWNER, 0);
    let b = cash(&mut conn, OWNER, 0);
    let food = create_category(&conn, OWNER, "Food", CategoryType::Expense).unwrap();

    for (acct, kind, amount, day) in [
        (a, TransactionType::Income, 50_000, 1),
        (a, TransactionType::Expense, 1_200, 2),
        (a, TransactionType::Expense, 800, 5),
        (b, TransactionType::Expense, 3_000, 6),
        (a, TransactionType::Expense, 20_000, 9),
    ] {
        let mut new = entry(acct, kind, amount, day);
        if kind == TransactionType::Expense {
            new.category_id = Some(food.id);
        }
        create_transaction(&mut conn, &clock(), OWNER, new).unwrap();
    }

    let filter = TransactionFilter {
        r#type: Some(TransactionType::Expense),
        min_amount: Some(500),
        max_amount: Some(5_000),
        ..Default::default()
    };
    let rows = list_transactions(&conn, OWNER, &filter).unwrap();
    let amounts: Vec<i64> = rows.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![3_000, 800, 1_200]);

    let filter = TransactionFilter {
        from: Some(at(2)),
        to: Some(at(6)),
        account_id: Some(a),
        category_id: Some(food.id),
        ..Default::default()
    };
    let rows = list_transactions(&conn, OWNER, &filter).unwrap();
    let amounts: Vec<i64> = rows.iter().map(|t| t.amount).collect();
    assert_eq!(amounts, vec![800, 1_200]);

    let filter = TransactionFilter {
        limit: Some(2),
        ..Default::default()
    };
    let rows = list_transactions(&conn, OWNER, &filter).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, at(9));
}

#[test]
fn malformed_filters_are_invalid_input() {
    let conn = db::open_in_memory().unwrap();
    let backwards = TransactionFilter {
        from: Some(at(10)),
        to: Some(at(1)),
        ..Default::default()
    };
    assert!(matches!(
        list_transactions(&conn, OWNER, &backwards),
        Err(CoreError::InvalidInput(_))
    ));
    let inverted = TransactionFilter {
        min_amount: Some(10),
        max_amount: Some(1),
        ..Default::default()
    };
    assert!(matches!(
        list_transactions(&conn, OWNER, &inverted),
        Err(CoreError::InvalidInput(_))
    ));
}

#[test]
fn debt_account_type_is_recorded() {
    let mut conn = db::open_in_memory().unwrap();
    let id = account(
        &mut conn,
        OWNER,
        "Car loan",
        AccountDetails::Debt {
            balance: 700_000,
            interest_rate: Some(4.5),
        },
    );
    let kind: AccountType = conn
        .query_row("SELECT type FROM accounts WHERE id = ?1", params![id], |r| r.get(0))
        .unwrap();
    assert_eq!(kind, AccountType::Debt);
    assert_eq!(balance(&conn, id), 700_000);
}

#[test]
fn balance_overflow_is_rejected_and_the_account_stays_usable() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 100);

    let err = create_transaction(&mut conn, &clock(), OWNER, entry(id, TransactionType::Income, i64::MAX, 2))
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
    assert_eq!(balance(&conn, id), 100);
    let kind: String = conn
        .query_row("SELECT typeof(balance) FROM accounts WHERE id = ?1", params![id], |r| r.get(0))
        .unwrap();
    assert_eq!(kind, "integer");
    let rows = list_account_transactions(&conn, OWNER, id, &TransactionFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);

    create_transaction(&mut conn, &clock(), OWNER, entry(id, TransactionType::Expense, 1, 3)).unwrap();
    assert_eq!(balance(&conn, id), 99);
}

#[test]
fn failure_after_reversal_restores_the_balance() {
    let mut conn = db::open_in_memory().unwrap();
    let id = cash(&mut conn, OWNER, 10_000);
    let tx = create_transaction(&mut conn, &clock(), OWNER, entry(id, TransactionType::Expense, 3_000, 2)).unwrap();
    assert_eq!(balance(&conn, id), 7_000);

    // The row rewrite fails after the old effect has been reversed.
    conn.execute_batch(
        "CREATE TRIGGER block_rewrite BEFORE UPDATE ON transactions
         BEGIN SELECT RAISE(ABORT, 'rewrite blocked'); END;",
    )
    .unwrap();
    let update = TransactionUpdate {
        amount: Some(5_000),
        ..Default::default()
    };
    let err = update_transaction(&mut conn, OWNER, tx.id, update).unwrap_err();
    assert_eq!(err.code(), "INTERNAL_ERROR");
    assert_eq!(balance(&conn, id), 7_000);
    assert_eq!(get_transaction(&conn, OWNER, tx.id).unwrap().amount, 3_000);
}
