// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Income, expense and transfer records and the balance effects they carry.
//!
//! Every write opens one immediate SQLite transaction covering the row change
//! and all balance deltas it implies, so a failure anywhere leaves both the
//! row and the balances as they were.

use crate::clock::Clock;
use crate::engine::accounts::{apply_delta, get_account, inverse};
use crate::engine::categories;
use crate::errors::{CoreError, Result, not_found_as};
use crate::models::{AccountType, Transaction, TransactionType};
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, TransactionBehavior, params, params_from_iter};

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub r#type: TransactionType,
    pub amount: i64,
    pub description: String,
    /// Defaults to the clock's now.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
}

/// Field changes for an income or expense row. `category_id: Some(None)`
/// clears the category.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub account_id: Option<i64>,
    pub category_id: Option<Option<i64>>,
    pub r#type: Option<TransactionType>,
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Optional predicates, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub r#type: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    pub account_id: Option<i64>,
    pub limit: Option<usize>,
}

fn ensure_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(CoreError::invalid("amount must be greater than zero"));
    }
    Ok(())
}

pub fn create_transaction(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    new: NewTransaction,
) -> Result<Transaction> {
    ensure_positive(new.amount)?;
    if new.account_id <= 0 {
        return Err(CoreError::invalid("account ID is required"));
    }
    match new.r#type {
        TransactionType::Income | TransactionType::Expense => {}
        TransactionType::Transfer => {
            return Err(CoreError::invalid("transfers must be created with a destination account"));
        }
        TransactionType::Investment => {
            return Err(CoreError::invalid("investment entries are recorded through holdings"));
        }
    }
    let date = new.date.unwrap_or_else(|| clock.now());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let account = get_account(&tx, owner, new.account_id)?;
    if let Some(category_id) = new.category_id {
        categories::ensure_owned(&tx, owner, category_id)?;
    }
    tx.execute(
        "INSERT INTO transactions(user_id, account_id, category_id, type, amount, description, date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            owner,
            account.id,
            new.category_id,
            new.r#type,
            new.amount,
            new.description,
            date
        ],
    )?;
    let id = tx.last_insert_rowid();
    let delta = apply_delta(&tx, &account, new.r#type, new.amount)?;
    let created = get_transaction(&tx, owner, id)?;
    tx.commit()?;

    tracing::info!(transaction_id = id, account_id = account.id, delta, "transaction created");
    Ok(created)
}

/// Moves `amount` between two accounts of the same owner as one row and two
/// balance effects. Only credit cards may go past zero on the source side.
pub fn create_transfer(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    new: NewTransfer,
) -> Result<Transaction> {
    if new.from_account_id == new.to_account_id {
        return Err(CoreError::SameAccountTransfer);
    }
    ensure_positive(new.amount)?;
    let date = new.date.unwrap_or_else(|| clock.now());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = get_account(&tx, owner, new.from_account_id)?;
    let to = get_account(&tx, owner, new.to_account_id)?;
    if from.r#type != AccountType::CreditCard && from.balance < new.amount {
        return Err(CoreError::InsufficientBalance);
    }

    tx.execute(
        "INSERT INTO transactions(user_id, account_id, to_account_id, type, amount, description, date)
         VALUES (?1, ?2, ?3, 'transfer', ?4, ?5, ?6)",
        params![owner, from.id, to.id, new.amount, new.description, date],
    )?;
    let id = tx.last_insert_rowid();
    apply_delta(&tx, &from, TransactionType::Expense, new.amount)?;
    apply_delta(&tx, &to, TransactionType::Income, new.amount)?;
    let created = get_transaction(&tx, owner, id)?;
    tx.commit()?;

    tracing::info!(
        transaction_id = id,
        from_account_id = from.id,
        to_account_id = to.id,
        amount = new.amount,
        "transfer created"
    );
    Ok(created)
}

/// Edits an income or expense row: undo the old effect on the old account,
/// rewrite the row, then apply the new effect to the (possibly different)
/// target account.
pub fn update_transaction(
    conn: &mut Connection,
    owner: i64,
    transaction_id: i64,
    update: TransactionUpdate,
) -> Result<Transaction> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut row = get_transaction(&tx, owner, transaction_id)?;
    if !row.r#type.is_editable() {
        return Err(CoreError::TransactionNotEditable);
    }
    if let Some(new_type) = update.r#type {
        if !new_type.is_editable() {
            return Err(CoreError::InvalidTypeChange);
        }
    }
    if let Some(amount) = update.amount {
        ensure_positive(amount)?;
    }

    let old_account = get_account(&tx, owner, row.account_id)?;
    let target = match update.account_id {
        Some(id) if id != old_account.id => get_account(&tx, owner, id)?,
        _ => old_account.clone(),
    };
    if let Some(Some(category_id)) = update.category_id {
        categories::ensure_owned(&tx, owner, category_id)?;
    }

    apply_delta(&tx, &old_account, inverse(row.r#type)?, row.amount)?;

    row.account_id = target.id;
    if let Some(t) = update.r#type {
        row.r#type = t;
    }
    if let Some(amount) = update.amount {
        row.amount = amount;
    }
    if let Some(description) = update.description {
        row.description = description;
    }
    if let Some(date) = update.date {
        row.date = date;
    }
    if let Some(category_id) = update.category_id {
        row.category_id = category_id;
    }
    tx.execute(
        "UPDATE transactions SET account_id = ?1, category_id = ?2, type = ?3, amount = ?4, description = ?5, date = ?6
         WHERE id = ?7",
        params![
            row.account_id,
            row.category_id,
            row.r#type,
            row.amount,
            row.description,
            row.date,
            row.id
        ],
    )?;

    apply_delta(&tx, &target, row.r#type, row.amount)?;
    tx.commit()?;

    tracing::info!(
        transaction_id,
        old_account_id = old_account.id,
        account_id = target.id,
        "transaction updated"
    );
    Ok(row)
}

/// Removes a row after reversing its effect. Transfers reverse both legs.
pub fn delete_transaction(conn: &mut Connection, owner: i64, transaction_id: i64) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let row = get_transaction(&tx, owner, transaction_id)?;
    let account = get_account(&tx, owner, row.account_id)?;

    tx.execute("DELETE FROM transactions WHERE id = ?1", params![row.id])?;
    match row.r#type {
        TransactionType::Income | TransactionType::Expense => {
            apply_delta(&tx, &account, inverse(row.r#type)?, row.amount)?;
        }
        TransactionType::Transfer => {
            let to_id = row.to_account_id.ok_or(CoreError::InvalidTransactionType)?;
            let to = get_account(&tx, owner, to_id)?;
            apply_delta(&tx, &account, TransactionType::Income, row.amount)?;
            apply_delta(&tx, &to, TransactionType::Expense, row.amount)?;
        }
        TransactionType::Investment => return Err(CoreError::InvalidTransactionType),
    }
    tx.commit()?;

    tracing::info!(transaction_id, kind = %row.r#type, "transaction deleted");
    Ok(())
}

pub fn get_transaction(conn: &Connection, owner: i64, transaction_id: i64) -> Result<Transaction> {
    let sql = format!(
        "SELECT {} FROM transactions WHERE id = ?1 AND user_id = ?2",
        Transaction::COLUMNS
    );
    conn.query_row(&sql, params![transaction_id, owner], Transaction::from_row)
        .map_err(|e| not_found_as(e, CoreError::TransactionNotFound))
}

/// Owner's transactions matching `filter`, newest first.
pub fn list_transactions(
    conn: &Connection,
    owner: i64,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(CoreError::invalid("from date must not be after to date"));
        }
    }
    if let (Some(min), Some(max)) = (filter.min_amount, filter.max_amount) {
        if min > max {
            return Err(CoreError::invalid("min amount must not exceed max amount"));
        }
    }

    let mut sql = format!(
        "SELECT {} FROM transactions WHERE user_id = ?",
        Transaction::COLUMNS
    );
    let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(owner)];
    if let Some(from) = filter.from {
        sql.push_str(" AND date >= ?");
        args.push(Box::new(from));
    }
    if let Some(to) = filter.to {
        sql.push_str(" AND date <= ?");
        args.push(Box::new(to));
    }
    if let Some(t) = filter.r#type {
        sql.push_str(" AND type = ?");
        args.push(Box::new(t));
    }
    if let Some(category_id) = filter.category_id {
        sql.push_str(" AND category_id = ?");
        args.push(Box::new(category_id));
    }
    if let Some(min) = filter.min_amount {
        sql.push_str(" AND amount >= ?");
        args.push(Box::new(min));
    }
    if let Some(max) = filter.max_amount {
        sql.push_str(" AND amount <= ?");
        args.push(Box::new(max));
    }
    if let Some(account_id) = filter.account_id {
        sql.push_str(" AND account_id = ?");
        args.push(Box::new(account_id));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        args.push(Box::new(limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), Transaction::from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// Same as [`list_transactions`] restricted to one owned account.
pub fn list_account_transactions(
    conn: &Connection,
    owner: i64,
    account_id: i64,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>> {
    get_account(conn, owner, account_id)?;
    let scoped = TransactionFilter {
        account_id: Some(account_id),
        ..filter.clone()
    };
    list_transactions(conn, owner, &scoped)
}
