// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Account ledger: the only code that writes `accounts.balance`.

use crate::clock::Clock;
use crate::errors::{CoreError, Result, not_found_as};
use crate::models::{Account, AccountType, TransactionType};
use crate::prices::{PriceSource, holding_value};
use crate::utils::default_currency;
use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior, params};
use std::collections::HashMap;

/// Signed balance change for a ledger effect of `kind` on an account of
/// `account_type`.
///
/// Credit-card balances are amounts owed, so the sign is inverted: an expense
/// grows the balance and a payment (income) shrinks it.
pub fn balance_effect(account_type: AccountType, kind: TransactionType, amount: i64) -> Result<i64> {
    let cash_direction = match kind {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
        TransactionType::Transfer | TransactionType::Investment => {
            return Err(CoreError::InvalidTransactionType);
        }
    };
    Ok(match account_type {
        AccountType::CreditCard => -cash_direction,
        AccountType::Cash | AccountType::Investment | AccountType::Debt => cash_direction,
    })
}

/// Income becomes expense and vice versa; used to undo an applied effect.
pub fn inverse(kind: TransactionType) -> Result<TransactionType> {
    match kind {
        TransactionType::Income => Ok(TransactionType::Expense),
        TransactionType::Expense => Ok(TransactionType::Income),
        TransactionType::Transfer | TransactionType::Investment => {
            Err(CoreError::InvalidTransactionType)
        }
    }
}

/// Applies one ledger effect to `account` and returns the signed delta.
///
/// Must run on the caller's open `rusqlite::Transaction` together with the
/// row write that caused it; the update is relative so concurrent writers
/// serialize on the account row instead of overwriting each other. A result
/// outside `i64` is rejected before anything is written.
pub fn apply_delta(
    conn: &Connection,
    account: &Account,
    kind: TransactionType,
    amount: i64,
) -> Result<i64> {
    let delta = balance_effect(account.r#type, kind, amount)?;
    let current: i64 = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id = ?1",
            params![account.id],
            |r| r.get(0),
        )
        .map_err(|e| not_found_as(e, CoreError::AccountNotFound))?;
    if current.checked_add(delta).is_none() {
        return Err(CoreError::invalid("resulting balance is out of range"));
    }
    conn.execute(
        "UPDATE accounts SET balance = balance + ?1 WHERE id = ?2",
        params![delta, account.id],
    )?;
    Ok(delta)
}

/// Active account owned by `owner`. Someone else's account is reported as
/// missing.
pub fn get_account(conn: &Connection, owner: i64, account_id: i64) -> Result<Account> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
        Account::COLUMNS
    );
    conn.query_row(&sql, params![account_id, owner], Account::from_row)
        .map_err(|e| not_found_as(e, CoreError::AccountNotFound))
}

#[derive(Debug, Clone)]
pub enum AccountDetails {
    Cash {
        initial_balance: i64,
    },
    Investment {
        broker: Option<String>,
        account_number: Option<String>,
    },
    Debt {
        balance: i64,
        interest_rate: Option<f64>,
    },
    CreditCard {
        credit_limit: i64,
        interest_rate: Option<f64>,
        due_date: Option<NaiveDate>,
    },
}

impl AccountDetails {
    pub fn account_type(&self) -> AccountType {
        match self {
            AccountDetails::Cash { .. } => AccountType::Cash,
            AccountDetails::Investment { .. } => AccountType::Investment,
            AccountDetails::Debt { .. } => AccountType::Debt,
            AccountDetails::CreditCard { .. } => AccountType::CreditCard,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub description: String,
    pub currency: Option<String>,
    pub details: AccountDetails,
}

/// Opens an account. A positive cash opening balance is also written as an
/// "Initial balance" income row so history explains the balance; the row is
/// not applied a second time.
pub fn create_account(
    conn: &mut Connection,
    clock: &dyn Clock,
    owner: i64,
    new: NewAccount,
) -> Result<Account> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(CoreError::invalid("account name is required"));
    }
    let currency = match new.currency.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => default_currency(conn)?,
    };

    let (mut broker, mut account_number) = (None, None);
    let (mut interest_rate, mut due_date, mut credit_limit) = (None, None, None);
    let opening = match &new.details {
        AccountDetails::Cash { initial_balance } => *initial_balance,
        AccountDetails::Investment {
            broker: b,
            account_number: n,
        } => {
            broker = b.clone();
            account_number = n.clone();
            0
        }
        AccountDetails::Debt {
            balance,
            interest_rate: rate,
        } => {
            interest_rate = *rate;
            *balance
        }
        AccountDetails::CreditCard {
            credit_limit: limit,
            interest_rate: rate,
            due_date: due,
        } => {
            if *limit < 0 {
                return Err(CoreError::invalid("credit limit cannot be negative"));
            }
            credit_limit = Some(*limit);
            interest_rate = *rate;
            due_date = *due;
            0
        }
    };
    let account_type = new.details.account_type();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT INTO accounts(user_id, name, type, description, balance, currency, broker, account_number, interest_rate, due_date, credit_limit)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            owner,
            name,
            account_type,
            new.description,
            opening,
            currency,
            broker,
            account_number,
            interest_rate,
            due_date,
            credit_limit
        ],
    )?;
    let id = tx.last_insert_rowid();
    if account_type == AccountType::Cash && opening > 0 {
        tx.execute(
            "INSERT INTO transactions(user_id, account_id, type, amount, description, date)
             VALUES (?1, ?2, 'income', ?3, 'Initial balance', ?4)",
            params![owner, id, opening, clock.now()],
        )?;
    }
    let account = get_account(&tx, owner, id)?;
    tx.commit()?;

    tracing::info!(account_id = id, owner, kind = %account_type, "account created");
    Ok(account)
}

/// Fields that only make sense for one account type.
#[derive(Debug, Clone)]
pub enum AccountDetailsUpdate {
    Investment {
        broker: Option<String>,
        account_number: Option<String>,
    },
    CreditCard {
        interest_rate: Option<f64>,
        due_date: Option<NaiveDate>,
        credit_limit: Option<i64>,
    },
}

impl AccountDetailsUpdate {
    fn applies_to(&self, account_type: AccountType) -> bool {
        matches!(
            (self, account_type),
            (AccountDetailsUpdate::Investment { .. }, AccountType::Investment)
                | (AccountDetailsUpdate::CreditCard { .. }, AccountType::CreditCard)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub details: Option<AccountDetailsUpdate>,
}

/// Updates common fields and, when they match the account's type, the
/// type-specific ones. Mismatched type-specific fields are ignored.
pub fn update_account(
    conn: &mut Connection,
    owner: i64,
    account_id: i64,
    update: AccountUpdate,
) -> Result<Account> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut account = get_account(&tx, owner, account_id)?;

    if let Some(name) = update.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        account.name = name;
    }
    if let Some(description) = update.description {
        account.description = description;
    }
    if let Some(active) = update.is_active {
        account.is_active = active;
    }
    match update.details {
        Some(details) if details.applies_to(account.r#type) => match details {
            AccountDetailsUpdate::Investment {
                broker,
                account_number,
            } => {
                if broker.is_some() {
                    account.broker = broker;
                }
                if account_number.is_some() {
                    account.account_number = account_number;
                }
            }
            AccountDetailsUpdate::CreditCard {
                interest_rate,
                due_date,
                credit_limit,
            } => {
                if interest_rate.is_some() {
                    account.interest_rate = interest_rate;
                }
                if due_date.is_some() {
                    account.due_date = due_date;
                }
                if let Some(limit) = credit_limit {
                    if limit < 0 {
                        return Err(CoreError::invalid("credit limit cannot be negative"));
                    }
                    account.credit_limit = Some(limit);
                }
            }
        },
        Some(details) => {
            tracing::debug!(account_id, kind = %account.r#type, ?details, "ignoring fields for other account type");
        }
        None => {}
    }

    tx.execute(
        "UPDATE accounts SET name = ?1, description = ?2, is_active = ?3, broker = ?4, account_number = ?5,
             interest_rate = ?6, due_date = ?7, credit_limit = ?8
         WHERE id = ?9",
        params![
            account.name,
            account.description,
            account.is_active,
            account.broker,
            account.account_number,
            account.interest_rate,
            account.due_date,
            account.credit_limit,
            account.id
        ],
    )?;
    tx.commit()?;
    Ok(account)
}

/// Active accounts of `owner`. Investment accounts report market value
/// (quantity times latest price over their holdings) as their balance.
pub fn list_accounts(conn: &Connection, prices: &dyn PriceSource, owner: i64) -> Result<Vec<Account>> {
    let sql = format!(
        "SELECT {} FROM accounts WHERE user_id = ?1 AND is_active = 1 ORDER BY name, id",
        Account::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner], Account::from_row)?;
    let mut accounts = Vec::new();
    for row in rows {
        accounts.push(row?);
    }

    let values = investment_account_values(conn, prices, owner)?;
    for account in accounts.iter_mut() {
        if account.r#type == AccountType::Investment {
            account.balance = values.get(&account.id).copied().unwrap_or(0);
        }
    }
    Ok(accounts)
}

/// Market value per active investment account of `owner`.
pub(crate) fn investment_account_values(
    conn: &Connection,
    prices: &dyn PriceSource,
    owner: i64,
) -> Result<HashMap<i64, i64>> {
    let mut stmt = conn.prepare(
        "SELECT i.account_id, i.security_id, i.quantity
         FROM investments i JOIN accounts a ON a.id = i.account_id
         WHERE a.user_id = ?1 AND a.type = 'investment' AND a.is_active = 1",
    )?;
    let rows = stmt.query_map(params![owner], |r| {
        Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, f64>(2)?))
    })?;
    let mut holdings = Vec::new();
    for row in rows {
        holdings.push(row?);
    }
    let security_ids: Vec<i64> = holdings.iter().map(|h| h.1).collect();
    let latest = prices.latest_prices(&security_ids)?;

    let mut values = HashMap::new();
    for (account_id, security_id, quantity) in holdings {
        let price = latest.get(&security_id).copied().unwrap_or(0);
        *values.entry(account_id).or_insert(0) += holding_value(quantity, price);
    }
    Ok(values)
}
