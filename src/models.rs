// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stores an enum as its lowercase TEXT tag.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Cash,
    Investment,
    Debt,
    CreditCard,
}

text_enum!(AccountType {
    Cash => "cash",
    Investment => "investment",
    Debt => "debt",
    CreditCard => "credit_card",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
    Investment,
}

text_enum!(TransactionType {
    Income => "income",
    Expense => "expense",
    Transfer => "transfer",
    Investment => "investment",
});

impl TransactionType {
    /// Whether rows of this type may go through the edit path.
    pub fn is_editable(&self) -> bool {
        matches!(self, TransactionType::Income | TransactionType::Expense)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentTransactionType {
    Buy,
    Sell,
    Dividend,
    Split,
    Transfer,
}

text_enum!(InvestmentTransactionType {
    Buy => "buy",
    Sell => "sell",
    Dividend => "dividend",
    Split => "split",
    Transfer => "transfer",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Stock,
    Etf,
    Bond,
    Crypto,
    Reit,
}

text_enum!(AssetType {
    Stock => "stock",
    Etf => "etf",
    Bond => "bond",
    Crypto => "crypto",
    Reit => "reit",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Monthly,
    Yearly,
}

text_enum!(BudgetPeriod {
    Monthly => "monthly",
    Yearly => "yearly",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Income,
    Expense,
}

text_enum!(CategoryType {
    Income => "income",
    Expense => "expense",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub description: String,
    /// Minor currency units. For credit cards this is the amount owed.
    pub balance: i64,
    pub currency: String,
    pub is_active: bool,
    pub broker: Option<String>,
    pub account_number: Option<String>,
    pub interest_rate: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub credit_limit: Option<i64>,
}

impl Account {
    pub(crate) const COLUMNS: &'static str = "id, user_id, name, type, description, balance, currency, is_active, broker, account_number, interest_rate, due_date, credit_limit";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Account {
            id: r.get(0)?,
            user_id: r.get(1)?,
            name: r.get(2)?,
            r#type: r.get(3)?,
            description: r.get(4)?,
            balance: r.get(5)?,
            currency: r.get(6)?,
            is_active: r.get(7)?,
            broker: r.get(8)?,
            account_number: r.get(9)?,
            interest_rate: r.get(10)?,
            due_date: r.get(11)?,
            credit_limit: r.get(12)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub r#type: CategoryType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub r#type: TransactionType,
    /// Always positive; direction comes from `type`.
    pub amount: i64,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub(crate) const COLUMNS: &'static str =
        "id, user_id, account_id, to_account_id, category_id, type, amount, description, date";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: r.get(0)?,
            user_id: r.get(1)?,
            account_id: r.get(2)?,
            to_account_id: r.get(3)?,
            category_id: r.get(4)?,
            r#type: r.get(5)?,
            amount: r.get(6)?,
            description: r.get(7)?,
            date: r.get(8)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub asset_type: AssetType,
    pub currency: String,
    pub exchange: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPrice {
    pub security_id: i64,
    pub price: i64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub account_id: i64,
    pub security_id: i64,
    pub quantity: f64,
    /// Total paid, fees included, for the quantity currently held.
    pub cost_basis: i64,
    pub wallet_address: Option<String>,
}

impl Investment {
    pub(crate) const COLUMNS: &'static str =
        "i.id, i.account_id, i.security_id, i.quantity, i.cost_basis, i.wallet_address";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Investment {
            id: r.get(0)?,
            account_id: r.get(1)?,
            security_id: r.get(2)?,
            quantity: r.get(3)?,
            cost_basis: r.get(4)?,
            wallet_address: r.get(5)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentTransaction {
    pub id: i64,
    pub investment_id: i64,
    pub r#type: InvestmentTransactionType,
    pub date: DateTime<Utc>,
    pub quantity: f64,
    pub price_per_unit: i64,
    pub total_amount: i64,
    pub fee: i64,
    pub notes: String,
    pub split_ratio: Option<f64>,
    pub dividend_type: Option<String>,
    pub realized_gain: Option<i64>,
}

impl InvestmentTransaction {
    pub(crate) const COLUMNS: &'static str = "id, investment_id, type, date, quantity, price_per_unit, total_amount, fee, notes, split_ratio, dividend_type, realized_gain";

    pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(InvestmentTransaction {
            id: r.get(0)?,
            investment_id: r.get(1)?,
            r#type: r.get(2)?,
            date: r.get(3)?,
            quantity: r.get(4)?,
            price_per_unit: r.get(5)?,
            total_amount: r.get(6)?,
            fee: r.get(7)?,
            notes: r.get(8)?,
            split_ratio: r.get(9)?,
            dividend_type: r.get(10)?,
            realized_gain: r.get(11)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub name: String,
    pub amount: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub user_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub total_net_worth: i64,
    pub cash_balance: i64,
    pub investment_value: i64,
    pub debt_balance: i64,
}
