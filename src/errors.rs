// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error kinds surfaced by the ledger, lot and aggregation engines.
//!
//! Every variant maps to a stable machine-readable code. Not-found variants
//! also cover records owned by another user, so callers cannot probe for the
//! existence of someone else's data.

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Investment not found")]
    InvestmentNotFound,

    #[error("Security not found")]
    SecurityNotFound,

    #[error("Budget not found")]
    BudgetNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    #[error("Insufficient account balance")]
    InsufficientBalance,

    #[error("Insufficient shares for this sale")]
    InsufficientShares,

    #[error("This transaction type cannot be edited")]
    TransactionNotEditable,

    #[error("Cannot change transaction type to or from transfer/investment")]
    InvalidTypeChange,

    #[error("Unsupported transaction type")]
    InvalidTransactionType,

    /// Storage failure. The wrapped error is kept for logs only.
    #[error("An internal error occurred")]
    InternalServer(#[source] rusqlite::Error),
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidInput(_) => "INVALID_INPUT",
            CoreError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            CoreError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            CoreError::InvestmentNotFound => "INVESTMENT_NOT_FOUND",
            CoreError::SecurityNotFound => "SECURITY_NOT_FOUND",
            CoreError::BudgetNotFound => "BUDGET_NOT_FOUND",
            CoreError::CategoryNotFound => "CATEGORY_NOT_FOUND",
            CoreError::SameAccountTransfer => "SAME_ACCOUNT_TRANSFER",
            CoreError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            CoreError::InsufficientShares => "INSUFFICIENT_SHARES",
            CoreError::TransactionNotEditable => "TRANSACTION_NOT_EDITABLE",
            CoreError::InvalidTypeChange => "INVALID_TYPE_CHANGE",
            CoreError::InvalidTransactionType => "INVALID_TRANSACTION_TYPE",
            CoreError::InternalServer(_) => "INTERNAL_ERROR",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        tracing::warn!(error = %err, "storage error");
        CoreError::InternalServer(err)
    }
}

/// Wire shape of an error for outer layers.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Maps `QueryReturnedNoRows` to the given not-found kind.
pub(crate) fn not_found_as(err: rusqlite::Error, kind: CoreError) -> CoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => kind,
        other => other.into(),
    }
}
