// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Kuberan", "kuberan"));

/// Overrides the platform data dir when set.
pub const DB_ENV: &str = "KUBERAN_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("kuberan.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    open_at(&path)
}

pub fn open_at(path: &std::path::Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('cash','investment','debt','credit_card')),
        description TEXT NOT NULL DEFAULT '',
        balance INTEGER NOT NULL DEFAULT 0,
        currency TEXT NOT NULL DEFAULT 'USD',
        is_active INTEGER NOT NULL DEFAULT 1,
        broker TEXT,
        account_number TEXT,
        interest_rate REAL,
        due_date TEXT,
        credit_limit INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id, is_active);

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        UNIQUE(user_id, name)
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        to_account_id INTEGER,
        category_id INTEGER,
        type TEXT NOT NULL CHECK(type IN ('income','expense','transfer','investment')),
        amount INTEGER NOT NULL CHECK(amount > 0),
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(to_account_id) REFERENCES accounts(id),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);

    CREATE TABLE IF NOT EXISTS securities(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        asset_type TEXT NOT NULL CHECK(asset_type IN ('stock','etf','bond','crypto','reit')),
        currency TEXT NOT NULL,
        exchange TEXT NOT NULL DEFAULT '',
        UNIQUE(symbol, exchange)
    );

    CREATE TABLE IF NOT EXISTS security_prices(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        security_id INTEGER NOT NULL,
        price INTEGER NOT NULL,
        recorded_at TEXT NOT NULL,
        UNIQUE(security_id, recorded_at),
        FOREIGN KEY(security_id) REFERENCES securities(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        security_id INTEGER NOT NULL,
        quantity REAL NOT NULL CHECK(quantity >= 0),
        cost_basis INTEGER NOT NULL,
        wallet_address TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(account_id, security_id),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(security_id) REFERENCES securities(id)
    );

    CREATE TABLE IF NOT EXISTS investment_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        investment_id INTEGER NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('buy','sell','dividend','split','transfer')),
        date TEXT NOT NULL,
        quantity REAL NOT NULL DEFAULT 0,
        price_per_unit INTEGER NOT NULL DEFAULT 0,
        total_amount INTEGER NOT NULL DEFAULT 0,
        fee INTEGER NOT NULL DEFAULT 0,
        notes TEXT NOT NULL DEFAULT '',
        split_ratio REAL,
        dividend_type TEXT,
        realized_gain INTEGER,
        FOREIGN KEY(investment_id) REFERENCES investments(id)
    );
    CREATE INDEX IF NOT EXISTS idx_investment_transactions_date ON investment_transactions(investment_id, date);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        amount INTEGER NOT NULL,
        period TEXT NOT NULL CHECK(period IN ('monthly','yearly')),
        start_date TEXT NOT NULL,
        end_date TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS portfolio_snapshots(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        recorded_at TEXT NOT NULL,
        total_net_worth INTEGER NOT NULL,
        cash_balance INTEGER NOT NULL,
        investment_value INTEGER NOT NULL,
        debt_balance INTEGER NOT NULL,
        UNIQUE(user_id, recorded_at)
    );
    "#,
    )?;
    Ok(())
}
