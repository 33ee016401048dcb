// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Security catalogue and recorded price points. Prices come from outside;
//! nothing here fetches or derives them.

use crate::errors::{CoreError, Result, not_found_as};
use crate::models::{AssetType, Security, SecurityPrice};
use crate::utils::default_currency;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, params};

fn from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Security> {
    Ok(Security {
        id: r.get(0)?,
        symbol: r.get(1)?,
        name: r.get(2)?,
        asset_type: r.get(3)?,
        currency: r.get(4)?,
        exchange: r.get(5)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewSecurity {
    pub symbol: String,
    pub name: String,
    pub asset_type: AssetType,
    pub currency: Option<String>,
    pub exchange: Option<String>,
}

pub fn create_security(conn: &Connection, new: NewSecurity) -> Result<Security> {
    let symbol = new.symbol.trim().to_uppercase();
    let name = new.name.trim();
    if symbol.is_empty() {
        return Err(CoreError::invalid("symbol is required"));
    }
    if name.is_empty() {
        return Err(CoreError::invalid("name is required"));
    }
    let currency = match new.currency.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => default_currency(conn)?,
    };
    let exchange = new.exchange.unwrap_or_default().trim().to_uppercase();

    match conn.execute(
        "INSERT INTO securities(symbol, name, asset_type, currency, exchange) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![symbol, name, new.asset_type, currency, exchange],
    ) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(CoreError::invalid(format!(
                "security '{}' already exists on this exchange",
                symbol
            )));
        }
        Err(e) => return Err(e.into()),
    }
    get_security(conn, conn.last_insert_rowid())
}

pub fn get_security(conn: &Connection, security_id: i64) -> Result<Security> {
    conn.query_row(
        "SELECT id, symbol, name, asset_type, currency, exchange FROM securities WHERE id = ?1",
        params![security_id],
        from_row,
    )
    .map_err(|e| not_found_as(e, CoreError::SecurityNotFound))
}

pub fn list_securities(conn: &Connection) -> Result<Vec<Security>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, name, asset_type, currency, exchange FROM securities ORDER BY symbol, exchange",
    )?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Stores a price point; re-recording the same instant replaces the price.
pub fn record_price(
    conn: &Connection,
    security_id: i64,
    price: i64,
    recorded_at: DateTime<Utc>,
) -> Result<()> {
    if price < 0 {
        return Err(CoreError::invalid("price cannot be negative"));
    }
    get_security(conn, security_id)?;
    conn.execute(
        "INSERT INTO security_prices(security_id, price, recorded_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(security_id, recorded_at) DO UPDATE SET price=excluded.price",
        params![security_id, price, recorded_at],
    )?;
    Ok(())
}

/// Recorded prices of a security within the optional bounds, oldest first.
pub fn list_prices(
    conn: &Connection,
    security_id: i64,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<SecurityPrice>> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(CoreError::invalid("from date must not be after to date"));
        }
    }
    get_security(conn, security_id)?;
    let mut stmt = conn.prepare(
        "SELECT security_id, price, recorded_at FROM security_prices
         WHERE security_id = ?1
           AND (?2 IS NULL OR recorded_at >= ?2)
           AND (?3 IS NULL OR recorded_at <= ?3)
         ORDER BY recorded_at",
    )?;
    let rows = stmt.query_map(params![security_id, from, to], |r| {
        Ok(SecurityPrice {
            security_id: r.get(0)?,
            price: r.get(1)?,
            recorded_at: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
