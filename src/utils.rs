// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber once. `RUST_LOG` extends the
/// default `kuberan=info` filter.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "kuberan=info".parse() {
            filter = filter.add_directive(directive);
        }
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = parse_date(s)?;
    Ok(day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid date '{}'", s))?
        .and_utc())
}

/// Parses a major-unit amount such as `12.34` into minor units (`1234`).
pub fn parse_minor(s: &str) -> Result<i64> {
    let d = s
        .trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid amount '{}'", s))?;
    let minor = d * Decimal::from(100);
    if !minor.fract().is_zero() {
        return Err(anyhow!("Amount '{}' has more than two decimal places", s));
    }
    minor
        .to_i64()
        .ok_or_else(|| anyhow!("Amount '{}' is out of range", s))
}

pub fn parse_quantity(s: &str) -> Result<f64> {
    let q = s
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid quantity '{}'", s))?;
    if !q.is_finite() {
        return Err(anyhow!("Invalid quantity '{}'", s));
    }
    Ok(q)
}

pub fn fmt_minor(minor: i64) -> String {
    format!("{:.2}", Decimal::new(minor, 2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}

/// Currency used when an account or security is created without one.
pub fn default_currency(conn: &Connection) -> crate::errors::Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='default_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v.unwrap_or_else(|| "USD".to_string()))
}

pub fn set_default_currency(conn: &Connection, ccy: &str) -> crate::errors::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('default_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy.trim().to_uppercase()],
    )?;
    Ok(())
}
