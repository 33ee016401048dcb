// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Latest-price lookup used by valuation and snapshots.
//!
//! Prices are integers in minor units per whole unit of the security. A
//! security without any recorded price is simply absent from the returned map.

use crate::errors::Result;
use rusqlite::{Connection, params_from_iter};
use std::collections::{BTreeSet, HashMap};

pub trait PriceSource {
    fn latest_prices(&self, security_ids: &[i64]) -> Result<HashMap<i64, i64>>;
}

/// Reads the most recent `security_prices` row per security.
pub struct SqlitePriceSource<'c> {
    conn: &'c Connection,
}

impl<'c> SqlitePriceSource<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl PriceSource for SqlitePriceSource<'_> {
    fn latest_prices(&self, security_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        let ids: BTreeSet<i64> = security_ids.iter().copied().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "SELECT security_id, price FROM (
                 SELECT security_id,
                        price,
                        ROW_NUMBER() OVER (
                            PARTITION BY security_id
                            ORDER BY recorded_at DESC, id DESC
                        ) AS rn
                 FROM security_prices
                 WHERE security_id IN ({placeholders})
             ) WHERE rn = 1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?))
        })?;
        let mut out = HashMap::with_capacity(ids.len());
        for row in rows {
            let (id, price) = row?;
            out.insert(id, price);
        }
        Ok(out)
    }
}

/// In-memory price table.
#[derive(Debug, Clone, Default)]
pub struct FixedPrices {
    prices: HashMap<i64, i64>,
}

impl FixedPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, security_id: i64, price: i64) -> Self {
        self.prices.insert(security_id, price);
        self
    }
}

impl PriceSource for FixedPrices {
    fn latest_prices(&self, security_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        Ok(security_ids
            .iter()
            .filter_map(|id| self.prices.get(id).map(|p| (*id, *p)))
            .collect())
    }
}

/// Market value of `quantity` units, truncated to whole minor units.
pub fn holding_value(quantity: f64, price: i64) -> i64 {
    (quantity * price as f64) as i64
}
