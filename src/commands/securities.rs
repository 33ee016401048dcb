// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{choice, minor, opt_datetime, required, text};
use crate::engine::securities::{
    NewSecurity, create_security, list_prices, list_securities, record_price,
};
use crate::models::AssetType;
use crate::utils::{fmt_minor, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let security = create_security(
                conn,
                NewSecurity {
                    symbol: required::<String>(sub, "symbol")?.clone(),
                    name: required::<String>(sub, "name")?.clone(),
                    asset_type: choice::<AssetType>(sub, "asset-type")?.unwrap_or(AssetType::Stock),
                    currency: text(sub, "currency"),
                    exchange: text(sub, "exchange"),
                },
            )?;
            println!(
                "Added security #{} {} ({}, {})",
                security.id, security.symbol, security.asset_type, security.currency
            );
        }
        Some(("list", sub)) => {
            let securities = list_securities(conn)?;
            if !maybe_print_json(sub.get_flag("json"), &securities)? {
                let data = securities
                    .into_iter()
                    .map(|s| {
                        vec![
                            s.id.to_string(),
                            s.symbol,
                            s.name,
                            s.asset_type.to_string(),
                            s.currency,
                            s.exchange,
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Symbol", "Name", "Type", "CCY", "Exchange"], data)
                );
            }
        }
        Some(("price", sub)) => {
            let id = *required::<i64>(sub, "id")?;
            let price = minor(sub, "price")?;
            let at = opt_datetime(sub, "at")?.unwrap_or_else(Utc::now);
            record_price(conn, id, price, at)?;
            println!("Recorded price {} for security #{} at {}", fmt_minor(price), id, at);
        }
        Some(("prices", sub)) => {
            let id = *required::<i64>(sub, "id")?;
            let prices = list_prices(
                conn,
                id,
                opt_datetime(sub, "from")?,
                opt_datetime(sub, "to")?,
            )?;
            if !maybe_print_json(sub.get_flag("json"), &prices)? {
                let data = prices
                    .into_iter()
                    .map(|p| vec![p.recorded_at.to_rfc3339(), fmt_minor(p.price)])
                    .collect();
                println!("{}", pretty_table(&["Recorded", "Price"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
