// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::opt_datetime;
use crate::engine::snapshots::{list_snapshots, record_snapshots};
use crate::prices::SqlitePriceSource;
use crate::utils::{fmt_minor, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("record", sub)) => {
            let at = opt_datetime(sub, "at")?.unwrap_or_else(Utc::now);
            let report = record_snapshots(conn, &SqlitePriceSource::new(conn), at)?;
            println!("Recorded {} snapshot(s) at {}", report.processed, at);
            if !report.failed.is_empty() {
                eprintln!("Failed owners: {:?}", report.failed);
            }
        }
        Some(("list", sub)) => {
            let snaps = list_snapshots(
                conn,
                owner,
                opt_datetime(sub, "from")?,
                opt_datetime(sub, "to")?,
            )?;
            if maybe_print_json(sub.get_flag("json"), &snaps)? {
                return Ok(());
            }
            let data = snaps
                .into_iter()
                .map(|s| {
                    vec![
                        s.recorded_at.to_rfc3339(),
                        fmt_minor(s.cash_balance),
                        fmt_minor(s.investment_value),
                        fmt_minor(s.debt_balance),
                        fmt_minor(s.total_net_worth),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["Recorded at", "Cash", "Investments", "Debt", "Net worth"],
                    data
                )
            );
        }
        _ => {}
    }
    Ok(())
}
