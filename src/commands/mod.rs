// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod investments;
pub mod reports;
pub mod securities;
pub mod snapshots;
pub mod transactions;

use crate::utils::{parse_date, parse_datetime, parse_minor};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::ArgMatches;
use std::any::Any;

pub(crate) fn required<'a, T>(m: &'a ArgMatches, id: &str) -> Result<&'a T>
where
    T: Any + Clone + Send + Sync + 'static,
{
    m.get_one::<T>(id)
        .with_context(|| format!("Missing required argument '{}'", id))
}

pub(crate) fn text(m: &ArgMatches, id: &str) -> Option<String> {
    m.get_one::<String>(id).cloned()
}

pub(crate) fn minor(m: &ArgMatches, id: &str) -> Result<i64> {
    parse_minor(required::<String>(m, id)?)
}

pub(crate) fn opt_minor(m: &ArgMatches, id: &str) -> Result<Option<i64>> {
    m.get_one::<String>(id).map(|s| parse_minor(s)).transpose()
}

pub(crate) fn opt_datetime(m: &ArgMatches, id: &str) -> Result<Option<DateTime<Utc>>> {
    m.get_one::<String>(id).map(|s| parse_datetime(s)).transpose()
}

pub(crate) fn opt_date(m: &ArgMatches, id: &str) -> Result<Option<NaiveDate>> {
    m.get_one::<String>(id).map(|s| parse_date(s)).transpose()
}

/// Parses a value-parser-restricted enum argument.
pub(crate) fn choice<T>(m: &ArgMatches, id: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    m.get_one::<String>(id)
        .map(|s| s.parse::<T>().map_err(anyhow::Error::msg))
        .transpose()
}
