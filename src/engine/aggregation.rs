// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-side rollups over transaction history: budget progress and
//! category, month and day spending summaries.

use crate::clock::Clock;
use crate::engine::budgets::get_budget;
use crate::errors::{CoreError, Result};
use crate::models::BudgetPeriod;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, params};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;

/// `numerator / denominator * 100`, rounded half away from zero to two
/// places. Zero when the denominator is not positive.
pub fn percentage(numerator: i64, denominator: i64) -> Decimal {
    if denominator <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(numerator) * Decimal::ONE_HUNDRED / Decimal::from(denominator))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn out_of_range() -> CoreError {
    CoreError::invalid("date out of range")
}

fn month_start(day: NaiveDate) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(day.year(), day.month(), 1).ok_or_else(out_of_range)
}

/// Half-open `[start, next_start)` calendar window of `period` containing `today`.
pub fn period_window(period: BudgetPeriod, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    match period {
        BudgetPeriod::Monthly => {
            let start = month_start(today)?;
            let next = start.checked_add_months(Months::new(1)).ok_or_else(out_of_range)?;
            Ok((start, next))
        }
        BudgetPeriod::Yearly => {
            let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).ok_or_else(out_of_range)?;
            let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).ok_or_else(out_of_range)?;
            Ok((start, next))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetProgress {
    pub budget_id: i64,
    pub name: String,
    pub budgeted: i64,
    pub spent: i64,
    /// Negative once overspent.
    pub remaining: i64,
    pub percentage: Decimal,
    pub period_start: NaiveDate,
    /// Last day of the window, inclusive.
    pub period_end: NaiveDate,
}

/// Spending against a budget for the period containing the clock's today.
pub fn budget_progress(
    conn: &Connection,
    clock: &dyn Clock,
    owner: i64,
    budget_id: i64,
) -> Result<BudgetProgress> {
    let budget = get_budget(conn, owner, budget_id)?;
    let (start, next) = period_window(budget.period, clock.now().date_naive())?;
    let spent: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions
         WHERE user_id = ?1 AND category_id = ?2 AND type = 'expense'
           AND date >= ?3 AND date < ?4",
        params![owner, budget.category_id, start_of(start), start_of(next)],
        |r| r.get(0),
    )?;
    Ok(BudgetProgress {
        budget_id: budget.id,
        name: budget.name,
        budgeted: budget.amount,
        spent,
        remaining: budget.amount - spent,
        percentage: percentage(spent, budget.amount),
        period_start: start,
        period_end: next.pred_opt().ok_or_else(out_of_range)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpend {
    pub category_id: Option<i64>,
    pub category_name: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpendingByCategory {
    pub items: Vec<CategorySpend>,
    pub total_spent: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Expense totals per category over `[from, to]`, largest first. Rows without
/// a category are reported under "Uncategorized".
pub fn spending_by_category(
    conn: &Connection,
    owner: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<SpendingByCategory> {
    if from > to {
        return Err(CoreError::invalid("from date must not be after to date"));
    }
    let mut stmt = conn.prepare(
        "SELECT t.category_id, c.name, SUM(t.amount)
         FROM transactions t
         LEFT JOIN categories c ON c.id = t.category_id AND c.user_id = t.user_id
         WHERE t.user_id = ?1 AND t.type = 'expense' AND t.date >= ?2 AND t.date <= ?3
         GROUP BY t.category_id",
    )?;
    let rows = stmt.query_map(params![owner, from, to], |r| {
        Ok((
            r.get::<_, Option<i64>>(0)?,
            r.get::<_, Option<String>>(1)?,
            r.get::<_, i64>(2)?,
        ))
    })?;
    let mut items = Vec::new();
    for row in rows {
        let (category_id, name, total) = row?;
        let category_name = match (category_id, name) {
            (None, _) => "Uncategorized".to_string(),
            (Some(_), Some(name)) => name,
            (Some(_), None) => "Unknown Category".to_string(),
        };
        items.push(CategorySpend {
            category_id,
            category_name,
            total,
        });
    }
    items.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
    let total_spent = items.iter().map(|i| i.total).sum();
    Ok(SpendingByCategory {
        items,
        total_spent,
        from,
        to,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    /// `YYYY-MM`
    pub month: String,
    pub income: i64,
    pub expenses: i64,
    pub net: i64,
}

/// Income and expense per calendar month for the last `months` months,
/// the current one included, oldest first. Empty months are zero.
pub fn monthly_summary(
    conn: &Connection,
    clock: &dyn Clock,
    owner: i64,
    months: u32,
) -> Result<Vec<MonthSummary>> {
    if months < 1 {
        return Err(CoreError::invalid("months must be at least 1"));
    }
    let current = month_start(clock.now().date_naive())?;
    let first = current
        .checked_sub_months(Months::new(months - 1))
        .ok_or_else(out_of_range)?;
    let end = current.checked_add_months(Months::new(1)).ok_or_else(out_of_range)?;

    let mut stmt = conn.prepare(
        "SELECT substr(date, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0)
         FROM transactions
         WHERE user_id = ?1 AND date >= ?2 AND date < ?3
         GROUP BY month",
    )?;
    let rows = stmt.query_map(params![owner, start_of(first), start_of(end)], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?, r.get::<_, i64>(2)?))
    })?;
    let mut totals = HashMap::new();
    for row in rows {
        let (month, income, expenses) = row?;
        totals.insert(month, (income, expenses));
    }

    let mut out = Vec::with_capacity(months as usize);
    let mut cursor = first;
    while cursor < end {
        let month = cursor.format("%Y-%m").to_string();
        let (income, expenses) = totals.get(&month).copied().unwrap_or((0, 0));
        out.push(MonthSummary {
            month,
            income,
            expenses,
            net: income - expenses,
        });
        cursor = cursor.checked_add_months(Months::new(1)).ok_or_else(out_of_range)?;
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub total: i64,
}

/// Expense total for every day in `from..=to`, ascending, zero-filled.
pub fn daily_spending(
    conn: &Connection,
    owner: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailySpend>> {
    if from > to {
        return Err(CoreError::invalid("from date must not be after to date"));
    }
    let end = to.checked_add_days(Days::new(1)).ok_or_else(out_of_range)?;
    let mut stmt = conn.prepare(
        "SELECT substr(date, 1, 10) AS day, SUM(amount)
         FROM transactions
         WHERE user_id = ?1 AND type = 'expense' AND date >= ?2 AND date < ?3
         GROUP BY day",
    )?;
    let rows = stmt.query_map(params![owner, start_of(from), start_of(end)], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
    })?;
    let mut totals = HashMap::new();
    for row in rows {
        let (day, total) = row?;
        totals.insert(day, total);
    }

    Ok(from
        .iter_days()
        .take_while(|d| *d <= to)
        .map(|date| DailySpend {
            date,
            total: totals
                .get(&date.format("%Y-%m-%d").to_string())
                .copied()
                .unwrap_or(0),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() {
        assert_eq!(percentage(1, 3), Decimal::from_str("33.33").unwrap());
        assert_eq!(percentage(2, 3), Decimal::from_str("66.67").unwrap());
        assert_eq!(percentage(1, 8000), Decimal::from_str("0.01").unwrap());
        assert_eq!(percentage(-1, 8000), Decimal::from_str("-0.01").unwrap());
        assert_eq!(percentage(150, 100), Decimal::from(150));
    }

    #[test]
    fn percentage_of_zero_denominator_is_zero() {
        assert_eq!(percentage(500, 0), Decimal::ZERO);
        assert_eq!(percentage(500, -10), Decimal::ZERO);
    }

    #[test]
    fn monthly_window_wraps_the_year() {
        let (start, next) = period_window(BudgetPeriod::Monthly, d("2025-12-17")).unwrap();
        assert_eq!(start, d("2025-12-01"));
        assert_eq!(next, d("2026-01-01"));
    }

    #[test]
    fn yearly_window_is_the_calendar_year() {
        let (start, next) = period_window(BudgetPeriod::Yearly, d("2024-02-29")).unwrap();
        assert_eq!(start, d("2024-01-01"));
        assert_eq!(next, d("2025-01-01"));
    }
}
