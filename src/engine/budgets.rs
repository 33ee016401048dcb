// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::categories;
use crate::errors::{CoreError, Result, not_found_as};
use crate::models::{Budget, BudgetPeriod};
use chrono::NaiveDate;
use rusqlite::{Connection, params};

const COLUMNS: &str =
    "id, user_id, category_id, name, amount, period, start_date, end_date, is_active";

fn from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        user_id: r.get(1)?,
        category_id: r.get(2)?,
        name: r.get(3)?,
        amount: r.get(4)?,
        period: r.get(5)?,
        start_date: r.get(6)?,
        end_date: r.get(7)?,
        is_active: r.get(8)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category_id: i64,
    pub name: String,
    pub amount: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

pub fn create_budget(conn: &Connection, owner: i64, new: NewBudget) -> Result<Budget> {
    if new.amount <= 0 {
        return Err(CoreError::invalid("budget amount must be greater than zero"));
    }
    if let Some(end) = new.end_date {
        if end < new.start_date {
            return Err(CoreError::invalid("end date must not be before start date"));
        }
    }
    categories::ensure_owned(conn, owner, new.category_id)?;
    conn.execute(
        "INSERT INTO budgets(user_id, category_id, name, amount, period, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            owner,
            new.category_id,
            new.name.trim(),
            new.amount,
            new.period,
            new.start_date,
            new.end_date
        ],
    )?;
    get_budget(conn, owner, conn.last_insert_rowid())
}

pub fn get_budget(conn: &Connection, owner: i64, budget_id: i64) -> Result<Budget> {
    let sql = format!("SELECT {COLUMNS} FROM budgets WHERE id = ?1 AND user_id = ?2");
    conn.query_row(&sql, params![budget_id, owner], from_row)
        .map_err(|e| not_found_as(e, CoreError::BudgetNotFound))
}

pub fn list_budgets(conn: &Connection, owner: i64, active_only: bool) -> Result<Vec<Budget>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM budgets WHERE user_id = ?1 AND (?2 = 0 OR is_active = 1) ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner, active_only], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
