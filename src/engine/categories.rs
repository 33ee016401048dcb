// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{CoreError, Result, not_found_as};
use crate::models::{Category, CategoryType};
use rusqlite::{Connection, ErrorCode, params};

fn from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        r#type: r.get(3)?,
    })
}

pub fn create_category(
    conn: &Connection,
    owner: i64,
    name: &str,
    r#type: CategoryType,
) -> Result<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::invalid("category name is required"));
    }
    match conn.execute(
        "INSERT INTO categories(user_id, name, type) VALUES (?1, ?2, ?3)",
        params![owner, name, r#type],
    ) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(CoreError::invalid(format!("category '{}' already exists", name)));
        }
        Err(e) => return Err(e.into()),
    }
    ensure_owned(conn, owner, conn.last_insert_rowid())
}

/// The category if `owner` owns it; `CategoryNotFound` otherwise.
pub fn ensure_owned(conn: &Connection, owner: i64, category_id: i64) -> Result<Category> {
    conn.query_row(
        "SELECT id, user_id, name, type FROM categories WHERE id = ?1 AND user_id = ?2",
        params![category_id, owner],
        from_row,
    )
    .map_err(|e| not_found_as(e, CoreError::CategoryNotFound))
}

pub fn list_categories(conn: &Connection, owner: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, type FROM categories WHERE user_id = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![owner], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
