// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{choice, required};
use crate::engine::categories::{create_category, list_categories};
use crate::models::CategoryType;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = required::<String>(sub, "name")?;
            let kind = choice::<CategoryType>(sub, "type")?.unwrap_or(CategoryType::Expense);
            let category = create_category(conn, owner, name, kind)?;
            println!("Added category #{} '{}' ({})", category.id, category.name, kind);
        }
        Some(("list", sub)) => {
            let categories = list_categories(conn, owner)?;
            if !maybe_print_json(sub.get_flag("json"), &categories)? {
                let data = categories
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name, c.r#type.to_string()])
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Type"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
