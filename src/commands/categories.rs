// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::models::Category;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let owner = user_id(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            conn.execute(
                "INSERT INTO categories(owner_id, name) VALUES (?1, ?2)",
                params![owner, name],
            )?;
            println!("Added category '{}'", name);
        }
        Some(("list", sub)) => {
            let owner = user_id(conn, sub)?;
            let data = list_categories(conn, owner)?
                .into_iter()
                .map(|c| vec![c.name])
                .collect();
            println!("{}", pretty_table(&["Category"], data));
        }
        Some(("rm", sub)) => {
            let owner = user_id(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            conn.execute(
                "DELETE FROM categories WHERE owner_id=?1 AND name=?2",
                params![owner, name],
            )?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn list_categories(conn: &Connection, owner_id: i64) -> Result<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, name FROM categories WHERE owner_id=?1 ORDER BY name")?;
    let rows = stmt.query_map(params![owner_id], |r| {
        Ok(Category {
            id: r.get(0)?,
            owner_id,
            name: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
