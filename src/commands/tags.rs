// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::models::Tag;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let owner = user_id(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            conn.execute(
                "INSERT INTO tags(owner_id, name) VALUES (?1, ?2)",
                params![owner, name],
            )?;
            println!("Added tag '{}'", name);
        }
        Some(("list", sub)) => {
            let owner = user_id(conn, sub)?;
            let data = list_tags(conn, owner)?
                .into_iter()
                .map(|t| vec![t.name])
                .collect();
            println!("{}", pretty_table(&["Tag"], data));
        }
        _ => {}
    }
    Ok(())
}

pub fn list_tags(conn: &Connection, owner_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name FROM tags WHERE owner_id=?1 ORDER BY name")?;
    let rows = stmt.query_map(params![owner_id], |r| {
        Ok(Tag {
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
