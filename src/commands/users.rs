// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::utils::pretty_table;
use anyhow::{Context, Result};
use rusqlite::{Connection, params};

/// Categories every new user starts with.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Salary",
    "Groceries",
    "Rent",
    "Utilities",
    "Transport",
    "Dining",
    "Health",
    "Entertainment",
    "Other",
];

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let user = register(conn, name, !sub.get_flag("no-defaults"))?;
            println!("Added user '{}' (id {})", user.name, user.id);
        }
        Some(("list", _)) => {
            let data = list_users(conn)?
                .into_iter()
                .map(|u| vec![u.id.to_string(), u.name])
                .collect();
            println!("{}", pretty_table(&["ID", "Name"], data));
        }
        _ => {}
    }
    Ok(())
}

/// Creates the user and, when asked, provisions the default categories.
pub fn register(conn: &Connection, name: &str, with_defaults: bool) -> Result<User> {
    conn.execute("INSERT INTO users(name) VALUES (?1)", params![name])
        .with_context(|| format!("Could not add user '{}'", name))?;
    let user = User {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    };
    if with_defaults {
        let n = provision_default_categories(conn, user.id)?;
        tracing::info!(user = user.id, categories = n, "provisioned default categories");
    }
    Ok(user)
}

/// Idempotent: categories the user already has are left alone.
pub fn provision_default_categories(conn: &Connection, user_id: i64) -> Result<usize> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO categories(owner_id, name) VALUES (?1, ?2)")?;
    let mut added = 0;
    for name in DEFAULT_CATEGORIES {
        added += stmt.execute(params![user_id, name])?;
    }
    Ok(added)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, name FROM users ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(User {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
