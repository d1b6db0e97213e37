// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let code = sub.get_one::<String>("code").unwrap().trim().to_uppercase();
            let name = sub.get_one::<String>("name").unwrap().trim();
            conn.execute(
                "INSERT INTO currencies(code, name) VALUES (?1, ?2)",
                params![code, name],
            )?;
            println!("Added currency {} ({})", code, name);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare("SELECT code, name FROM currencies ORDER BY code")?;
            let rows = stmt.query_map([], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (c, n) = row?;
                data.push(vec![c, n]);
            }
            println!("{}", pretty_table(&["Code", "Name"], data));
        }
        _ => {}
    }
    Ok(())
}
