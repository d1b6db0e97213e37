// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::db_path;
use crate::utils::{get_timezone, parse_offset, pretty_table, set_timezone, today_in};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-timezone", sub)) => {
            let raw = sub.get_one::<String>("offset").unwrap();
            let offset = parse_offset(raw)?;
            set_timezone(conn, &offset)?;
            println!("Timezone set to UTC{}", offset);
        }
        Some(("show", _)) => {
            let offset = get_timezone(conn)?;
            let data = vec![
                vec!["database".to_string(), db_path()?.display().to_string()],
                vec!["timezone".to_string(), format!("UTC{}", offset)],
                vec!["today".to_string(), today_in(&offset).to_string()],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], data));
        }
        _ => {}
    }
    Ok(())
}
