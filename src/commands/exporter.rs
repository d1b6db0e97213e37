// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::utils::{from_minor_units, get_timezone, utc_to_local};
use anyhow::{Result, bail};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

// Same column layout the importer reads; dates are local to the configured zone.
fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let author_id = user_id(conn, sub)?;
    let fmt = sub.get_one::<String>("format").unwrap().trim().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap().trim();
    let offset = get_timezone(conn)?;

    let mut stmt = conn.prepare(
        "SELECT t.created_at, a.name, t.kind, t.amount_minor, c.name, t.description,
                (SELECT group_concat(g.name, ';') FROM transaction_tags tt JOIN tags g ON g.id=tt.tag_id WHERE tt.transaction_id=t.id)
         FROM transactions t
         JOIN accounts a ON t.account_id=a.id
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.author_id=?1
         ORDER BY t.created_at, t.id",
    )?;
    let rows = stmt.query_map(params![author_id], |r| {
        Ok((
            utc_to_local(r.get::<_, NaiveDateTime>(0)?, &offset)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            from_minor_units(r.get::<_, i64>(3)?),
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut count = 0;
    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date",
                "account",
                "kind",
                "amount",
                "category",
                "description",
                "tags",
            ])?;
            for row in rows {
                let (d, a, k, amt, cat, desc, tags) = row?;
                wtr.write_record([
                    d,
                    a,
                    k,
                    format!("{:.2}", amt),
                    cat.unwrap_or_default(),
                    desc.unwrap_or_default(),
                    tags.unwrap_or_default(),
                ])?;
                count += 1;
            }
            wtr.flush()?;
        }
        "json" => {
            let mut items = Vec::new();
            for row in rows {
                let (d, a, k, amt, cat, desc, tags) = row?;
                let tags: Vec<&str> = tags
                    .as_deref()
                    .map(|t| t.split(';').collect())
                    .unwrap_or_default();
                items.push(json!({
                    "date": d, "account": a, "kind": k, "amount": amt,
                    "category": cat, "description": desc, "tags": tags
                }));
            }
            count = items.len();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    tracing::info!(rows = count, out, format = %fmt, "export finished");
    println!("Exported {} transactions to {}", count, out);
    Ok(())
}
