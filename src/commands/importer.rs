// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::transactions::{NewTransaction, record};
use super::user_id;
use crate::models::TxKind;
use crate::utils::{get_timezone, local_to_utc, parse_decimal, parse_local_datetime};
use anyhow::{Context, Result, bail};
use csv::ReaderBuilder;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => import_transactions(conn, sub).map(|_| ()),
        _ => Ok(()),
    }
}

/// CSV layout: `date,account,kind,amount,category,description,tags` where
/// `tags` is `;`-separated. All rows commit together or not at all.
pub fn import_transactions(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<usize> {
    let author_id = user_id(conn, sub)?;
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let offset = get_timezone(conn)?;
    let tx = conn.transaction()?;
    let mut count = 0;

    for (line, result) in rdr.records().enumerate() {
        let rec = result?;
        let field = |i: usize| rec.get(i).map(str::trim).unwrap_or("");
        let date_raw = field(0);
        let account = field(1);
        if account.is_empty() {
            bail!("Row {}: account missing", line + 1);
        }
        let kind: TxKind = field(2)
            .parse()
            .with_context(|| format!("Row {}: bad kind", line + 1))?;
        let amount = parse_decimal(field(3))
            .with_context(|| format!("Row {}: invalid amount '{}'", line + 1, field(3)))?;
        let local = parse_local_datetime(date_raw)
            .with_context(|| format!("Row {}: invalid date '{}'", line + 1, date_raw))?;
        let category = Some(field(4).to_string()).filter(|s| !s.is_empty());
        let description = Some(field(5).to_string()).filter(|s| !s.is_empty());
        let tags = field(6)
            .split(';')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        record(
            &tx,
            &NewTransaction {
                author_id,
                account: account.to_string(),
                kind,
                amount,
                category,
                tags,
                description,
                created_at: local_to_utc(local, &offset),
            },
        )
        .with_context(|| format!("Row {}", line + 1))?;
        count += 1;
    }
    tx.commit()?;
    tracing::info!(rows = count, path, "import finished");
    println!("Imported {} transactions from {}", count, path);
    Ok(count)
}
