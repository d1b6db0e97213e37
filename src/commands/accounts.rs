// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::models::{Account, Currency};
use crate::utils::{fmt_money, from_minor_units, id_for_account, id_for_currency, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let owner = user_id(conn, sub)?;
            let name = sub.get_one::<String>("name").unwrap().trim();
            let ccy = sub.get_one::<String>("currency").unwrap().trim().to_uppercase();
            let currency_id = id_for_currency(conn, &ccy)?;
            conn.execute(
                "INSERT INTO accounts(owner_id, name, currency_id) VALUES (?1, ?2, ?3)",
                params![owner, name, currency_id],
            )?;
            println!("Added account '{}' ({})", name, ccy);
        }
        Some(("list", sub)) => {
            let owner = user_id(conn, sub)?;
            let mut data = Vec::new();
            for (a, bal) in list_accounts(conn, owner)? {
                data.push(vec![
                    a.name,
                    a.currency.code.clone(),
                    if a.is_active { "yes" } else { "no" }.to_string(),
                    fmt_money(&bal, &a.currency.code),
                ]);
            }
            println!(
                "{}",
                pretty_table(&["Name", "Currency", "Active", "Balance"], data)
            );
        }
        Some(("activate", sub)) => set_active(conn, sub, true)?,
        Some(("deactivate", sub)) => set_active(conn, sub, false)?,
        _ => {}
    }
    Ok(())
}

fn set_active(conn: &Connection, sub: &clap::ArgMatches, active: bool) -> Result<()> {
    let owner = user_id(conn, sub)?;
    let name = sub.get_one::<String>("name").unwrap().trim();
    let id = id_for_account(conn, owner, name)?;
    conn.execute(
        "UPDATE accounts SET is_active=?1 WHERE id=?2",
        params![active, id],
    )?;
    tracing::info!(account = id, active, "account state changed");
    println!(
        "Account '{}' {}",
        name,
        if active { "activated" } else { "deactivated" }
    );
    Ok(())
}

/// All of a user's accounts with their current all-time balance.
pub fn list_accounts(conn: &Connection, owner_id: i64) -> Result<Vec<(Account, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, c.code, c.name, a.is_active,
                IFNULL(SUM(CASE WHEN t.kind='income' THEN t.amount_minor ELSE -t.amount_minor END), 0)
         FROM accounts a
         JOIN currencies c ON c.id=a.currency_id
         LEFT JOIN transactions t ON t.account_id=a.id
         WHERE a.owner_id=?1
         GROUP BY a.id ORDER BY a.name",
    )?;
    let rows = stmt.query_map(params![owner_id], |r| {
        Ok((
            Account {
                id: r.get(0)?,
                owner_id,
                name: r.get(1)?,
                currency: Currency {
                    code: r.get(2)?,
                    name: r.get(3)?,
                },
                is_active: r.get(4)?,
            },
            from_minor_units(r.get(5)?),
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
