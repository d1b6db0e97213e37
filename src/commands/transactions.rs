// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::models::{Transaction, TxKind};
use crate::utils::{
    apply_category_rules, from_minor_units, get_timezone, id_for_account, id_for_category,
    id_for_tag, local_to_utc, maybe_print_json, parse_decimal, parse_local_datetime,
    pretty_table, to_minor_units,
};
use anyhow::{Result, bail};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Input for [`record`]. Names are resolved against the author's own entities.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub author_id: i64,
    pub account: String,
    pub kind: TxKind,
    pub amount: Decimal,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime, // UTC
}

/// Inserts one transaction with its tags. Falls back to categorization rules
/// when no category is given.
pub fn record(conn: &Connection, new: &NewTransaction) -> Result<Transaction> {
    let account_id = id_for_account(conn, new.author_id, &new.account)?;
    let amount_minor = to_minor_units(new.amount)?;
    let category_id = match new.category.as_deref().filter(|c| !c.is_empty()) {
        Some(c) => Some(id_for_category(conn, new.author_id, c)?),
        None => match new.description.as_deref() {
            Some(d) => apply_category_rules(conn, new.author_id, d)?,
            None => None,
        },
    };
    let mut tag_ids = Vec::with_capacity(new.tags.len());
    for t in new.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        tag_ids.push(id_for_tag(conn, new.author_id, t)?);
    }

    conn.execute(
        "INSERT INTO transactions(author_id, account_id, category_id, kind, amount_minor, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.author_id,
            account_id,
            category_id,
            new.kind.as_str(),
            amount_minor,
            new.description,
            new.created_at
        ],
    )?;
    let id = conn.last_insert_rowid();
    for tag_id in tag_ids {
        conn.execute(
            "INSERT OR IGNORE INTO transaction_tags(transaction_id, tag_id) VALUES (?1, ?2)",
            params![id, tag_id],
        )?;
    }
    tracing::debug!(id, account = account_id, kind = %new.kind, amount = %new.amount, "recorded transaction");

    Ok(Transaction {
        id,
        author_id: new.author_id,
        account_id,
        category_id,
        kind: new.kind,
        amount: from_minor_units(amount_minor),
        description: new.description.clone(),
        created_at: new.created_at,
    })
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let author_id = user_id(conn, sub)?;
    let account = sub.get_one::<String>("account").unwrap().trim().to_string();
    let kind: TxKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    if amount <= Decimal::ZERO {
        bail!("Amount must be positive; use --kind to record money going out");
    }
    let category = sub
        .get_one::<String>("category")
        .map(|s| s.trim().to_string());
    let tags = sub
        .get_many::<String>("tag")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    let description = sub
        .get_one::<String>("description")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let created_at = match sub.get_one::<String>("at") {
        Some(raw) => local_to_utc(parse_local_datetime(raw)?, &get_timezone(conn)?),
        None => Utc::now().naive_utc(),
    };

    let tx = record(
        conn,
        &NewTransaction {
            author_id,
            account: account.clone(),
            kind,
            amount,
            category,
            tags,
            description,
            created_at,
        },
    )?;
    println!(
        "Recorded {} {} on {} (acct: {})",
        tx.kind, tx.amount, tx.created_at, account
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.created_at.clone(),
                    r.account.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.currency.clone(),
                    r.category.clone(),
                    r.tags.clone(),
                    r.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "When (UTC)",
                    "Account",
                    "Kind",
                    "Amount",
                    "CCY",
                    "Category",
                    "Tags",
                    "Description"
                ],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub created_at: String,
    pub account: String,
    pub kind: String,
    pub amount: String,
    pub currency: String,
    pub category: String,
    pub tags: String,
    pub description: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let author_id = user_id(conn, sub)?;
    let mut sql = String::from(
        "SELECT t.created_at, a.name, t.kind, t.amount_minor, cur.code, c.name,
                (SELECT group_concat(g.name, ';') FROM transaction_tags tt JOIN tags g ON g.id=tt.tag_id WHERE tt.transaction_id=t.id),
                t.description
         FROM transactions t
         JOIN accounts a ON t.account_id=a.id
         JOIN currencies cur ON a.currency_id=cur.id
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.author_id=?",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(author_id)];

    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.name=?");
        params_vec.push(Box::new(acct.trim().to_string()));
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(Box::new(cat.trim().to_string()));
    }
    sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(*limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let created_at: String = r.get(0)?;
        let account: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let amount_minor: i64 = r.get(3)?;
        let currency: String = r.get(4)?;
        let category: Option<String> = r.get(5)?;
        let tags: Option<String> = r.get(6)?;
        let description: Option<String> = r.get(7)?;
        data.push(TransactionRow {
            created_at,
            account,
            kind,
            amount: format!("{:.2}", from_minor_units(amount_minor)),
            currency,
            category: category.unwrap_or_default(),
            tags: tags.unwrap_or_default(),
            description: description.unwrap_or_default(),
        });
    }
    Ok(data)
}
