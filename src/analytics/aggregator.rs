// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The single grouped aggregate query behind every report.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, named_params};
use rust_decimal::Decimal;

use super::bucket::Granularity;
use super::error::ReportError;
use crate::utils::{from_minor_units, local_to_utc};

/// Window and filters for one aggregate query.
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    pub user_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub category_id: Option<i64>,
    pub offset: FixedOffset,
}

impl AggregateQuery {
    /// UTC timestamp of local midnight on `start`.
    pub fn lower_bound(&self) -> NaiveDateTime {
        local_to_utc(self.start.and_time(NaiveTime::MIN), &self.offset)
    }

    /// Exclusive UTC bound: local midnight after `end`.
    pub fn upper_bound(&self) -> NaiveDateTime {
        let next = self.end.succ_opt().unwrap_or(self.end);
        local_to_utc(next.and_time(NaiveTime::MIN), &self.offset)
    }

    /// SQLite date modifier that moves stored UTC into the configured zone.
    pub fn shift_modifier(&self) -> String {
        format!("{:+} seconds", self.offset.local_minus_utc())
    }
}

/// One (subject, bucket) row. `bucket` is `None` for an account whose only
/// history lies before the window.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub subject_id: i64,
    pub name: String,
    pub currency_code: String,
    pub currency_name: String,
    pub bucket: Option<String>,
    pub income: Decimal,
    pub expenditures: Decimal,
    pub balance_to_date: Option<Decimal>,
}

const ACCOUNT_SQL: &str = r#"
WITH history AS (
    SELECT t.account_id AS subject_id,
           SUM(CASE WHEN t.kind = 'income' THEN t.amount_minor ELSE -t.amount_minor END) AS balance
    FROM transactions t
    JOIN accounts a ON a.id = t.account_id
    WHERE a.is_active = 1 AND t.author_id = :user AND t.created_at < :upper
    GROUP BY t.account_id
),
windowed AS (
    SELECT t.account_id AS subject_id,
           strftime(:fmt, t.created_at, :shift) AS bucket,
           SUM(CASE WHEN t.kind = 'income' THEN t.amount_minor ELSE 0 END) AS income,
           SUM(CASE WHEN t.kind = 'expenditure' THEN t.amount_minor ELSE 0 END) AS expenditures
    FROM transactions t
    JOIN accounts a ON a.id = t.account_id
    WHERE a.is_active = 1 AND t.author_id = :user
      AND t.created_at >= :lower AND t.created_at < :upper
      AND (:category IS NULL OR t.category_id = :category)
    GROUP BY t.account_id, bucket
)
SELECT a.id, a.name, c.code, c.name, w.bucket,
       IFNULL(w.income, 0), IFNULL(w.expenditures, 0), IFNULL(h.balance, 0)
FROM history h
JOIN accounts a ON a.id = h.subject_id
JOIN currencies c ON c.id = a.currency_id
LEFT JOIN windowed w ON w.subject_id = h.subject_id
ORDER BY a.name, a.id, w.bucket
"#;

const CATEGORY_SQL: &str = r#"
SELECT cat.id, cat.name, c.code, c.name,
       strftime(:fmt, t.created_at, :shift) AS bucket,
       IFNULL(SUM(CASE WHEN t.kind = 'income' THEN t.amount_minor END), 0),
       IFNULL(SUM(CASE WHEN t.kind = 'expenditure' THEN t.amount_minor END), 0),
       NULL
FROM transactions t
JOIN accounts a ON a.id = t.account_id
JOIN categories cat ON cat.id = t.category_id
JOIN currencies c ON c.id = a.currency_id
WHERE a.is_active = 1 AND t.author_id = :user
  AND t.created_at >= :lower AND t.created_at < :upper
  AND (:category IS NULL OR t.category_id = :category)
GROUP BY cat.id, c.id, bucket
ORDER BY cat.name, cat.id, c.code, bucket
"#;

/// Per-account sums plus each account's balance as of the window end. The
/// category filter narrows the sums only; the balance covers every transaction.
pub fn aggregate_accounts(
    conn: &Connection,
    q: &AggregateQuery,
) -> Result<Vec<AggregateRow>, ReportError> {
    let mut stmt = conn.prepare(ACCOUNT_SQL)?;
    let rows = stmt.query_map(
        named_params! {
            ":user": q.user_id,
            ":fmt": q.granularity.sql_format(),
            ":shift": q.shift_modifier(),
            ":lower": q.lower_bound(),
            ":upper": q.upper_bound(),
            ":category": q.category_id,
        },
        map_row,
    )?;
    collect(rows)
}

/// Per-(category, currency) sums; categories carry no balance.
pub fn aggregate_categories(
    conn: &Connection,
    q: &AggregateQuery,
) -> Result<Vec<AggregateRow>, ReportError> {
    let mut stmt = conn.prepare(CATEGORY_SQL)?;
    let rows = stmt.query_map(
        named_params! {
            ":user": q.user_id,
            ":fmt": q.granularity.sql_format(),
            ":shift": q.shift_modifier(),
            ":lower": q.lower_bound(),
            ":upper": q.upper_bound(),
            ":category": q.category_id,
        },
        map_row,
    )?;
    collect(rows)
}

fn map_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<AggregateRow> {
    Ok(AggregateRow {
        subject_id: r.get(0)?,
        name: r.get(1)?,
        currency_code: r.get(2)?,
        currency_name: r.get(3)?,
        bucket: r.get(4)?,
        income: from_minor_units(r.get(5)?),
        expenditures: from_minor_units(r.get(6)?),
        balance_to_date: r.get::<_, Option<i64>>(7)?.map(from_minor_units),
    })
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<AggregateRow>>,
) -> Result<Vec<AggregateRow>, ReportError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    tracing::debug!(rows = out.len(), "aggregate query finished");
    Ok(out)
}
