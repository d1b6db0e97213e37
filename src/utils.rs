// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts `YYYY-MM-DD` (local midnight) or `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_local_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    let date = parse_date(s)?;
    Ok(date.and_time(NaiveTime::MIN))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Converts a non-negative amount to cents, rounding to two places.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        bail!("Amount must not be negative: {}", amount);
    }
    (amount.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| anyhow!("Amount out of range: {}", amount))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_user(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("User '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_currency(conn: &Connection, code: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM currencies WHERE code=?1")?;
    let id: i64 = stmt
        .query_row(params![code.to_uppercase()], |r| r.get(0))
        .with_context(|| format!("Currency '{}' not found", code))?;
    Ok(id)
}

pub fn id_for_account(conn: &Connection, owner_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE owner_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner_id, name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, owner_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE owner_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner_id, name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_tag(conn: &Connection, owner_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM tags WHERE owner_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner_id, name], |r| r.get(0))
        .with_context(|| format!("Tag '{}' not found", name))?;
    Ok(id)
}

// Timezone settings
pub fn parse_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    let s = if s.eq_ignore_ascii_case("utc") || s == "Z" {
        "+00:00"
    } else {
        s
    };
    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => bail!("Invalid timezone offset '{}', expected ±HH:MM", s),
    };
    let (h, m) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid timezone offset '{}', expected ±HH:MM", s))?;
    let h: i32 = h
        .parse()
        .with_context(|| format!("Invalid offset hours in '{}'", s))?;
    let m: i32 = m
        .parse()
        .with_context(|| format!("Invalid offset minutes in '{}'", s))?;
    if m >= 60 {
        bail!("Invalid offset minutes in '{}'", s);
    }
    FixedOffset::east_opt(sign * (h * 3600 + m * 60))
        .ok_or_else(|| anyhow!("Timezone offset '{}' out of range", s))
}

pub fn get_timezone(conn: &Connection) -> Result<FixedOffset> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key='timezone'", [], |r| {
            r.get(0)
        })
        .optional()?;
    match v {
        Some(s) => parse_offset(&s),
        None => parse_offset("+00:00"),
    }
}

pub fn set_timezone(conn: &Connection, offset: &FixedOffset) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('timezone', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![offset.to_string()],
    )?;
    Ok(())
}

pub fn today_in(offset: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(offset).date_naive()
}

/// Local wall-clock time in `offset` to the UTC representation stored in the DB.
pub fn local_to_utc(local: NaiveDateTime, offset: &FixedOffset) -> NaiveDateTime {
    local - Duration::seconds(offset.local_minus_utc() as i64)
}

pub fn utc_to_local(utc: NaiveDateTime, offset: &FixedOffset) -> NaiveDateTime {
    utc + Duration::seconds(offset.local_minus_utc() as i64)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// First matching rule (newest first) for `description`, as a category id.
pub fn apply_category_rules(
    conn: &Connection,
    owner_id: i64,
    description: &str,
) -> Result<Option<i64>> {
    let mut stmt = conn.prepare(
        "SELECT pattern, category_id FROM rules WHERE owner_id=?1 ORDER BY id DESC",
    )?;
    let mut cur = stmt.query(params![owner_id])?;
    while let Some(r) = cur.next()? {
        let pat: String = r.get(0)?;
        let cat: i64 = r.get(1)?;
        match Regex::new(&pat) {
            Ok(re) if re.is_match(description) => return Ok(Some(cat)),
            Ok(_) => {}
            Err(err) => tracing::warn!(pattern = %pat, %err, "skipping invalid rule pattern"),
        }
    }
    Ok(None)
}
