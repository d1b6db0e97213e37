// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::user_id;
use crate::analytics::{GroupBy, ReportRequest, SubjectSeries, generate_reports};
use crate::utils::{get_timezone, id_for_category, maybe_print_json, parse_date, pretty_table, today_in};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let series = run(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &series)? {
        println!(
            "{}",
            pretty_table(
                &["Subject", "CCY", "Period", "Income", "Expenditures", "Balance"],
                table_rows(&series),
            )
        );
    }
    Ok(())
}

/// Resolves CLI arguments into a request and generates the report.
pub fn run(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<SubjectSeries>> {
    let user = user_id(conn, sub)?;
    let offset = get_timezone(conn)?;
    let start = sub
        .get_one::<String>("start")
        .map(|s| parse_date(s.trim()))
        .transpose()?;
    let end = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s.trim()))
        .transpose()?;
    let group_by: GroupBy = match sub.get_one::<String>("group-by") {
        Some(g) => g.parse()?,
        None => GroupBy::default(),
    };
    let category_id = sub
        .get_one::<String>("category")
        .map(|c| id_for_category(conn, user, c.trim()))
        .transpose()?;

    let req = ReportRequest::resolve(
        user,
        start,
        end,
        sub.get_one::<String>("granularity").map(String::as_str),
        group_by,
        category_id,
        today_in(&offset),
        offset,
    )?;
    Ok(generate_reports(conn, &req)?)
}

fn table_rows(series: &[SubjectSeries]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for s in series {
        for r in &s.reports {
            let period = match r.day {
                Some(d) => format!("{:04}-{:02}-{:02}", r.year, r.month, d),
                None => format!("{:04}-{:02}", r.year, r.month),
            };
            rows.push(vec![
                s.name.clone(),
                s.currency.code.clone(),
                period,
                format!("{:.2}", r.income),
                format!("{:.2}", r.expenditures),
                r.balance.map(|b| format!("{:.2}", b)).unwrap_or_default(),
            ]);
        }
    }
    rows
}
