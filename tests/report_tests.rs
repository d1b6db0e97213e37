// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::analytics::{
    GroupBy, ReportError, ReportRequest, SubjectSeries, generate_reports,
};
use fintrack::commands::{reports, transactions, users};
use fintrack::models::TxKind;
use fintrack::utils::{id_for_category, parse_local_datetime, parse_offset, set_timezone};
use fintrack::{cli, db};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> (Connection, i64) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute_batch(
        "INSERT INTO currencies(code, name) VALUES ('USD', 'US Dollar'), ('EUR', 'Euro');",
    )
    .unwrap();
    let user = users::register(&conn, "alice", true).unwrap();
    add_account(&conn, user.id, "Wallet", "USD");
    add_account(&conn, user.id, "Savings", "EUR");
    (conn, user.id)
}

fn add_account(conn: &Connection, owner: i64, name: &str, ccy: &str) {
    conn.execute(
        "INSERT INTO accounts(owner_id, name, currency_id) VALUES (?1, ?2, (SELECT id FROM currencies WHERE code=?3))",
        params![owner, name, ccy],
    )
    .unwrap();
}

fn tx(conn: &Connection, user: i64, account: &str, kind: TxKind, amount: &str, at: &str) {
    tx_cat(conn, user, account, kind, amount, at, None);
}

fn tx_cat(
    conn: &Connection,
    user: i64,
    account: &str,
    kind: TxKind,
    amount: &str,
    at: &str,
    category: Option<&str>,
) {
    transactions::record(
        conn,
        &transactions::NewTransaction {
            author_id: user,
            account: account.into(),
            kind,
            amount: amount.parse().unwrap(),
            category: category.map(String::from),
            tags: vec![],
            description: None,
            created_at: parse_local_datetime(at).unwrap(),
        },
    )
    .unwrap();
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn request(
    user: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    granularity: &str,
    group_by: GroupBy,
) -> ReportRequest {
    ReportRequest::resolve(
        user,
        start,
        end,
        Some(granularity),
        group_by,
        None,
        d(2025, 6, 15),
        parse_offset("UTC").unwrap(),
    )
    .unwrap()
}

fn assert_backward_recurrence(s: &SubjectSeries) {
    for w in s.reports.windows(2) {
        let later = &w[1];
        let expected = later.balance.unwrap() - later.income + later.expenditures;
        assert_eq!(w[0].balance, Some(expected), "series {}", s.name);
    }
}

#[test]
fn monthly_default_range_has_six_buckets() {
    let (conn, user) = setup();
    tx(&conn, user, "Wallet", TxKind::Income, "310", "2025-06-15 09:00");
    tx(&conn, user, "Wallet", TxKind::Expenditure, "100", "2025-06-15 18:30");

    let out = generate_reports(&conn, &request(user, None, None, "monthly", GroupBy::Accounts))
        .unwrap();
    assert_eq!(out.len(), 1);
    let s = &out[0];
    assert_eq!(s.name, "Wallet");
    assert_eq!(s.currency.code, "USD");

    let months: Vec<(i32, u32)> = s.reports.iter().map(|r| (r.year, r.month)).collect();
    assert_eq!(
        months,
        [(2025, 1), (2025, 2), (2025, 3), (2025, 4), (2025, 5), (2025, 6)]
    );
    let last = s.reports.last().unwrap();
    assert_eq!(last.income, dec("310"));
    assert_eq!(last.expenditures, dec("100"));
    assert_eq!(last.balance, Some(dec("210")));
    for r in &s.reports[..5] {
        assert_eq!(r.income, Decimal::ZERO);
        assert_eq!(r.expenditures, Decimal::ZERO);
        assert_eq!(r.balance, Some(Decimal::ZERO));
        assert_eq!(r.day, None);
    }
}

#[test]
fn daily_default_range_covers_one_month() {
    let (conn, user) = setup();
    tx(&conn, user, "Wallet", TxKind::Income, "310", "2025-06-15 09:00");
    tx(&conn, user, "Wallet", TxKind::Expenditure, "100", "2025-06-15 10:00");

    let out =
        generate_reports(&conn, &request(user, None, None, "daily", GroupBy::Accounts)).unwrap();
    let s = &out[0];
    // 2025-05-15 ..= 2025-06-15
    assert_eq!(s.reports.len(), 32);
    assert_eq!(
        (s.reports[0].month, s.reports[0].day),
        (5, Some(15))
    );
    let last = s.reports.last().unwrap();
    assert_eq!((last.month, last.day), (6, Some(15)));
    assert_eq!(last.balance, Some(dec("210")));
    assert!(
        s.reports[..31]
            .iter()
            .all(|r| r.income.is_zero() && r.expenditures.is_zero())
    );
    assert_backward_recurrence(s);
}

#[test]
fn accounts_are_balanced_independently() {
    let (conn, user) = setup();
    tx(&conn, user, "Wallet", TxKind::Income, "50", "2025-06-03 12:00");
    tx(&conn, user, "Savings", TxKind::Income, "1000", "2025-06-10 08:00");
    tx(&conn, user, "Savings", TxKind::Expenditure, "200", "2025-06-11 08:00");

    let out = generate_reports(&conn, &request(user, None, None, "monthly", GroupBy::Accounts))
        .unwrap();
    let names: Vec<&str> = out.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Savings", "Wallet"]);

    let savings = out[0].reports.last().unwrap();
    assert_eq!(savings.balance, Some(dec("800")));
    assert_eq!(out[0].currency.code, "EUR");
    let wallet = out[1].reports.last().unwrap();
    assert_eq!(wallet.balance, Some(dec("50")));
    assert_eq!(wallet.expenditures, Decimal::ZERO);
    for s in &out {
        assert_eq!(s.reports.len(), 6);
        assert_backward_recurrence(s);
    }
}

#[test]
fn empty_middle_month_carries_older_balance() {
    let (conn, user) = setup();
    tx(&conn, user, "Wallet", TxKind::Income, "100", "2025-04-10 12:00");
    tx(&conn, user, "Wallet", TxKind::Income, "310", "2025-06-15 12:00");
    tx(&conn, user, "Wallet", TxKind::Expenditure, "100", "2025-06-15 13:00");

    let out = generate_reports(
        &conn,
        &request(user, Some(d(2025, 4, 1)), None, "monthly", GroupBy::Accounts),
    )
    .unwrap();
    let r = &out[0].reports;
    assert_eq!(r.len(), 3);
    assert_eq!(r[0].income, dec("100"));
    assert_eq!(r[1].income, Decimal::ZERO);
    assert_eq!(r[1].balance, r[0].balance);
    assert_eq!(r[0].balance, Some(dec("100")));
    assert_eq!(r[2].balance, Some(dec("310")));
    assert_backward_recurrence(&out[0]);
}

#[test]
fn category_series_carry_no_balance() {
    let (conn, user) = setup();
    tx_cat(&conn, user, "Wallet", TxKind::Expenditure, "40", "2025-06-02 10:00", Some("Groceries"));
    tx_cat(&conn, user, "Wallet", TxKind::Income, "500", "2025-06-01 10:00", Some("Salary"));
    tx_cat(&conn, user, "Savings", TxKind::Expenditure, "7.5", "2025-05-20 10:00", Some("Groceries"));
    tx(&conn, user, "Wallet", TxKind::Expenditure, "3", "2025-06-02 11:00");

    let out = generate_reports(&conn, &request(user, None, None, "monthly", GroupBy::Categories))
        .unwrap();
    // Groceries once per currency, then Salary; uncategorized is not a subject
    let keys: Vec<(&str, &str)> = out
        .iter()
        .map(|s| (s.name.as_str(), s.currency.code.as_str()))
        .collect();
    assert_eq!(keys, [("Groceries", "EUR"), ("Groceries", "USD"), ("Salary", "USD")]);

    for s in &out {
        assert_eq!(s.reports.len(), 6);
        assert!(s.reports.iter().all(|r| r.balance.is_none()));
    }
    assert_eq!(out[0].reports[4].expenditures, dec("7.5"));
    assert_eq!(out[1].reports[5].expenditures, dec("40"));

    let json = serde_json::to_value(&out).unwrap();
    for s in json.as_array().unwrap() {
        for r in s["reports"].as_array().unwrap() {
            assert!(r.get("balance").is_none());
        }
    }
}

#[test]
fn category_filter_limits_series() {
    let (conn, user) = setup();
    tx_cat(&conn, user, "Wallet", TxKind::Expenditure, "40", "2025-06-02 10:00", Some("Groceries"));
    tx_cat(&conn, user, "Wallet", TxKind::Income, "500", "2025-06-01 10:00", Some("Salary"));
    let salary = id_for_category(&conn, user, "Salary").unwrap();

    let req = ReportRequest::resolve(
        user,
        None,
        Some(d(2025, 6, 30)),
        Some("daily"),
        GroupBy::Categories,
        Some(salary),
        d(2025, 6, 15),
        parse_offset("UTC").unwrap(),
    )
    .unwrap();
    let out = generate_reports(&conn, &req).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].subject_id, salary);
    // 2025-05-30 ..= 2025-06-30
    assert_eq!(out[0].reports.len(), 32);
}

#[test]
fn category_filter_narrows_account_flows_but_not_balance() {
    let (conn, user) = setup();
    tx_cat(&conn, user, "Wallet", TxKind::Income, "500", "2025-06-01 10:00", Some("Salary"));
    tx_cat(&conn, user, "Wallet", TxKind::Expenditure, "40", "2025-06-02 10:00", Some("Groceries"));
    tx_cat(&conn, user, "Savings", TxKind::Expenditure, "7", "2025-06-05 10:00", Some("Groceries"));
    let groceries = id_for_category(&conn, user, "Groceries").unwrap();

    let req = ReportRequest::resolve(
        user,
        None,
        None,
        Some("monthly"),
        GroupBy::Accounts,
        Some(groceries),
        d(2025, 6, 15),
        parse_offset("UTC").unwrap(),
    )
    .unwrap();
    let out = generate_reports(&conn, &req).unwrap();
    let names: Vec<&str> = out.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Savings", "Wallet"]);

    let savings = out[0].reports.last().unwrap();
    assert_eq!(savings.expenditures, dec("7"));
    assert_eq!(savings.balance, Some(dec("-7")));

    let wallet = out[1].reports.last().unwrap();
    assert_eq!(wallet.income, Decimal::ZERO);
    assert_eq!(wallet.expenditures, dec("40"));
    // the salary is filtered from the flows but still counts towards the balance
    assert_eq!(wallet.balance, Some(dec("460")));
}

#[test]
fn account_netting_to_zero_reports_no_balance() {
    let (conn, user) = setup();
    tx(&conn, user, "Wallet", TxKind::Income, "100", "2025-06-10 12:00");
    tx(&conn, user, "Wallet", TxKind::Expenditure, "100", "2025-06-11 12:00");

    let out = generate_reports(&conn, &request(user, None, None, "monthly", GroupBy::Accounts))
        .unwrap();
    assert_eq!(out.len(), 1);
    let r = &out[0].reports;
    assert_eq!(r.len(), 6);
    assert!(r.iter().all(|b| b.balance.is_none()));
    assert_eq!(r[5].income, dec("100"));
    assert_eq!(r[5].expenditures, dec("100"));

    let json = serde_json::to_value(&out[0]).unwrap();
    for b in json["reports"].as_array().unwrap() {
        assert!(b.get("balance").is_none());
    }
    // gap buckets share the two-decimal scale of aggregated figures
    assert_eq!(json["reports"][0]["income"], "0.00");
    assert_eq!(json["reports"][5]["income"], "100.00");
}

#[test]
fn history_before_window_still_reports_account() {
    let (conn, user) = setup();
    tx(&conn, user, "Savings", TxKind::Income, "70", "2024-01-01 10:00");

    let out = generate_reports(&conn, &request(user, None, None, "monthly", GroupBy::Accounts))
        .unwrap();
    // Wallet never had a transaction and is left out
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].name, "Savings");
    for r in &out[0].reports {
        assert!(r.income.is_zero() && r.expenditures.is_zero());
        assert_eq!(r.balance, Some(dec("70")));
    }
}

#[test]
fn inactive_accounts_and_other_users_are_ignored() {
    let (conn, user) = setup();
    let bob = users::register(&conn, "bob", false).unwrap();
    add_account(&conn, bob.id, "Wallet", "USD");
    tx(&conn, bob.id, "Wallet", TxKind::Income, "999", "2025-06-01 10:00");
    tx(&conn, user, "Savings", TxKind::Income, "5", "2025-06-01 10:00");
    tx(&conn, user, "Wallet", TxKind::Income, "20", "2025-06-01 10:00");
    conn.execute(
        "UPDATE accounts SET is_active=0 WHERE owner_id=?1 AND name='Savings'",
        params![user],
    )
    .unwrap();

    let out = generate_reports(&conn, &request(user, None, None, "monthly", GroupBy::Accounts))
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].name, "Wallet");
    assert_eq!(out[0].reports.last().unwrap().balance, Some(dec("20")));
}

#[test]
fn transactions_after_end_do_not_move_the_anchor() {
    let (conn, user) = setup();
    tx(&conn, user, "Wallet", TxKind::Income, "100", "2025-06-09 23:59");
    tx(&conn, user, "Wallet", TxKind::Expenditure, "30", "2025-06-10 00:00");
    tx(&conn, user, "Wallet", TxKind::Expenditure, "50", "2025-06-11 00:00");

    let out = generate_reports(
        &conn,
        &request(user, Some(d(2025, 6, 8)), Some(d(2025, 6, 10)), "daily", GroupBy::Accounts),
    )
    .unwrap();
    let r = &out[0].reports;
    assert_eq!(r.len(), 3);
    assert_eq!(r[2].balance, Some(dec("70")));
    assert_eq!(r[1].balance, Some(dec("100")));
    assert_eq!(r[0].balance, Some(Decimal::ZERO));
}

#[test]
fn decimal_sums_are_exact() {
    let (conn, user) = setup();
    for _ in 0..10 {
        tx(&conn, user, "Wallet", TxKind::Income, "0.1", "2025-06-01 10:00");
    }
    tx(&conn, user, "Wallet", TxKind::Expenditure, "0.2", "2025-05-01 10:00");

    let out = generate_reports(&conn, &request(user, None, None, "monthly", GroupBy::Accounts))
        .unwrap();
    let r = &out[0].reports;
    assert_eq!(r[5].income, dec("1.00"));
    assert_eq!(r[5].balance, Some(dec("0.8")));
    assert_eq!(r[4].balance, Some(dec("-0.2")));
    assert_eq!(r[3].balance, Some(Decimal::ZERO));
}

#[test]
fn buckets_follow_configured_timezone() {
    let (conn, user) = setup();
    // 23:30 UTC on May 31 is already June 1 at +02:00
    tx(&conn, user, "Wallet", TxKind::Income, "10", "2025-05-31 23:30");
    let req = ReportRequest::resolve(
        user,
        Some(d(2025, 5, 1)),
        Some(d(2025, 6, 30)),
        Some("monthly"),
        GroupBy::Accounts,
        None,
        d(2025, 6, 15),
        parse_offset("+02:00").unwrap(),
    )
    .unwrap();
    let out = generate_reports(&conn, &req).unwrap();
    let r = &out[0].reports;
    assert_eq!(r.len(), 2);
    assert_eq!(r[0].income, Decimal::ZERO);
    assert_eq!(r[1].income, dec("10"));
}

#[test]
fn resolve_rejects_inverted_range() {
    let err = ReportRequest::resolve(
        1,
        Some(d(2025, 6, 2)),
        Some(d(2025, 6, 1)),
        None,
        GroupBy::Accounts,
        None,
        d(2025, 6, 15),
        parse_offset("UTC").unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, ReportError::InvalidRange { .. }));
}

#[test]
fn report_command_treats_unknown_granularity_as_monthly() {
    let (conn, user) = setup();
    set_timezone(&conn, &parse_offset("UTC").unwrap()).unwrap();
    tx(&conn, user, "Wallet", TxKind::Income, "12.34", "2025-02-14 10:00");

    let matches = cli::build_cli().get_matches_from([
        "fintrack",
        "report",
        "--user",
        "alice",
        "--granularity",
        "weekly",
        "--start",
        "2025-01-01",
        "--end",
        "2025-03-31",
    ]);
    if let Some(("report", sub)) = matches.subcommand() {
        let out = reports::run(&conn, sub).unwrap();
        assert_eq!(out.len(), 1);
        let r = &out[0].reports;
        assert_eq!(r.len(), 3);
        assert!(r.iter().all(|b| b.day.is_none()));
        assert_eq!(r[1].income, dec("12.34"));
        assert_eq!(r[2].balance, Some(dec("12.34")));
    } else {
        panic!("no report subcommand");
    }
}

#[test]
fn report_command_rejects_unknown_grouping() {
    let (conn, _user) = setup();
    let matches = cli::build_cli().get_matches_from([
        "fintrack",
        "report",
        "--user",
        "alice",
        "--group-by",
        "tags",
    ]);
    if let Some(("report", sub)) = matches.subcommand() {
        let err = reports::run(&conn, sub).unwrap_err();
        assert!(err.to_string().contains("Unknown grouping 'tags'"));
    } else {
        panic!("no report subcommand");
    }
}
