// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::commands::{rules, transactions, users};
use fintrack::models::TxKind;
use fintrack::{cli, db, utils};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    users::register(&conn, "alice", false).unwrap();
    users::register(&conn, "bob", false).unwrap();
    conn.execute(
        "INSERT INTO categories(owner_id,name) VALUES (1,'Shopping'),(1,'Books'),(2,'Shopping')",
        [],
    )
    .unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["fintrack", "rules"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("rules", rules_m)) = matches.subcommand() {
        rules::handle(conn, rules_m)
    } else {
        panic!("rules command not parsed");
    }
}

fn rule_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM rules", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn rule_matches_description_case_insensitively() {
    let conn = setup();
    run(&conn, &["add", "--user", "alice", "--pattern", "(?i)amazon|amzn", "--category", " Shopping "]).unwrap();

    let cat = utils::apply_category_rules(&conn, 1, "AMZN Mktp US*AB123").unwrap();
    assert_eq!(cat, Some(1));
    assert_eq!(utils::apply_category_rules(&conn, 1, "Coffee").unwrap(), None);
    // rules belong to their owner
    assert_eq!(utils::apply_category_rules(&conn, 2, "amazon").unwrap(), None);
}

#[test]
fn newest_rule_wins() {
    let conn = setup();
    run(&conn, &["add", "--user", "alice", "--pattern", "(?i)amazon", "--category", "Shopping"]).unwrap();
    run(&conn, &["add", "--user", "alice", "--pattern", "(?i)amazon books", "--category", "Books"]).unwrap();

    assert_eq!(
        utils::apply_category_rules(&conn, 1, "Amazon Books order").unwrap(),
        Some(2)
    );
}

#[test]
fn invalid_stored_pattern_is_skipped() {
    let conn = setup();
    conn.execute(
        "INSERT INTO rules(owner_id,pattern,category_id) VALUES (1,'shop',1),(1,'(?P<',2)",
        [],
    )
    .unwrap();
    assert_eq!(utils::apply_category_rules(&conn, 1, "shop").unwrap(), Some(1));
}

#[test]
fn recorded_transaction_picks_up_rule_category() {
    let conn = setup();
    conn.execute("INSERT INTO currencies(code,name) VALUES ('USD','US Dollar')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO accounts(owner_id,name,currency_id) VALUES (1,'Card',1)",
        [],
    )
    .unwrap();
    run(&conn, &["add", "--user", "alice", "--pattern", "(?i)amazon", "--category", "Shopping"]).unwrap();

    let tx = transactions::record(
        &conn,
        &transactions::NewTransaction {
            author_id: 1,
            account: "Card".into(),
            kind: TxKind::Expenditure,
            amount: Decimal::new(4999, 2),
            category: None,
            tags: Vec::new(),
            description: Some("Amazon order".into()),
            created_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        },
    )
    .unwrap();
    assert_eq!(tx.category_id, Some(1));
}

#[test]
fn rules_add_rejects_invalid_regex() {
    let conn = setup();
    let err = run(
        &conn,
        &["add", "--user", "alice", "--pattern", " (?P< ", "--category", " Shopping "],
    )
    .unwrap_err();
    assert!(err.to_string().contains("Invalid regex pattern"));
    assert_eq!(rule_count(&conn), 0);
}

#[test]
fn rules_add_requires_known_category() {
    let conn = setup();
    let err = run(
        &conn,
        &["add", "--user", "alice", "--pattern", "foo", "--category", "Travel"],
    )
    .unwrap_err();
    assert!(err.to_string().contains("Category 'Travel' not found"));
}

#[test]
fn rules_rm_trims_id_argument() {
    let conn = setup();
    conn.execute(
        "INSERT INTO rules(owner_id,pattern,category_id) VALUES (1,'foo',1)",
        [],
    )
    .unwrap();

    run(&conn, &["rm", "--id", " 1 "]).unwrap();
    assert_eq!(rule_count(&conn), 0);
}
