// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Grouping strategies and the grouper that turns flat rows into series.

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::aggregator::{AggregateQuery, AggregateRow, aggregate_accounts, aggregate_categories};
use super::bucket::{BucketKey, BucketReport, Granularity};
use super::error::ReportError;
use crate::models::Currency;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Accounts,
    Categories,
}

impl FromStr for GroupBy {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accounts" | "account" => Ok(GroupBy::Accounts),
            "categories" | "category" => Ok(GroupBy::Categories),
            other => Err(ReportError::UnknownGrouping(other.to_string())),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Accounts => f.write_str("accounts"),
            GroupBy::Categories => f.write_str("categories"),
        }
    }
}

impl GroupBy {
    pub fn strategy(&self) -> &'static dyn Grouping {
        match self {
            GroupBy::Accounts => &AccountGrouping,
            GroupBy::Categories => &CategoryGrouping,
        }
    }
}

/// What differs between grouping dimensions. The gap filler never sees it.
pub trait Grouping {
    fn aggregate(
        &self,
        conn: &Connection,
        q: &AggregateQuery,
    ) -> Result<Vec<AggregateRow>, ReportError>;

    fn key_of(&self, row: &AggregateRow) -> String;

    fn attach_balance(&self, series: &mut SeriesBuilder, row: &AggregateRow);
}

pub struct AccountGrouping;

impl Grouping for AccountGrouping {
    fn aggregate(
        &self,
        conn: &Connection,
        q: &AggregateQuery,
    ) -> Result<Vec<AggregateRow>, ReportError> {
        aggregate_accounts(conn, q)
    }

    fn key_of(&self, row: &AggregateRow) -> String {
        row.subject_id.to_string()
    }

    // a zero balance is indistinguishable from no history and stays unset
    fn attach_balance(&self, series: &mut SeriesBuilder, row: &AggregateRow) {
        if let Some(b) = row.balance_to_date.filter(|b| !b.is_zero()) {
            series.ending_balance = Some(b);
        }
    }
}

pub struct CategoryGrouping;

impl Grouping for CategoryGrouping {
    fn aggregate(
        &self,
        conn: &Connection,
        q: &AggregateQuery,
    ) -> Result<Vec<AggregateRow>, ReportError> {
        aggregate_categories(conn, q)
    }

    // the same category recurs once per currency it was used in
    fn key_of(&self, row: &AggregateRow) -> String {
        format!("{}-{}", row.subject_id, row.currency_code)
    }

    fn attach_balance(&self, _series: &mut SeriesBuilder, _row: &AggregateRow) {}
}

/// A subject's sparse series while the report is being assembled.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    pub subject_id: i64,
    pub name: String,
    pub currency: Currency,
    pub ending_balance: Option<Decimal>,
    pub buckets: BTreeMap<String, BucketReport>,
}

impl SeriesBuilder {
    fn from_row(row: &AggregateRow) -> Self {
        SeriesBuilder {
            subject_id: row.subject_id,
            name: row.name.clone(),
            currency: Currency {
                code: row.currency_code.clone(),
                name: row.currency_name.clone(),
            },
            ending_balance: None,
            buckets: BTreeMap::new(),
        }
    }
}

/// Reshapes aggregate rows into one builder per subject, in first-seen order.
pub fn group_rows(
    grouping: &dyn Grouping,
    rows: &[AggregateRow],
    granularity: Granularity,
) -> Result<Vec<SeriesBuilder>, ReportError> {
    let mut order: Vec<SeriesBuilder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let key = grouping.key_of(row);
        let pos = *index.entry(key).or_insert_with(|| {
            order.push(SeriesBuilder::from_row(row));
            order.len() - 1
        });
        let series = &mut order[pos];
        grouping.attach_balance(series, row);

        let Some(raw) = row.bucket.as_deref() else {
            continue;
        };
        let k: BucketKey = raw.parse()?;
        let report = BucketReport {
            year: k.year,
            month: k.month,
            day: match granularity {
                Granularity::Daily => k.day,
                Granularity::Monthly => None,
            },
            income: row.income,
            expenditures: row.expenditures,
            balance: None,
        };
        if let Some(prev) = series.buckets.insert(report.key(), report) {
            tracing::debug!(
                subject = series.subject_id,
                bucket = %prev.key(),
                "duplicate bucket row, keeping the later one"
            );
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, ccy: &str, bucket: Option<&str>, inc: i64, exp: i64) -> AggregateRow {
        AggregateRow {
            subject_id: id,
            name: format!("S{}", id),
            currency_code: ccy.into(),
            currency_name: ccy.into(),
            bucket: bucket.map(String::from),
            income: Decimal::from(inc),
            expenditures: Decimal::from(exp),
            balance_to_date: Some(Decimal::from(inc - exp)),
        }
    }

    #[test]
    fn account_rows_group_by_id_in_first_seen_order() {
        let rows = vec![
            row(2, "USD", Some("202501"), 5, 0),
            row(1, "USD", Some("202501"), 1, 0),
            row(2, "USD", Some("202502"), 7, 3),
        ];
        let out = group_rows(&AccountGrouping, &rows, Granularity::Monthly).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].subject_id, 2);
        assert_eq!(out[0].buckets.len(), 2);
        assert_eq!(out[0].ending_balance, Some(Decimal::from(4)));
        assert_eq!(out[1].subject_id, 1);
    }

    #[test]
    fn categories_split_per_currency_and_never_get_balance() {
        let rows = vec![
            row(9, "EUR", Some("20250102"), 0, 4),
            row(9, "USD", Some("20250102"), 0, 6),
        ];
        let out = group_rows(&CategoryGrouping, &rows, Granularity::Daily).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.ending_balance.is_none()));
        assert_eq!(out[0].buckets["20250102"].day, Some(2));
    }

    #[test]
    fn duplicate_bucket_keeps_later_row() {
        let rows = vec![
            row(1, "USD", Some("202501"), 1, 0),
            row(1, "USD", Some("202501"), 8, 2),
        ];
        let out = group_rows(&AccountGrouping, &rows, Granularity::Monthly).unwrap();
        let b = &out[0].buckets["202501"];
        assert_eq!(b.income, Decimal::from(8));
        assert_eq!(b.expenditures, Decimal::from(2));
    }

    #[test]
    fn rows_without_bucket_create_empty_series() {
        let mut r = row(3, "USD", None, 0, 0);
        r.balance_to_date = Some(Decimal::from(42));
        let out = group_rows(&AccountGrouping, &[r], Granularity::Monthly).unwrap();
        assert!(out[0].buckets.is_empty());
        assert_eq!(out[0].ending_balance, Some(Decimal::from(42)));
    }

    #[test]
    fn zero_balance_is_not_attached() {
        let rows = [row(4, "USD", Some("202501"), 6, 6)];
        let out = group_rows(&AccountGrouping, &rows, Granularity::Monthly).unwrap();
        assert_eq!(out[0].ending_balance, None);
    }

    #[test]
    fn unknown_grouping_is_rejected() {
        assert!(matches!(
            "tags".parse::<GroupBy>(),
            Err(ReportError::UnknownGrouping(_))
        ));
        assert_eq!("Categories".parse::<GroupBy>().unwrap(), GroupBy::Categories);
    }
}
