// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Gap filling and backward balance propagation.
//!
//! Only the balance at `end` is known. Walking from `end` towards `start`,
//! each earlier bucket's balance is recovered by undoing the later bucket's
//! own income and expenditure:
//!
//! `balance(t) = balance(t+1) - income(t+1) + expenditures(t+1)`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bucket::{BucketReport, Granularity};
use super::grouping::SeriesBuilder;
use crate::models::Currency;

/// A finished, gap-free series for one account or category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSeries {
    pub subject_id: i64,
    pub name: String,
    pub currency: Currency,
    pub reports: Vec<BucketReport>,
}

/// Fills every bucket in `[start, end]` and materializes them in ascending
/// order. Does not validate `start <= end`; an inverted range still yields
/// the single bucket at `end`.
pub fn backfill(
    mut series: SeriesBuilder,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
) -> SubjectSeries {
    let start_key = granularity.key_of(start);
    let ending_balance = series.ending_balance.take();

    let mut cursor = end;
    let mut next_opening = None;
    loop {
        let key = granularity.key_of(cursor);
        let bucket = series
            .buckets
            .entry(key.clone())
            .or_insert_with(|| granularity.empty_report(cursor));

        if ending_balance.is_some() {
            bucket.balance = if cursor == end {
                ending_balance
            } else {
                next_opening
            };
        }
        next_opening = bucket.opening_balance();

        if key <= start_key {
            break;
        }
        match granularity.previous(cursor) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }

    SubjectSeries {
        subject_id: series.subject_id,
        name: series.name,
        currency: series.currency,
        // BTreeMap iteration is already ascending by canonical key
        reports: series.buckets.into_values().collect(),
    }
}
