// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Calendar buckets: granularity, canonical keys and stepping.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ReportError;
use crate::utils::from_minor_units;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Daily,
}

impl Granularity {
    /// Unknown or empty input falls back to monthly.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("daily") | Some("day") => Granularity::Daily,
            Some("monthly") | Some("month") | Some("") | None => Granularity::Monthly,
            Some(other) => {
                tracing::debug!(granularity = other, "unsupported granularity, using monthly");
                Granularity::Monthly
            }
        }
    }

    /// `strftime` pattern producing the canonical key in SQLite.
    pub fn sql_format(&self) -> &'static str {
        match self {
            Granularity::Monthly => "%Y%m",
            Granularity::Daily => "%Y%m%d",
        }
    }

    pub fn key_of(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Monthly => format!("{:04}{:02}", date.year(), date.month()),
            Granularity::Daily => {
                format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
            }
        }
    }

    /// Steps one bucket back. `None` only at the edge of the calendar.
    pub fn previous(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Monthly => date.checked_sub_months(Months::new(1)),
            Granularity::Daily => date.pred_opt(),
        }
    }

    /// Start of the default window ending at `end`.
    pub fn default_start(&self, end: NaiveDate) -> NaiveDate {
        let back = match self {
            Granularity::Monthly => 5,
            Granularity::Daily => 1,
        };
        end.checked_sub_months(Months::new(back)).unwrap_or(end)
    }

    pub fn empty_report(&self, date: NaiveDate) -> BucketReport {
        BucketReport {
            year: date.year(),
            month: date.month(),
            day: match self {
                Granularity::Monthly => None,
                Granularity::Daily => Some(date.day()),
            },
            income: from_minor_units(0),
            expenditures: from_minor_units(0),
            balance: None,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Monthly => f.write_str("monthly"),
            Granularity::Daily => f.write_str("daily"),
        }
    }
}

/// One bucket of one subject's series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketReport {
    pub year: i32,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub day: Option<u32>,
    pub income: Decimal,
    pub expenditures: Decimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub balance: Option<Decimal>,
}

impl BucketReport {
    pub fn key(&self) -> String {
        match self.day {
            Some(d) => format!("{:04}{:02}{:02}", self.year, self.month, d),
            None => format!("{:04}{:02}", self.year, self.month),
        }
    }

    /// Balance just before this bucket's own flows were applied.
    pub fn opening_balance(&self) -> Option<Decimal> {
        self.balance
            .map(|b| b - self.income + self.expenditures)
    }
}

/// Parsed `YYYYMM` / `YYYYMMDD` key as produced by the aggregate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketKey {
    pub year: i32,
    pub month: u32,
    pub day: Option<u32>,
}

impl FromStr for BucketKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ReportError::MalformedBucket(s.to_string());
        if !s.bytes().all(|b| b.is_ascii_digit()) || !(s.len() == 6 || s.len() == 8) {
            return Err(bad());
        }
        let year = s[0..4].parse().map_err(|_| bad())?;
        let month = s[4..6].parse().map_err(|_| bad())?;
        let day = if s.len() == 8 {
            Some(s[6..8].parse().map_err(|_| bad())?)
        } else {
            None
        };
        if !(1..=12).contains(&month) {
            return Err(bad());
        }
        Ok(BucketKey { year, month, day })
    }
}
