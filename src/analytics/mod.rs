// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Income / expenditure / balance series per account or category.
//!
//! A report runs three stages in order: one aggregate query
//! ([`aggregator`]), reshaping rows into per-subject series ([`grouping`]),
//! then gap filling with backward balance propagation ([`backfill`]).

pub mod aggregator;
pub mod backfill;
pub mod bucket;
pub mod error;
pub mod grouping;

pub use backfill::SubjectSeries;
pub use bucket::{BucketReport, Granularity};
pub use error::ReportError;
pub use grouping::GroupBy;

use chrono::{FixedOffset, NaiveDate};
use rusqlite::Connection;

use aggregator::AggregateQuery;

/// Fully resolved report parameters. Build with [`ReportRequest::resolve`].
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub user_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub group_by: GroupBy,
    pub category_id: Option<i64>,
    pub offset: FixedOffset,
}

impl ReportRequest {
    /// Applies defaults and validates the window. `today` is the current date
    /// in `offset`.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        user_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        granularity: Option<&str>,
        group_by: GroupBy,
        category_id: Option<i64>,
        today: NaiveDate,
        offset: FixedOffset,
    ) -> Result<Self, ReportError> {
        let granularity = Granularity::parse_lenient(granularity);
        let end = end.unwrap_or(today);
        let start = start.unwrap_or_else(|| granularity.default_start(end));
        if start > end {
            return Err(ReportError::InvalidRange { start, end });
        }
        Ok(ReportRequest {
            user_id,
            start,
            end,
            granularity,
            group_by,
            category_id,
            offset,
        })
    }

    fn query(&self) -> AggregateQuery {
        AggregateQuery {
            user_id: self.user_id,
            start: self.start,
            end: self.end,
            granularity: self.granularity,
            category_id: self.category_id,
            offset: self.offset,
        }
    }
}

/// Builds every series for `req` from a single aggregate query.
pub fn generate_reports(
    conn: &Connection,
    req: &ReportRequest,
) -> Result<Vec<SubjectSeries>, ReportError> {
    let strategy = req.group_by.strategy();
    let rows = strategy.aggregate(conn, &req.query())?;
    let grouped = grouping::group_rows(strategy, &rows, req.granularity)?;

    let series: Vec<SubjectSeries> = grouped
        .into_iter()
        .map(|s| backfill::backfill(s, req.start, req.end, req.granularity))
        .collect();

    tracing::info!(
        user = req.user_id,
        group_by = %req.group_by,
        granularity = %req.granularity,
        start = %req.start,
        end = %req.end,
        subjects = series.len(),
        "report generated"
    );
    Ok(series)
}
