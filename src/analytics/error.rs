// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Unknown grouping '{0}', expected accounts|categories")]
    UnknownGrouping(String),

    #[error("Malformed bucket key '{0}'")]
    MalformedBucket(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}
