// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod users;
pub mod currencies;
pub mod accounts;
pub mod categories;
pub mod tags;
pub mod transactions;
pub mod rules;
pub mod reports;
pub mod importer;
pub mod exporter;
pub mod config;

use anyhow::Result;
use rusqlite::Connection;

/// Resolves the required `--user` argument to a user id.
pub(crate) fn user_id(conn: &Connection, sub: &clap::ArgMatches) -> Result<i64> {
    let name = sub.get_one::<String>("user").unwrap().trim();
    crate::utils::id_for_user(conn, name)
}
