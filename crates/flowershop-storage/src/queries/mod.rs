// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each function takes `&Database` and runs on the
//! connection's background thread.

pub mod assignments;
pub mod catalog;
pub mod orders;
pub mod sessions;
pub mod workers;

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::Row;

/// Read a TEXT column and parse it with `FromStr`, reporting parse failures
/// as column conversion errors.
pub(crate) fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
