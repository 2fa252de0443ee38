// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod broadcasts;
pub mod responses;
pub mod subscribers;
pub mod triggers;
pub mod turns;

use std::str::FromStr;

/// Parse a TEXT column into a strum-backed enum, surfacing a conversion
/// failure as a rusqlite error so it propagates through `query_map`.
pub(crate) fn parse_enum<T>(idx: usize, value: String) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a JSON-encoded TEXT column into a list of strings.
pub(crate) fn parse_string_list(idx: usize, value: String) -> Result<Vec<String>, rusqlite::Error> {
    serde_json::from_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
