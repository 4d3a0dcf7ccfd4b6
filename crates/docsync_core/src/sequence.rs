//! Document number allocation per series and year.
//!
//! Allocation is pure: it reads a counter map and returns the next number
//! together with the updated map. Numbers are strictly increasing per key
//! only if every returned map is persisted before the next allocation on
//! the same key. Two callers allocating from the same stale map will both
//! get the same number.

use crate::counter::CounterMap;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Datelike, NaiveDate};
use std::fmt;

/// A sequence key: `"<series>-<year>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceKey(String);

impl SequenceKey {
    /// Builds the key for a series code and year.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSequenceKey`] if the series code is empty
    /// or contains whitespace.
    pub fn new(series: &str, year: i32) -> CoreResult<Self> {
        if series.is_empty() || series.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidSequenceKey {
                key: format!("{series}-{year}"),
            });
        }
        Ok(Self(format!("{series}-{year}")))
    }

    /// Returns the key as stored in the counter map.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Sequence key the number belongs to.
    pub key: SequenceKey,
    /// The allocated number.
    pub number: u64,
    /// The counter map with `key` advanced to `number`. Persist it.
    pub counters: CounterMap,
}

/// Allocates the next number for `series` in the year of `date`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidSequenceKey`] for an invalid series code, or
/// [`CoreError::SequenceExhausted`] if the stored counter is already at
/// `u64::MAX`.
pub fn allocate(counters: &CounterMap, series: &str, date: NaiveDate) -> CoreResult<Allocation> {
    let key = SequenceKey::new(series, date.year())?;
    let number = counters
        .last(key.as_str())
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| CoreError::SequenceExhausted {
            key: key.as_str().to_owned(),
        })?;

    let mut updated = counters.clone();
    updated.set(key.as_str(), number);

    Ok(Allocation {
        key,
        number,
        counters: updated,
    })
}

/// Parses a document date given as `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps keep the calendar date of their own offset.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDate`] if neither format matches.
pub fn parse_document_date(input: &str) -> CoreResult<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| CoreError::InvalidDate {
            input: input.to_owned(),
        })
}
