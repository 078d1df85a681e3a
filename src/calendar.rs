// rsas - an interpreter for a subset of the SAS language.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Calendar support for the date functions.
//!
//! Dates are handled as `YYYYMMDD` integers, matching what `today()` returns.
//! Only the `"day"` interval is implemented for `intck`/`intnx`; any other
//! interval is a runtime error raised by the caller.

use chrono::{Datelike, Local, NaiveDate};
use thiserror::Error as ThisError;

#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Interval {0:?} is not supported; only \"day\" is.")]
    Unsupported(String),
}

/// The intervals `intck` and `intnx` understand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interval {
    Day,
}

impl TryFrom<&str> for Interval {
    type Error = IntervalError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.eq_ignore_ascii_case("day") {
            Ok(Self::Day)
        } else {
            Err(IntervalError::Unsupported(s.to_string()))
        }
    }
}

/// Today's date as a `YYYYMMDD` integer.
pub fn today() -> f64 {
    as_yyyymmdd(Local::now().date_naive())
}

pub fn as_yyyymmdd(date: NaiveDate) -> f64 {
    (date.year() as f64) * 10_000.0 + (date.month() as f64) * 100.0 + date.day() as f64
}
