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

//! Sorting rows by BY variables.
//!
//! All sorts are stable and ascending.  Missing values order before every
//! number (see [Value]'s `Ord`), so they group at the front the way SAS
//! sorts them.

use std::cmp::Ordering;

use crate::{catalog::Row, identifier::Identifier, value::Value};

/// The BY-variable key of one row.  Absent variables key as numeric missing.
pub fn key_of(row: &Row, by: &[Identifier]) -> Vec<Value> {
    by.iter()
        .map(|name| row.get(name).cloned().unwrap_or(Value::missing()))
        .collect()
}

pub fn compare_rows(a: &Row, b: &Row, by: &[Identifier]) -> Ordering {
    for name in by {
        let left = a.get(name).cloned().unwrap_or(Value::missing());
        let right = b.get(name).cloned().unwrap_or(Value::missing());
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Stable ascending sort by the BY variables.
pub fn sort_rows(rows: &mut [Row], by: &[Identifier]) {
    rows.sort_by(|a, b| compare_rows(a, b, by));
}

pub fn is_sorted(rows: &[Row], by: &[Identifier]) -> bool {
    rows.windows(2)
        .all(|pair| compare_rows(&pair[0], &pair[1], by) != Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::{is_sorted, sort_rows};
    use crate::{catalog::Row, identifier::Identifier, value::Value};

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(name, value)| (Identifier::new(*name), value.clone()))
            .collect()
    }

    fn by(names: &[&str]) -> Vec<Identifier> {
        names.iter().map(|name| Identifier::new(*name)).collect()
    }

    #[test]
    fn sorts_ascending_with_missing_first() {
        let mut rows = vec![
            row(&[("id", Value::from(2.0))]),
            row(&[("id", Value::missing())]),
            row(&[("id", Value::from(1.0))]),
        ];
        sort_rows(&mut rows, &by(&["id"]));
        assert_eq!(rows[0][&Identifier::new("id")], Value::missing());
        assert_eq!(rows[1][&Identifier::new("id")], Value::from(1.0));
        assert_eq!(rows[2][&Identifier::new("id")], Value::from(2.0));
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut rows = vec![
            row(&[("k", Value::from(1.0)), ("tag", Value::string("first"))]),
            row(&[("k", Value::from(1.0)), ("tag", Value::string("second"))]),
        ];
        sort_rows(&mut rows, &by(&["k"]));
        assert_eq!(rows[0][&Identifier::new("tag")], Value::string("first"));
    }

    #[test]
    fn sorting_sorted_input_is_idempotent() {
        let mut rows = vec![
            row(&[("id", Value::from(1.0))]),
            row(&[("id", Value::from(2.0))]),
            row(&[("id", Value::from(3.0))]),
        ];
        let keys = by(&["id"]);
        assert!(is_sorted(&rows, &keys));
        let before = rows.clone();
        sort_rows(&mut rows, &keys);
        assert_eq!(rows, before);
    }

    #[test]
    fn multi_key_ordering() {
        let mut rows = vec![
            row(&[("a", Value::from(1.0)), ("b", Value::from(2.0))]),
            row(&[("a", Value::from(1.0)), ("b", Value::from(1.0))]),
            row(&[("a", Value::from(0.0)), ("b", Value::from(9.0))]),
        ];
        let keys = by(&["a", "b"]);
        sort_rows(&mut rows, &keys);
        assert_eq!(rows[0][&Identifier::new("b")], Value::from(9.0));
        assert_eq!(rows[1][&Identifier::new("b")], Value::from(1.0));
    }
}
