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

//! The Program Data Vector.
//!
//! A [Pdv] is the working row of a DATA step: one slot per variable, in
//! first-seen order.  At the end of each iteration every slot is reset to
//! its typed missing value unless it is retained — explicitly via RETAIN, or
//! implicitly because its value was loaded from the current input row (such
//! a value stands until the next row replaces it).

use std::collections::HashMap;

use crate::{
    catalog::{ColumnMeta, Row},
    identifier::Identifier,
    value::Value,
};

/// A PDV slot's metadata: a column plus its retention flag.
#[derive(Clone, Debug)]
pub struct PdvVar {
    pub meta: ColumnMeta,

    /// Set by RETAIN: the reset step leaves this slot alone.
    pub retained: bool,

    /// Set for variables fed by the step's input rows; they keep their
    /// loaded value across the reset.
    pub from_input: bool,
}

/// The Program Data Vector: an ordered list of `(PdvVar, Value)` pairs.
#[derive(Debug, Default)]
pub struct Pdv {
    slots: Vec<(PdvVar, Value)>,
    index: HashMap<Identifier, usize>,
}

impl Pdv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Adds a variable, initialized to its typed missing value.  Adding a
    /// name that already exists (in any case) returns the existing slot.
    pub fn add(&mut self, meta: ColumnMeta) -> usize {
        if let Some(&idx) = self.index.get(&meta.name) {
            return idx;
        }
        let idx = self.slots.len();
        self.index.insert(meta.name.clone(), idx);
        let value = meta.missing_value();
        self.slots.push((
            PdvVar {
                meta,
                retained: false,
                from_input: false,
            },
            value,
        ));
        idx
    }

    pub fn find(&self, name: &Identifier) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn var(&self, idx: usize) -> &PdvVar {
        &self.slots[idx].0
    }

    pub fn value(&self, idx: usize) -> &Value {
        &self.slots[idx].1
    }

    pub fn set_value(&mut self, idx: usize, value: Value) {
        self.slots[idx].1 = value;
    }

    pub fn set_retained(&mut self, idx: usize) {
        self.slots[idx].0.retained = true;
    }

    pub fn mark_from_input(&mut self, idx: usize) {
        self.slots[idx].0.from_input = true;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PdvVar, &Value)> {
        self.slots.iter().map(|(var, value)| (var, value))
    }

    /// Overwrites the slots present in `row` with the row's values.
    pub fn load_row(&mut self, row: &Row) {
        for (name, value) in row {
            if let Some(&idx) = self.index.get(name) {
                self.slots[idx].1 = value.clone();
            }
        }
    }

    /// End-of-iteration reset: every slot that is neither retained nor fed
    /// from the input goes back to its typed missing value.
    pub fn reset(&mut self) {
        for (var, value) in &mut self.slots {
            if !var.retained && !var.from_input {
                *value = var.meta.missing_value();
            }
        }
    }

    /// Copies the PDV into a [Row] using `columns` for membership and order.
    pub fn to_row(&self, columns: &[ColumnMeta]) -> Row {
        let mut row = Row::new();
        for meta in columns {
            let value = match self.find(&meta.name) {
                Some(idx) => self.value(idx).clone(),
                None => meta.missing_value(),
            };
            row.insert(meta.name.clone(), value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::Pdv;
    use crate::{
        catalog::{ColumnMeta, Row},
        identifier::Identifier,
        value::Value,
    };

    #[test]
    fn add_is_idempotent() {
        let mut pdv = Pdv::new();
        let a = pdv.add(ColumnMeta::numeric("x"));
        let b = pdv.add(ColumnMeta::numeric("X"));
        assert_eq!(a, b);
        assert_eq!(pdv.len(), 1);
    }

    #[test]
    fn reset_clears_only_unretained() {
        let mut pdv = Pdv::new();
        let kept = pdv.add(ColumnMeta::numeric("total"));
        let cleared = pdv.add(ColumnMeta::numeric("x"));
        let string = pdv.add(ColumnMeta::character("tag"));
        pdv.set_retained(kept);

        pdv.set_value(kept, Value::from(10.0));
        pdv.set_value(cleared, Value::from(5.0));
        pdv.set_value(string, Value::string("hi"));
        pdv.reset();

        assert_eq!(*pdv.value(kept), Value::from(10.0));
        assert_eq!(*pdv.value(cleared), Value::missing());
        assert_eq!(*pdv.value(string), Value::blank());
    }

    #[test]
    fn input_values_survive_reset() {
        let mut pdv = Pdv::new();
        let x = pdv.add(ColumnMeta::numeric("x"));
        pdv.mark_from_input(x);

        let mut row = Row::new();
        row.insert(Identifier::new("x"), Value::from(3.0));
        pdv.load_row(&row);
        pdv.reset();
        assert_eq!(*pdv.value(x), Value::from(3.0));
    }

    #[test]
    fn to_row_follows_column_order() {
        let mut pdv = Pdv::new();
        let x = pdv.add(ColumnMeta::numeric("x"));
        let y = pdv.add(ColumnMeta::numeric("y"));
        pdv.set_value(x, Value::from(1.0));
        pdv.set_value(y, Value::from(2.0));

        let columns = vec![ColumnMeta::numeric("y"), ColumnMeta::numeric("x")];
        let row = pdv.to_row(&columns);
        let keys: Vec<String> = row.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["y", "x"]);
    }
}
