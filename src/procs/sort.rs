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

//! PROC SORT: filter with WHERE, sort by the BY variables, optionally drop
//! duplicate keys, and write to OUT= (default: back over the input).

use crate::{
    ast::ProcSort,
    catalog::{Catalog, Dataset},
    data_step::{eval, StepState},
    engine::{Engine, StepError},
    identifier::Identifier,
    sort,
};

pub(crate) fn run(engine: &mut Engine, proc: &ProcSort) -> Result<(), StepError> {
    let dataset = engine
        .catalog()
        .dataset(&proc.input)
        .ok_or_else(|| StepError::DatasetNotFound(Catalog::qualified_name(&proc.input)))?
        .clone();
    let by: Vec<Identifier> = proc
        .by
        .iter()
        .map(|name| Identifier::new(name.as_str()))
        .collect();

    let total = dataset.rows.len();
    let mut rows = dataset.rows.clone();

    // WHERE runs each row through a scratch PDV.
    if let Some(where_clause) = &proc.where_clause {
        let mut state = StepState::scratch_for(dataset.columns());
        let mut kept = Vec::new();
        for row in rows {
            for meta in dataset.columns() {
                if let Some(idx) = state.pdv.find(&meta.name) {
                    let value = row
                        .get(&meta.name)
                        .cloned()
                        .unwrap_or_else(|| meta.missing_value());
                    state.pdv.set_value(idx, value);
                }
            }
            if eval(engine, &mut state, where_clause)?.is_true() {
                kept.push(row);
            }
        }
        engine.note(format!(
            "WHERE clause kept {} of {total} observations.",
            kept.len()
        ));
        rows = kept;
    }

    sort::sort_rows(&mut rows, &by);

    if proc.nodupkey {
        let before = rows.len();
        let mut deduped = Vec::with_capacity(rows.len());
        let mut last_key = None;
        for row in rows {
            let key = sort::key_of(&row, &by);
            if last_key.as_ref() != Some(&key) {
                deduped.push(row);
                last_key = Some(key);
            }
        }
        engine.note(format!(
            "{} observations with duplicate key values were deleted.",
            before - deduped.len()
        ));
        rows = deduped;
    } else if proc.duplicates {
        let duplicates = rows
            .windows(2)
            .filter(|pair| sort::key_of(&pair[0], &by) == sort::key_of(&pair[1], &by))
            .count();
        engine.note(format!("{duplicates} observations have duplicate key values."));
    }

    let out_name = proc.output.as_deref().unwrap_or(&proc.input);
    let mut out = Dataset::new(Catalog::qualified_name(out_name));
    for meta in dataset.columns() {
        out.add_column(meta.clone());
    }
    for row in rows {
        out.push_row(row);
    }
    engine.note(format!(
        "The data set {} has {} observations and {} variables.",
        out.name,
        out.n_rows(),
        out.n_columns()
    ));
    engine.catalog_mut().insert_dataset(out_name, out)?;
    Ok(())
}
