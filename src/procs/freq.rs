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

//! PROC FREQ: one frequency table per TABLES variable, sorted by descending
//! count with ties broken by value order.  Missing values are not counted.

use indexmap::IndexMap;

use crate::{
    ast::ProcFreq,
    catalog::Catalog,
    engine::{Engine, StepError},
    identifier::Identifier,
    value::Value,
};

pub(crate) fn run(engine: &mut Engine, proc: &ProcFreq) -> Result<(), StepError> {
    let dataset = engine
        .catalog()
        .dataset(&proc.data)
        .ok_or_else(|| StepError::DatasetNotFound(Catalog::qualified_name(&proc.data)))?
        .clone();

    engine.listing_title();

    for name in &proc.tables {
        let id = Identifier::new(name.as_str());
        let Some(meta) = dataset.column(&id) else {
            engine.warning(format!(
                "Variable {name} is not in the data set {}.",
                dataset.name
            ));
            continue;
        };

        let mut counts: IndexMap<Value, usize> = IndexMap::new();
        for row in &dataset.rows {
            let value = row
                .get(&meta.name)
                .cloned()
                .unwrap_or_else(|| meta.missing_value());
            if value.is_missing() {
                continue;
            }
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut entries: Vec<(Value, usize)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        engine.listing_line(&format!("{}\tFrequency", meta.name));
        let mut total = 0usize;
        for (value, count) in &entries {
            engine.listing_line(&format!("{value}\t{count}"));
            total += count;
        }
        engine.note(format!(
            "{total} non-missing observations of {} were tabulated.",
            meta.name
        ));
    }
    Ok(())
}
