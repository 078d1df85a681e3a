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

//! PROC PRINT: the dataset as tab-separated listing lines, each row
//! prefixed with its observation number unless NOOBS.

use crate::{
    ast::ProcPrint,
    catalog::{Catalog, ColumnMeta},
    engine::{Engine, StepError},
    identifier::Identifier,
};

pub(crate) fn run(engine: &mut Engine, proc: &ProcPrint) -> Result<(), StepError> {
    let dataset = engine
        .catalog()
        .dataset(&proc.data)
        .ok_or_else(|| StepError::DatasetNotFound(Catalog::qualified_name(&proc.data)))?
        .clone();

    let columns: Vec<ColumnMeta> = match &proc.vars {
        Some(vars) => {
            let mut columns = Vec::with_capacity(vars.len());
            for name in vars {
                match dataset.column(&Identifier::new(name.as_str())) {
                    Some(meta) => columns.push(meta.clone()),
                    None => engine.warning(format!(
                        "Variable {name} is not in the data set {}.",
                        dataset.name
                    )),
                }
            }
            columns
        }
        None => dataset.columns().to_vec(),
    };

    engine.listing_title();

    let mut header = Vec::with_capacity(columns.len() + 1);
    if !proc.noobs {
        header.push("Obs".to_string());
    }
    header.extend(columns.iter().map(|meta| meta.name.to_string()));
    engine.listing_line(&header.join("\t"));

    let limit = proc.obs.unwrap_or(usize::MAX);
    for (i, _) in dataset.rows.iter().enumerate().take(limit) {
        let mut cells = Vec::with_capacity(columns.len() + 1);
        if !proc.noobs {
            cells.push((i + 1).to_string());
        }
        for meta in &columns {
            cells.push(dataset.value(i, &meta.name).to_string());
        }
        engine.listing_line(&cells.join("\t"));
    }

    engine.note(format!(
        "There were {} observations read from the data set {}.",
        dataset.rows.len(),
        dataset.name
    ));
    Ok(())
}
