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

//! PROC MEANS: N, mean, min, max, and standard deviation per analysis
//! variable.  VAR defaults to every numeric column.  The standard deviation
//! is the sample statistic (n − 1 denominator), missing when N < 2.

use itertools::Itertools;

use crate::{
    ast::{MeansStat, ProcMeans},
    catalog::{Catalog, ColumnMeta},
    engine::{Engine, StepError},
    identifier::Identifier,
    value::Value,
};

pub(crate) fn run(engine: &mut Engine, proc: &ProcMeans) -> Result<(), StepError> {
    let dataset = engine
        .catalog()
        .dataset(&proc.data)
        .ok_or_else(|| StepError::DatasetNotFound(Catalog::qualified_name(&proc.data)))?
        .clone();

    let columns: Vec<ColumnMeta> = if proc.vars.is_empty() {
        dataset
            .columns()
            .iter()
            .filter(|meta| meta.is_numeric)
            .cloned()
            .collect()
    } else {
        let mut columns = Vec::with_capacity(proc.vars.len());
        for name in &proc.vars {
            match dataset.column(&Identifier::new(name.as_str())) {
                Some(meta) if meta.is_numeric => columns.push(meta.clone()),
                Some(_) => engine.warning(format!(
                    "Variable {name} is not numeric and was dropped from the analysis."
                )),
                None => engine.warning(format!(
                    "Variable {name} is not in the data set {}.",
                    dataset.name
                )),
            }
        }
        columns
    };

    engine.listing_title();

    let header = std::iter::once("Variable".to_string())
        .chain(proc.stats.iter().map(|stat| stat.header().to_string()))
        .join("\t");
    engine.listing_line(&header);

    for meta in &columns {
        let values: Vec<f64> = dataset
            .rows
            .iter()
            .filter_map(|row| row.get(&meta.name))
            .filter_map(Value::as_number)
            .collect();
        let summary = Summary::of(&values);

        let line = std::iter::once(meta.name.to_string())
            .chain(proc.stats.iter().map(|stat| summary.format(*stat)))
            .join("\t");
        engine.listing_line(&line);
    }

    engine.note(format!(
        "There were {} observations read from the data set {}.",
        dataset.rows.len(),
        dataset.name
    ));
    Ok(())
}

struct Summary {
    n: usize,
    mean: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    std: Option<f64>,
}

impl Summary {
    fn of(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                n,
                mean: None,
                min: None,
                max: None,
                std: None,
            };
        }
        let sum: f64 = values.iter().sum();
        let mean = sum / n as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std = if n >= 2 {
            let ss: f64 = values.iter().map(|x| (x - mean) * (x - mean)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        } else {
            None
        };
        Self {
            n,
            mean: Some(mean),
            min: Some(min),
            max: Some(max),
            std,
        }
    }

    fn format(&self, stat: MeansStat) -> String {
        match stat {
            MeansStat::N => self.n.to_string(),
            MeansStat::Mean => Value::Number(self.mean).to_string(),
            MeansStat::Min => Value::Number(self.min).to_string(),
            MeansStat::Max => Value::Number(self.max).to_string(),
            MeansStat::Std => Value::Number(self.std).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Summary;

    #[test]
    fn summary_statistics() {
        let summary = Summary::of(&[2.0, 4.0, 6.0, 8.0]);
        assert_eq!(summary.n, 4);
        assert_eq!(summary.mean, Some(5.0));
        assert_eq!(summary.min, Some(2.0));
        assert_eq!(summary.max, Some(8.0));
        // Sample variance of 2,4,6,8 is 20/3.
        let std = summary.std.unwrap();
        assert!((std - (20.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_std() {
        let summary = Summary::of(&[7.0]);
        assert_eq!(summary.n, 1);
        assert_eq!(summary.mean, Some(7.0));
        assert_eq!(summary.std, None);
    }

    #[test]
    fn empty_input_is_all_missing() {
        let summary = Summary::of(&[]);
        assert_eq!(summary.n, 0);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.format(crate::ast::MeansStat::Mean), ".");
    }
}
