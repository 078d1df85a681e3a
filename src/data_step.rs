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

//! DATA step execution.
//!
//! A DATA step builds its PDV, then runs its body once per input row (or
//! once in total when there is no row source).  OUTPUT snapshots the PDV
//! into the output dataset, projected through KEEP/DROP; if the body
//! contains no OUTPUT statement anywhere, an implicit one fires at the end
//! of each iteration.  Row sources are, in order of precedence: SET, MERGE,
//! and INPUT/DATALINES.

use std::collections::HashSet;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    ast::{AssignTarget, BinaryOp, DataStep, DoLoop, DoSpec, Expr, Literal, Statement, UnaryOp},
    catalog::{Catalog, ColumnMeta, Dataset, Row},
    engine::{Engine, StepError},
    func,
    identifier::Identifier,
    pdv::Pdv,
    sort,
    value::{parse_number, Value},
};

/// Hard cap on iterations of any single DO loop invocation.
pub(crate) const LOOP_LIMIT: usize = 1_000_000;

/// Mutable execution state of one step: the PDV plus array declarations.
pub(crate) struct StepState {
    pub pdv: Pdv,
    pub arrays: IndexMap<Identifier, Vec<Identifier>>,

    /// Variables already reported as uninitialized, so each is reported once
    /// per step.
    warned: HashSet<Identifier>,
}

impl StepState {
    pub(crate) fn new() -> Self {
        Self {
            pdv: Pdv::new(),
            arrays: IndexMap::new(),
            warned: HashSet::new(),
        }
    }

    /// A scratch state seeded from dataset columns, for evaluating WHERE
    /// expressions row by row.
    pub(crate) fn scratch_for(columns: &[ColumnMeta]) -> Self {
        let mut state = Self::new();
        for meta in columns {
            let idx = state.pdv.add(meta.clone());
            state.pdv.mark_from_input(idx);
        }
        state
    }
}

/// Everything the step body declares, gathered before the first iteration.
#[derive(Default)]
struct StepPlan {
    retain: Vec<(String, Option<Literal>)>,
    drop: Vec<Identifier>,
    keep: Vec<Identifier>,
    arrays: Vec<(String, usize, Vec<String>)>,
    merge: Option<Vec<String>>,
    by: Vec<Identifier>,
    input_vars: Vec<(String, bool)>,
    datalines: Vec<String>,
    explicit_output: bool,
}

fn analyze(body: &[Statement], plan: &mut StepPlan) {
    for statement in body {
        match statement {
            Statement::Retain(vars) => {
                for (name, initial) in vars {
                    plan.retain.push((name.clone(), initial.clone()));
                }
            }
            Statement::Drop(names) => plan
                .drop
                .extend(names.iter().map(|name| Identifier::new(name.as_str()))),
            Statement::Keep(names) => plan
                .keep
                .extend(names.iter().map(|name| Identifier::new(name.as_str()))),
            Statement::Array { name, size, vars } => {
                plan.arrays.push((name.clone(), *size, vars.clone()));
            }
            Statement::Merge(datasets) => plan.merge = Some(datasets.clone()),
            Statement::By(names) => {
                plan.by = names
                    .iter()
                    .map(|name| Identifier::new(name.as_str()))
                    .collect();
            }
            Statement::Input(vars) => plan.input_vars.extend(vars.iter().cloned()),
            Statement::Datalines(lines) => plan.datalines.extend(lines.iter().cloned()),
            Statement::Output => plan.explicit_output = true,
            Statement::IfThenElse {
                then_body,
                else_ifs,
                else_body,
                ..
            } => {
                analyze(then_body, plan);
                for (_, body) in else_ifs {
                    analyze(body, plan);
                }
                if let Some(body) = else_body {
                    analyze(body, plan);
                }
            }
            Statement::DoLoop(do_loop) => analyze(&do_loop.body, plan),
            _ => {}
        }
    }
}

/// The output side of a step: the dataset being built and the KEEP/DROP
/// projection applied to every emitted row.
struct StepIo {
    out: Dataset,
    keep: Vec<Identifier>,
    drop: Vec<Identifier>,
}

impl StepIo {
    /// Emits one row: the PDV snapshot, projected.  KEEP wins over DROP and
    /// fixes the column order; DROP alone keeps first-seen order minus the
    /// dropped names.
    fn emit(&mut self, pdv: &Pdv) {
        let columns = self.projected_columns(pdv);
        for meta in &columns {
            self.out.add_column(meta.clone());
        }
        let row = pdv.to_row(&columns);
        self.out.push_row(row);
    }

    fn projected_columns(&self, pdv: &Pdv) -> Vec<ColumnMeta> {
        if !self.keep.is_empty() {
            self.keep
                .iter()
                .filter_map(|name| pdv.find(name).map(|idx| pdv.var(idx).meta.clone()))
                .collect()
        } else {
            pdv.iter()
                .filter(|(var, _)| !self.drop.contains(&var.meta.name))
                .map(|(var, _)| var.meta.clone())
                .collect()
        }
    }
}

/// Runs one DATA step to completion.
pub(crate) fn run(engine: &mut Engine, step: &DataStep) -> Result<(), StepError> {
    let mut plan = StepPlan::default();
    analyze(&step.body, &mut plan);

    // The row source.
    let mut source_columns: Vec<ColumnMeta> = Vec::new();
    let mut source_rows: Option<Vec<Row>> = None;

    if let Some(input_name) = &step.input {
        let dataset = engine
            .catalog()
            .dataset(input_name)
            .ok_or_else(|| StepError::DatasetNotFound(Catalog::qualified_name(input_name)))?;
        source_columns = dataset.columns().to_vec();
        let rows = complete_rows(&source_columns, dataset.rows.clone());
        engine.note(format!(
            "There were {} observations read from the data set {}.",
            rows.len(),
            Catalog::qualified_name(input_name)
        ));
        source_rows = Some(rows);
    } else if let Some(merge_list) = &plan.merge {
        if plan.by.is_empty() {
            return Err(StepError::MergeWithoutBy);
        }
        let (columns, rows) = build_merge(engine, merge_list, &plan.by)?;
        source_columns = columns;
        source_rows = Some(rows);
    } else if !plan.input_vars.is_empty() {
        let (columns, rows) = read_datalines(engine, &plan.input_vars, &plan.datalines);
        source_columns = columns;
        source_rows = Some(rows);
    }

    // Build the PDV: input columns first, then RETAIN and ARRAY variables.
    let mut state = StepState::new();
    for meta in &source_columns {
        let idx = state.pdv.add(meta.clone());
        state.pdv.mark_from_input(idx);
    }
    for (name, initial) in &plan.retain {
        let meta = match initial {
            Some(Literal::String(_)) => ColumnMeta::character(name.as_str()),
            _ => ColumnMeta::numeric(name.as_str()),
        };
        let idx = state.pdv.add(meta);
        state.pdv.set_retained(idx);
        match initial {
            Some(Literal::Number(n)) => state.pdv.set_value(idx, Value::from(*n)),
            Some(Literal::String(s)) => state.pdv.set_value(idx, Value::string(s)),
            None => {}
        }
    }
    for (name, size, vars) in &plan.arrays {
        if *size != vars.len() {
            return Err(StepError::ArraySizeMismatch {
                array: name.clone(),
                size: *size,
                listed: vars.len(),
            });
        }
        let mut members = Vec::with_capacity(vars.len());
        for var in vars {
            let id = Identifier::new(var.as_str());
            state.pdv.add(ColumnMeta::numeric(id.clone()));
            members.push(id);
        }
        state.arrays.insert(Identifier::new(name.as_str()), members);
    }

    let mut io = StepIo {
        out: Dataset::new(Catalog::qualified_name(&step.output)),
        keep: plan.keep.clone(),
        drop: plan.drop.clone(),
    };

    match &source_rows {
        Some(rows) => {
            for row in rows {
                state.pdv.load_row(row);
                exec_body(engine, &mut state, &step.body, &mut io)?;
                if !plan.explicit_output {
                    io.emit(&state.pdv);
                }
                state.pdv.reset();
            }
        }
        None => {
            exec_body(engine, &mut state, &step.body, &mut io)?;
            if !plan.explicit_output {
                io.emit(&state.pdv);
            }
        }
    }

    let out = io.out;
    let note = format!(
        "The data set {} has {} observations and {} variables.",
        out.name,
        out.n_rows(),
        out.n_columns()
    );
    engine.catalog_mut().insert_dataset(&step.output, out)?;
    engine.note(note);
    Ok(())
}

fn exec_body(
    engine: &mut Engine,
    state: &mut StepState,
    body: &[Statement],
    io: &mut StepIo,
) -> Result<(), StepError> {
    for statement in body {
        exec_statement(engine, state, statement, io)?;
    }
    Ok(())
}

fn exec_statement(
    engine: &mut Engine,
    state: &mut StepState,
    statement: &Statement,
    io: &mut StepIo,
) -> Result<(), StepError> {
    match statement {
        Statement::Assignment { target, expr } => {
            let value = eval(engine, state, expr)?;
            match target {
                AssignTarget::Variable(name) => assign(state, name, value),
                AssignTarget::ArrayElement { array, index } => {
                    let index = eval(engine, state, index)?;
                    let slot = resolve_array_slot(state, array, &index)?;
                    state.pdv.set_value(slot, value);
                }
            }
        }
        Statement::IfThenElse {
            cond,
            then_body,
            else_ifs,
            else_body,
        } => {
            if eval(engine, state, cond)?.is_true() {
                exec_body(engine, state, then_body, io)?;
            } else {
                let mut taken = false;
                for (cond, body) in else_ifs {
                    if eval(engine, state, cond)?.is_true() {
                        exec_body(engine, state, body, io)?;
                        taken = true;
                        break;
                    }
                }
                if !taken {
                    if let Some(body) = else_body {
                        exec_body(engine, state, body, io)?;
                    }
                }
            }
        }
        Statement::DoLoop(do_loop) => exec_do(engine, state, do_loop, io)?,
        Statement::Output => io.emit(&state.pdv),

        // Declaratives were folded into the plan before the first iteration.
        Statement::Drop(_)
        | Statement::Keep(_)
        | Statement::Retain(_)
        | Statement::Array { .. }
        | Statement::Merge(_)
        | Statement::By(_)
        | Statement::Input(_)
        | Statement::Datalines(_) => {}

        // The parser does not produce top-level statements inside a body.
        _ => {}
    }
    Ok(())
}

fn exec_do(
    engine: &mut Engine,
    state: &mut StepState,
    do_loop: &DoLoop,
    io: &mut StepIo,
) -> Result<(), StepError> {
    match &do_loop.spec {
        DoSpec::Block => exec_body(engine, state, &do_loop.body, io),
        DoSpec::While(cond) => {
            let mut iterations = 0usize;
            while eval(engine, state, cond)?.is_true() {
                iterations += 1;
                if iterations > LOOP_LIMIT {
                    return Err(StepError::PossibleInfiniteLoop(LOOP_LIMIT));
                }
                exec_body(engine, state, &do_loop.body, io)?;
            }
            Ok(())
        }
        DoSpec::Until(cond) => {
            // DO UNTIL tests its condition at the bottom, so the body always
            // runs at least once.
            let mut iterations = 0usize;
            loop {
                iterations += 1;
                if iterations > LOOP_LIMIT {
                    return Err(StepError::PossibleInfiniteLoop(LOOP_LIMIT));
                }
                exec_body(engine, state, &do_loop.body, io)?;
                if eval(engine, state, cond)?.is_true() {
                    return Ok(());
                }
            }
        }
        DoSpec::Iterative {
            var,
            start,
            end,
            by,
        } => {
            // Bounds and step are computed once, before the first iteration.
            let start_value = eval(engine, state, start)?;
            let start = coerce_number(engine, &start_value);
            let end_value = eval(engine, state, end)?;
            let end = coerce_number(engine, &end_value);
            let step = match by {
                Some(by) => {
                    let by_value = eval(engine, state, by)?;
                    coerce_number(engine, &by_value)
                }
                None => Some(1.0),
            };
            let (Some(start), Some(end), Some(step)) = (start, end, step) else {
                return Ok(());
            };
            if step == 0.0 {
                return Err(StepError::ZeroLoopStep);
            }

            let id = Identifier::new(var.as_str());
            let idx = state.pdv.add(ColumnMeta::numeric(id));
            state.pdv.set_value(idx, Value::from(start));

            let mut iterations = 0usize;
            loop {
                let Some(current) = state.pdv.value(idx).as_number() else {
                    return Ok(());
                };
                if (step > 0.0 && current > end) || (step < 0.0 && current < end) {
                    return Ok(());
                }
                iterations += 1;
                if iterations > LOOP_LIMIT {
                    return Err(StepError::PossibleInfiniteLoop(LOOP_LIMIT));
                }
                exec_body(engine, state, &do_loop.body, io)?;

                let next = state.pdv.value(idx).as_number().map(|v| v + step);
                let stop = next.is_none();
                state.pdv.set_value(idx, Value::Number(next));
                if stop {
                    return Ok(());
                }
            }
        }
    }
}

fn assign(state: &mut StepState, name: &str, value: Value) {
    let id = Identifier::new(name);
    let idx = match state.pdv.find(&id) {
        Some(idx) => idx,
        None => {
            // The variable's type is inferred from the first value assigned.
            let meta = if value.is_numeric() {
                ColumnMeta::numeric(id)
            } else {
                ColumnMeta::character(id)
            };
            state.pdv.add(meta)
        }
    };
    state.pdv.set_value(idx, value);
}

/// Resolves a 1-based array reference to a PDV slot.
fn resolve_array_slot(
    state: &mut StepState,
    array: &str,
    index: &Value,
) -> Result<usize, StepError> {
    let id = Identifier::new(array);
    let members = state
        .arrays
        .get(&id)
        .ok_or_else(|| StepError::UndefinedArray(array.to_string()))?;

    let out_of_range = |index| StepError::ArrayIndexOutOfRange {
        array: array.to_string(),
        index,
        size: members.len(),
    };
    let raw = index
        .to_number()
        .ok_or_else(|| out_of_range(0))?;
    let position = raw as i64;
    if position < 1 || position as usize > members.len() {
        return Err(out_of_range(position));
    }

    let member = members[(position - 1) as usize].clone();
    state
        .pdv
        .find(&member)
        .ok_or_else(|| StepError::UndefinedArray(array.to_string()))
}

/// Evaluates an expression against the PDV.
pub(crate) fn eval(
    engine: &mut Engine,
    state: &mut StepState,
    expr: &Expr,
) -> Result<Value, StepError> {
    match expr {
        Expr::Number(n) => Ok(Value::from(*n)),
        Expr::String(s) => Ok(Value::string(s)),
        Expr::Variable(name) => Ok(read_variable(engine, state, name)),
        Expr::ArrayElement { array, index } => {
            let index = eval(engine, state, index)?;
            let slot = resolve_array_slot(state, array, &index)?;
            Ok(state.pdv.value(slot).clone())
        }
        Expr::FunctionCall { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(engine, state, arg)?);
            }
            func::call(engine, name, values)
        }
        Expr::Binary { op, left, right } => {
            let left = eval(engine, state, left)?;
            let right = eval(engine, state, right)?;
            Ok(apply_binary(engine, *op, left, right))
        }
        Expr::Unary { op, operand } => {
            let value = eval(engine, state, operand)?;
            Ok(match op {
                UnaryOp::Neg => Value::Number(coerce_number(engine, &value).map(|n| -n)),
                UnaryOp::Not => Value::from(if value.is_true() { 0.0 } else { 1.0 }),
            })
        }
    }
}

/// Reads a variable, creating it as numeric missing (with a one-time
/// warning) when it has never been given a value.
fn read_variable(engine: &mut Engine, state: &mut StepState, name: &str) -> Value {
    let id = Identifier::new(name);
    match state.pdv.find(&id) {
        Some(idx) => state.pdv.value(idx).clone(),
        None => {
            if state.warned.insert(id.clone()) {
                engine.warning(format!("Variable {name} is uninitialized."));
            }
            state.pdv.add(ColumnMeta::numeric(id));
            Value::missing()
        }
    }
}

/// Coerces a value to a number, warning when a non-blank string fails to
/// convert.
pub(crate) fn coerce_number(engine: &mut Engine, value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => *n,
        Value::String(s) => {
            let parsed = parse_number(s);
            if parsed.is_none() && !s.trim().is_empty() {
                engine.warning(format!(
                    "Invalid numeric data, {:?} converted to a missing value.",
                    s.as_str()
                ));
            }
            parsed
        }
    }
}

fn apply_binary(engine: &mut Engine, op: BinaryOp, left: Value, right: Value) -> Value {
    use BinaryOp::*;
    match op {
        Add | Sub | Mul | Div | Pow => {
            let (Some(l), Some(r)) = (
                coerce_number(engine, &left),
                coerce_number(engine, &right),
            ) else {
                return Value::missing();
            };
            let result = match op {
                Add => l + r,
                Sub => l - r,
                Mul => l * r,
                Div => {
                    if r == 0.0 {
                        engine.warning("Division by zero detected; result is missing.");
                        return Value::missing();
                    }
                    l / r
                }
                Pow => l.powf(r),
                _ => unreachable!(),
            };
            if result.is_finite() {
                Value::from(result)
            } else {
                Value::missing()
            }
        }
        Lt | Le | Gt | Ge | Eq | Ne => {
            Value::from(if compare(engine, op, &left, &right) { 1.0 } else { 0.0 })
        }
        And => Value::from(if left.is_true() && right.is_true() { 1.0 } else { 0.0 }),
        Or => Value::from(if left.is_true() || right.is_true() { 1.0 } else { 0.0 }),
    }
}

/// Comparison semantics: strings compare lexically when both sides are
/// strings; otherwise both sides convert to numbers, where a missing operand
/// makes every comparison false except `missing == missing` (true) and
/// `missing != number` (true).
fn compare(engine: &mut Engine, op: BinaryOp, left: &Value, right: &Value) -> bool {
    use std::cmp::Ordering;
    use BinaryOp::*;

    if let (Value::String(a), Value::String(b)) = (left, right) {
        let ordering = a.as_str().cmp(b.as_str());
        return match op {
            Lt => ordering == Ordering::Less,
            Le => ordering != Ordering::Greater,
            Gt => ordering == Ordering::Greater,
            Ge => ordering != Ordering::Less,
            Eq => ordering == Ordering::Equal,
            Ne => ordering != Ordering::Equal,
            _ => unreachable!(),
        };
    }

    let l = coerce_number(engine, left);
    let r = coerce_number(engine, right);
    match (l, r) {
        (Some(l), Some(r)) => match op {
            Lt => l < r,
            Le => l <= r,
            Gt => l > r,
            Ge => l >= r,
            Eq => l == r,
            Ne => l != r,
            _ => unreachable!(),
        },
        (None, None) => matches!(op, Eq),
        _ => matches!(op, Ne),
    }
}

/// Builds the merged row sequence for `merge A B …; by …;`.
///
/// Each input is sorted by the BY variables first if it is not already.  The
/// merge takes the lowest key present among the inputs' current rows,
/// overlays every row carrying that key in MERGE-list order (so the later
/// dataset wins variable conflicts), and emits one combined row.  Inputs
/// exhaust independently; surplus rows come out as singleton matches.
fn build_merge(
    engine: &mut Engine,
    names: &[String],
    by: &[Identifier],
) -> Result<(Vec<ColumnMeta>, Vec<Row>), StepError> {
    let mut datasets = Vec::with_capacity(names.len());
    for name in names {
        let dataset = engine
            .catalog()
            .dataset(name)
            .ok_or_else(|| StepError::DatasetNotFound(Catalog::qualified_name(name)))?
            .clone();
        datasets.push(dataset);
    }

    for dataset in &mut datasets {
        if !sort::is_sorted(&dataset.rows, by) {
            sort::sort_rows(&mut dataset.rows, by);
            let vars = by.iter().join(" ");
            engine.note(format!(
                "The data set {} was sorted by {vars} for the MERGE.",
                dataset.name
            ));
        }
    }

    // Union of input columns, in input order; the first dataset wins order
    // ties.
    let mut columns: Vec<ColumnMeta> = Vec::new();
    for dataset in &datasets {
        for meta in dataset.columns() {
            if !columns.iter().any(|c| c.name == meta.name) {
                columns.push(meta.clone());
            }
        }
    }

    let mut cursors = vec![0usize; datasets.len()];
    let mut rows = Vec::new();
    loop {
        let mut min_key: Option<Vec<Value>> = None;
        for (i, dataset) in datasets.iter().enumerate() {
            if let Some(row) = dataset.rows.get(cursors[i]) {
                let key = sort::key_of(row, by);
                if min_key.as_ref().map_or(true, |m| key < *m) {
                    min_key = Some(key);
                }
            }
        }
        let Some(min_key) = min_key else { break };

        // Start from all-missing so that a key absent from some input does
        // not inherit that input's variables from the previous row.
        let mut merged = Row::new();
        for meta in &columns {
            merged.insert(meta.name.clone(), meta.missing_value());
        }
        for (i, dataset) in datasets.iter().enumerate() {
            if let Some(row) = dataset.rows.get(cursors[i]) {
                if sort::key_of(row, by) == min_key {
                    for (name, value) in row {
                        merged.insert(name.clone(), value.clone());
                    }
                    cursors[i] += 1;
                }
            }
        }
        rows.push(merged);
    }

    Ok((columns, rows))
}

/// Fills each row out to the full column set, so that loading it into the
/// PDV overwrites every input variable.
fn complete_rows(columns: &[ColumnMeta], rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            let mut complete = Row::new();
            for meta in columns {
                let value = row
                    .get(&meta.name)
                    .cloned()
                    .unwrap_or_else(|| meta.missing_value());
                complete.insert(meta.name.clone(), value);
            }
            complete
        })
        .collect()
}

/// Turns INPUT/DATALINES into rows: whitespace-delimited fields, `$` columns
/// read as strings, everything else as numbers (missing on parse failure).
fn read_datalines(
    engine: &mut Engine,
    vars: &[(String, bool)],
    lines: &[String],
) -> (Vec<ColumnMeta>, Vec<Row>) {
    let columns: Vec<ColumnMeta> = vars
        .iter()
        .map(|(name, is_character)| {
            if *is_character {
                ColumnMeta::character(name.as_str())
            } else {
                ColumnMeta::numeric(name.as_str())
            }
        })
        .collect();

    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let mut fields = line.split_whitespace();
        let mut row = Row::new();
        for meta in &columns {
            let value = match fields.next() {
                None => meta.missing_value(),
                Some(text) if meta.is_numeric => match parse_number(text) {
                    Some(n) => Value::from(n),
                    None => {
                        engine.warning(format!(
                            "Invalid numeric data {text:?} for variable {}; value set to \
                             missing.",
                            meta.name
                        ));
                        Value::missing()
                    }
                },
                Some(text) => Value::string(text),
            };
            row.insert(meta.name.clone(), value);
        }
        rows.push(row);
    }
    (columns, rows)
}
