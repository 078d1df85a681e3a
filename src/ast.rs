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

//! The abstract syntax tree.
//!
//! Statements and expressions are closed sum types; the interpreter matches
//! them exhaustively.  Body statements that only declare things (DROP, KEEP,
//! RETAIN, ARRAY, BY, MERGE, INPUT, DATALINES) still appear in the DATA step
//! body in source order, because SAS semantics distinguish where some of them
//! occur.

use crate::message::Point;

/// A whole program: the ordered sequence of top-level statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    DataStep(DataStep),

    /// `options key=value …;`
    Options(Vec<(String, String)>),

    /// `libname LIBREF "path";`
    Libname { libref: String, path: String },

    /// `title "text";`
    Title(String),

    Proc(ProcStep),

    /// `name = expr;` or `name[index] = expr;`
    Assignment {
        target: AssignTarget,
        expr: Expr,
    },

    /// `if cond then …; [else if cond then …;]* [else …;]`
    IfThenElse {
        cond: Expr,
        then_body: Vec<Statement>,
        else_ifs: Vec<(Expr, Vec<Statement>)>,
        else_body: Option<Vec<Statement>>,
    },

    DoLoop(DoLoop),

    /// `output;`
    Output,

    /// `drop v1 v2 …;`
    Drop(Vec<String>),

    /// `keep v1 v2 …;`
    Keep(Vec<String>),

    /// `retain v1 [init1] v2 [init2] …;`
    Retain(Vec<(String, Option<Literal>)>),

    /// `array NAME[n] v1 v2 …;`
    Array {
        name: String,
        size: usize,
        vars: Vec<String>,
    },

    /// `merge ds1 ds2 …;`
    Merge(Vec<String>),

    /// `by v1 v2 …;`
    By(Vec<String>),

    /// `input v1 [$] v2 [$] …;` — true marks a character variable.
    Input(Vec<(String, bool)>),

    /// The raw lines between `datalines;` and the terminating `;` line.
    Datalines(Vec<String>),
}

/// A DATA step: `data NAME; [set NAME;] … run;`
///
/// `input` is the `SET` source, when present.  Other row sources (MERGE,
/// INPUT/DATALINES) remain body statements.
#[derive(Clone, Debug, PartialEq)]
pub struct DataStep {
    pub output: String,
    pub input: Option<String>,
    pub body: Vec<Statement>,

    /// Where the step started, for diagnostics.
    pub location: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    Variable(String),
    ArrayElement { array: String, index: Expr },
}

/// `do …; … end;` in its four forms.
#[derive(Clone, Debug, PartialEq)]
pub struct DoLoop {
    pub spec: DoSpec,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DoSpec {
    /// `do;` — a plain block, executed once.
    Block,

    /// `do var = start to end [by step];`
    Iterative {
        var: String,
        start: Expr,
        end: Expr,
        by: Option<Expr>,
    },

    /// `do while(cond);`
    While(Expr),

    /// `do until(cond);`
    Until(Expr),
}

/// A literal initial value, as allowed in RETAIN.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProcStep {
    Sort(ProcSort),
    Print(ProcPrint),
    Means(ProcMeans),
    Freq(ProcFreq),
}

impl ProcStep {
    /// The procedure name, for log messages.
    pub fn name(&self) -> &'static str {
        match self {
            ProcStep::Sort(_) => "SORT",
            ProcStep::Print(_) => "PRINT",
            ProcStep::Means(_) => "MEANS",
            ProcStep::Freq(_) => "FREQ",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcSort {
    pub input: String,
    pub output: Option<String>,
    pub by: Vec<String>,
    pub nodupkey: bool,
    pub duplicates: bool,
    pub where_clause: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcPrint {
    pub data: String,
    pub obs: Option<usize>,
    pub vars: Option<Vec<String>>,
    pub noobs: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcMeans {
    pub data: String,
    pub vars: Vec<String>,
    pub stats: Vec<MeansStat>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MeansStat {
    N,
    Mean,
    Min,
    Max,
    Std,
}

impl MeansStat {
    pub fn header(&self) -> &'static str {
        match self {
            MeansStat::N => "N",
            MeansStat::Mean => "Mean",
            MeansStat::Min => "Min",
            MeansStat::Max => "Max",
            MeansStat::Std => "Std",
        }
    }

    /// The default statistic set, in display order.
    pub fn default_set() -> Vec<MeansStat> {
        vec![
            MeansStat::N,
            MeansStat::Mean,
            MeansStat::Min,
            MeansStat::Max,
            MeansStat::Std,
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcFreq {
    pub data: String,
    pub tables: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    String(String),
    Variable(String),
    ArrayElement {
        array: String,
        index: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}
