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

//! Program execution.
//!
//! The [Engine] owns the catalog and the two output sinks.  It runs a
//! program top-level statement by top-level statement.  A runtime error
//! inside a DATA or PROC step is caught at the step boundary, logged, and
//! execution resumes with the next statement; the step's partial output is
//! discarded.

use enum_map::EnumMap;
use indexmap::IndexMap;
use thiserror::Error as ThisError;

use crate::{
    ast::Statement,
    calendar::IntervalError,
    catalog::{Access, Catalog, CatalogError},
    data_step,
    lex::tokenize,
    message::{Diagnostic, Severity},
    output::{Level, Sink},
    parse::parse,
    procs,
    timer::StepTimer,
};

/// The overall result of [Engine::execute_program].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// No warnings or errors.
    Clean,

    /// At least one warning, no errors.
    Warnings,

    /// At least one error; execution continued past each.
    Errors,

    /// The program was so malformed that nothing could be executed.
    ParseFailure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Warnings => 1,
            ExitStatus::Errors => 2,
            ExitStatus::ParseFailure => 3,
        }
    }
}

/// A runtime error that aborts the current DATA or PROC step.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub enum StepError {
    #[error("Dataset {0} was not found.")]
    DatasetNotFound(String),

    #[error("Array {0} is not defined.")]
    UndefinedArray(String),

    #[error("Array subscript {index} is out of range for array {array} of size {size}.")]
    ArrayIndexOutOfRange {
        array: String,
        index: i64,
        size: usize,
    },

    #[error("Array {array} declares {size} elements but lists {listed} variables.")]
    ArraySizeMismatch {
        array: String,
        size: usize,
        listed: usize,
    },

    #[error("DO loop BY value is zero.")]
    ZeroLoopStep,

    #[error("Possible infinite loop: DO exceeded {0} iterations.")]
    PossibleInfiniteLoop(usize),

    #[error("MERGE requires a preceding BY statement.")]
    MergeWithoutBy,

    #[error("Function {0} is not supported.")]
    UnknownFunction(String),

    #[error("Function {name} expects {expected} argument(s), not {actual}.")]
    WrongArgumentCount {
        name: String,
        expected: &'static str,
        actual: usize,
    },

    #[error(transparent)]
    Interval(#[from] IntervalError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub struct Engine {
    catalog: Catalog,
    log: Box<dyn Sink>,
    listing: Box<dyn Sink>,
    title: Option<String>,
    options: IndexMap<String, String>,
    counts: EnumMap<Severity, usize>,
}

impl Engine {
    pub fn new(log: Box<dyn Sink>, listing: Box<dyn Sink>) -> Self {
        Self {
            catalog: Catalog::new(),
            log,
            listing,
            title: None,
            options: IndexMap::new(),
            counts: EnumMap::default(),
        }
    }

    /// A read-only view of the catalog, mainly for tests.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Runs a whole program and reports the worst thing that happened.
    pub fn execute_program(&mut self, source: &str) -> ExitStatus {
        self.counts = EnumMap::default();

        let (tokens, lex_diagnostics) = tokenize(source);
        for diagnostic in lex_diagnostics {
            self.report(diagnostic);
        }

        let (program, parse_diagnostics) = parse(tokens);
        for diagnostic in parse_diagnostics {
            self.report(diagnostic);
        }

        if program.statements.is_empty() && self.counts[Severity::Error] > 0 {
            return ExitStatus::ParseFailure;
        }

        for statement in &program.statements {
            self.execute_statement(statement);
        }
        self.log.flush();
        self.listing.flush();

        if self.counts[Severity::Error] > 0 {
            ExitStatus::Errors
        } else if self.counts[Severity::Warning] > 0 {
            ExitStatus::Warnings
        } else {
            ExitStatus::Clean
        }
    }

    fn execute_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::DataStep(step) => {
                let timer = StepTimer::start();
                if let Err(error) = data_step::run(self, step) {
                    self.report(Diagnostic::at(
                        Severity::Error,
                        step.location,
                        error.to_string(),
                    ));
                }
                self.note("DATA statement used (Total process time):");
                for line in timer.report() {
                    self.log_raw(&line);
                }
            }
            Statement::Proc(step) => {
                let timer = StepTimer::start();
                if let Err(error) = procs::run(self, step) {
                    self.error(error.to_string());
                }
                self.note(format!(
                    "PROCEDURE {} used (Total process time):",
                    step.name()
                ));
                for line in timer.report() {
                    self.log_raw(&line);
                }
            }
            Statement::Options(pairs) => {
                for (key, value) in pairs {
                    self.note(format!("Option {key} set to '{value}'."));
                    self.options.insert(key.clone(), value.clone());
                }
            }
            Statement::Libname { libref, path } => {
                self.catalog
                    .define_library(libref, path, Access::ReadWrite);
                self.note(format!(
                    "Libref {} was assigned to '{path}'.",
                    libref.to_uppercase()
                ));
            }
            Statement::Title(text) => {
                self.note(format!("Title set to '{text}'."));
                self.title = Some(text.clone());
            }
            // The parser only produces these inside a DATA step body.
            _ => self.error("This statement is only valid inside a DATA step."),
        }
    }

    /// Records a diagnostic: counts it and writes it to the log.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.counts[diagnostic.severity] += 1;
        let level = match diagnostic.severity {
            Severity::Error => Level::Error,
            Severity::Warning => Level::Warn,
            Severity::Note => Level::Info,
        };
        self.log.write(level, &diagnostic.to_string());
    }

    pub(crate) fn note(&mut self, text: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Note, text));
    }

    pub(crate) fn warning(&mut self, text: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Warning, text));
    }

    pub(crate) fn error(&mut self, text: impl Into<String>) {
        self.report(Diagnostic::new(Severity::Error, text));
    }

    /// Writes a log line verbatim, without a severity prefix (step timings).
    pub(crate) fn log_raw(&mut self, line: &str) {
        self.log.write(Level::Info, line);
    }

    /// Writes one line to the listing.
    pub(crate) fn listing_line(&mut self, line: &str) {
        self.listing.write(Level::Info, line);
    }

    /// Writes the current title to the listing, if one is set.
    pub(crate) fn listing_title(&mut self) {
        if let Some(title) = self.title.clone() {
            self.listing.write(Level::Info, &title);
        }
    }
}
