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

//! Diagnostics carried from the lexer, parser, and interpreter to the log.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use enum_map::Enum;

/// A line and column number within the source program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point {
    /// 1-based line number.
    pub line: u32,

    /// 1-based column number.
    pub column: u32,
}

impl Point {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// How serious a diagnostic is.
///
/// The ordering matters: the engine reports the worst severity seen during a
/// run as its exit status.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Enum)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic message destined for the log.
#[derive(Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Source position, present for diagnostics that originate in the lexer
    /// or parser.
    pub location: Option<Point>,

    pub text: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            location: None,
            text: text.into(),
        }
    }

    pub fn at(severity: Severity, location: Point, text: impl Into<String>) -> Self {
        Self {
            severity,
            location: Some(location),
            text: text.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.severity, self.text)?;
        if let Some(location) = self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

impl Debug for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostic, Point, Severity};

    #[test]
    fn display_with_location() {
        let diagnostic = Diagnostic::at(
            Severity::Error,
            Point::new(3, 7),
            "Expected `;` after statement.",
        );
        assert_eq!(
            diagnostic.to_string(),
            "ERROR: Expected `;` after statement. (line 3, column 7)"
        );
    }

    #[test]
    fn display_without_location() {
        let diagnostic = Diagnostic::new(Severity::Warning, "Division by zero.");
        assert_eq!(diagnostic.to_string(), "WARNING: Division by zero.");
    }
}
