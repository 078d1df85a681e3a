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

//! Libraries and datasets.
//!
//! The [Catalog] owns every dataset in the session, grouped into libraries
//! addressed by libref.  A dataset name without a libref refers to the
//! predefined temporary `WORK` library.  All name lookup is
//! case-insensitive; column order is the order in which variables were first
//! seen.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error as ThisError;

use crate::{identifier::Identifier, value::Value};

/// How a library may be used.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    Temp,
}

/// Metadata for one dataset column.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnMeta {
    pub name: Identifier,
    pub is_numeric: bool,

    /// Maximum observed byte length, for character columns.
    pub length: usize,
    pub label: Option<String>,
    pub format: Option<String>,
    pub decimals: u8,
}

impl ColumnMeta {
    pub fn numeric(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            is_numeric: true,
            length: 8,
            label: None,
            format: None,
            decimals: 0,
        }
    }

    pub fn character(name: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            is_numeric: false,
            length: 0,
            label: None,
            format: None,
            decimals: 0,
        }
    }

    /// The typed missing value for this column.
    pub fn missing_value(&self) -> Value {
        Value::missing_for(self.is_numeric)
    }
}

/// One observation.  Keys come from the owning dataset's columns; a column
/// absent from the map reads as its typed missing value.
pub type Row = IndexMap<Identifier, Value>;

#[derive(Clone, Debug)]
pub struct Dataset {
    /// Display name in `LIBREF.NAME` form.
    pub name: String,
    columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &Identifier) -> Option<&ColumnMeta> {
        self.columns.iter().find(|meta| &meta.name == name)
    }

    /// Registers a column if no column with that name exists yet.
    pub fn add_column(&mut self, meta: ColumnMeta) {
        if self.column(&meta.name).is_none() {
            self.columns.push(meta);
        }
    }

    /// Appends a row, growing character column lengths to fit.
    pub fn push_row(&mut self, row: Row) {
        for meta in &mut self.columns {
            if !meta.is_numeric {
                if let Some(Value::String(s)) = row.get(&meta.name) {
                    meta.length = meta.length.max(s.len());
                }
            }
        }
        self.rows.push(row);
    }

    /// Reads one cell; absent columns read as typed missing.
    pub fn value(&self, row: usize, name: &Identifier) -> Value {
        match self.rows.get(row).and_then(|r| r.get(name)) {
            Some(value) => value.clone(),
            None => self
                .column(name)
                .map(|meta| meta.missing_value())
                .unwrap_or(Value::missing()),
        }
    }
}

#[derive(Debug)]
pub struct Library {
    pub libref: Identifier,
    pub path: String,
    pub access: Access,
    pub created_at: DateTime<Local>,
    datasets: IndexMap<Identifier, Dataset>,
}

impl Library {
    fn new(libref: Identifier, path: impl Into<String>, access: Access) -> Self {
        Self {
            libref,
            path: path.into(),
            access,
            created_at: Local::now(),
            datasets: IndexMap::new(),
        }
    }

    pub fn dataset(&self, name: &Identifier) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    pub fn dataset_names(&self) -> impl Iterator<Item = &Identifier> {
        self.datasets.keys()
    }
}

#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Libref {0} is not assigned.")]
    UnknownLibref(String),
}

/// The session-wide set of libraries.
#[derive(Debug)]
pub struct Catalog {
    libraries: IndexMap<Identifier, Library>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates a catalog holding the predefined temporary `WORK` library.
    pub fn new() -> Self {
        let work = Identifier::new("WORK");
        let mut libraries = IndexMap::new();
        libraries.insert(work.clone(), Library::new(work, "", Access::Temp));
        Self { libraries }
    }

    /// Defines (or redefines) a library.  The libref is stored uppercased.
    pub fn define_library(&mut self, libref: &str, path: &str, access: Access) {
        let id = Identifier::new(libref.to_uppercase());
        self.libraries
            .insert(id.clone(), Library::new(id, path, access));
    }

    pub fn library(&self, libref: &str) -> Option<&Library> {
        self.libraries.get(&Identifier::new(libref))
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }

    /// Splits `name` into its libref and member parts, defaulting the libref
    /// to `WORK`.
    fn split(name: &str) -> (Identifier, Identifier) {
        match name.split_once('.') {
            Some((libref, member)) => (Identifier::new(libref), Identifier::new(member)),
            None => (Identifier::new("WORK"), Identifier::new(name)),
        }
    }

    /// The display form of a dataset name: `LIBREF.NAME` with the libref
    /// uppercased and the member's declared case preserved.
    pub fn qualified_name(name: &str) -> String {
        let (libref, member) = Self::split(name);
        format!("{}.{}", libref.as_str().to_uppercase(), member)
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        let (libref, member) = Self::split(name);
        self.libraries.get(&libref)?.datasets.get(&member)
    }

    /// Installs `dataset` under `name`, replacing any existing dataset of
    /// that name.  Fails if the libref has not been assigned.
    pub fn insert_dataset(&mut self, name: &str, mut dataset: Dataset) -> Result<(), CatalogError> {
        let (libref, member) = Self::split(name);
        let Some(library) = self.libraries.get_mut(&libref) else {
            return Err(CatalogError::UnknownLibref(
                libref.as_str().to_uppercase(),
            ));
        };
        dataset.name = Self::qualified_name(name);
        library.datasets.insert(member, dataset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Access, Catalog, ColumnMeta, Dataset, Row};
    use crate::{identifier::Identifier, value::Value};

    #[test]
    fn work_is_predefined() {
        let catalog = Catalog::new();
        let work = catalog.library("work").unwrap();
        assert_eq!(work.access, Access::Temp);
    }

    #[test]
    fn bare_names_resolve_to_work() {
        let mut catalog = Catalog::new();
        catalog.insert_dataset("a", Dataset::new("a")).unwrap();
        assert!(catalog.dataset("a").is_some());
        assert!(catalog.dataset("work.a").is_some());
        assert!(catalog.dataset("WORK.A").is_some());
        assert_eq!(catalog.dataset("a").unwrap().name, "WORK.a");
    }

    #[test]
    fn unknown_libref_is_rejected() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert_dataset("nosuch.a", Dataset::new("a")).is_err());
    }

    #[test]
    fn absent_column_reads_as_typed_missing() {
        let mut dataset = Dataset::new("WORK.a");
        dataset.add_column(ColumnMeta::numeric("x"));
        dataset.add_column(ColumnMeta::character("s"));
        let mut row = Row::new();
        row.insert(Identifier::new("x"), Value::from(1.0));
        dataset.push_row(row);

        assert_eq!(dataset.value(0, &Identifier::new("x")), Value::from(1.0));
        assert_eq!(dataset.value(0, &Identifier::new("s")), Value::blank());
    }

    #[test]
    fn character_length_tracks_longest_value() {
        let mut dataset = Dataset::new("WORK.a");
        dataset.add_column(ColumnMeta::character("s"));
        let mut row = Row::new();
        row.insert(Identifier::new("s"), Value::string("abcdef"));
        dataset.push_row(row);
        assert_eq!(dataset.column(&Identifier::new("s")).unwrap().length, 6);
    }

    #[test]
    fn add_column_is_idempotent_case_insensitively() {
        let mut dataset = Dataset::new("WORK.a");
        dataset.add_column(ColumnMeta::numeric("Alpha"));
        dataset.add_column(ColumnMeta::numeric("ALPHA"));
        assert_eq!(dataset.n_columns(), 1);
        // First-declared case wins for display.
        assert_eq!(dataset.columns()[0].name.to_string(), "Alpha");
    }
}
