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

//! Case-insensitive names.
//!
//! SAS matches dataset, variable, and libref names without regard to case but
//! displays them with the case in which they were first declared.
//! [Identifier] captures exactly that: it compares and hashes
//! case-insensitively while preserving the spelling it was created with.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use serde::{Serialize, Serializer};
use unicase::UniCase;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(pub UniCase<String>);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(UniCase::new(s.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// Returns true if this identifier is a case-insensitive match for
    /// `keyword`, which must be ASCII.
    pub fn matches(&self, keyword: &str) -> bool {
        debug_assert!(keyword.is_ascii());
        self.as_str().eq_ignore_ascii_case(keyword)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == UniCase::new(String::from(other))
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:?}", self.as_str())
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Identifier;

    #[test]
    fn case_insensitive_equality() {
        assert_eq!(Identifier::new("Weight"), Identifier::new("WEIGHT"));
        assert_ne!(Identifier::new("Weight"), Identifier::new("Height"));
    }

    #[test]
    fn preserves_declared_case() {
        assert_eq!(Identifier::new("SqRt_X").to_string(), "SqRt_X");
    }

    #[test]
    fn keyword_matching() {
        let id = Identifier::new("NoDupKey");
        assert!(id.matches("nodupkey"));
        assert!(!id.matches("nodup"));
    }
}
