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

//! String interning.
//!
//! Dataset columns tend to hold the same few category values over and over
//! again ("M"/"F", "High"/"Low", …).  Interning shares one allocation per
//! distinct string.  The pool is thread-local: the interpreter is
//! single-threaded, so no locking is needed, and a value interned on one
//! thread still compares correctly against one interned on another because
//! comparison falls back to string content.

use std::{cell::RefCell, collections::HashSet, fmt, ops::Deref, sync::Arc};

use serde::{Serialize, Serializer};

thread_local! {
    static POOL: RefCell<HashSet<Arc<str>>> = RefCell::new(HashSet::new());
}

/// A handle to an interned string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InternedStr(Arc<str>);

impl InternedStr {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Interns `s`, returning a shared handle.
pub fn intern(s: &str) -> InternedStr {
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        if let Some(existing) = pool.get(s) {
            InternedStr(Arc::clone(existing))
        } else {
            let arc: Arc<str> = Arc::from(s);
            pool.insert(Arc::clone(&arc));
            InternedStr(arc)
        }
    })
}

impl Deref for InternedStr {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InternedStr {
    fn from(s: &str) -> Self {
        intern(s)
    }
}

impl From<&String> for InternedStr {
    fn from(s: &String) -> Self {
        intern(s)
    }
}

impl PartialEq<str> for InternedStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Display for InternedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for InternedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl Serialize for InternedStr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
