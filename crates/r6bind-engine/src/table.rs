//! Default-attribute tables
//!
//! A table maps foreign attribute names to the way they are forwarded. It is
//! declared by a class (or inherited from the nearest ancestor that declares
//! one) and turned into forwarding accessors when the class is defined.

use indexmap::IndexMap;

use crate::error::{BindError, BindResult};

/// How a foreign attribute is exposed on a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    /// Calling the attribute invokes the foreign callable with the caller's
    /// arguments and returns the raw result
    PlainForward,
    /// Reading the attribute fetches the foreign value; it cannot be called
    PropertyForward,
}

/// Immutable name → forwarding-kind table, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultAttributeTable {
    entries: IndexMap<String, AttrKind>,
}

impl DefaultAttributeTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from declared entries, rejecting repeated names.
    ///
    /// `class` names the class being defined, for the error.
    pub fn try_from_entries<I, S>(class: &str, entries: I) -> BindResult<Self>
    where
        I: IntoIterator<Item = (S, AttrKind)>,
        S: Into<String>,
    {
        let mut table = IndexMap::new();
        for (name, kind) in entries {
            let name = name.into();
            if table.contains_key(&name) {
                return Err(BindError::DuplicateAttributeName {
                    class: class.to_string(),
                    name,
                });
            }
            table.insert(name, kind);
        }
        Ok(Self { entries: table })
    }

    /// Forwarding kind for `name`
    pub fn get(&self, name: &str) -> Option<AttrKind> {
        self.entries.get(name).copied()
    }

    /// Check if `name` is listed
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, AttrKind)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Listed names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
