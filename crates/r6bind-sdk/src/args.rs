//! Call arguments for foreign invocations

use crate::value::ForeignValue;

/// Positional and named arguments for a foreign call.
///
/// Named arguments keep their insertion order; the foreign runtime decides
/// how to match them against formals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<ForeignValue>,
    named: Vec<(String, ForeignValue)>,
}

impl CallArgs {
    /// No arguments
    pub fn none() -> Self {
        Self::default()
    }

    /// Positional arguments only
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ForeignValue>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: Vec::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<ForeignValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a named argument
    pub fn named(mut self, name: impl Into<String>, value: impl Into<ForeignValue>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Positional arguments in order
    pub fn positional_args(&self) -> &[ForeignValue] {
        &self.positional
    }

    /// Named arguments in order
    pub fn named_args(&self) -> &[(String, ForeignValue)] {
        &self.named
    }

    /// Look up a named argument
    pub fn get_named(&self, name: &str) -> Option<&ForeignValue> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Total number of arguments
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Check if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
