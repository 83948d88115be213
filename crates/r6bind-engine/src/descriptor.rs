//! Read-only view over a foreign class generator

use indexmap::IndexSet;
use r6bind_sdk::{ForeignId, ForeignValue, Handle};

use crate::accessor;
use crate::error::{BindError, BindResult};
use crate::gate::ForeignGate;

/// Name given to generators whose `classname` is NULL or empty
pub const ANONYMOUS_CLASS_NAME: &str = "<anonymous>";

/// Reflected metadata of one foreign class generator.
///
/// Built per synthesis and discarded afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    generator: Handle,
    identity: ForeignId,
    name: String,
    public_fields: IndexSet<String>,
    public_methods: IndexSet<String>,
}

impl ClassDescriptor {
    /// Reflect over `generator`.
    ///
    /// Fails with `NotAClassGenerator` when the handle fails the foreign
    /// predicate. A missing name falls back to [`ANONYMOUS_CLASS_NAME`]; missing
    /// field or method collections are empty.
    pub fn from_handle(gate: &ForeignGate, generator: Handle) -> BindResult<Self> {
        gate.exclusive(|| -> BindResult<Self> {
            if !gate.is_class_generator(generator) {
                return Err(BindError::NotAClassGenerator { handle: generator });
            }
            let identity = gate.identity(generator)?;
            let name = class_name(gate, generator)?;
            let public_fields = member_names(gate, generator, "public_fields")?;
            let public_methods = member_names(gate, generator, "public_methods")?;

            Ok(Self {
                generator,
                identity,
                name,
                public_fields,
                public_methods,
            })
        })
    }

    /// Handle of the described generator
    pub fn generator(&self) -> Handle {
        self.generator
    }

    /// Cache key of the described generator
    pub fn identity(&self) -> ForeignId {
        self.identity
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Public field names, in foreign order
    pub fn public_fields(&self) -> &IndexSet<String> {
        &self.public_fields
    }

    /// Public method names, in foreign order
    pub fn public_methods(&self) -> &IndexSet<String> {
        &self.public_methods
    }

    /// Names reported both as fields and as methods
    pub fn overlapping_names(&self) -> Vec<String> {
        self.public_fields
            .intersection(&self.public_methods)
            .cloned()
            .collect()
    }
}

/// Read an attribute the foreign side may legitimately lack
fn optional_attribute(gate: &ForeignGate, target: Handle, name: &str) -> BindResult<ForeignValue> {
    match accessor::get_attribute(gate, target, name) {
        Err(err) if err.is_lookup() => Ok(ForeignValue::Null),
        other => other,
    }
}

fn class_name(gate: &ForeignGate, generator: Handle) -> BindResult<String> {
    match optional_attribute(gate, generator, "classname")? {
        ForeignValue::Character(name) if !name.is_empty() => Ok(name),
        other => {
            tracing::debug!(
                ?generator,
                got = other.type_name(),
                "class generator has no usable classname"
            );
            Ok(ANONYMOUS_CLASS_NAME.to_string())
        }
    }
}

fn member_names(gate: &ForeignGate, generator: Handle, attr: &str) -> BindResult<IndexSet<String>> {
    let members = optional_attribute(gate, generator, attr)?;
    match gate.names(&members)? {
        Some(names) => Ok(names.into_iter().collect()),
        None => {
            tracing::debug!(?generator, attr, "no member names, treating as empty");
            Ok(IndexSet::new())
        }
    }
}
