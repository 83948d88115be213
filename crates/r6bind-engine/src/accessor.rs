//! Foreign attribute access (the `$` accessor)

use std::sync::Arc;

use r6bind_sdk::{ForeignValue, Handle};

use crate::error::BindResult;
use crate::gate::ForeignGate;

/// Attribute fetcher curried over the attribute name.
///
/// One closure is built per attribute name and shared by every instance of
/// every class that forwards that name.
pub type BoundGetter = Arc<dyn Fn(&ForeignGate, Handle) -> BindResult<ForeignValue> + Send + Sync>;

/// Fetch attribute `name` from `target`.
///
/// Read-only. Lookup failures and invalid handles propagate unchanged.
pub fn get_attribute(gate: &ForeignGate, target: Handle, name: &str) -> BindResult<ForeignValue> {
    tracing::trace!(?target, name, "foreign attribute get");
    Ok(gate.get_attribute(target, name)?)
}

/// Curry [`get_attribute`] over `name`
pub fn bind_attribute(name: impl Into<Arc<str>>) -> BoundGetter {
    let name: Arc<str> = name.into();
    Arc::new(move |gate, target| get_attribute(gate, target, &name))
}
