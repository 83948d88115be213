//! ForeignRuntime trait: abstract foreign-runtime operations
//!
//! Defines the interface a foreign-runtime connection implements. The
//! binding engine programs against this trait only; it never sees how values
//! travel to and from the foreign side.

use crate::args::CallArgs;
use crate::error::AbiResult;
use crate::value::{ForeignId, ForeignValue, Handle};

/// Connection to a foreign runtime.
///
/// Implementations are not required to tolerate concurrent calls: the engine
/// serializes every call it makes through a single lock. They must still be
/// `Send + Sync` so the connection can be shared across host threads.
pub trait ForeignRuntime: Send + Sync {
    // ========================================================================
    // Reflection
    // ========================================================================

    /// Whether `target` is a class-generator object.
    ///
    /// Invalid handles are simply not class generators.
    fn is_class_generator(&self, target: Handle) -> bool;

    /// Fetch attribute `name` from `target` (the `$` accessor).
    ///
    /// Fails with [`ForeignError::Lookup`](crate::ForeignError::Lookup) when
    /// the attribute does not exist.
    fn get_attribute(&self, target: Handle, name: &str) -> AbiResult<ForeignValue>;

    /// Names of a named collection; `None` when the foreign side reports NULL
    /// names (including for NULL itself).
    fn names(&self, value: &ForeignValue) -> AbiResult<Option<Vec<String>>>;

    /// Stable identity of the object behind `target`
    fn identity(&self, target: Handle) -> AbiResult<ForeignId>;

    // ========================================================================
    // Execution
    // ========================================================================

    /// Call a foreign callable; blocks until complete
    fn invoke(&self, callee: &ForeignValue, args: &CallArgs) -> AbiResult<ForeignValue>;

    // ========================================================================
    // Packages
    // ========================================================================

    /// Installed version of a foreign package, if it is known
    fn package_version(&self, package: &str) -> AbiResult<Option<String>>;
}
