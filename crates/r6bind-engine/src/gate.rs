//! Serialized access to the foreign runtime
//!
//! The foreign runtime is a single shared resource that does not accept
//! concurrent reentrant calls from several host threads. Every crossing goes
//! through a `ForeignGate`, which holds one re-entrant lock for the duration
//! of the call. Calls block; there is no timeout or cancellation, so a
//! foreign call that never returns blocks its caller (and everyone queued
//! behind it) indefinitely.

use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use r6bind_sdk::{AbiResult, CallArgs, ForeignId, ForeignRuntime, ForeignValue, Handle};

/// Lock-guarded connection to a foreign runtime
pub struct ForeignGate {
    runtime: Arc<dyn ForeignRuntime>,
    lock: ReentrantMutex<()>,
}

impl ForeignGate {
    /// Wrap a runtime connection
    pub fn new(runtime: Arc<dyn ForeignRuntime>) -> Self {
        Self {
            runtime,
            lock: ReentrantMutex::new(()),
        }
    }

    /// Run `f` while holding the foreign-runtime lock.
    ///
    /// The lock is re-entrant: gate calls made inside `f` on the same thread
    /// do not deadlock.
    pub fn exclusive<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.lock.lock();
        f()
    }

    /// See [`ForeignRuntime::is_class_generator`]
    pub fn is_class_generator(&self, target: Handle) -> bool {
        self.exclusive(|| self.runtime.is_class_generator(target))
    }

    /// See [`ForeignRuntime::get_attribute`]
    pub fn get_attribute(&self, target: Handle, name: &str) -> AbiResult<ForeignValue> {
        self.exclusive(|| self.runtime.get_attribute(target, name))
    }

    /// See [`ForeignRuntime::names`]
    pub fn names(&self, value: &ForeignValue) -> AbiResult<Option<Vec<String>>> {
        self.exclusive(|| self.runtime.names(value))
    }

    /// See [`ForeignRuntime::identity`]
    pub fn identity(&self, target: Handle) -> AbiResult<ForeignId> {
        self.exclusive(|| self.runtime.identity(target))
    }

    /// See [`ForeignRuntime::invoke`]
    pub fn invoke(&self, callee: &ForeignValue, args: &CallArgs) -> AbiResult<ForeignValue> {
        self.exclusive(|| self.runtime.invoke(callee, args))
    }

    /// See [`ForeignRuntime::package_version`]
    pub fn package_version(&self, package: &str) -> AbiResult<Option<String>> {
        self.exclusive(|| self.runtime.package_version(package))
    }
}

impl fmt::Debug for ForeignGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignGate")
            .field("locked", &self.lock.is_locked())
            .finish()
    }
}
