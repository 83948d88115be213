//! Identity-keyed class map
//!
//! Maps the identity of a foreign class generator to the proxy class
//! mirroring it, so that every proxy of "the same" foreign class shares one
//! local type. Entries are never replaced or removed.
//!
//! Two policies read the same map, chosen per call site:
//!
//! - **static**: read-only lookup; unknown identities resolve to a fixed
//!   fallback class.
//! - **dynamic**: create on first use and keep the entry for the lifetime of
//!   the map. Check, build and insert run under the foreign-runtime lock, so
//!   racing first uses of one identity produce a single class.

use std::fmt;

use parking_lot::RwLock;
use r6bind_sdk::ForeignId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::class::ClassRef;
use crate::error::BindResult;
use crate::gate::ForeignGate;

/// Class-map policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassMapPolicy {
    /// Read-only lookup with fallback
    Static,
    /// Create on first use
    #[default]
    Dynamic,
}

impl fmt::Display for ClassMapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassMapPolicy::Static => write!(f, "static"),
            ClassMapPolicy::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Map from foreign class identity to proxy class
pub struct ClassMap {
    entries: RwLock<FxHashMap<ForeignId, ClassRef>>,
    fallback: ClassRef,
}

impl ClassMap {
    /// Empty map; `fallback` answers static lookups of unknown identities
    pub fn new(fallback: ClassRef) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            fallback,
        }
    }

    /// Pre-seeded map
    pub fn with_entries(
        fallback: ClassRef,
        entries: impl IntoIterator<Item = (ForeignId, ClassRef)>,
    ) -> Self {
        let map = Self::new(fallback);
        map.entries.write().extend(entries);
        map
    }

    /// Register `class` for `identity` unless one is already registered.
    ///
    /// Returns the class now registered for `identity`.
    pub fn insert(&self, identity: ForeignId, class: ClassRef) -> ClassRef {
        self.entries.write().entry(identity).or_insert(class).clone()
    }

    /// Registered class for `identity`
    pub fn get(&self, identity: ForeignId) -> Option<ClassRef> {
        self.entries.read().get(&identity).cloned()
    }

    /// Static policy: registered class, or the fallback. Never writes.
    pub fn lookup(&self, identity: ForeignId) -> ClassRef {
        match self.get(identity) {
            Some(class) => class,
            None => {
                tracing::debug!(?identity, fallback = self.fallback.name(), "class map miss, using fallback");
                self.fallback.clone()
            }
        }
    }

    /// Dynamic policy: registered class, or the result of `build`, which is
    /// stored before returning.
    ///
    /// `build` runs at most once per identity. If it fails nothing is stored.
    pub fn get_or_create(
        &self,
        gate: &ForeignGate,
        identity: ForeignId,
        build: impl FnOnce() -> BindResult<ClassRef>,
    ) -> BindResult<ClassRef> {
        gate.exclusive(|| -> BindResult<ClassRef> {
            if let Some(class) = self.get(identity) {
                return Ok(class);
            }
            tracing::debug!(?identity, "class map miss, synthesizing");
            let class = build()?;
            Ok(self.insert(identity, class))
        })
    }

    /// Resolve `identity` under `policy`
    pub fn resolve(
        &self,
        policy: ClassMapPolicy,
        gate: &ForeignGate,
        identity: ForeignId,
        build: impl FnOnce() -> BindResult<ClassRef>,
    ) -> BindResult<ClassRef> {
        match policy {
            ClassMapPolicy::Static => Ok(self.lookup(identity)),
            ClassMapPolicy::Dynamic => self.get_or_create(gate, identity, build),
        }
    }

    /// Class returned for unknown identities under the static policy
    pub fn fallback(&self) -> &ClassRef {
        &self.fallback
    }

    /// Check if `identity` is registered
    pub fn contains(&self, identity: ForeignId) -> bool {
        self.entries.read().contains_key(&identity)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for ClassMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMap")
            .field("entries", &self.len())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ProxyClass;
    use crate::error::BindError;
    use crate::protocol::ClassDef;
    use r6bind_test_helpers::MockRuntime;
    use std::cell::Cell;

    fn class(name: &str) -> ClassRef {
        ClassDef::new(name)
            .default_attrs::<_, String>([])
            .define()
            .unwrap()
    }

    #[test]
    fn test_static_lookup_falls_back() {
        let fallback = class("R6");
        let map = ClassMap::new(fallback.clone());

        assert!(ProxyClass::same(&map.lookup(ForeignId(1)), &fallback));
        assert!(ProxyClass::same(map.fallback(), &fallback));
        assert!(map.is_empty());
    }

    #[test]
    fn test_static_lookup_uses_seeded_entry() {
        let fallback = class("R6");
        let stack = class("Stack");
        let map = ClassMap::with_entries(fallback, [(ForeignId(9), stack.clone())]);

        assert!(ProxyClass::same(&map.lookup(ForeignId(9)), &stack));
    }

    #[test]
    fn test_get_or_create_builds_once() {
        let gate = ForeignGate::new(MockRuntime::new());
        let map = ClassMap::new(class("R6"));
        let builds = Cell::new(0);

        let first = map
            .get_or_create(&gate, ForeignId(3), || {
                builds.set(builds.get() + 1);
                Ok(class("Stack"))
            })
            .unwrap();
        let second = map
            .get_or_create(&gate, ForeignId(3), || {
                builds.set(builds.get() + 1);
                Ok(class("Stack"))
            })
            .unwrap();

        assert_eq!(builds.get(), 1);
        assert!(ProxyClass::same(&first, &second));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let gate = ForeignGate::new(MockRuntime::new());
        let map = ClassMap::new(class("R6"));

        let err = map
            .get_or_create(&gate, ForeignId(4), || {
                Err(BindError::MissingDefaultTable {
                    class: "Broken".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, BindError::MissingDefaultTable { .. }));
        assert!(!map.contains(ForeignId(4)));
    }

    #[test]
    fn test_insert_keeps_first_entry() {
        let map = ClassMap::new(class("R6"));
        let a = class("A");
        let b = class("B");

        assert!(ProxyClass::same(&map.insert(ForeignId(1), a.clone()), &a));
        assert!(ProxyClass::same(&map.insert(ForeignId(1), b), &a));
    }

    #[test]
    fn test_policy_from_str() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: ClassMapPolicy,
        }
        let parsed: Wrapper = toml::from_str("policy = \"static\"").unwrap();
        assert_eq!(parsed.policy, ClassMapPolicy::Static);
        assert_eq!(ClassMapPolicy::default().to_string(), "dynamic");
    }
}
