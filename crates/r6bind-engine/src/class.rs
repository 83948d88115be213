//! Local proxy classes
//!
//! A `ProxyClass` is the host-side type mirroring one foreign class
//! generator (or one of the built-in proxy types). Classes are created once,
//! through [`ClassDef::define`](crate::ClassDef::define), and are immutable
//! afterwards. They are shared as [`ClassRef`] and compared by reference:
//! two proxies have the same type exactly when their `ClassRef`s point to the
//! same class.
//!
//! Every class carries a flattened slot table (inherited slots, injected
//! forwarders, explicit declarations) resolved at definition time, so
//! attribute access on an instance is one hash lookup.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use r6bind_sdk::{CallArgs, ForeignValue, Handle};
use rustc_hash::FxHashMap;

use crate::accessor;
use crate::error::{BindError, BindResult};
use crate::gate::ForeignGate;
use crate::instance::ProxyInstance;
use crate::table::DefaultAttributeTable;

/// Shared reference to a class
pub type ClassRef = Arc<ProxyClass>;

/// Method implementation: receives the instance and the caller's arguments
pub type MethodFn =
    Arc<dyn Fn(&ProxyInstance, &CallArgs) -> BindResult<ForeignValue> + Send + Sync>;

/// Property implementation: receives the instance
pub type PropertyFn = Arc<dyn Fn(&ProxyInstance) -> BindResult<ForeignValue> + Send + Sync>;

static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique class id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub(crate) fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// An attribute implementation
#[derive(Clone)]
pub enum Attribute {
    /// Callable attribute
    Method(MethodFn),
    /// Read-only value attribute
    Property(PropertyFn),
}

impl Attribute {
    /// Whether this attribute is callable
    pub fn is_method(&self) -> bool {
        matches!(self, Attribute::Method(_))
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Method(_) => write!(f, "Attribute::Method"),
            Attribute::Property(_) => write!(f, "Attribute::Property"),
        }
    }
}

/// Where a slot's implementation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Declared explicitly in a class definition
    Declared,
    /// Injected from a default-attribute table
    Injected,
}

/// A resolved attribute on a class
#[derive(Debug, Clone)]
pub struct Slot {
    pub(crate) attribute: Attribute,
    pub(crate) origin: Origin,
    pub(crate) owner: ClassId,
}

impl Slot {
    /// The implementation
    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    /// Declared or injected
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Class whose definition produced this slot
    pub fn owner(&self) -> ClassId {
        self.owner
    }
}

/// A host-side type mirroring a foreign class
pub struct ProxyClass {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) base: Option<ClassRef>,
    /// Table declared by this class itself
    pub(crate) default_attrs: Option<Arc<DefaultAttributeTable>>,
    /// Own table, or the nearest ancestor's
    pub(crate) effective_attrs: Arc<DefaultAttributeTable>,
    pub(crate) generator: Option<Handle>,
    pub(crate) doc: Option<String>,
    pub(crate) slots: FxHashMap<String, Slot>,
}

impl ProxyClass {
    /// Class id
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct base class
    pub fn base(&self) -> Option<&ClassRef> {
        self.base.as_ref()
    }

    /// Generated or declared description
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Default-attribute table declared by this class, if any
    pub fn default_attrs(&self) -> Option<&DefaultAttributeTable> {
        self.default_attrs.as_deref()
    }

    /// Default-attribute table in effect for this class
    pub fn effective_attrs(&self) -> &DefaultAttributeTable {
        &self.effective_attrs
    }

    /// Originating class generator declared by this class
    pub fn generator(&self) -> Option<Handle> {
        self.generator
    }

    /// Nearest class generator in this class's chain
    pub fn class_generator(&self) -> Option<Handle> {
        self.ancestors().find_map(|class| class.generator)
    }

    /// Resolved slot for `name`
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// All attribute names, sorted
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// This class followed by its bases, nearest first
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Whether `self` is `other` or derives from it
    pub fn is_subclass_of(&self, other: &ProxyClass) -> bool {
        self.ancestors().any(|class| std::ptr::eq(class, other))
    }

    /// Reference identity of two classes
    pub fn same(a: &ClassRef, b: &ClassRef) -> bool {
        Arc::ptr_eq(a, b)
    }

    /// Construct an instance through the nearest class generator.
    ///
    /// Invokes the generator's foreign `new` with `args` and wraps the
    /// resulting handle in a proxy of this class.
    pub fn instantiate(
        self: &Arc<Self>,
        gate: &Arc<ForeignGate>,
        args: &CallArgs,
    ) -> BindResult<ProxyInstance> {
        let generator = self
            .class_generator()
            .ok_or_else(|| BindError::NoClassGenerator {
                class: self.name.clone(),
            })?;
        let handle = construct(gate, generator, &self.name, args)?;
        Ok(ProxyInstance::wrap(Arc::clone(self), Arc::clone(gate), handle))
    }
}

/// Invoke `generator$new(args)` and check that it produced an object
pub(crate) fn construct(
    gate: &ForeignGate,
    generator: Handle,
    class: &str,
    args: &CallArgs,
) -> BindResult<Handle> {
    let result = gate.exclusive(|| -> BindResult<ForeignValue> {
        let new = accessor::get_attribute(gate, generator, "new")?;
        Ok(gate.invoke(&new, args)?)
    })?;
    result
        .as_handle()
        .ok_or_else(|| BindError::ConstructorResult {
            class: class.to_string(),
            got: result.type_name(),
        })
}

/// Iterator over a class and its bases
pub struct Ancestors<'a> {
    next: Option<&'a ProxyClass>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ProxyClass;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.base.as_deref();
        Some(current)
    }
}

impl fmt::Display for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}'>", self.name)
    }
}

impl fmt::Debug for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name.as_str()))
            .field("generator", &self.generator)
            .field("attributes", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ClassDef;
    use crate::table::AttrKind;

    fn root() -> ClassRef {
        ClassDef::new("R6")
            .default_attrs::<_, String>([])
            .define()
            .unwrap()
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let root = root();
        let mid = ClassDef::new("Mid").extends(&root).define().unwrap();
        let leaf = ClassDef::new("Leaf").extends(&mid).define().unwrap();

        let names: Vec<&str> = leaf.ancestors().map(|c| c.name()).collect();
        assert_eq!(names, ["Leaf", "Mid", "R6"]);
        assert!(leaf.is_subclass_of(&root));
        assert!(!root.is_subclass_of(&leaf));
    }

    #[test]
    fn test_identity_is_by_reference() {
        let root = root();
        let a = ClassDef::new("Same").extends(&root).define().unwrap();
        let b = ClassDef::new("Same").extends(&root).define().unwrap();

        assert!(ProxyClass::same(&a, &Arc::clone(&a)));
        assert!(!ProxyClass::same(&a, &b));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_subclass_check_ignores_id_reuse() {
        let root = root();
        let stack = ClassDef::new("Stack").extends(&root).define().unwrap();
        // Same id as `stack`, as after the id counter wraps around.
        let other = ProxyClass {
            id: stack.id,
            name: "Other".to_string(),
            base: Some(Arc::clone(&root)),
            default_attrs: None,
            effective_attrs: Arc::clone(&stack.effective_attrs),
            generator: None,
            doc: None,
            slots: FxHashMap::default(),
        };

        assert!(stack.is_subclass_of(&stack));
        assert!(!other.is_subclass_of(&stack));
        assert!(!stack.is_subclass_of(&other));
        assert!(other.is_subclass_of(&root));
    }

    #[test]
    fn test_class_generator_is_inherited() {
        let root = root();
        let mapped = ClassDef::new("Stack")
            .extends(&root)
            .default_attrs([("push", AttrKind::PlainForward)])
            .generator(Handle::from_bits(7))
            .define()
            .unwrap();
        let user = ClassDef::new("MyStack").extends(&mapped).define().unwrap();

        assert_eq!(user.generator(), None);
        assert_eq!(user.class_generator(), Some(Handle::from_bits(7)));
        assert_eq!(root.class_generator(), None);
    }

    #[test]
    fn test_display() {
        let root = root();
        assert_eq!(root.to_string(), "<class 'R6'>");
    }
}
