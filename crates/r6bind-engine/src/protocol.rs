//! Class definition and attribute injection
//!
//! Every proxy class is created through [`ClassDef::define`], which runs the
//! injection protocol once, at definition time:
//!
//! 1. Resolve the effective default-attribute table: the definition's own
//!    table, otherwise the nearest ancestor's. No table anywhere is an error.
//! 2. Reject tables that list a name twice.
//! 3. Inject a forwarding accessor for every table entry that is not
//!    explicitly declared, neither by this definition nor by an ancestor.
//! 4. Apply the explicit declarations, which always win.
//!
//! Only the nearest table is consulted; ancestors' tables are not merged.

use std::sync::Arc;

use indexmap::IndexMap;
use r6bind_sdk::{CallArgs, ForeignValue, Handle};

use crate::accessor;
use crate::class::{Attribute, ClassId, ClassRef, Origin, ProxyClass, Slot};
use crate::error::{BindError, BindResult};
use crate::instance::ProxyInstance;
use crate::table::{AttrKind, DefaultAttributeTable};

/// Definition of a proxy class, consumed by [`ClassDef::define`]
pub struct ClassDef {
    name: String,
    base: Option<ClassRef>,
    default_attrs: Option<Vec<(String, AttrKind)>>,
    members: IndexMap<String, Attribute>,
    generator: Option<Handle>,
    doc: Option<String>,
}

impl ClassDef {
    /// Start a definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            default_attrs: None,
            members: IndexMap::new(),
            generator: None,
            doc: None,
        }
    }

    /// Set the base class
    pub fn extends(mut self, base: &ClassRef) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    pub(crate) fn extends_if_unset(mut self, base: &ClassRef) -> Self {
        if self.base.is_none() {
            self.base = Some(Arc::clone(base));
        }
        self
    }

    /// Declare this class's own default-attribute table
    pub fn default_attrs<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, AttrKind)>,
        S: Into<String>,
    {
        self.default_attrs = Some(
            entries
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        );
        self
    }

    /// Declare an explicit method
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ProxyInstance, &CallArgs) -> BindResult<ForeignValue> + Send + Sync + 'static,
    {
        self.members.insert(name.into(), Attribute::Method(Arc::new(f)));
        self
    }

    /// Declare an explicit read-only property
    pub fn property<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ProxyInstance) -> BindResult<ForeignValue> + Send + Sync + 'static,
    {
        self.members.insert(name.into(), Attribute::Property(Arc::new(f)));
        self
    }

    /// Record the originating foreign class generator
    pub fn generator(mut self, handle: Handle) -> Self {
        self.generator = Some(handle);
        self
    }

    /// Attach a description
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Run the injection protocol and create the class
    pub fn define(self) -> BindResult<ClassRef> {
        let ClassDef {
            name,
            base,
            default_attrs,
            members,
            generator,
            doc,
        } = self;

        let own = match default_attrs {
            Some(entries) => Some(Arc::new(DefaultAttributeTable::try_from_entries(
                &name, entries,
            )?)),
            None => None,
        };
        let effective = match &own {
            Some(table) => Arc::clone(table),
            None => base
                .as_deref()
                .and_then(|b| b.ancestors().find_map(|class| class.default_attrs.clone()))
                .ok_or_else(|| BindError::MissingDefaultTable {
                    class: name.clone(),
                })?,
        };

        let id = ClassId::next();
        let mut slots = base
            .as_ref()
            .map(|b| b.slots.clone())
            .unwrap_or_default();

        let mut injected = 0usize;
        for (attr, kind) in effective.iter() {
            if members.contains_key(attr) {
                continue;
            }
            if matches!(slots.get(attr), Some(slot) if slot.origin == Origin::Declared) {
                continue;
            }
            slots.insert(
                attr.to_string(),
                Slot {
                    attribute: forwarding(attr, kind),
                    origin: Origin::Injected,
                    owner: id,
                },
            );
            injected += 1;
        }

        let declared = members.len();
        for (attr, attribute) in members {
            slots.insert(
                attr,
                Slot {
                    attribute,
                    origin: Origin::Declared,
                    owner: id,
                },
            );
        }

        tracing::debug!(
            class = %name,
            id = id.as_u32(),
            base = base.as_ref().map(|b| b.name.as_str()),
            own_table = own.is_some(),
            injected,
            declared,
            "defined proxy class"
        );

        Ok(Arc::new(ProxyClass {
            id,
            name,
            base,
            default_attrs: own,
            effective_attrs: effective,
            generator,
            doc,
            slots,
        }))
    }
}

/// Forwarding accessor for one table entry
fn forwarding(name: &str, kind: AttrKind) -> Attribute {
    let getter = accessor::bind_attribute(name);
    match kind {
        AttrKind::PlainForward => Attribute::Method(Arc::new(
            move |instance: &ProxyInstance, args: &CallArgs| -> BindResult<ForeignValue> {
                let gate = instance.gate();
                gate.exclusive(|| -> BindResult<ForeignValue> {
                    let callee = getter(gate, instance.handle())?;
                    Ok(gate.invoke(&callee, args)?)
                })
            },
        )),
        AttrKind::PropertyForward => Attribute::Property(Arc::new(
            move |instance: &ProxyInstance| -> BindResult<ForeignValue> {
                getter(instance.gate(), instance.handle())
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> ClassRef {
        ClassDef::new("R6")
            .default_attrs::<_, String>([])
            .define()
            .unwrap()
    }

    fn stack(root: &ClassRef) -> ClassRef {
        ClassDef::new("Stack")
            .extends(root)
            .default_attrs([
                ("push", AttrKind::PlainForward),
                ("size", AttrKind::PropertyForward),
            ])
            .define()
            .unwrap()
    }

    #[test]
    fn test_missing_table_without_base() {
        let err = ClassDef::new("Orphan").define().unwrap_err();
        assert!(matches!(err, BindError::MissingDefaultTable { class } if class == "Orphan"));
    }

    #[test]
    fn test_duplicate_names_rejected_at_definition() {
        let err = ClassDef::new("Broken")
            .default_attrs([("x", AttrKind::PlainForward), ("x", AttrKind::PlainForward)])
            .define()
            .unwrap_err();
        assert!(matches!(err, BindError::DuplicateAttributeName { .. }));
    }

    #[test]
    fn test_injects_every_table_entry() {
        let root = root();
        let stack = stack(&root);

        assert!(stack.slot("push").unwrap().attribute().is_method());
        assert!(!stack.slot("size").unwrap().attribute().is_method());
        assert_eq!(stack.slot("push").unwrap().origin(), Origin::Injected);
        assert_eq!(stack.slot("push").unwrap().owner(), stack.id());
    }

    #[test]
    fn test_explicit_member_wins() {
        let root = root();
        let class = ClassDef::new("Stack")
            .extends(&root)
            .default_attrs([("size", AttrKind::PropertyForward)])
            .property("size", |_| Ok(ForeignValue::Integer(-1)))
            .define()
            .unwrap();

        assert_eq!(class.slot("size").unwrap().origin(), Origin::Declared);
    }

    #[test]
    fn test_table_inherited_from_nearest_ancestor() {
        let root = root();
        let stack = stack(&root);
        let child = ClassDef::new("Child").extends(&stack).define().unwrap();
        let grandchild = ClassDef::new("Grandchild").extends(&child).define().unwrap();

        assert!(child.default_attrs().is_none());
        assert!(grandchild.default_attrs().is_none());
        assert_eq!(grandchild.effective_attrs(), stack.default_attrs().unwrap());
        assert_eq!(grandchild.slot("push").unwrap().owner(), grandchild.id());
    }

    #[test]
    fn test_nearest_table_is_not_merged() {
        let root = root();
        let stack = stack(&root);
        let narrowed = ClassDef::new("Narrowed")
            .extends(&stack)
            .default_attrs([("pop", AttrKind::PlainForward)])
            .define()
            .unwrap();
        let leaf = ClassDef::new("Leaf").extends(&narrowed).define().unwrap();

        assert_eq!(leaf.effective_attrs().names().collect::<Vec<_>>(), ["pop"]);
        // Slots injected for Stack are still inherited as slots.
        assert!(leaf.slot("push").is_some());
        assert_eq!(leaf.slot("push").unwrap().owner(), stack.id());
    }

    #[test]
    fn test_inherited_declaration_not_overwritten() {
        let root = root();
        let stack = stack(&root);
        let custom = ClassDef::new("Custom")
            .extends(&stack)
            .property("size", |_| Ok(ForeignValue::Integer(0)))
            .define()
            .unwrap();
        let leaf = ClassDef::new("Leaf").extends(&custom).define().unwrap();

        let slot = leaf.slot("size").unwrap();
        assert_eq!(slot.origin(), Origin::Declared);
        assert_eq!(slot.owner(), custom.id());
    }
}
