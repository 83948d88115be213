//! Class-generator proxies and the built-in class family

use std::fmt;
use std::sync::Arc;

use r6bind_sdk::{CallArgs, ForeignValue, Handle};

use crate::class::{self, ClassRef};
use crate::classmap::ClassMapPolicy;
use crate::descriptor::ClassDescriptor;
use crate::error::BindResult;
use crate::instance::ProxyInstance;
use crate::protocol::ClassDef;
use crate::table::AttrKind;

/// Name of the root proxy class
pub const ROOT_CLASS_NAME: &str = "R6";

/// Attributes every class-generator proxy forwards.
///
/// `new` is not listed: [`ClassGeneratorProxy::new`] handles it.
pub const CLASS_GENERATOR_ATTRS: &[(&str, AttrKind)] = &[
    ("active", AttrKind::PlainForward),
    ("class", AttrKind::PropertyForward),
    ("classname", AttrKind::PropertyForward),
    ("clone_method", AttrKind::PlainForward),
    ("debug", AttrKind::PlainForward),
    ("debug_names", AttrKind::PropertyForward),
    ("get_inherit", AttrKind::PlainForward),
    ("has_private", AttrKind::PropertyForward),
    ("inherit", AttrKind::PlainForward),
    ("is_locked", AttrKind::PropertyForward),
    ("lock", AttrKind::PlainForward),
    ("lock_class", AttrKind::PropertyForward),
    ("lock_objects", AttrKind::PropertyForward),
    ("parent_env", AttrKind::PropertyForward),
    ("portable", AttrKind::PropertyForward),
    ("private_fields", AttrKind::PropertyForward),
    ("private_methods", AttrKind::PropertyForward),
    ("public_fields", AttrKind::PropertyForward),
    ("public_methods", AttrKind::PropertyForward),
    ("self", AttrKind::PropertyForward),
    ("set", AttrKind::PlainForward),
    ("undebug", AttrKind::PlainForward),
    ("unlock", AttrKind::PlainForward),
];

/// The classes every binding starts with
#[derive(Debug, Clone)]
pub struct BuiltinClasses {
    /// Root of all proxy classes; empty table
    pub root: ClassRef,
    /// Class-generator proxies; fixed table
    pub generator: ClassRef,
    /// Class-generator proxies resolving user classes statically
    pub static_generator: ClassRef,
    /// Class-generator proxies synthesizing user classes on first use
    pub dynamic_generator: ClassRef,
}

impl BuiltinClasses {
    /// Define the built-in family
    pub fn define() -> BindResult<Self> {
        let root = ClassDef::new(ROOT_CLASS_NAME)
            .default_attrs::<_, &str>([])
            .doc("Base class for proxies of foreign R6 objects.")
            .define()?;
        let generator = ClassDef::new("R6ClassGenerator")
            .extends(&root)
            .default_attrs(CLASS_GENERATOR_ATTRS.iter().copied())
            .doc("Factory of constructors for R6 objects.")
            .define()?;
        let static_generator = ClassDef::new("R6StaticClassGenerator")
            .extends(&generator)
            .define()?;
        let dynamic_generator = ClassDef::new("R6DynamicClassGenerator")
            .extends(&generator)
            .define()?;

        Ok(Self {
            root,
            generator,
            static_generator,
            dynamic_generator,
        })
    }

    /// Generator proxy class for `policy`
    pub fn generator_for(&self, policy: ClassMapPolicy) -> &ClassRef {
        match policy {
            ClassMapPolicy::Static => &self.static_generator,
            ClassMapPolicy::Dynamic => &self.dynamic_generator,
        }
    }
}

/// Proxy over a foreign class generator.
///
/// Answers the fixed generator attributes like any proxy, and constructs
/// instances of the resolved user class through [`new`](Self::new).
pub struct ClassGeneratorProxy {
    instance: ProxyInstance,
    user_class: ClassRef,
    policy: ClassMapPolicy,
}

impl ClassGeneratorProxy {
    pub(crate) fn new_resolved(
        instance: ProxyInstance,
        user_class: ClassRef,
        policy: ClassMapPolicy,
    ) -> Self {
        Self {
            instance,
            user_class,
            policy,
        }
    }

    /// Invoke the foreign constructor with `args` and wrap the result as an
    /// instance of the user class
    pub fn new(&self, args: &CallArgs) -> BindResult<ProxyInstance> {
        let gate = self.instance.shared_gate();
        let handle = class::construct(gate, self.instance.handle(), self.user_class.name(), args)?;
        Ok(ProxyInstance::wrap(
            Arc::clone(&self.user_class),
            Arc::clone(gate),
            handle,
        ))
    }

    /// Local class that `new` instantiates
    pub fn user_class(&self) -> &ClassRef {
        &self.user_class
    }

    /// Policy the user class was resolved with
    pub fn policy(&self) -> ClassMapPolicy {
        self.policy
    }

    /// Handle of the wrapped generator
    pub fn handle(&self) -> Handle {
        self.instance.handle()
    }

    /// Proxy over the generator itself
    pub fn as_instance(&self) -> &ProxyInstance {
        &self.instance
    }

    /// Read a generator property (e.g. `classname`)
    pub fn get(&self, name: &str) -> BindResult<ForeignValue> {
        self.instance.get(name)
    }

    /// Call a generator method (e.g. `set`)
    pub fn call(&self, name: &str, args: &CallArgs) -> BindResult<ForeignValue> {
        self.instance.call(name, args)
    }

    /// Reflect over the wrapped generator again
    pub fn descriptor(&self) -> BindResult<ClassDescriptor> {
        ClassDescriptor::from_handle(self.instance.gate(), self.instance.handle())
    }
}

impl fmt::Display for ClassGeneratorProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.instance, f)
    }
}

impl fmt::Debug for ClassGeneratorProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassGeneratorProxy")
            .field("generator", &self.instance.handle())
            .field("user_class", &self.user_class.name())
            .field("policy", &self.policy)
            .finish()
    }
}
