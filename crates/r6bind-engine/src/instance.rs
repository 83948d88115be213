//! Proxy instances

use std::fmt;
use std::sync::Arc;

use r6bind_sdk::{CallArgs, ForeignValue, Handle};

use crate::class::{Attribute, ClassRef, ProxyClass};
use crate::error::{BindError, BindResult};
use crate::gate::ForeignGate;

/// Host-side view of one foreign object.
///
/// Holds exactly one handle, fixed at construction. Dropping the proxy does
/// not release the foreign object; that is the foreign runtime's business.
pub struct ProxyInstance {
    class: ClassRef,
    gate: Arc<ForeignGate>,
    handle: Handle,
}

impl ProxyInstance {
    /// Wrap `handle` as an instance of `class`. No other side effects.
    pub fn wrap(class: ClassRef, gate: Arc<ForeignGate>, handle: Handle) -> Self {
        Self {
            class,
            gate,
            handle,
        }
    }

    /// The instance's class
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// The owned foreign handle
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Gate used for forwarded access
    pub fn gate(&self) -> &ForeignGate {
        &self.gate
    }

    pub(crate) fn shared_gate(&self) -> &Arc<ForeignGate> {
        &self.gate
    }

    /// Whether the instance's class is `class` or derives from it
    pub fn is_instance_of(&self, class: &ProxyClass) -> bool {
        self.class.is_subclass_of(class)
    }

    /// Whether `name` resolves on this instance
    pub fn has_attribute(&self, name: &str) -> bool {
        self.class.slot(name).is_some()
    }

    /// Read a property
    pub fn get(&self, name: &str) -> BindResult<ForeignValue> {
        match self.attribute(name)? {
            Attribute::Property(read) => read(self),
            Attribute::Method(_) => Err(BindError::NotAProperty {
                class: self.class.name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Call a method
    pub fn call(&self, name: &str, args: &CallArgs) -> BindResult<ForeignValue> {
        match self.attribute(name)? {
            Attribute::Method(call) => call(self, args),
            Attribute::Property(_) => Err(BindError::NotCallable {
                class: self.class.name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn attribute(&self, name: &str) -> BindResult<&Attribute> {
        tracing::trace!(class = self.class.name(), name, "proxy attribute access");
        self.class
            .slot(name)
            .map(|slot| slot.attribute())
            .ok_or_else(|| BindError::UnknownAttribute {
                class: self.class.name().to_string(),
                name: name.to_string(),
            })
    }
}

impl From<&ProxyInstance> for ForeignValue {
    fn from(instance: &ProxyInstance) -> Self {
        ForeignValue::Handle(instance.handle)
    }
}

impl fmt::Display for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {:#x}", self.class, self.handle.to_bits())
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("class", &self.class.name())
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ClassDef;
    use crate::table::AttrKind;
    use r6bind_test_helpers::MockRuntime;

    fn setup() -> (Arc<MockRuntime>, Arc<ForeignGate>, ClassRef, Handle) {
        let runtime = MockRuntime::new();
        let gate = Arc::new(ForeignGate::new(runtime.clone()));
        let root = ClassDef::new("R6")
            .default_attrs::<_, String>([])
            .define()
            .unwrap();
        let class = ClassDef::new("Counter")
            .extends(&root)
            .default_attrs([
                ("increment", AttrKind::PlainForward),
                ("count", AttrKind::PropertyForward),
            ])
            .define()
            .unwrap();
        let object = runtime.new_object(MockRuntime::generator("Counter").field("count", 3));
        (runtime, gate, class, object)
    }

    #[test]
    fn test_property_read() {
        let (_rt, gate, class, object) = setup();
        let instance = ProxyInstance::wrap(class, gate, object);

        assert_eq!(instance.get("count").unwrap(), ForeignValue::Integer(3));
    }

    #[test]
    fn test_property_not_callable() {
        let (_rt, gate, class, object) = setup();
        let instance = ProxyInstance::wrap(class, gate, object);

        let err = instance.call("count", &CallArgs::none()).unwrap_err();
        assert!(matches!(err, BindError::NotCallable { .. }));
    }

    #[test]
    fn test_method_not_readable() {
        let (_rt, gate, class, object) = setup();
        let instance = ProxyInstance::wrap(class, gate, object);

        let err = instance.get("increment").unwrap_err();
        assert!(matches!(err, BindError::NotAProperty { .. }));
    }

    #[test]
    fn test_unknown_attribute() {
        let (_rt, gate, class, object) = setup();
        let instance = ProxyInstance::wrap(class, gate, object);

        assert!(!instance.has_attribute("missing"));
        let err = instance.get("missing").unwrap_err();
        assert_eq!(err.to_string(), "'Counter' object has no attribute 'missing'");
    }

    #[test]
    fn test_foreign_lookup_failure_propagates() {
        let (_rt, gate, class, object) = setup();
        let instance = ProxyInstance::wrap(class, gate, object);

        // Listed in the table but absent on the foreign object.
        let err = instance.call("increment", &CallArgs::none()).unwrap_err();
        assert!(err.is_lookup());
    }

    #[test]
    fn test_display_and_handle_passthrough() {
        let (_rt, gate, class, object) = setup();
        let instance = ProxyInstance::wrap(class, gate, object);

        assert_eq!(
            instance.to_string(),
            format!("<class 'Counter'> at {:#x}", object.to_bits())
        );
        assert_eq!(ForeignValue::from(&instance), ForeignValue::Handle(object));
    }
}
