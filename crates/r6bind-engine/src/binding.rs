//! Binding entry point
//!
//! An [`R6Binding`] owns everything one foreign-runtime connection needs:
//! the gate, the built-in classes, the class map and the configuration.

use std::sync::Arc;

use r6bind_sdk::{CallArgs, ForeignRuntime, ForeignValue, Handle};

use crate::bootstrap::{self, VersionStatus};
use crate::class::ClassRef;
use crate::classmap::{ClassMap, ClassMapPolicy};
use crate::config::{BindingConfig, ConfigError};
use crate::descriptor::ClassDescriptor;
use crate::error::{BindError, BindResult};
use crate::gate::ForeignGate;
use crate::generator::{BuiltinClasses, ClassGeneratorProxy};
use crate::instance::ProxyInstance;
use crate::protocol::ClassDef;
use crate::synthesizer::Synthesizer;

/// Host-side binding to one foreign runtime
pub struct R6Binding {
    gate: Arc<ForeignGate>,
    config: BindingConfig,
    builtins: BuiltinClasses,
    classmap: ClassMap,
    synthesizer: Synthesizer,
    version: VersionStatus,
}

impl R6Binding {
    /// Binding with the default configuration
    pub fn new(runtime: Arc<dyn ForeignRuntime>) -> BindResult<Self> {
        Self::with_config(runtime, BindingConfig::default())
    }

    /// Binding with an explicit configuration
    pub fn with_config(runtime: Arc<dyn ForeignRuntime>, config: BindingConfig) -> BindResult<Self> {
        config.validate().map_err(|err| match err {
            ConfigError::Invalid(reason) => BindError::InvalidConfig(reason),
            other => BindError::InvalidConfig(other.to_string()),
        })?;
        let gate = Arc::new(ForeignGate::new(runtime));
        let builtins = BuiltinClasses::define()?;
        let classmap = ClassMap::new(Arc::clone(&builtins.root));
        let synthesizer = Synthesizer::new().strict_member_partition(config.strict_member_partition);

        let version = if config.check_version {
            bootstrap::check_package_version(&gate, &config.package, &config.target_version)?
        } else {
            VersionStatus::Skipped
        };

        tracing::debug!(policy = %config.policy, ?version, "binding ready");
        Ok(Self {
            gate,
            config,
            builtins,
            classmap,
            synthesizer,
            version,
        })
    }

    /// Wrap a foreign class generator using the configured policy
    pub fn wrap_class_generator(&self, handle: Handle) -> BindResult<ClassGeneratorProxy> {
        self.wrap_class_generator_with(handle, self.config.policy)
    }

    /// Wrap a foreign class generator, resolving its user class under `policy`
    pub fn wrap_class_generator_with(
        &self,
        handle: Handle,
        policy: ClassMapPolicy,
    ) -> BindResult<ClassGeneratorProxy> {
        let descriptor = ClassDescriptor::from_handle(&self.gate, handle)?;
        let user_class = self.classmap.resolve(policy, &self.gate, descriptor.identity(), || {
            self.synthesizer.synthesize(&descriptor, &self.builtins.root)
        })?;

        tracing::debug!(
            class = descriptor.name(),
            user_class = user_class.name(),
            %policy,
            "wrapped class generator"
        );
        let instance = ProxyInstance::wrap(
            Arc::clone(self.builtins.generator_for(policy)),
            Arc::clone(&self.gate),
            handle,
        );
        Ok(ClassGeneratorProxy::new_resolved(instance, user_class, policy))
    }

    /// Wrap a foreign value holding a class generator
    pub fn wrap_value(&self, value: &ForeignValue) -> BindResult<ClassGeneratorProxy> {
        match value.as_handle() {
            Some(handle) => self.wrap_class_generator(handle),
            None => Err(BindError::NotAHandle {
                got: value.type_name(),
            }),
        }
    }

    /// Synthesize a fresh class for `handle` without touching the class map
    pub fn synthesize(&self, handle: Handle) -> BindResult<ClassRef> {
        let descriptor = ClassDescriptor::from_handle(&self.gate, handle)?;
        self.synthesizer.synthesize(&descriptor, &self.builtins.root)
    }

    /// Register `class` as the proxy class for the generator behind `handle`.
    ///
    /// Returns the class now registered, which is the earlier one if the
    /// identity was already mapped.
    pub fn register_class(&self, handle: Handle, class: ClassRef) -> BindResult<ClassRef> {
        if !self.gate.is_class_generator(handle) {
            return Err(BindError::NotAClassGenerator { handle });
        }
        let identity = self.gate.identity(handle)?;
        Ok(self.classmap.insert(identity, class))
    }

    /// Define a class from a builder; classes without a base derive from the root
    pub fn define_class(&self, def: ClassDef) -> BindResult<ClassRef> {
        def.extends_if_unset(&self.builtins.root).define()
    }

    /// Wrap an existing foreign object as an instance of `class`
    pub fn wrap(&self, class: &ClassRef, handle: Handle) -> ProxyInstance {
        ProxyInstance::wrap(Arc::clone(class), Arc::clone(&self.gate), handle)
    }

    /// Construct an instance of `class` through its class generator
    pub fn instantiate(&self, class: &ClassRef, args: &CallArgs) -> BindResult<ProxyInstance> {
        class.instantiate(&self.gate, args)
    }

    /// Root of all proxy classes
    pub fn root_class(&self) -> &ClassRef {
        &self.builtins.root
    }

    /// Built-in class family
    pub fn builtins(&self) -> &BuiltinClasses {
        &self.builtins
    }

    /// Identity cache
    pub fn classmap(&self) -> &ClassMap {
        &self.classmap
    }

    /// Foreign-runtime gate
    pub fn gate(&self) -> &Arc<ForeignGate> {
        &self.gate
    }

    /// Active configuration
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Result of the bootstrap version check
    pub fn version_status(&self) -> &VersionStatus {
        &self.version
    }
}

impl std::fmt::Debug for R6Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R6Binding")
            .field("config", &self.config)
            .field("classmap", &self.classmap)
            .field("version", &self.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ProxyClass;
    use r6bind_test_helpers::MockRuntime;

    fn binding(runtime: &Arc<MockRuntime>) -> R6Binding {
        R6Binding::new(runtime.clone()).unwrap()
    }

    #[test]
    fn test_rejects_non_generator() {
        let runtime = MockRuntime::new();
        let object = runtime.new_object(MockRuntime::generator("Stack"));

        let err = binding(&runtime).wrap_class_generator(object).unwrap_err();
        assert!(matches!(err, BindError::NotAClassGenerator { handle } if handle == object));
    }

    #[test]
    fn test_wrap_value_requires_handle() {
        let runtime = MockRuntime::new();
        let err = binding(&runtime).wrap_value(&ForeignValue::Integer(1)).unwrap_err();
        assert!(matches!(err, BindError::NotAHandle { got: "integer" }));
        assert!(!err.is_lookup());
    }

    #[test]
    fn test_dynamic_policy_caches_by_identity() {
        let runtime = MockRuntime::new();
        let stack = runtime.define_generator(MockRuntime::generator("Stack").field("size", 0));
        let alias = runtime.alias(stack);
        let binding = binding(&runtime);

        let a = binding.wrap_class_generator(stack).unwrap();
        let b = binding.wrap_class_generator(alias).unwrap();
        assert!(ProxyClass::same(a.user_class(), b.user_class()));
        assert_eq!(binding.classmap().len(), 1);
    }

    #[test]
    fn test_synthesize_bypasses_cache() {
        let runtime = MockRuntime::new();
        let stack = runtime.define_generator(MockRuntime::generator("Stack"));
        let binding = binding(&runtime);

        let a = binding.synthesize(stack).unwrap();
        let b = binding.synthesize(stack).unwrap();
        assert!(!ProxyClass::same(&a, &b));
        assert!(binding.classmap().is_empty());
    }

    #[test]
    fn test_version_check_skipped() {
        let runtime = MockRuntime::new();
        let config = BindingConfig {
            check_version: false,
            ..BindingConfig::default()
        };
        let binding = R6Binding::with_config(runtime, config).unwrap();
        assert_eq!(binding.version_status(), &VersionStatus::Skipped);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let runtime = MockRuntime::new();
        let config = BindingConfig {
            package: String::new(),
            ..BindingConfig::default()
        };

        let err = R6Binding::with_config(runtime.clone(), config).unwrap_err();
        assert!(matches!(err, BindError::InvalidConfig(_)));
        assert_eq!(runtime.max_in_flight(), 0);
    }

    #[test]
    fn test_define_class_defaults_to_root() {
        let runtime = MockRuntime::new();
        let binding = binding(&runtime);

        let class = binding.define_class(ClassDef::new("Plain")).unwrap();
        assert!(ProxyClass::same(class.base().unwrap(), binding.root_class()));
    }
}
