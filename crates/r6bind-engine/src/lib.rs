//! r6bind Engine
//!
//! Mirrors foreign R6 classes as host-side proxy classes:
//! - **Protocol**: class definition with default-attribute injection (`protocol`)
//! - **Synthesis**: proxy classes built from reflected class generators (`synthesizer`)
//! - **Class map**: identity-keyed cache with static and dynamic policies (`classmap`)
//! - **Proxies**: instances and class-generator proxies (`instance`, `generator`)
//!
//! # Example
//!
//! ```rust,ignore
//! use r6bind_engine::{R6Binding, CallArgs};
//!
//! let binding = R6Binding::new(runtime)?;
//! let stack = binding.wrap_class_generator(stack_generator)?;
//! let s = stack.new(&CallArgs::none())?;
//! s.call("push", &CallArgs::none().arg(5))?;
//! assert_eq!(s.get("size")?.as_i64(), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod accessor;
pub mod binding;
pub mod bootstrap;
pub mod class;
pub mod classmap;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod gate;
pub mod generator;
pub mod instance;
pub mod protocol;
pub mod synthesizer;
pub mod table;

pub use binding::R6Binding;
pub use bootstrap::{check_package_version, VersionStatus};
pub use class::{Attribute, ClassId, ClassRef, Origin, ProxyClass, Slot};
pub use classmap::{ClassMap, ClassMapPolicy};
pub use config::{BindingConfig, ConfigError};
pub use descriptor::{ClassDescriptor, ANONYMOUS_CLASS_NAME};
pub use error::{BindError, BindResult};
pub use gate::ForeignGate;
pub use generator::{BuiltinClasses, ClassGeneratorProxy, CLASS_GENERATOR_ATTRS, ROOT_CLASS_NAME};
pub use instance::ProxyInstance;
pub use protocol::ClassDef;
pub use synthesizer::Synthesizer;
pub use table::{AttrKind, DefaultAttributeTable};

pub use r6bind_sdk::{CallArgs, ForeignError, ForeignId, ForeignRuntime, ForeignValue, Handle};
