//! Mock implementations for testing
//!
//! [`MockRuntime`] is an in-memory stand-in for an R6 session: class
//! generators, the objects they construct, bound methods and name lists all
//! live in one arena addressed by handles. An alias is a second handle onto
//! the same arena entry, so it shares the entry's identity.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;
use r6bind_sdk::{
    AbiResult, CallArgs, ForeignError, ForeignId, ForeignRuntime, ForeignValue, Handle,
};
use rustc_hash::FxHashMap;

/// Body of a mock method: `(runtime, self handle, args)`
pub type MockMethod =
    Arc<dyn Fn(&MockRuntime, Handle, &CallArgs) -> AbiResult<ForeignValue> + Send + Sync>;

const HANDLE_BASE: u64 = 0x1000;
const HANDLE_STRIDE: u64 = 0x10;

/// Blueprint of a foreign class generator
#[derive(Clone)]
pub struct GeneratorSpec {
    classname: ForeignValue,
    fields: Vec<(String, ForeignValue)>,
    methods: Vec<(String, MockMethod)>,
    constructor_result: Option<ForeignValue>,
    reflect_members: bool,
    omitted: Vec<String>,
}

impl GeneratorSpec {
    /// Generator named `classname` with no members
    pub fn new(classname: impl Into<ForeignValue>) -> Self {
        Self {
            classname: classname.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructor_result: None,
            reflect_members: true,
            omitted: Vec::new(),
        }
    }

    /// Add a public field with its initial value
    pub fn field(mut self, name: impl Into<String>, value: impl Into<ForeignValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a public method
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&MockRuntime, Handle, &CallArgs) -> AbiResult<ForeignValue> + Send + Sync + 'static,
    {
        self.methods.push((name.into(), Arc::new(body)));
        self
    }

    /// Add a public method that always returns `value`
    pub fn method_returning(self, name: impl Into<String>, value: impl Into<ForeignValue>) -> Self {
        let value = value.into();
        self.method(name, move |_, _, _| Ok(value.clone()))
    }

    /// Make `new` return `value` instead of a fresh object
    pub fn new_returning(mut self, value: impl Into<ForeignValue>) -> Self {
        self.constructor_result = Some(value.into());
        self
    }

    /// Leave `attr` off the generator entirely
    pub fn omit(mut self, attr: impl Into<String>) -> Self {
        self.omitted.push(attr.into());
        self
    }

    /// Report NULL for `public_fields` and `public_methods`
    pub fn without_member_lists(mut self) -> Self {
        self.reflect_members = false;
        self
    }
}

impl fmt::Debug for GeneratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorSpec")
            .field("classname", &self.classname)
            .field("fields", &self.fields)
            .field(
                "methods",
                &self.methods.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// One recorded call to [`ForeignRuntime::invoke`]
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Name the function was bound under
    pub function: String,
    /// Object the function is bound to
    pub receiver: Handle,
    /// Arguments passed
    pub args: CallArgs,
}

enum Entry {
    Env {
        generator: bool,
        attrs: Vec<(String, ForeignValue)>,
    },
    Names(Vec<String>),
    Function {
        name: String,
        receiver: Handle,
        body: MockMethod,
    },
}

impl Entry {
    fn type_name(&self) -> &'static str {
        match self {
            Entry::Env { .. } => "environment",
            Entry::Names(_) => "list",
            Entry::Function { .. } => "function",
        }
    }
}

#[derive(Default)]
struct Arena {
    entries: Vec<Entry>,
    handles: FxHashMap<Handle, usize>,
    issued: u64,
    versions: FxHashMap<String, String>,
    invocations: Vec<Invocation>,
}

impl Arena {
    fn alloc(&mut self, entry: Entry) -> Handle {
        self.entries.push(entry);
        self.bind(self.entries.len() - 1)
    }

    fn bind(&mut self, index: usize) -> Handle {
        self.issued += 1;
        let handle = Handle::from_bits(HANDLE_BASE + self.issued * HANDLE_STRIDE);
        self.handles.insert(handle, index);
        handle
    }

    fn index(&self, handle: Handle) -> AbiResult<usize> {
        self.handles
            .get(&handle)
            .copied()
            .ok_or(ForeignError::InvalidHandle(handle))
    }

    fn entry(&self, handle: Handle) -> AbiResult<&Entry> {
        Ok(&self.entries[self.index(handle)?])
    }

    fn env_attrs(&mut self, handle: Handle) -> AbiResult<&mut Vec<(String, ForeignValue)>> {
        let index = self.index(handle)?;
        match &mut self.entries[index] {
            Entry::Env { attrs, .. } => Ok(attrs),
            other => Err(ForeignError::TypeMismatch {
                expected: "environment".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }
}

fn upsert(attrs: &mut Vec<(String, ForeignValue)>, name: &str, value: ForeignValue) {
    match attrs.iter_mut().find(|(existing, _)| existing == name) {
        Some((_, slot)) => *slot = value,
        None => attrs.push((name.to_string(), value)),
    }
}

/// `set(which, name, value)` on a generator: records `name` in the
/// `public_fields` or `public_methods` list. Objects built afterwards do not
/// see the new member.
fn generator_set(rt: &MockRuntime, generator: Handle, args: &CallArgs) -> AbiResult<ForeignValue> {
    if rt.field(generator, "is_locked")?.as_bool() == Some(true) {
        return Err(ForeignError::Evaluation("Can't modify a locked R6 class.".into()));
    }
    let positional = args.positional_args();
    let which = positional.first().and_then(ForeignValue::as_str);
    let name = positional.get(1).and_then(ForeignValue::as_str);
    let list = match (which, name) {
        (Some("public"), Some(_)) => match positional.get(2) {
            Some(ForeignValue::Handle(_)) => "public_methods",
            _ => "public_fields",
        },
        _ => {
            return Err(ForeignError::Evaluation(
                "`which` must be \"public\" and `name` a string".into(),
            ))
        }
    };
    let list = rt.field(generator, list)?.as_handle().ok_or_else(|| ForeignError::TypeMismatch {
        expected: "list".to_string(),
        got: "NULL".to_string(),
    })?;
    let mut arena = rt.arena.lock();
    let index = arena.index(list)?;
    if let Entry::Names(names) = &mut arena.entries[index] {
        let name = name.unwrap_or_default().to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(ForeignValue::Null)
}

/// In-memory foreign runtime
pub struct MockRuntime {
    arena: Mutex<Arena>,
    active: Mutex<FxHashMap<ThreadId, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl MockRuntime {
    /// Empty runtime with no packages installed
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            arena: Mutex::new(Arena::default()),
            active: Mutex::new(FxHashMap::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Mutex::new(None),
        })
    }

    /// Start a generator blueprint
    pub fn generator(classname: &str) -> GeneratorSpec {
        GeneratorSpec::new(classname)
    }

    /// Blueprint with a NULL class name and NULL member lists
    pub fn anonymous_generator() -> GeneratorSpec {
        GeneratorSpec::new(ForeignValue::Null).without_member_lists()
    }

    /// Create a class generator from `blueprint`
    pub fn define_generator(&self, blueprint: GeneratorSpec) -> Handle {
        let mut arena = self.arena.lock();
        let names = |members: Vec<String>, arena: &mut Arena| {
            if blueprint.reflect_members {
                ForeignValue::Handle(arena.alloc(Entry::Names(members)))
            } else {
                ForeignValue::Null
            }
        };
        let public_fields = names(
            blueprint.fields.iter().map(|(name, _)| name.clone()).collect(),
            &mut *arena,
        );
        let public_methods = names(
            blueprint.methods.iter().map(|(name, _)| name.clone()).collect(),
            &mut *arena,
        );

        let generator = arena.alloc(Entry::Env {
            generator: true,
            attrs: Vec::new(),
        });
        let constructor: MockMethod = match &blueprint.constructor_result {
            Some(result) => {
                let result = result.clone();
                Arc::new(move |_: &MockRuntime, _: Handle, _: &CallArgs| Ok(result.clone()))
            }
            None => {
                let template = blueprint.clone();
                Arc::new(move |rt: &MockRuntime, _: Handle, args: &CallArgs| {
                    Ok(ForeignValue::Handle(rt.construct(&template, args)))
                })
            }
        };
        let new = arena.alloc(Entry::Function {
            name: "new".to_string(),
            receiver: generator,
            body: constructor,
        });
        let set = arena.alloc(Entry::Function {
            name: "set".to_string(),
            receiver: generator,
            body: Arc::new(generator_set),
        });
        let lock = arena.alloc(Entry::Function {
            name: "lock".to_string(),
            receiver: generator,
            body: Arc::new(|rt: &MockRuntime, this: Handle, _: &CallArgs| -> AbiResult<ForeignValue> {
                rt.set_field(this, "is_locked", true)?;
                Ok(ForeignValue::Null)
            }),
        });
        let unlock = arena.alloc(Entry::Function {
            name: "unlock".to_string(),
            receiver: generator,
            body: Arc::new(|rt: &MockRuntime, this: Handle, _: &CallArgs| -> AbiResult<ForeignValue> {
                rt.set_field(this, "is_locked", false)?;
                Ok(ForeignValue::Null)
            }),
        });

        let mut attrs = vec![
            ("classname".to_string(), blueprint.classname.clone()),
            ("public_fields".to_string(), public_fields),
            ("public_methods".to_string(), public_methods),
            ("new".to_string(), ForeignValue::Handle(new)),
            ("set".to_string(), ForeignValue::Handle(set)),
            ("lock".to_string(), ForeignValue::Handle(lock)),
            ("unlock".to_string(), ForeignValue::Handle(unlock)),
            ("is_locked".to_string(), ForeignValue::Logical(false)),
            ("lock_objects".to_string(), ForeignValue::Logical(true)),
            ("portable".to_string(), ForeignValue::Logical(true)),
        ];
        attrs.retain(|(name, _)| !blueprint.omitted.contains(name));
        if let Ok(slot) = arena.env_attrs(generator) {
            *slot = attrs;
        }
        generator
    }

    /// Create an object from `blueprint` without going through a generator
    pub fn new_object(&self, blueprint: GeneratorSpec) -> Handle {
        self.construct(&blueprint, &CallArgs::none())
    }

    /// Named `args` matching a field name override its initial value
    fn construct(&self, blueprint: &GeneratorSpec, args: &CallArgs) -> Handle {
        let mut arena = self.arena.lock();
        let object = arena.alloc(Entry::Env {
            generator: false,
            attrs: Vec::new(),
        });

        let mut attrs = Vec::new();
        for (name, body) in &blueprint.methods {
            let function = arena.alloc(Entry::Function {
                name: name.clone(),
                receiver: object,
                body: Arc::clone(body),
            });
            upsert(&mut attrs, name, ForeignValue::Handle(function));
        }
        for (name, initial) in &blueprint.fields {
            let value = args.get_named(name).cloned().unwrap_or_else(|| initial.clone());
            upsert(&mut attrs, name, value);
        }
        if let Ok(slot) = arena.env_attrs(object) {
            *slot = attrs;
        }
        object
    }

    /// A second handle onto the value behind `handle`
    pub fn alias(&self, handle: Handle) -> Handle {
        let mut arena = self.arena.lock();
        let index = arena.index(handle).expect("alias of a live handle");
        arena.bind(index)
    }

    /// Identity of a live handle
    pub fn identity_of(&self, handle: Handle) -> ForeignId {
        let arena = self.arena.lock();
        let index = arena.index(handle).expect("identity of a live handle");
        ForeignId(index as u64 + 1)
    }

    /// Read an attribute of an object, for use inside method bodies
    pub fn field(&self, object: Handle, name: &str) -> AbiResult<ForeignValue> {
        let mut arena = self.arena.lock();
        let attrs = arena.env_attrs(object)?;
        attrs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ForeignError::lookup(name))
    }

    /// Write an attribute of an object, creating it if absent
    pub fn set_field(
        &self,
        object: Handle,
        name: &str,
        value: impl Into<ForeignValue>,
    ) -> AbiResult<()> {
        let mut arena = self.arena.lock();
        upsert(arena.env_attrs(object)?, name, value.into());
        Ok(())
    }

    /// Installed version reported for `package`
    pub fn set_package_version(&self, package: &str, version: &str) {
        self.arena
            .lock()
            .versions
            .insert(package.to_string(), version.to_string());
    }

    /// Sleep this long inside every runtime call, to widen race windows
    pub fn set_call_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Every `invoke` so far, oldest first
    pub fn invocations(&self) -> Vec<Invocation> {
        self.arena.lock().invocations.clone()
    }

    /// Number of invocations of functions bound as `function`
    pub fn invocation_count(&self, function: &str) -> usize {
        self.arena
            .lock()
            .invocations
            .iter()
            .filter(|call| call.function == function)
            .count()
    }

    /// Highest number of threads seen inside the runtime at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) -> CallTracker<'_> {
        {
            let mut active = self.active.lock();
            let depth = active.entry(thread::current().id()).or_insert(0);
            *depth += 1;
            if *depth == 1 {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            }
        }
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        CallTracker { runtime: self }
    }
}

/// Tracks how many distinct threads are inside the runtime
struct CallTracker<'a> {
    runtime: &'a MockRuntime,
}

impl Drop for CallTracker<'_> {
    fn drop(&mut self) {
        let mut active = self.runtime.active.lock();
        let id = thread::current().id();
        if let Some(depth) = active.get_mut(&id) {
            *depth -= 1;
            if *depth == 0 {
                active.remove(&id);
                self.runtime.in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }
}

impl ForeignRuntime for MockRuntime {
    fn is_class_generator(&self, target: Handle) -> bool {
        let _call = self.enter();
        matches!(
            self.arena.lock().entry(target),
            Ok(Entry::Env {
                generator: true,
                ..
            })
        )
    }

    fn get_attribute(&self, target: Handle, name: &str) -> AbiResult<ForeignValue> {
        let _call = self.enter();
        let arena = self.arena.lock();
        match arena.entry(target)? {
            Entry::Env { attrs, .. } => attrs
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| ForeignError::lookup(name)),
            other => Err(ForeignError::TypeMismatch {
                expected: "environment".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    fn names(&self, value: &ForeignValue) -> AbiResult<Option<Vec<String>>> {
        let _call = self.enter();
        let Some(handle) = value.as_handle() else {
            return Ok(None);
        };
        let arena = self.arena.lock();
        Ok(match arena.entry(handle)? {
            Entry::Names(names) => Some(names.clone()),
            Entry::Env { attrs, .. } => Some(attrs.iter().map(|(name, _)| name.clone()).collect()),
            Entry::Function { .. } => None,
        })
    }

    fn identity(&self, target: Handle) -> AbiResult<ForeignId> {
        let _call = self.enter();
        let index = self.arena.lock().index(target)?;
        Ok(ForeignId(index as u64 + 1))
    }

    fn invoke(&self, callee: &ForeignValue, args: &CallArgs) -> AbiResult<ForeignValue> {
        let _call = self.enter();
        let handle = callee.as_handle().ok_or_else(|| ForeignError::NotCallable {
            got: callee.type_name().to_string(),
        })?;

        let (receiver, body) = {
            let mut arena = self.arena.lock();
            let (name, receiver, body) = match arena.entry(handle)? {
                Entry::Function {
                    name,
                    receiver,
                    body,
                } => (name.clone(), *receiver, Arc::clone(body)),
                other => {
                    return Err(ForeignError::NotCallable {
                        got: other.type_name().to_string(),
                    })
                }
            };
            arena.invocations.push(Invocation {
                function: name,
                receiver,
                args: args.clone(),
            });
            (receiver, body)
        };

        body(self, receiver, args)
    }

    fn package_version(&self, package: &str) -> AbiResult<Option<String>> {
        let _call = self.enter();
        Ok(self.arena.lock().versions.get(package).cloned())
    }
}

impl fmt::Debug for MockRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.lock();
        f.debug_struct("MockRuntime")
            .field("entries", &arena.entries.len())
            .field("handles", &arena.handles.len())
            .field("invocations", &arena.invocations.len())
            .finish()
    }
}
