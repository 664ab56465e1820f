use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::value::Value;
use crate::SandboxedVm;

pub type NameAndDescriptor = (String, String);

/// A native method body. The receiver is [`Value::Null`] for static
/// calls. Returning `Ok(None)` means a `void` method.
pub type NativeMethod = fn(&mut SandboxedVm, Value, Vec<Value>) -> Result<Option<Value>>;

/// The only gate between sandboxed code and the outside world. Anything
/// the bytecode touches by name goes through here, and an unregistered
/// name is a hard fault rather than a fallback.
pub trait ClassResolver {
    fn resolve(&self, class_name: &str) -> Option<Arc<dyn ClassImplementation>>;
}

pub trait ClassImplementation: Send + Sync {
    fn name(&self) -> &str;

    fn static_field(&self, name: &str, descriptor: &str) -> Option<Value>;

    fn method(&self, name: &str, descriptor: &str) -> Option<NativeMethod>;
}

/// A class built out of registered fields and function pointers.
pub struct NativeClass {
    name: String,
    static_fields: HashMap<String, Value>,
    methods: HashMap<NameAndDescriptor, NativeMethod>,
}

impl NativeClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            static_fields: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    pub fn static_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.static_fields.insert(name.into(), value);
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        method: NativeMethod,
    ) -> Self {
        self.methods.insert((name.into(), descriptor.into()), method);
        self
    }
}

impl ClassImplementation for NativeClass {
    fn name(&self) -> &str {
        &self.name
    }

    // Fields are registered by name alone; the descriptor rides along
    // for implementations that want to discriminate on it.
    fn static_field(&self, name: &str, _descriptor: &str) -> Option<Value> {
        self.static_fields.get(name).cloned()
    }

    fn method(&self, name: &str, descriptor: &str) -> Option<NativeMethod> {
        self.methods
            .get(&(name.to_string(), descriptor.to_string()))
            .copied()
    }
}

/// A plain map-backed resolver.
#[derive(Default)]
pub struct SandboxResolver {
    classes: HashMap<String, Arc<NativeClass>>,
}

impl SandboxResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: NativeClass) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }
}

impl ClassResolver for SandboxResolver {
    fn resolve(&self, class_name: &str) -> Option<Arc<dyn ClassImplementation>> {
        self.classes
            .get(class_name)
            .cloned()
            .map(|class| class as Arc<dyn ClassImplementation>)
    }
}
