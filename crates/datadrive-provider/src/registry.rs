use std::any::Any;

use datadrive_resource::TypeDescriptor;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;

/// Name → type lookup used when resources are declared in a manifest.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`, replacing any earlier registration.
    pub fn register<T>(&mut self, name: impl Into<String>) -> &mut Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        self.types.insert(name.into(), TypeDescriptor::of::<T>());
        self
    }

    /// Register `T` under its bare type name (`OrderRecord`).
    pub fn register_short<T>(&mut self) -> &mut Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let descriptor = TypeDescriptor::of::<T>();
        self.types
            .insert(descriptor.short_name(), descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<TypeDescriptor> {
        self.types.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
