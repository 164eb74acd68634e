use std::any::Any;
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;

use crate::descriptor::TypeDescriptor;
use crate::error::ResourceError;

/// A location expression inside a structured document.
///
/// The only guarantee made here is that the expression is non-empty; its
/// syntax is checked by whichever provider evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Selector(String);

impl Selector {
    pub fn new(expression: impl Into<String>) -> Result<Self, ResourceError> {
        let expression = expression.into();
        if expression.trim().is_empty() {
            return Err(ResourceError::invalid(
                "selector",
                "selector expression must not be empty",
            ));
        }
        Ok(Self(expression))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Selector {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Selector {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Selector {
    type Error = ResourceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Selector {
    type Error = ResourceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Selector → target type map for documents that yield several typed values.
///
/// Keys are unique; inserting an existing selector replaces its type. Equality
/// ignores insertion order, and iteration is in selector order so providers
/// produce argument tuples deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedBindingMap {
    entries: BTreeMap<Selector, TypeDescriptor>,
}

impl TypedBindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk assignment from `(selector, type)` pairs. The first empty selector
    /// aborts the whole assignment.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ResourceError>
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (selector, target) in entries {
            map.insert(selector, target)?;
        }
        Ok(map)
    }

    /// Register `target` under `selector`, returning the type it replaced.
    pub fn insert(
        &mut self,
        selector: impl Into<String>,
        target: TypeDescriptor,
    ) -> Result<Option<TypeDescriptor>, ResourceError> {
        let selector = Selector::new(selector)?;
        Ok(self.entries.insert(selector, target))
    }

    /// Chaining form of [`insert`](Self::insert) for a concrete type.
    pub fn bind<T>(mut self, selector: impl Into<String>) -> Result<Self, ResourceError>
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        self.insert(selector, TypeDescriptor::of::<T>())?;
        Ok(self)
    }

    /// Exact-match lookup. No prefix or fuzzy matching.
    pub fn get(&self, selector: &str) -> Result<&TypeDescriptor, ResourceError> {
        self.entries
            .get(selector)
            .ok_or_else(|| ResourceError::NotFound {
                selector: selector.to_string(),
            })
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.entries.contains_key(selector)
    }

    /// The full mapping, or `None` when nothing is bound. An empty map and a
    /// map that was never configured are indistinguishable to callers.
    pub fn entries(&self) -> Option<&BTreeMap<Selector, TypeDescriptor>> {
        if self.entries.is_empty() {
            None
        } else {
            Some(&self.entries)
        }
    }

    pub fn into_option(self) -> Option<Self> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Selector, &TypeDescriptor)> + '_ {
        self.entries.iter()
    }

    pub fn selectors(&self) -> impl Iterator<Item = &Selector> + '_ {
        self.entries.keys()
    }
}

impl TryFrom<HashMap<String, TypeDescriptor>> for TypedBindingMap {
    type Error = ResourceError;

    fn try_from(value: HashMap<String, TypeDescriptor>) -> Result<Self, Self::Error> {
        Self::from_entries(value)
    }
}

impl<'a> IntoIterator for &'a TypedBindingMap {
    type Item = (&'a Selector, &'a TypeDescriptor);
    type IntoIter = std::collections::btree_map::Iter<'a, Selector, TypeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
