//! Path-value resolvers
//!
//! A resolver owns part of an external address space and can read and
//! write typed values at paths within it. The registry dispatches every
//! request to the first registered resolver that knows the path, so
//! registration order decides which resolver wins when several overlap.

use crate::errors::{CommandError, Result};
use crate::value::{PathValue, Value, ValueType};
use std::collections::BTreeMap;

/// Plugin that fetches and stores values addressed by path
pub trait PathValueResolver {
    fn known_path(&self, value: &PathValue) -> bool;

    /// # Errors
    ///
    /// Fails if the path cannot be resolved.
    fn get_type(&self, value: &PathValue) -> Result<ValueType>;

    /// Fill `value.value` with the data stored at `value.path`
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be resolved.
    fn get_value(&self, value: &mut PathValue) -> Result<()>;

    /// Store `value.value` at `value.path`
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be resolved or the value is rejected.
    fn set_value(&mut self, value: &PathValue) -> Result<()>;

    /// Called after registration with the registered name
    fn registration_callback(&mut self, _name: &str) {}

    /// Called once the resolver has been detached from the registry
    fn finalize(&mut self) {}
}

/// Ordered set of named resolvers
#[derive(Default)]
pub struct ResolverRegistry {
    entries: Vec<(String, Box<dyn PathValueResolver>)>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` under `name`
    ///
    /// Re-registering a name swaps the resolver in place, keeping its
    /// position in the dispatch order; the replaced resolver is finalized.
    pub fn register_resolver(&mut self, name: &str, mut resolver: Box<dyn PathValueResolver>) {
        resolver.registration_callback(name);
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => {
                let mut old = std::mem::replace(&mut entry.1, resolver);
                old.finalize();
                tracing::debug!(resolver = name, "resolver replaced");
            }
            None => {
                self.entries.push((name.to_string(), resolver));
                tracing::debug!(resolver = name, "resolver registered");
            }
        }
    }

    /// Detach and finalize the resolver registered under `name`
    ///
    /// Returns false if no such resolver exists.
    pub fn unregister_resolver(&mut self, name: &str) -> bool {
        let Some(index) = self.entries.iter().position(|(n, _)| n == name) else {
            return false;
        };
        // Detach before finalizing so a finalizer never sees itself registered.
        let (_, mut resolver) = self.entries.remove(index);
        resolver.finalize();
        tracing::debug!(resolver = name, "resolver unregistered");
        true
    }

    /// Detach every resolver, then finalize them in registration order
    pub fn clear(&mut self) {
        let detached = std::mem::take(&mut self.entries);
        for (_, mut resolver) in detached {
            resolver.finalize();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_resolver(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Registered names in dispatch order
    pub fn resolver_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn resolver(&self, name: &str) -> Option<&dyn PathValueResolver> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.as_ref())
    }

    pub fn resolver_mut(&mut self, name: &str) -> Option<&mut (dyn PathValueResolver + 'static)> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r.as_mut())
    }

    fn position_for(&self, value: &PathValue) -> Option<usize> {
        self.entries.iter().position(|(_, r)| r.known_path(value))
    }

    /// First resolver, in registration order, that knows the path
    pub fn resolver_for(&self, value: &PathValue) -> Option<&dyn PathValueResolver> {
        self.position_for(value).map(|i| self.entries[i].1.as_ref())
    }

    /// Name of the resolver that would handle `value`
    pub fn resolver_name(&self, value: &PathValue) -> Option<&str> {
        self.position_for(value).map(|i| self.entries[i].0.as_str())
    }

    pub fn known_path(&self, value: &PathValue) -> bool {
        self.position_for(value).is_some()
    }

    /// # Errors
    ///
    /// Fails with `PathUnresolvable` if no resolver knows the path.
    pub fn get_type(&self, value: &PathValue) -> Result<ValueType> {
        self.resolver_for(value)
            .ok_or_else(|| unknown_path(value))?
            .get_type(value)
    }

    /// # Errors
    ///
    /// Fails with `PathUnresolvable` if no resolver knows the path.
    pub fn get_value(&self, value: &mut PathValue) -> Result<()> {
        let index = self.position_for(value).ok_or_else(|| unknown_path(value))?;
        self.entries[index].1.get_value(value)
    }

    /// # Errors
    ///
    /// Fails with `PathUnresolvable` if no resolver knows the path.
    pub fn set_value(&mut self, value: &PathValue) -> Result<()> {
        let index = self.position_for(value).ok_or_else(|| unknown_path(value))?;
        self.entries[index].1.set_value(value)
    }

    /// Convenience read of the value stored at `path`
    ///
    /// # Errors
    ///
    /// Fails with `PathUnresolvable` if no resolver knows the path.
    pub fn value_at(&self, path: &str) -> Result<Option<Value>> {
        let mut pv = PathValue::at(path);
        self.get_value(&mut pv)?;
        Ok(pv.value)
    }
}

fn unknown_path(value: &PathValue) -> crate::errors::ExError {
    CommandError::UnknownPath {
        path: value.path.clone(),
    }
    .into()
}

/// Resolver backed by an in-memory map
///
/// Knows exactly the paths it holds a value for, optionally restricted to
/// a `prefix.` namespace.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    prefix: Option<String>,
    values: BTreeMap<String, Value>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only answer for paths starting with `prefix.`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(path.into(), value.into());
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    fn in_namespace(&self, path: &str) -> bool {
        match &self.prefix {
            Some(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
            None => true,
        }
    }

    fn stored(&self, value: &PathValue) -> Result<&Value> {
        self.values
            .get(&value.path)
            .filter(|_| self.in_namespace(&value.path))
            .ok_or_else(|| unknown_path(value))
    }
}

impl PathValueResolver for MemoryResolver {
    fn known_path(&self, value: &PathValue) -> bool {
        self.in_namespace(&value.path) && self.values.contains_key(&value.path)
    }

    fn get_type(&self, value: &PathValue) -> Result<ValueType> {
        Ok(self.stored(value)?.value_type())
    }

    fn get_value(&self, value: &mut PathValue) -> Result<()> {
        value.value = Some(self.stored(value)?.clone());
        Ok(())
    }

    fn set_value(&mut self, value: &PathValue) -> Result<()> {
        self.stored(value)?;
        if let Some(v) = &value.value {
            self.values.insert(value.path.clone(), v.clone());
        }
        Ok(())
    }
}
