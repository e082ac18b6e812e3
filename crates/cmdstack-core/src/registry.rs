//! Command registry
//!
//! Maps command names to factories. Every record remembers the declared
//! command type and whether the command runs natively or is proxied onto
//! an external runtime.

use crate::command::Command;
use crate::errors::{CommandError, Result};
use std::fmt;

/// Where a registered command is implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImplementationKind {
    Native,
    Bridged,
}

impl ImplementationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImplementationKind::Native => "Native",
            ImplementationKind::Bridged => "Bridged",
        }
    }
}

impl fmt::Display for ImplementationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type and implementation kind of a registered command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command_type: String,
    pub kind: ImplementationKind,
}

/// Builds a fresh, unnamed command instance
pub type CommandFactory = Box<dyn Fn() -> Result<Box<dyn Command>>>;

/// Observer of successful registrations
pub trait RegistryListener {
    /// # Errors
    ///
    /// An error aborts the registration call that triggered it; the record
    /// itself stays registered.
    fn registration_done(
        &self,
        name: &str,
        command_type: &str,
        kind: ImplementationKind,
    ) -> Result<()>;
}

struct Record {
    name: String,
    spec: CommandSpec,
    factory: CommandFactory,
}

#[derive(Default)]
pub struct CommandRegistry {
    records: Vec<Record>,
    listeners: Vec<Box<dyn RegistryListener>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn RegistryListener>) {
        self.listeners.push(listener);
    }

    /// Register a native command factory
    ///
    /// The first registration of a name wins; later ones return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Fails if a registration listener fails.
    pub fn register_factory<F>(&mut self, name: &str, command_type: &str, factory: F) -> Result<bool>
    where
        F: Fn() -> Result<Box<dyn Command>> + 'static,
    {
        self.register(name, command_type, ImplementationKind::Native, Box::new(factory))
    }

    /// Register a native command built by `Default`
    ///
    /// The declared type is the command's type name.
    ///
    /// # Errors
    ///
    /// Fails if a registration listener fails.
    pub fn register_command<C>(&mut self, name: &str) -> Result<bool>
    where
        C: Command + Default + 'static,
    {
        let full = std::any::type_name::<C>();
        let short = full.rsplit("::").next().unwrap_or(full);
        self.register_factory(name, short, || Ok(Box::new(C::default())))
    }

    /// Register a command implemented by an external runtime
    ///
    /// # Errors
    ///
    /// Fails if a registration listener fails.
    pub fn register_bridged<F>(&mut self, name: &str, command_type: &str, factory: F) -> Result<bool>
    where
        F: Fn() -> Result<Box<dyn Command>> + 'static,
    {
        self.register(name, command_type, ImplementationKind::Bridged, Box::new(factory))
    }

    fn register(
        &mut self,
        name: &str,
        command_type: &str,
        kind: ImplementationKind,
        factory: CommandFactory,
    ) -> Result<bool> {
        if self.is_command_registered(name) {
            tracing::debug!(cmd_name = name, "command already registered, keeping first");
            return Ok(false);
        }
        self.records.push(Record {
            name: name.to_string(),
            spec: CommandSpec {
                command_type: command_type.to_string(),
                kind,
            },
            factory,
        });
        tracing::debug!(cmd_name = name, command_type, kind = kind.as_str(), "command registered");
        for listener in &self.listeners {
            listener.registration_done(name, command_type, kind)?;
        }
        Ok(true)
    }

    /// Build a new instance of the command registered as `name`
    ///
    /// # Errors
    ///
    /// Fails with `NotRegistered` for unknown names, or with whatever the
    /// factory reports.
    pub fn create_command(&self, name: &str) -> Result<Box<dyn Command>> {
        let record = self
            .records
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| CommandError::NotRegistered {
                name: name.to_string(),
            })?;
        let mut cmd = (record.factory)()?;
        cmd.registration_callback(name);
        Ok(cmd)
    }

    pub fn is_command_registered(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    /// Registered names in registration order
    pub fn command_names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    pub fn command_specs(&self, name: &str) -> Option<&CommandSpec> {
        self.records.iter().find(|r| r.name == name).map(|r| &r.spec)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record; listeners stay attached
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn content(&self) -> String {
        let mut res = String::from("--> CommandRegistry:\n");
        for record in &self.records {
            res.push_str(&format!(
                "[{}] type:{}, implType:{}\n",
                record.name, record.spec.command_type, record.spec.kind
            ));
        }
        res
    }
}
