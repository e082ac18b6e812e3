//! Contract the external runtime implements

use crate::args::ArgFlags;
use crate::command::MergeDecision;
use crate::errors::{CommandError, Result};
use crate::value::PathValue;
use std::collections::BTreeMap;

/// Opaque id of a command instance living in the runtime
pub type RuntimeCommandId = u64;

/// Host command the runtime asked for but cannot run itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppCommandRequest {
    pub name: String,
    pub merge_id: i32,
    pub log_blocked: bool,
    pub args: BTreeMap<String, PathValue>,
}

/// Entry of the runtime's pending stack
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEntry {
    /// To be created and executed by the host
    AppCommand(AppCommandRequest),
    /// Already executed inside the runtime
    Executed(RuntimeCommandId),
}

fn not_scriptable(op: &str) -> crate::errors::ExError {
    CommandError::ExternalRuntime {
        op: op.to_string(),
        message: "runtime command does not take arguments".to_string(),
    }
    .into()
}

/// A second command system the manager stays synchronized with
///
/// Argument methods have defaults for runtimes without scriptable
/// commands.
pub trait ExternalRuntime {
    // ===== Registry =====

    fn command_names(&self) -> Vec<String>;

    fn is_command_registered(&self, name: &str) -> bool;

    /// # Errors
    ///
    /// Fails if `name` is unknown to the runtime.
    fn command_type(&self, name: &str) -> Result<String>;

    /// Make a host command callable from the runtime
    ///
    /// # Errors
    ///
    /// Runtime-specific.
    fn register_app_command(&mut self, name: &str) -> Result<()>;

    /// Register a command of a runtime type under `name`
    ///
    /// # Errors
    ///
    /// Runtime-specific.
    fn register_command(&mut self, name: &str, command_type: &str) -> Result<()>;

    /// # Errors
    ///
    /// Fails if `name` is unknown to the runtime.
    fn create_command(&mut self, name: &str) -> Result<RuntimeCommandId>;

    /// The host dropped its last reference to `id`
    fn release_command(&mut self, _id: RuntimeCommandId) {}

    // ===== Command instances =====

    /// # Errors
    ///
    /// Fails for unknown ids.
    fn command_name(&self, id: RuntimeCommandId) -> Result<String>;

    /// # Errors
    ///
    /// Fails for unknown ids.
    fn merge_id(&self, id: RuntimeCommandId) -> Result<i32>;

    /// # Errors
    ///
    /// Fails for unknown ids.
    fn set_merge_id(&mut self, id: RuntimeCommandId, merge_id: i32) -> Result<()>;

    fn can_undo(&self, id: RuntimeCommandId) -> bool;

    fn can_log(&self, id: RuntimeCommandId) -> bool;

    fn help(&self, _id: RuntimeCommandId) -> String {
        String::new()
    }

    fn history_description(&self, id: RuntimeCommandId) -> String;

    /// # Errors
    ///
    /// Runtime-specific.
    fn do_command(&mut self, id: RuntimeCommandId) -> Result<bool>;

    /// Undo `id`, the newest command of the runtime's own undo stack
    ///
    /// # Errors
    ///
    /// Runtime-specific.
    fn undo_command(&mut self, id: RuntimeCommandId) -> Result<bool>;

    /// # Errors
    ///
    /// Runtime-specific.
    fn redo_command(&mut self, id: RuntimeCommandId) -> Result<bool>;

    fn can_merge(&self, id: RuntimeCommandId, previous: RuntimeCommandId) -> MergeDecision;

    /// # Errors
    ///
    /// Runtime-specific.
    fn merge(&mut self, id: RuntimeCommandId, previous: RuntimeCommandId) -> Result<()>;

    // ===== Scriptable instances =====

    fn is_scriptable(&self, _id: RuntimeCommandId) -> bool {
        false
    }

    /// # Errors
    ///
    /// Fails if the command takes no arguments or rejects the declaration.
    fn declare_arg(
        &mut self,
        _id: RuntimeCommandId,
        _key: &str,
        _flags: ArgFlags,
        _default: &str,
    ) -> Result<()> {
        Err(not_scriptable("declare_arg"))
    }

    fn arg_keys(&self, _id: RuntimeCommandId) -> Vec<String> {
        Vec::new()
    }

    /// # Errors
    ///
    /// Fails for undeclared keys.
    fn arg_flags(&self, _id: RuntimeCommandId, _key: &str) -> Result<ArgFlags> {
        Err(not_scriptable("arg_flags"))
    }

    fn is_arg_set(&self, _id: RuntimeCommandId, _key: &str) -> bool {
        false
    }

    /// # Errors
    ///
    /// Fails for undeclared keys.
    fn get_arg(&self, _id: RuntimeCommandId, _key: &str) -> Result<String> {
        Err(not_scriptable("get_arg"))
    }

    /// # Errors
    ///
    /// Fails for undeclared keys or rejected values.
    fn set_arg(&mut self, _id: RuntimeCommandId, _key: &str, _value: &str) -> Result<()> {
        Err(not_scriptable("set_arg"))
    }

    /// # Errors
    ///
    /// Fails if a mandatory argument is unset.
    fn validate_args(&self, _id: RuntimeCommandId) -> Result<()> {
        Ok(())
    }

    fn args_description(&self, _id: RuntimeCommandId) -> String {
        String::new()
    }

    fn arg_type_specs(&self, _id: RuntimeCommandId, _key: &str) -> String {
        String::new()
    }

    // ===== Manager =====

    /// Commands queued for the host since the last synchronization
    fn app_stack(&self) -> Vec<PendingEntry>;

    /// # Errors
    ///
    /// Runtime-specific.
    fn clear_app_stack(&mut self) -> Result<()>;

    fn merge_id_counter(&self) -> i32;

    /// # Errors
    ///
    /// Runtime-specific.
    fn set_merge_id_counter(&mut self, value: i32) -> Result<()>;

    /// # Errors
    ///
    /// Runtime-specific.
    fn clear(&mut self) -> Result<()>;

    /// # Errors
    ///
    /// Runtime-specific.
    fn clear_redo_stack(&mut self) -> Result<()>;

    fn content(&self) -> String;
}
