//! Built-in `setPathValue` command
//!
//! Writes a new value to whatever the `target` path addresses. The target
//! is an IO argument, so the manager reads its current value before each
//! step and writes the argument back afterwards; the command itself only
//! swaps argument values.

use crate::args::{ArgFlags, Scriptable};
use crate::command::{Command, CommandCore};
use crate::errors::{CommandError, ExError, ExErrorKind, Result};
use crate::helpers::{create_help_from_rtval_args, create_history_desc_from_args};
use crate::manager::CommandManager;
use crate::registry::CommandRegistry;
use crate::rtval_args::{RtvalArgTable, RtvalScriptable};
use crate::value::{Value, ValueType};
use std::collections::BTreeMap;

pub const SET_PATH_VALUE: &str = "setPathValue";

const TARGET: &str = "target";
const NEW_VALUE: &str = "newValue";

#[derive(Debug, Clone)]
pub struct SetPathValueCommand {
    core: CommandCore,
    args: RtvalArgTable,
    previous: Option<Value>,
}

impl SetPathValueCommand {
    /// # Errors
    ///
    /// Fails only if the argument table rejects the declarations.
    pub fn new() -> Result<Self> {
        let mut args = RtvalArgTable::new();
        // Both types are unknown until the target is resolved.
        args.declare_rtval_arg(TARGET, ValueType::Any, ArgFlags::IO, None)?;
        args.declare_rtval_arg(NEW_VALUE, ValueType::Any, ArgFlags::IN, None)?;
        Ok(Self {
            core: CommandCore::new(),
            args,
            previous: None,
        })
    }

    /// Target value saved by the first execution
    pub fn previous_value(&self) -> Option<&Value> {
        self.previous.as_ref()
    }
}

impl Command for SetPathValueCommand {
    fn core(&self) -> &CommandCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }

    fn do_it(&mut self, manager: &mut CommandManager) -> Result<bool> {
        let current = self.args.rtval_arg_value(TARGET)?.ok_or_else(|| {
            ExError::from(CommandError::ArgNotSet {
                command: self.name().to_string(),
                key: TARGET.to_string(),
            })
        })?;
        self.previous = Some(current);
        self.redo_it(manager)
    }

    fn undo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        let Some(previous) = self.previous.clone() else {
            return Ok(false);
        };
        self.args.set_rtval_arg_value(TARGET, previous)?;
        Ok(true)
    }

    fn redo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        let ty = self.args.rtval_arg_type(TARGET)?;
        let value = self.args.rtval_arg_value_as(NEW_VALUE, ty)?;
        self.args.set_rtval_arg_value(TARGET, value)?;
        Ok(true)
    }

    fn can_undo(&self) -> bool {
        true
    }

    fn help(&self) -> String {
        let mut docs = BTreeMap::new();
        docs.insert(TARGET.to_string(), "Path of the target".to_string());
        docs.insert(NEW_VALUE.to_string(), "New value".to_string());
        create_help_from_rtval_args(self, "Sets the value of a PathValue arg", &docs)
            .unwrap_or_default()
    }

    fn history_description(&self) -> String {
        let mut desc = BTreeMap::new();
        desc.insert(
            TARGET.to_string(),
            self.args.rtval_arg_path(TARGET).unwrap_or_default(),
        );
        create_history_desc_from_args(self, &desc).unwrap_or_else(|_| self.name().to_string())
    }

    /// Take over the value the previous command saved, so one undo restores
    /// the state from before the first merged command.
    fn merge_with(&mut self, previous: &dyn Command) -> Result<()> {
        let Some(saved) = previous.merge_state() else {
            return Err(ExError::new(ExErrorKind::ValidationFailed)
                .with_op("merge")
                .with_command(self.name())
                .with_message(format!(
                    "command '{}' is not a {} command",
                    previous.name(),
                    SET_PATH_VALUE
                )));
        };
        self.previous = Some(saved);
        Ok(())
    }

    fn merge_state(&self) -> Option<Value> {
        self.previous.clone()
    }

    fn as_scriptable(&self) -> Option<&dyn Scriptable> {
        Some(&self.args)
    }

    fn as_scriptable_mut(&mut self) -> Option<&mut dyn Scriptable> {
        Some(&mut self.args)
    }

    fn as_rtval_scriptable(&self) -> Option<&dyn RtvalScriptable> {
        Some(&self.args)
    }

    fn as_rtval_scriptable_mut(&mut self) -> Option<&mut dyn RtvalScriptable> {
        Some(&mut self.args)
    }
}

/// Register the commands every manager ships with
///
/// # Errors
///
/// Fails if a registration listener fails.
pub fn register_builtin_commands(registry: &mut CommandRegistry) -> Result<()> {
    registry.register_factory(SET_PATH_VALUE, "SetPathValueCommand", || {
        Ok(Box::new(SetPathValueCommand::new()?))
    })?;
    Ok(())
}
