//! Proxy commands onto the external runtime

use super::runtime::RuntimeCommandId;
use super::RuntimeHandle;
use crate::args::{ArgFlags, Scriptable};
use crate::command::{Command, CommandCore, MergeDecision};
use crate::errors::{CommandError, ExError, Result};
use crate::manager::CommandManager;

/// Local stand-in for a command instance owned by the runtime
///
/// Every capability is answered by the runtime. A proxy built for a
/// command the runtime already executed skips its first `do_it`.
pub struct BridgedCommand {
    core: CommandCore,
    runtime: RuntimeHandle,
    id: RuntimeCommandId,
    scriptable: bool,
    already_executed: bool,
}

impl BridgedCommand {
    /// Create a fresh runtime command named `name`
    ///
    /// # Errors
    ///
    /// Fails if the runtime cannot create it.
    pub fn create(runtime: &RuntimeHandle, name: &str) -> Result<Self> {
        let id = runtime.borrow_mut().create_command(name)?;
        let mut cmd = Self::wrap(runtime, id);
        cmd.core.set_name(name);
        Ok(cmd)
    }

    /// Wrap a command the runtime has already executed
    ///
    /// # Errors
    ///
    /// Fails if the runtime does not know `id`.
    pub fn executed(runtime: &RuntimeHandle, id: RuntimeCommandId) -> Result<Self> {
        let (name, merge_id) = {
            let rt = runtime.borrow();
            (rt.command_name(id)?, rt.merge_id(id)?)
        };
        let mut cmd = Self::wrap(runtime, id);
        cmd.core.set_name(name);
        cmd.core.set_merge_id(merge_id);
        cmd.already_executed = true;
        Ok(cmd)
    }

    fn wrap(runtime: &RuntimeHandle, id: RuntimeCommandId) -> Self {
        let scriptable = runtime.borrow().is_scriptable(id);
        Self {
            core: CommandCore::new(),
            runtime: runtime.clone(),
            id,
            scriptable,
            already_executed: false,
        }
    }

    pub fn runtime_id(&self) -> RuntimeCommandId {
        self.id
    }

    pub fn is_already_executed(&self) -> bool {
        self.already_executed
    }
}

impl Drop for BridgedCommand {
    fn drop(&mut self) {
        if let Ok(mut runtime) = self.runtime.try_borrow_mut() {
            runtime.release_command(self.id);
        }
    }
}

impl Command for BridgedCommand {
    fn core(&self) -> &CommandCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }

    fn do_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        if self.already_executed {
            self.already_executed = false;
            return Ok(true);
        }
        self.runtime.borrow_mut().do_command(self.id)
    }

    fn undo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        self.runtime.borrow_mut().undo_command(self.id)
    }

    fn redo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        self.runtime.borrow_mut().redo_command(self.id)
    }

    fn can_undo(&self) -> bool {
        self.runtime.borrow().can_undo(self.id)
    }

    fn can_log(&self) -> bool {
        !self.core.is_log_blocked() && self.runtime.borrow().can_log(self.id)
    }

    fn set_merge_id(&mut self, id: i32) {
        self.core.set_merge_id(id);
        if let Err(e) = self.runtime.borrow_mut().set_merge_id(self.id, id) {
            tracing::warn!(cmd_name = self.core.name(), err_code = e.code(), "merge id not forwarded");
        }
    }

    fn help(&self) -> String {
        self.runtime.borrow().help(self.id)
    }

    fn history_description(&self) -> String {
        self.runtime.borrow().history_description(self.id)
    }

    fn can_merge_with(&self, previous: &dyn Command) -> MergeDecision {
        let Some(previous_bridged) = previous.as_bridged() else {
            return MergeDecision::REJECT;
        };
        if !self.core.can_merge_with(previous.core()) {
            return MergeDecision::REJECT;
        }
        self.runtime.borrow().can_merge(self.id, previous_bridged.id)
    }

    fn merge_with(&mut self, previous: &dyn Command) -> Result<()> {
        let previous_id = previous.as_bridged().map(|p| p.id).ok_or_else(|| {
            ExError::from(CommandError::ExternalRuntime {
                op: "merge".to_string(),
                message: format!("command '{}' is not bridged", previous.name()),
            })
        })?;
        self.runtime.borrow_mut().merge(self.id, previous_id)
    }

    fn as_scriptable(&self) -> Option<&dyn Scriptable> {
        if self.scriptable {
            Some(self)
        } else {
            None
        }
    }

    fn as_scriptable_mut(&mut self) -> Option<&mut dyn Scriptable> {
        if self.scriptable {
            Some(self)
        } else {
            None
        }
    }

    fn as_bridged(&self) -> Option<&BridgedCommand> {
        Some(self)
    }
}

/// Arguments of scriptable runtime commands stay in the runtime
impl Scriptable for BridgedCommand {
    fn bind_command_name(&mut self, _name: &str) {}

    fn declare_arg(&mut self, key: &str, flags: ArgFlags, default: &str) -> Result<()> {
        self.runtime
            .borrow_mut()
            .declare_arg(self.id, key, flags, default)
    }

    fn has_arg(&self, key: &str) -> bool {
        self.runtime
            .borrow()
            .arg_keys(self.id)
            .iter()
            .any(|k| k == key)
    }

    fn has_arg_flag(&self, key: &str, flag: ArgFlags) -> Result<bool> {
        Ok(self.runtime.borrow().arg_flags(self.id, key)?.intersects(flag))
    }

    fn arg_keys(&self) -> Vec<String> {
        self.runtime.borrow().arg_keys(self.id)
    }

    fn is_arg_set(&self, key: &str) -> bool {
        self.runtime.borrow().is_arg_set(self.id, key)
    }

    fn get_arg(&self, key: &str) -> Result<String> {
        self.runtime.borrow().get_arg(self.id, key)
    }

    fn set_arg(&mut self, key: &str, value: &str) -> Result<()> {
        self.runtime.borrow_mut().set_arg(self.id, key, value)
    }

    fn validate_set_args(&self) -> Result<()> {
        self.runtime.borrow().validate_args(self.id)
    }

    fn args_description(&self) -> String {
        self.runtime.borrow().args_description(self.id)
    }

    fn arg_type_specs(&self, key: &str) -> String {
        self.runtime.borrow().arg_type_specs(self.id, key)
    }
}
