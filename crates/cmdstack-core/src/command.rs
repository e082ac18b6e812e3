//! Command capability contract
//!
//! A command is a named unit of work created by the registry and executed
//! by the manager. Optional capabilities (arguments, typed arguments,
//! external-runtime proxying) are exposed through accessor methods that
//! return `None` by default, so callers never inspect concrete types.

use crate::args::Scriptable;
use crate::bridge::BridgedCommand;
use crate::errors::Result;
use crate::manager::CommandManager;
use crate::rtval_args::RtvalScriptable;
use crate::value::Value;

/// Merge id that never merges, not even with itself
pub const NO_MERGE_ID: i32 = -1;

/// State shared by every command implementation
#[derive(Debug, Clone)]
pub struct CommandCore {
    name: String,
    merge_id: i32,
    log_blocked: bool,
}

impl Default for CommandCore {
    fn default() -> Self {
        Self {
            name: String::new(),
            merge_id: NO_MERGE_ID,
            log_blocked: false,
        }
    }
}

impl CommandCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn merge_id(&self) -> i32 {
        self.merge_id
    }

    pub fn set_merge_id(&mut self, id: i32) {
        self.merge_id = id;
    }

    pub fn is_log_blocked(&self) -> bool {
        self.log_blocked
    }

    pub fn block_log(&mut self) {
        self.log_blocked = true;
    }

    /// Base merge rule: same name, same merge id, and not the sentinel
    pub fn can_merge_with(&self, previous: &CommandCore) -> bool {
        self.merge_id > NO_MERGE_ID
            && self.name == previous.name
            && self.merge_id == previous.merge_id
    }
}

/// Outcome of a merge check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeDecision {
    pub can_merge: bool,
    /// Merge first, then undo the previous command before doing this one.
    /// Otherwise this command runs first and merges afterwards.
    pub undo_previous_first: bool,
}

impl MergeDecision {
    pub const REJECT: MergeDecision = MergeDecision {
        can_merge: false,
        undo_previous_first: false,
    };

    pub fn merge_after_do() -> Self {
        Self {
            can_merge: true,
            undo_previous_first: false,
        }
    }

    pub fn merge_and_undo_previous() -> Self {
        Self {
            can_merge: true,
            undo_previous_first: true,
        }
    }
}

/// The command contract
///
/// `do_it`, `undo_it` and `redo_it` report failure either by returning
/// `Ok(false)` or an error; the manager compensates in both cases. They
/// receive the manager so a command can create and execute sub-commands.
pub trait Command {
    fn core(&self) -> &CommandCore;

    fn core_mut(&mut self) -> &mut CommandCore;

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Any error is treated as an execution failure.
    fn do_it(&mut self, manager: &mut CommandManager) -> Result<bool>;

    /// # Errors
    ///
    /// Any error is treated as an execution failure.
    fn undo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        Ok(false)
    }

    /// # Errors
    ///
    /// Any error is treated as an execution failure.
    fn redo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        Ok(false)
    }

    fn can_undo(&self) -> bool {
        false
    }

    fn can_log(&self) -> bool {
        self.can_undo() && !self.is_log_blocked()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn merge_id(&self) -> i32 {
        self.core().merge_id()
    }

    fn set_merge_id(&mut self, id: i32) {
        self.core_mut().set_merge_id(id);
    }

    fn is_log_blocked(&self) -> bool {
        self.core().is_log_blocked()
    }

    fn block_log(&mut self) {
        self.core_mut().block_log();
    }

    /// Called by the registry right after creation with the registered name
    fn registration_callback(&mut self, name: &str) {
        self.core_mut().set_name(name);
        if let Some(args) = self.as_scriptable_mut() {
            args.bind_command_name(name);
        }
    }

    fn help(&self) -> String {
        String::new()
    }

    fn history_description(&self) -> String {
        self.name().to_string()
    }

    /// Decide whether this command merges into `previous`
    ///
    /// Overrides should start from `CommandCore::can_merge_with`.
    fn can_merge_with(&self, previous: &dyn Command) -> MergeDecision {
        if self.core().can_merge_with(previous.core()) {
            MergeDecision::merge_after_do()
        } else {
            MergeDecision::REJECT
        }
    }

    /// Absorb `previous`, which is about to be replaced by this command
    ///
    /// # Errors
    ///
    /// Implementations may fail if the previous command is incompatible.
    fn merge_with(&mut self, _previous: &dyn Command) -> Result<()> {
        Ok(())
    }

    /// State a merging successor needs to take over to undo both commands
    fn merge_state(&self) -> Option<Value> {
        None
    }

    fn as_scriptable(&self) -> Option<&dyn Scriptable> {
        None
    }

    fn as_scriptable_mut(&mut self) -> Option<&mut dyn Scriptable> {
        None
    }

    fn as_rtval_scriptable(&self) -> Option<&dyn RtvalScriptable> {
        None
    }

    fn as_rtval_scriptable_mut(&mut self) -> Option<&mut dyn RtvalScriptable> {
        None
    }

    /// Proxy onto an external-runtime command
    fn as_bridged(&self) -> Option<&BridgedCommand> {
        None
    }
}
