//! Manager notifications
//!
//! Listeners are attached to a `CommandManager` and receive every stack
//! change as a `ManagerEvent`. `ScriptHistory` is the stock listener used
//! by scripting front-ends to keep a flat, replayable command log.

use crate::command::Command;

/// A change of the manager's stacks
pub enum ManagerEvent<'a> {
    /// An undoable command entered the undo stack, as a new entry or as a
    /// sub-command of the pending entry.
    CommandPushed { command: &'a dyn Command, is_low: bool },
    /// A top-level command finished executing.
    CommandDone { command: &'a dyn Command, can_undo: bool },
    /// The redo stack was dropped; `total_undo_count` counts the commands
    /// still undoable at that point.
    RedoCleared { total_undo_count: usize },
    /// A pending entry was dropped after its command failed;
    /// `total_undo_count` counts the commands left on the undo stack.
    Unwound { total_undo_count: usize },
    Cleared,
}

pub trait ManagerListener {
    fn on_event(&mut self, event: &ManagerEvent<'_>);
}

/// Flat history of pushed commands plus the log of completed ones
#[derive(Debug, Clone, Default)]
pub struct ScriptHistory {
    flat: Vec<String>,
    logged: Vec<String>,
}

impl ScriptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History descriptions of every command pushed and not yet discarded,
    /// top-level and sub-commands interleaved in push order
    pub fn flat_stack(&self) -> &[String] {
        &self.flat
    }

    /// History lines of completed undoable commands that allow logging
    pub fn logged(&self) -> &[String] {
        &self.logged
    }
}

impl ManagerListener for ScriptHistory {
    fn on_event(&mut self, event: &ManagerEvent<'_>) {
        match event {
            ManagerEvent::CommandPushed { command, .. } => {
                self.flat.push(command.history_description());
            }
            ManagerEvent::CommandDone { command, can_undo } => {
                if *can_undo && command.can_log() {
                    self.logged.push(command.history_description());
                }
            }
            ManagerEvent::RedoCleared { total_undo_count }
            | ManagerEvent::Unwound { total_undo_count } => {
                self.flat.truncate(*total_undo_count);
            }
            ManagerEvent::Cleared => {
                self.flat.clear();
            }
        }
    }
}
