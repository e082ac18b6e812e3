//! Command manager
//!
//! The manager is the explicit context every command runs in. It owns the
//! command registry, the resolver registry, the undo and redo stacks, and
//! (once attached) the external runtime handle. Commands receive it
//! mutably while they execute so they can create and run sub-commands.
//!
//! ## Stack model
//!
//! Each undo stack entry is a `StackedCommand`: one top-level command plus
//! the undoable sub-commands it ran. An entry is pushed unfinished before
//! its top-level command executes; commands created while the newest
//! entry is unfinished become its sub-commands. While the top-level
//! command runs it is owned by the caller frame, so the entry holds no
//! top-level command yet.
//!
//! ## Failure handling
//!
//! A failing command unwinds its unfinished entry by undoing the
//! sub-commands already recorded, newest first, before the error is
//! raised. Undo and redo failures compensate the sub-commands already
//! processed so the entry is left as it was.

use crate::args::ArgFlags;
use crate::bridge::RuntimeHandle;
use crate::command::{Command, MergeDecision};
use crate::config::{DebugMode, ManagerConfig};
use crate::errors::{CommandError, ExError, ExErrorKind, Result};
use crate::events::{ManagerEvent, ManagerListener};
use crate::registry::CommandRegistry;
use crate::resolver::ResolverRegistry;
use crate::value::{PathValue, Value};
use crate::{log_op_end, log_op_error, log_op_skipped, log_op_start};
use cmdstack_core_types::schema::EVENT_DUMP;
use cmdstack_core_types::{ExecutionId, SessionId};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One undo/redo unit: a top-level command and its sub-commands
pub struct StackedCommand {
    succeeded: bool,
    top_level: Option<Box<dyn Command>>,
    low_level: Vec<Box<dyn Command>>,
}

impl StackedCommand {
    fn pending() -> Self {
        Self {
            succeeded: false,
            top_level: None,
            low_level: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// `None` while the top-level command is still executing
    pub fn top_level(&self) -> Option<&dyn Command> {
        self.top_level.as_deref()
    }

    pub fn low_level(&self) -> impl Iterator<Item = &dyn Command> {
        self.low_level.iter().map(|c| c.as_ref())
    }

    pub fn low_level_count(&self) -> usize {
        self.low_level.len()
    }

    fn top_name(&self) -> String {
        self.top_level
            .as_ref()
            .map(|c| c.name().to_string())
            .unwrap_or_default()
    }
}

/// Argument value handed to `create_command_with_values`
#[derive(Debug, Clone, PartialEq)]
pub enum ArgInput {
    /// Literal text form, `<path>` for a path reference
    Text(String),
    /// Whole path-value, replacing the argument's path
    Path(PathValue),
    /// Typed value, keeping the argument's path
    Value(Value),
}

impl From<&str> for ArgInput {
    fn from(text: &str) -> Self {
        ArgInput::Text(text.to_string())
    }
}

impl From<String> for ArgInput {
    fn from(text: String) -> Self {
        ArgInput::Text(text)
    }
}

impl From<PathValue> for ArgInput {
    fn from(value: PathValue) -> Self {
        ArgInput::Path(value)
    }
}

impl From<Value> for ArgInput {
    fn from(value: Value) -> Self {
        ArgInput::Value(value)
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Do,
    Undo,
    Redo,
}

impl Step {
    fn method(self) -> &'static str {
        match self {
            Step::Do => "do_it",
            Step::Undo => "undo_it",
            Step::Redo => "redo_it",
        }
    }
}

pub struct CommandManager {
    config: ManagerConfig,
    session_id: SessionId,
    registry: CommandRegistry,
    resolvers: ResolverRegistry,
    undo_stack: Vec<StackedCommand>,
    redo_stack: Vec<StackedCommand>,
    merge_id_counter: i32,
    listeners: Vec<Rc<RefCell<dyn ManagerListener>>>,
    pub(crate) runtime: Option<RuntimeHandle>,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::with_config(ManagerConfig::default())
    }
}

impl CommandManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            merge_id_counter: config.first_merge_id,
            config,
            session_id: SessionId::new(),
            registry: CommandRegistry::new(),
            resolvers: ResolverRegistry::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            listeners: Vec::new(),
            runtime: None,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn set_debug_mode(&mut self, mode: DebugMode) {
        self.config.debug_mode = mode;
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    pub fn resolvers_mut(&mut self) -> &mut ResolverRegistry {
        &mut self.resolvers
    }

    pub fn add_listener(&mut self, listener: Rc<RefCell<dyn ManagerListener>>) {
        self.listeners.push(listener);
    }

    pub fn undo_stack(&self) -> &[StackedCommand] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[StackedCommand] {
        &self.redo_stack
    }

    // ===== Creation =====

    /// Create a command, set its text arguments, and optionally execute it
    ///
    /// Returns the command when it was not executed; once executed it is
    /// owned by the stacks (or dropped if it cannot undo).
    ///
    /// # Errors
    ///
    /// Fails if the name is unknown, an argument is rejected, or execution
    /// fails.
    pub fn create_command(
        &mut self,
        name: &str,
        args: &BTreeMap<String, String>,
        execute: bool,
        merge_id: i32,
    ) -> Result<Option<Box<dyn Command>>> {
        let mut cmd = self.registry.create_command(name)?;
        if !args.is_empty() {
            check_command_args(cmd.as_mut(), args)?;
        }
        self.finish_creation(cmd, execute, merge_id)
    }

    /// Like `create_command`, accepting typed values and path-values
    ///
    /// Typed-argument commands take every input form; plain scriptable
    /// commands only accept `ArgInput::Text`.
    ///
    /// # Errors
    ///
    /// Fails if the name is unknown, an argument is rejected, or execution
    /// fails.
    pub fn create_command_with_values(
        &mut self,
        name: &str,
        args: BTreeMap<String, ArgInput>,
        execute: bool,
        merge_id: i32,
    ) -> Result<Option<Box<dyn Command>>> {
        let mut cmd = self.registry.create_command(name)?;
        if !args.is_empty() {
            if cmd.as_rtval_scriptable().is_some() {
                check_rtval_command_args(cmd.as_mut(), args)?;
            } else {
                let mut text = BTreeMap::new();
                for (key, input) in args {
                    let ArgInput::Text(value) = input else {
                        return Err(CommandError::NotTypedScriptable {
                            command: cmd.name().to_string(),
                        }
                        .into());
                    };
                    text.insert(key, value);
                }
                check_command_args(cmd.as_mut(), &text)?;
            }
        }
        self.finish_creation(cmd, execute, merge_id)
    }

    fn finish_creation(
        &mut self,
        cmd: Box<dyn Command>,
        execute: bool,
        merge_id: i32,
    ) -> Result<Option<Box<dyn Command>>> {
        if !execute {
            return Ok(Some(cmd));
        }
        self.do_command(cmd, merge_id)?;
        Ok(None)
    }

    /// Fresh merge id; ids handed out by one manager never repeat
    ///
    /// With a runtime attached, ids the runtime handed out since the last
    /// synchronization are skipped too.
    pub fn get_new_merge_id(&mut self) -> i32 {
        self.reconcile_merge_ids();
        self.merge_id_counter += 1;
        self.forward_merge_id_counter();
        self.merge_id_counter
    }

    pub fn merge_id_counter(&self) -> i32 {
        self.merge_id_counter
    }

    pub(crate) fn set_merge_id_counter(&mut self, value: i32) {
        self.merge_id_counter = value;
    }

    // ===== Execution =====

    /// Execute `cmd` and record it for undo
    ///
    /// Pass `NO_MERGE_ID` to opt out of merging.
    ///
    /// # Errors
    ///
    /// `ExecutionFailed` if the command (or an argument hook) fails, after
    /// the unfinished entry has been unwound; `RollbackFailed` if unwinding
    /// itself fails.
    pub fn do_command(&mut self, cmd: Box<dyn Command>, merge_id: i32) -> Result<()> {
        let name = cmd.name().to_string();
        let execution_id = ExecutionId::new();
        log_op_start!(
            "do_command",
            cmd_name = name.as_str(),
            merge_id = merge_id,
            execution_id = %execution_id
        );
        let start = std::time::Instant::now();

        self.do_command_impl(cmd, merge_id).map_err(|e| {
            let e = e.with_execution_id(execution_id.clone());
            log_op_error!(
                "do_command",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                cmd_name = name.as_str(),
                execution_id = %execution_id
            );
            e
        })?;

        log_op_end!(
            "do_command",
            duration_ms = start.elapsed().as_millis() as u64,
            cmd_name = name.as_str(),
            undo_len = self.undo_stack.len(),
            redo_len = self.redo_stack.len()
        );
        self.dump_content("do_command");
        Ok(())
    }

    fn do_command_impl(&mut self, mut cmd: Box<dyn Command>, merge_id: i32) -> Result<()> {
        cmd.set_merge_id(merge_id);

        let can_undo = cmd.can_undo();
        let decision = match self.undo_stack.last().and_then(|e| e.top_level()) {
            Some(previous) if can_undo => cmd.can_merge_with(previous),
            _ => MergeDecision::REJECT,
        };
        let can_merge = decision.can_merge;
        let is_sub = self.undo_stack.last().is_some_and(|e| !e.succeeded);

        let target = match self.execute_new(cmd.as_mut(), is_sub, can_undo, decision) {
            Ok(target) => target,
            Err(cause) => return Err(self.cleanup_unfinished(cmd.name(), cause)),
        };

        if !can_undo {
            if !is_sub {
                dispatch(
                    &self.listeners,
                    &ManagerEvent::CommandDone {
                        command: cmd.as_ref(),
                        can_undo: false,
                    },
                );
            }
            return Ok(());
        }

        if is_sub {
            dispatch(
                &self.listeners,
                &ManagerEvent::CommandPushed {
                    command: cmd.as_ref(),
                    is_low: true,
                },
            );
            let entry = self.top_entry_mut()?;
            entry.low_level.push(cmd);
            return Ok(());
        }

        // The entry must still be the newest one; a failed sub-command may
        // have unwound it while the command kept going.
        let undo_len = self.undo_stack.len();
        let in_place = target
            .filter(|&index| index + 1 == undo_len)
            .and_then(|index| self.undo_stack.get(index))
            .is_some_and(|entry| can_merge || !entry.succeeded);
        if !in_place {
            let cause = internal(&format!(
                "undo entry of '{}' was unwound while executing",
                cmd.name()
            ));
            return Err(self.cleanup_unfinished(cmd.name(), cause));
        }
        let entry = self
            .undo_stack
            .last_mut()
            .ok_or_else(|| internal("undo stack emptied while executing"))?;
        if can_merge && !decision.undo_previous_first {
            if let Some(previous) = entry.top_level.as_deref() {
                cmd.merge_with(previous).map_err(|e| {
                    ExError::from(CommandError::DoFailed {
                        command: cmd.name().to_string(),
                    })
                    .with_source(e)
                })?;
            }
        }
        entry.top_level = Some(cmd);
        entry.succeeded = true;

        if let Some(top) = entry.top_level.as_deref() {
            dispatch(
                &self.listeners,
                &ManagerEvent::CommandDone {
                    command: top,
                    can_undo: true,
                },
            );
        }
        Ok(())
    }

    fn execute_new(
        &mut self,
        cmd: &mut dyn Command,
        is_sub: bool,
        can_undo: bool,
        decision: MergeDecision,
    ) -> Result<Option<usize>> {
        if !is_sub && can_undo && decision.can_merge && decision.undo_previous_first {
            let mut previous = self
                .undo_stack
                .last_mut()
                .and_then(|e| e.top_level.take())
                .ok_or_else(|| internal("merge target vanished"))?;
            let result = match cmd.merge_with(previous.as_ref()) {
                Ok(()) => self.run_step(previous.as_mut(), Step::Undo),
                Err(e) => Err(e),
            };
            if let Some(entry) = self.undo_stack.last_mut() {
                entry.top_level = Some(previous);
            }
            result?;
        }

        if !is_sub && can_undo && !decision.can_merge {
            self.clear_redo_stack()?;
            self.undo_stack.push(StackedCommand::pending());
            dispatch(
                &self.listeners,
                &ManagerEvent::CommandPushed {
                    command: &*cmd,
                    is_low: false,
                },
            );
        }

        // Entry a top-level undoable command fills once done
        let target = self.undo_stack.len().checked_sub(1);
        self.run_step(cmd, Step::Do)?;
        Ok(target)
    }

    fn cleanup_unfinished(&mut self, name: &str, cause: ExError) -> ExError {
        self.clear_runtime_app_stack();

        let failed = ExError::from(CommandError::DoFailed {
            command: name.to_string(),
        })
        .with_source(cause);

        if !self.undo_stack.last().is_some_and(|e| !e.succeeded) {
            return failed;
        }
        let Some(mut entry) = self.undo_stack.pop() else {
            return failed;
        };
        let mut result = failed;
        for low in entry.low_level.iter_mut().rev() {
            if let Err(e) = self.run_step(low.as_mut(), Step::Undo) {
                tracing::error!(
                    cmd_name = low.name(),
                    err_code = e.code(),
                    "compensating undo failed"
                );
                result = ExError::from(CommandError::RollbackFailed {
                    command: name.to_string(),
                    low: low.name().to_string(),
                })
                .with_source(result);
                break;
            }
        }
        dispatch(
            &self.listeners,
            &ManagerEvent::Unwound {
                total_undo_count: self.total_undo_count(),
            },
        );
        result
    }

    /// Undo the newest entry
    ///
    /// Returns `Ok(false)` if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// `ExecutionFailed` if a command fails to undo; the entry stays on the
    /// undo stack with any partially undone sub-commands redone.
    pub fn undo_command(&mut self) -> Result<bool> {
        log_op_start!("undo_command", undo_len = self.undo_stack.len());
        let start = std::time::Instant::now();

        let Some(entry) = self.undo_stack.pop() else {
            let err = ExError::from(CommandError::NothingToUndo);
            log_op_skipped!("undo_command", err.message());
            return Ok(false);
        };
        let name = entry.top_name();

        self.undo_entry(entry).map_err(|e| {
            log_op_error!(
                "undo_command",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                cmd_name = name.as_str()
            );
            e
        })?;

        log_op_end!(
            "undo_command",
            duration_ms = start.elapsed().as_millis() as u64,
            cmd_name = name.as_str(),
            undo_len = self.undo_stack.len(),
            redo_len = self.redo_stack.len()
        );
        self.dump_content("undo_command");
        Ok(true)
    }

    fn undo_entry(&mut self, mut entry: StackedCommand) -> Result<()> {
        let top = entry.top_name();

        if entry.low_level.is_empty() {
            let result = match entry.top_level.as_deref_mut() {
                Some(cmd) => self.run_step(cmd, Step::Undo),
                None => Err(internal("undo of an unfinished entry")),
            };
            if let Err(e) = result {
                self.undo_stack.push(entry);
                return Err(ExError::from(CommandError::UndoTopFailed { top }).with_source(e));
            }
            self.redo_stack.push(entry);
            return Ok(());
        }

        for i in (0..entry.low_level.len()).rev() {
            if let Err(e) = self.run_step(entry.low_level[i].as_mut(), Step::Undo) {
                let low = entry.low_level[i].name().to_string();
                for j in i + 1..entry.low_level.len() {
                    if let Err(redo_err) = self.run_step(entry.low_level[j].as_mut(), Step::Redo) {
                        tracing::warn!(
                            cmd_name = entry.low_level[j].name(),
                            err_code = redo_err.code(),
                            "compensating redo failed"
                        );
                    }
                }
                self.undo_stack.push(entry);
                return Err(ExError::from(CommandError::UndoLowFailed { top, low }).with_source(e));
            }
        }
        self.redo_stack.push(entry);
        Ok(())
    }

    /// Redo the newest undone entry
    ///
    /// Returns `Ok(false)` if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// `ExecutionFailed` if a command fails to redo; the entry stays on the
    /// redo stack with any partially redone sub-commands undone.
    pub fn redo_command(&mut self) -> Result<bool> {
        log_op_start!("redo_command", redo_len = self.redo_stack.len());
        let start = std::time::Instant::now();

        let Some(entry) = self.redo_stack.pop() else {
            let err = ExError::from(CommandError::NothingToRedo);
            log_op_skipped!("redo_command", err.message());
            return Ok(false);
        };
        let name = entry.top_name();

        self.redo_entry(entry).map_err(|e| {
            log_op_error!(
                "redo_command",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                cmd_name = name.as_str()
            );
            e
        })?;

        log_op_end!(
            "redo_command",
            duration_ms = start.elapsed().as_millis() as u64,
            cmd_name = name.as_str(),
            undo_len = self.undo_stack.len(),
            redo_len = self.redo_stack.len()
        );
        self.dump_content("redo_command");
        Ok(true)
    }

    fn redo_entry(&mut self, mut entry: StackedCommand) -> Result<()> {
        let top = entry.top_name();

        if entry.low_level.is_empty() {
            let result = match entry.top_level.as_deref_mut() {
                Some(cmd) => self.run_step(cmd, Step::Redo),
                None => Err(internal("redo of an unfinished entry")),
            };
            if let Err(e) = result {
                self.redo_stack.push(entry);
                return Err(ExError::from(CommandError::RedoTopFailed { top }).with_source(e));
            }
            self.undo_stack.push(entry);
            return Ok(());
        }

        for i in 0..entry.low_level.len() {
            if let Err(e) = self.run_step(entry.low_level[i].as_mut(), Step::Redo) {
                let low = entry.low_level[i].name().to_string();
                for j in (0..i).rev() {
                    if let Err(undo_err) = self.run_step(entry.low_level[j].as_mut(), Step::Undo) {
                        tracing::warn!(
                            cmd_name = entry.low_level[j].name(),
                            err_code = undo_err.code(),
                            "compensating undo failed"
                        );
                    }
                }
                self.redo_stack.push(entry);
                return Err(ExError::from(CommandError::RedoLowFailed { top, low }).with_source(e));
            }
        }
        self.undo_stack.push(entry);
        Ok(())
    }

    /// Run one step of `cmd` between the argument hooks
    fn run_step(&mut self, cmd: &mut dyn Command, step: Step) -> Result<()> {
        resolve_inputs(&self.resolvers, cmd)?;
        let ok = match step {
            Step::Do => cmd.do_it(self)?,
            Step::Undo => cmd.undo_it(self)?,
            Step::Redo => cmd.redo_it(self)?,
        };
        if !ok {
            return Err(ExError::new(ExErrorKind::ExecutionFailed)
                .with_op(step.method())
                .with_command(cmd.name())
                .with_message(format!("'{}' returned false", step.method())));
        }
        write_outputs(&mut self.resolvers, cmd)
    }

    // ===== Stack maintenance =====

    /// Drop every entry of both stacks
    ///
    /// # Errors
    ///
    /// Fails if the attached runtime fails to clear.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(runtime) = &self.runtime {
            runtime.borrow_mut().clear()?;
        }
        self.clear_redo_stack()?;
        self.undo_stack.clear();
        dispatch(&self.listeners, &ManagerEvent::Cleared);
        tracing::debug!(session_id = %self.session_id, "manager cleared");
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the attached runtime fails to clear its redo stack.
    pub fn clear_redo_stack(&mut self) -> Result<()> {
        if let Some(runtime) = &self.runtime {
            runtime.borrow_mut().clear_redo_stack()?;
        }
        let total_undo_count = self.total_undo_count();
        self.redo_stack.clear();
        dispatch(
            &self.listeners,
            &ManagerEvent::RedoCleared { total_undo_count },
        );
        Ok(())
    }

    fn top_entry_mut(&mut self) -> Result<&mut StackedCommand> {
        self.undo_stack
            .last_mut()
            .ok_or_else(|| internal("no entry to attach the sub-command to"))
    }

    // ===== Introspection =====

    /// Entries on both stacks
    pub fn count(&self) -> usize {
        self.undo_stack.len() + self.redo_stack.len()
    }

    /// Commands on the undo stack, sub-commands included
    pub fn total_undo_count(&self) -> usize {
        self.undo_stack
            .iter()
            .map(|e| 1 + e.low_level.len())
            .sum()
    }

    /// Index of the newest undo entry, -1 when the undo stack is empty
    pub fn stack_index(&self) -> i64 {
        self.undo_stack.len() as i64 - 1
    }

    pub fn content(&self, with_args: bool) -> String {
        let mut res = format!(
            "--> Command Manager - size:{}, index:{}, undo:{}, redo:{}\n",
            self.count(),
            self.stack_index(),
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        res.push_str(&stack_content('+', 0, &self.undo_stack, with_args));
        res.push_str(&stack_content(
            '-',
            self.undo_stack.len(),
            &self.redo_stack,
            with_args,
        ));
        if let Some(runtime) = &self.runtime {
            res.push('\n');
            res.push_str(&runtime.borrow().content());
        }
        res
    }

    fn dump_content(&self, op: &str) {
        if self.config.debug_mode == DebugMode::NoDebug {
            return;
        }
        let content = self.content(self.config.debug_mode == DebugMode::Verbose);
        tracing::debug!(
            component = module_path!(),
            op,
            event = EVENT_DUMP,
            content = content.as_str(),
        );
    }
}

fn stack_content(sign: char, offset: usize, stack: &[StackedCommand], with_args: bool) -> String {
    let mut res = String::new();
    for (i, entry) in stack.iter().enumerate() {
        let desc = match entry.top_level() {
            Some(top) => describe(top, with_args, true),
            None => "<executing>".to_string(),
        };
        res.push_str(&format!("{}[{}] {}\n", sign, offset + i, desc));
        for (j, low) in entry.low_level().enumerate() {
            res.push_str(&format!("  {}[{}] {}\n", sign, j, describe(low, with_args, false)));
        }
    }
    res
}

fn describe(cmd: &dyn Command, with_args: bool, require_keys: bool) -> String {
    match cmd.as_scriptable() {
        Some(args) if with_args && (!require_keys || !args.arg_keys().is_empty()) => {
            format!("{}\n{}", cmd.name(), args.args_description())
        }
        _ => cmd.name().to_string(),
    }
}

fn dispatch(listeners: &[Rc<RefCell<dyn ManagerListener>>], event: &ManagerEvent<'_>) {
    for listener in listeners {
        // A listener already borrowed up the call stack misses nested events.
        if let Ok(mut listener) = listener.try_borrow_mut() {
            listener.on_event(event);
        }
    }
}

fn internal(message: &str) -> ExError {
    CommandError::Internal {
        message: message.to_string(),
    }
    .into()
}

/// Set plain text arguments, then validate the command's arguments
///
/// Keys are set even when undeclared so the command reports the error.
///
/// # Errors
///
/// Fails if the command is not scriptable or an argument is rejected.
pub fn check_command_args(cmd: &mut dyn Command, args: &BTreeMap<String, String>) -> Result<()> {
    let name = cmd.name().to_string();
    let scriptable = cmd
        .as_scriptable_mut()
        .ok_or(CommandError::NotScriptable { command: name })?;
    for (key, value) in args {
        scriptable.set_arg(key, value)?;
    }
    scriptable.validate_set_args()
}

/// Set typed arguments, then validate the command's arguments
///
/// # Errors
///
/// Fails if the command does not take typed arguments or an argument is
/// rejected.
pub fn check_rtval_command_args(cmd: &mut dyn Command, args: BTreeMap<String, ArgInput>) -> Result<()> {
    let name = cmd.name().to_string();
    let scriptable = cmd
        .as_rtval_scriptable_mut()
        .ok_or(CommandError::NotTypedScriptable { command: name })?;
    for (key, input) in args {
        match input {
            ArgInput::Text(text) => scriptable.set_arg(&key, &text)?,
            ArgInput::Path(value) => scriptable.set_rtval_arg(&key, value)?,
            ArgInput::Value(value) => scriptable.set_rtval_arg_value(&key, value)?,
        }
    }
    scriptable.validate_set_args()
}

/// Pull IN/IO arguments bound to a path from the resolvers
fn resolve_inputs(resolvers: &ResolverRegistry, cmd: &mut dyn Command) -> Result<()> {
    let name = cmd.name().to_string();
    let Some(args) = cmd.as_rtval_scriptable_mut() else {
        return Ok(());
    };
    for key in args.arg_keys() {
        if !args.has_arg_flag(&key, ArgFlags::IN | ArgFlags::IO)? {
            continue;
        }
        let path = args.rtval_arg_path(&key)?;
        if path.is_empty() {
            if !args.has_arg_flag(&key, ArgFlags::OPTIONAL)? && !args.is_arg_set(&key) {
                return Err(CommandError::ArgNotSet { command: name, key }.into());
            }
            continue;
        }
        let mut value = args.rtval_arg(&key)?;
        if let Err(e) = resolvers.get_value(&mut value) {
            return Err(unresolvable(&name, &key, &path, e));
        }
        args.set_rtval_arg(&key, value)?;
    }
    Ok(())
}

/// Push OUT/IO arguments bound to a path back through the resolvers
fn write_outputs(resolvers: &mut ResolverRegistry, cmd: &mut dyn Command) -> Result<()> {
    let name = cmd.name().to_string();
    let Some(args) = cmd.as_rtval_scriptable() else {
        return Ok(());
    };
    for key in args.arg_keys() {
        if !args.has_arg_flag(&key, ArgFlags::OUT | ArgFlags::IO)? {
            continue;
        }
        let value = args.rtval_arg(&key)?;
        if value.path.is_empty() {
            if !args.has_arg_flag(&key, ArgFlags::OPTIONAL)? && !args.is_arg_set(&key) {
                return Err(CommandError::ArgNotSet { command: name, key }.into());
            }
            continue;
        }
        if let Err(e) = resolvers.set_value(&value) {
            return Err(unresolvable(&name, &key, &value.path, e));
        }
    }
    Ok(())
}

fn unresolvable(command: &str, key: &str, path: &str, cause: ExError) -> ExError {
    ExError::from(CommandError::PathUnresolvable {
        command: command.to_string(),
        key: key.to_string(),
        path: path.to_string(),
    })
    .with_source(cause)
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("session_id", &self.session_id)
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("merge_id_counter", &self.merge_id_counter)
            .field("bridged", &self.runtime.is_some())
            .finish()
    }
}
