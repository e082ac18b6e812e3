use cmdstack_core::bridge::{AppCommandRequest, PendingEntry, RuntimeCommandId};
use cmdstack_core::errors::CommandError;
use cmdstack_core::{
    ArgFlags, ArgTable, Command, CommandCore, CommandManager, ExError, ExternalRuntime,
    ManagerEvent, ManagerListener, MergeDecision, Result, Scriptable, Value, NO_MERGE_ID,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// State mutated by the test commands
#[derive(Debug, Default)]
pub struct Scene {
    pub values: BTreeMap<String, i64>,
    pub journal: Vec<String>,
}

pub type SharedScene = Rc<RefCell<Scene>>;

#[allow(dead_code)]
pub fn new_scene() -> SharedScene {
    Rc::new(RefCell::new(Scene::default()))
}

#[allow(dead_code)]
pub fn value_of(scene: &SharedScene, key: &str) -> i64 {
    scene.borrow().values.get(key).copied().unwrap_or(0)
}

#[allow(dead_code)]
pub fn journal(scene: &SharedScene) -> Vec<String> {
    scene.borrow().journal.clone()
}

/// Adds `amount` to `key`
///
/// `failOn` names a step (`do`, `undo` or `redo`) that reports failure.
/// Merging takes over the previous command's amount so one undo reverts
/// both.
pub struct AddCommand {
    core: CommandCore,
    args: ArgTable,
    scene: SharedScene,
    applied: i64,
    undoable: bool,
}

impl AddCommand {
    pub fn new(scene: SharedScene) -> Self {
        let mut args = ArgTable::new();
        args.declare_arg("key", ArgFlags::empty(), "").unwrap();
        args.declare_arg("amount", ArgFlags::OPTIONAL, "1").unwrap();
        args.declare_arg("failOn", ArgFlags::OPTIONAL, "").unwrap();
        Self {
            core: CommandCore::new(),
            args,
            scene,
            applied: 0,
            undoable: true,
        }
    }

    #[allow(dead_code)]
    pub fn not_undoable(mut self) -> Self {
        self.undoable = false;
        self
    }

    fn key(&self) -> String {
        self.args.get_arg("key").unwrap_or_default()
    }

    fn fails_on(&self, step: &str) -> bool {
        self.args.get_arg("failOn").is_ok_and(|s| s == step)
    }

    fn apply(&mut self, step: &str, delta: i64) -> Result<bool> {
        let key = self.key();
        self.scene
            .borrow_mut()
            .journal
            .push(format!("{} {} {}", step, key, delta));
        if self.fails_on(step) {
            return Ok(false);
        }
        *self.scene.borrow_mut().values.entry(key).or_insert(0) += delta;
        Ok(true)
    }
}

impl Command for AddCommand {
    fn core(&self) -> &CommandCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }

    fn do_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        let raw = self.args.get_arg("amount")?;
        let amount: i64 = raw.parse().map_err(|_| {
            ExError::from(CommandError::InvalidArgValue {
                command: self.name().to_string(),
                key: "amount".to_string(),
                reason: format!("'{}' is not an integer", raw),
            })
        })?;
        self.applied += amount;
        self.apply("do", amount)
    }

    fn undo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        self.apply("undo", -self.applied)
    }

    fn redo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        self.apply("redo", self.applied)
    }

    fn can_undo(&self) -> bool {
        self.undoable
    }

    fn history_description(&self) -> String {
        format!("{}(key=\"{}\")", self.name(), self.key())
    }

    fn merge_with(&mut self, previous: &dyn Command) -> Result<()> {
        if let Some(Value::Integer(amount)) = previous.merge_state() {
            self.applied += amount;
        }
        Ok(())
    }

    fn merge_state(&self) -> Option<Value> {
        Some(Value::Integer(self.applied))
    }

    fn as_scriptable(&self) -> Option<&dyn Scriptable> {
        Some(&self.args)
    }

    fn as_scriptable_mut(&mut self) -> Option<&mut dyn Scriptable> {
        Some(&mut self.args)
    }
}

/// Sets `key` to `value`, merging by undoing the previous command first
pub struct AssignCommand {
    core: CommandCore,
    args: ArgTable,
    scene: SharedScene,
    previous: Option<i64>,
}

impl AssignCommand {
    pub fn new(scene: SharedScene) -> Self {
        let mut args = ArgTable::new();
        args.declare_arg("key", ArgFlags::empty(), "").unwrap();
        args.declare_arg("value", ArgFlags::empty(), "").unwrap();
        Self {
            core: CommandCore::new(),
            args,
            scene,
            previous: None,
        }
    }

    fn key(&self) -> String {
        self.args.get_arg("key").unwrap_or_default()
    }

    fn target(&self) -> i64 {
        self.args
            .get_arg("value")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

impl Command for AssignCommand {
    fn core(&self) -> &CommandCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }

    fn do_it(&mut self, manager: &mut CommandManager) -> Result<bool> {
        let key = self.key();
        self.previous = Some(self.scene.borrow().values.get(&key).copied().unwrap_or(0));
        self.scene.borrow_mut().journal.push(format!("assign {}", key));
        self.redo_it(manager)
    }

    fn undo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        let key = self.key();
        let previous = self.previous.unwrap_or(0);
        self.scene.borrow_mut().values.insert(key, previous);
        Ok(true)
    }

    fn redo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        let key = self.key();
        let target = self.target();
        self.scene.borrow_mut().values.insert(key, target);
        Ok(true)
    }

    fn can_undo(&self) -> bool {
        true
    }

    fn can_merge_with(&self, previous: &dyn Command) -> MergeDecision {
        if self.core().can_merge_with(previous.core()) {
            MergeDecision::merge_and_undo_previous()
        } else {
            MergeDecision::REJECT
        }
    }

    fn as_scriptable(&self) -> Option<&dyn Scriptable> {
        Some(&self.args)
    }

    fn as_scriptable_mut(&mut self) -> Option<&mut dyn Scriptable> {
        Some(&mut self.args)
    }
}

/// Runs one `add` sub-command per comma separated key
///
/// With `fail` set to `true` the macro reports failure after its
/// sub-commands ran. `failKey` and `failOn` are forwarded to the
/// sub-command of that key. With `tolerate` set to `true` failing
/// sub-commands are skipped.
pub struct MacroCommand {
    core: CommandCore,
    args: ArgTable,
}

impl MacroCommand {
    pub fn new() -> Self {
        let mut args = ArgTable::new();
        args.declare_arg("keys", ArgFlags::empty(), "").unwrap();
        args.declare_arg("fail", ArgFlags::OPTIONAL, "false").unwrap();
        args.declare_arg("failKey", ArgFlags::OPTIONAL, "").unwrap();
        args.declare_arg("failOn", ArgFlags::OPTIONAL, "").unwrap();
        args.declare_arg("tolerate", ArgFlags::OPTIONAL, "false").unwrap();
        Self {
            core: CommandCore::new(),
            args,
        }
    }
}

impl Command for MacroCommand {
    fn core(&self) -> &CommandCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CommandCore {
        &mut self.core
    }

    fn do_it(&mut self, manager: &mut CommandManager) -> Result<bool> {
        let keys = self.args.get_arg("keys")?;
        let fail_key = self.args.get_arg("failKey")?;
        let fail_on = self.args.get_arg("failOn")?;
        for key in keys.split(',').filter(|k| !k.is_empty()) {
            let mut args = BTreeMap::new();
            args.insert("key".to_string(), key.to_string());
            if key == fail_key {
                args.insert("failOn".to_string(), fail_on.clone());
            }
            let created = manager.create_command("add", &args, true, NO_MERGE_ID);
            if created.is_err() && self.args.get_arg("tolerate")? == "true" {
                continue;
            }
            created?;
        }
        Ok(self.args.get_arg("fail")? != "true")
    }

    fn undo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        Ok(true)
    }

    fn redo_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
        Ok(true)
    }

    fn can_undo(&self) -> bool {
        true
    }

    fn as_scriptable(&self) -> Option<&dyn Scriptable> {
        Some(&self.args)
    }

    fn as_scriptable_mut(&mut self) -> Option<&mut dyn Scriptable> {
        Some(&mut self.args)
    }
}

/// Manager with `add`, `assign` and `macro` registered against `scene`
#[allow(dead_code)]
pub fn new_manager(scene: &SharedScene) -> CommandManager {
    let mut manager = CommandManager::new();
    register_test_commands(&mut manager, scene);
    manager
}

#[allow(dead_code)]
pub fn register_test_commands(manager: &mut CommandManager, scene: &SharedScene) {
    let add_scene = scene.clone();
    manager
        .registry_mut()
        .register_factory("add", "AddCommand", move || {
            Ok(Box::new(AddCommand::new(add_scene.clone())))
        })
        .unwrap();
    let assign_scene = scene.clone();
    manager
        .registry_mut()
        .register_factory("assign", "AssignCommand", move || {
            Ok(Box::new(AssignCommand::new(assign_scene.clone())))
        })
        .unwrap();
    manager
        .registry_mut()
        .register_factory("macro", "MacroCommand", || Ok(Box::new(MacroCommand::new())))
        .unwrap();
}

/// Text argument map from key/value pairs
#[allow(dead_code)]
pub fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[allow(dead_code)]
pub fn add(manager: &mut CommandManager, key: &str, amount: i64, merge_id: i32) -> Result<()> {
    manager
        .create_command(
            "add",
            &args(&[("key", key), ("amount", &amount.to_string())]),
            true,
            merge_id,
        )
        .map(|_| ())
}

/// Listener recording every event as a line of text
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<String>,
}

impl ManagerListener for RecordingListener {
    fn on_event(&mut self, event: &ManagerEvent<'_>) {
        let line = match event {
            ManagerEvent::CommandPushed { command, is_low } => {
                format!("pushed {} low={}", command.name(), is_low)
            }
            ManagerEvent::CommandDone { command, can_undo } => {
                format!("done {} undo={}", command.name(), can_undo)
            }
            ManagerEvent::RedoCleared { total_undo_count } => {
                format!("redo_cleared {}", total_undo_count)
            }
            ManagerEvent::Unwound { total_undo_count } => {
                format!("unwound {}", total_undo_count)
            }
            ManagerEvent::Cleared => "cleared".to_string(),
        };
        self.events.push(line);
    }
}

// ===== Fake external runtime =====

#[derive(Debug, Clone)]
pub struct FakeCommand {
    pub name: String,
    pub merge_id: i32,
    pub weight: i64,
    pub args: BTreeMap<String, String>,
}

/// In-memory runtime whose commands add their weight to `value`
///
/// Commands of type `Increment` are undoable; `Inspect` commands are not.
/// `Scripted` commands declare a mandatory `amount` argument used as
/// their weight.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    pub types: BTreeMap<String, String>,
    pub app_commands: Vec<String>,
    pub commands: BTreeMap<RuntimeCommandId, FakeCommand>,
    pub pending: Vec<PendingEntry>,
    pub released: Vec<RuntimeCommandId>,
    pub counter: i32,
    pub value: i64,
    pub clears: usize,
    pub redo_clears: usize,
    pub fail_do: bool,
    next_id: RuntimeCommandId,
}

#[allow(dead_code)]
pub const APP_COMMAND_TYPE: &str = "AppCommand";

#[allow(dead_code)]
impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, name: &str, command_type: &str) -> Self {
        self.types.insert(name.to_string(), command_type.to_string());
        self
    }

    /// Execute `name` inside the runtime, as its own scripting would
    pub fn run(&mut self, name: &str, merge_id: i32) -> RuntimeCommandId {
        let id = self.create_command(name).unwrap();
        self.set_merge_id(id, merge_id).unwrap();
        self.do_command(id).unwrap();
        self.pending.push(PendingEntry::Executed(id));
        id
    }

    /// Queue a host command, as the runtime's scripting would
    pub fn request(&mut self, name: &str, merge_id: i32, args: BTreeMap<String, cmdstack_core::PathValue>) {
        self.pending.push(PendingEntry::AppCommand(AppCommandRequest {
            name: name.to_string(),
            merge_id,
            log_blocked: false,
            args,
        }));
    }

    fn get(&self, id: RuntimeCommandId) -> Result<&FakeCommand> {
        self.commands.get(&id).ok_or_else(|| unknown(id))
    }

    fn get_mut(&mut self, id: RuntimeCommandId) -> Result<&mut FakeCommand> {
        self.commands.get_mut(&id).ok_or_else(|| unknown(id))
    }

    fn type_of(&self, id: RuntimeCommandId) -> Option<&str> {
        self.commands
            .get(&id)
            .and_then(|c| self.types.get(&c.name))
            .map(String::as_str)
    }
}

fn unknown(id: RuntimeCommandId) -> ExError {
    CommandError::ExternalRuntime {
        op: "lookup".to_string(),
        message: format!("unknown command id {}", id),
    }
    .into()
}

impl ExternalRuntime for FakeRuntime {
    fn command_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    fn is_command_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn command_type(&self, name: &str) -> Result<String> {
        self.types.get(name).cloned().ok_or_else(|| {
            CommandError::ExternalRuntime {
                op: "command_type".to_string(),
                message: format!("unknown command '{}'", name),
            }
            .into()
        })
    }

    fn register_app_command(&mut self, name: &str) -> Result<()> {
        self.types
            .insert(name.to_string(), APP_COMMAND_TYPE.to_string());
        self.app_commands.push(name.to_string());
        Ok(())
    }

    fn register_command(&mut self, name: &str, command_type: &str) -> Result<()> {
        self.types.insert(name.to_string(), command_type.to_string());
        Ok(())
    }

    fn create_command(&mut self, name: &str) -> Result<RuntimeCommandId> {
        self.command_type(name)?;
        self.next_id += 1;
        self.commands.insert(
            self.next_id,
            FakeCommand {
                name: name.to_string(),
                merge_id: NO_MERGE_ID,
                weight: 1,
                args: BTreeMap::new(),
            },
        );
        Ok(self.next_id)
    }

    fn release_command(&mut self, id: RuntimeCommandId) {
        self.released.push(id);
    }

    fn command_name(&self, id: RuntimeCommandId) -> Result<String> {
        Ok(self.get(id)?.name.clone())
    }

    fn merge_id(&self, id: RuntimeCommandId) -> Result<i32> {
        Ok(self.get(id)?.merge_id)
    }

    fn set_merge_id(&mut self, id: RuntimeCommandId, merge_id: i32) -> Result<()> {
        self.get_mut(id)?.merge_id = merge_id;
        Ok(())
    }

    fn can_undo(&self, id: RuntimeCommandId) -> bool {
        self.type_of(id) != Some("Inspect")
    }

    fn can_log(&self, _id: RuntimeCommandId) -> bool {
        true
    }

    fn history_description(&self, id: RuntimeCommandId) -> String {
        self.commands
            .get(&id)
            .map(|c| format!("{}()", c.name))
            .unwrap_or_default()
    }

    fn do_command(&mut self, id: RuntimeCommandId) -> Result<bool> {
        if self.fail_do {
            return Ok(false);
        }
        let scripted = self.type_of(id) == Some("Scripted");
        let cmd = self.get_mut(id)?;
        if scripted {
            cmd.weight = cmd
                .args
                .get("amount")
                .and_then(|a| a.parse().ok())
                .unwrap_or(0);
        }
        let weight = cmd.weight;
        self.value += weight;
        Ok(true)
    }

    fn undo_command(&mut self, id: RuntimeCommandId) -> Result<bool> {
        self.value -= self.get(id)?.weight;
        Ok(true)
    }

    fn redo_command(&mut self, id: RuntimeCommandId) -> Result<bool> {
        self.value += self.get(id)?.weight;
        Ok(true)
    }

    fn can_merge(&self, id: RuntimeCommandId, previous: RuntimeCommandId) -> MergeDecision {
        match (self.commands.get(&id), self.commands.get(&previous)) {
            (Some(cmd), Some(prev)) if cmd.name == prev.name => MergeDecision::merge_after_do(),
            _ => MergeDecision::REJECT,
        }
    }

    fn merge(&mut self, id: RuntimeCommandId, previous: RuntimeCommandId) -> Result<()> {
        let weight = self.get(previous)?.weight;
        self.get_mut(id)?.weight += weight;
        Ok(())
    }

    fn is_scriptable(&self, id: RuntimeCommandId) -> bool {
        self.type_of(id) == Some("Scripted")
    }

    fn declare_arg(
        &mut self,
        _id: RuntimeCommandId,
        _key: &str,
        _flags: ArgFlags,
        _default: &str,
    ) -> Result<()> {
        Ok(())
    }

    fn arg_keys(&self, id: RuntimeCommandId) -> Vec<String> {
        if self.is_scriptable(id) {
            vec!["amount".to_string()]
        } else {
            Vec::new()
        }
    }

    fn arg_flags(&self, _id: RuntimeCommandId, _key: &str) -> Result<ArgFlags> {
        Ok(ArgFlags::empty())
    }

    fn is_arg_set(&self, id: RuntimeCommandId, key: &str) -> bool {
        self.commands
            .get(&id)
            .is_some_and(|c| c.args.contains_key(key))
    }

    fn get_arg(&self, id: RuntimeCommandId, key: &str) -> Result<String> {
        Ok(self.get(id)?.args.get(key).cloned().unwrap_or_default())
    }

    fn set_arg(&mut self, id: RuntimeCommandId, key: &str, value: &str) -> Result<()> {
        if key != "amount" {
            return Err(CommandError::UnknownArg {
                command: self.get(id)?.name.clone(),
                key: key.to_string(),
            }
            .into());
        }
        self.get_mut(id)?
            .args
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn validate_args(&self, id: RuntimeCommandId) -> Result<()> {
        if self.is_scriptable(id) && !self.is_arg_set(id, "amount") {
            return Err(CommandError::ArgNotSet {
                command: self.get(id)?.name.clone(),
                key: "amount".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn app_stack(&self) -> Vec<PendingEntry> {
        self.pending.clone()
    }

    fn clear_app_stack(&mut self) -> Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn merge_id_counter(&self) -> i32 {
        self.counter
    }

    fn set_merge_id_counter(&mut self, value: i32) -> Result<()> {
        self.counter = value;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }

    fn clear_redo_stack(&mut self) -> Result<()> {
        self.redo_clears += 1;
        Ok(())
    }

    fn content(&self) -> String {
        format!("--> FakeRuntime - value:{}", self.value)
    }
}
