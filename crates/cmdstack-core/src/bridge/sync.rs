//! Manager side of the bridge: attaching and synchronizing

use super::command::BridgedCommand;
use super::runtime::{AppCommandRequest, PendingEntry};
use super::RuntimeHandle;
use crate::command::Command;
use crate::errors::{CommandError, ExError, Result};
use crate::manager::{check_command_args, check_rtval_command_args, ArgInput, CommandManager};
use crate::registry::{ImplementationKind, RegistryListener};
use crate::value::{cast_to_path, PathValue, Value};
use crate::{log_op_end, log_op_error, log_op_start};
use std::collections::BTreeMap;

/// Exposes natively registered commands to the runtime as they appear
struct RuntimeRegistrar {
    runtime: RuntimeHandle,
}

impl RegistryListener for RuntimeRegistrar {
    fn registration_done(
        &self,
        name: &str,
        _command_type: &str,
        kind: ImplementationKind,
    ) -> Result<()> {
        if kind != ImplementationKind::Native {
            return Ok(());
        }
        let mut runtime = self.runtime.try_borrow_mut().map_err(|_| busy("register_app_command"))?;
        if !runtime.is_command_registered(name) {
            runtime.register_app_command(name)?;
        }
        Ok(())
    }
}

fn busy(op: &str) -> ExError {
    CommandError::ExternalRuntime {
        op: op.to_string(),
        message: "runtime is already in use".to_string(),
    }
    .into()
}

fn no_runtime() -> ExError {
    CommandError::ExternalRuntime {
        op: "synchronize".to_string(),
        message: "no runtime attached".to_string(),
    }
    .into()
}

/// Text form of a runtime argument for plain scriptable commands
fn plain_text(value: &PathValue) -> String {
    match &value.value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_json(),
        None if value.has_path() => cast_to_path(&value.path),
        None => String::new(),
    }
}

impl CommandManager {
    /// Bind the manager to an external runtime
    ///
    /// Native commands registered from now on are exposed to the runtime
    /// immediately; earlier ones are exchanged by `synchronize`.
    pub fn attach_runtime(&mut self, runtime: RuntimeHandle) {
        self.registry_mut().add_listener(Box::new(RuntimeRegistrar {
            runtime: runtime.clone(),
        }));
        self.runtime = Some(runtime);
        tracing::debug!(session_id = %self.session_id(), "runtime attached");
    }

    pub fn runtime(&self) -> Option<&RuntimeHandle> {
        self.runtime.as_ref()
    }

    /// Reconcile registries, replay the runtime's pending commands, and
    /// align merge id counters
    ///
    /// # Errors
    ///
    /// Fails if no runtime is attached, the runtime fails, or a pending
    /// command fails to execute. Entries replayed before the failure stay
    /// on the undo stack; the runtime's pending stack is cleared either way.
    pub fn synchronize(&mut self) -> Result<()> {
        log_op_start!("synchronize");
        let start = std::time::Instant::now();

        let result = self
            .synchronize_registry()
            .and_then(|()| self.synchronize_stack());
        if let Err(e) = result {
            log_op_error!(
                "synchronize",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(e);
        }

        log_op_end!(
            "synchronize",
            duration_ms = start.elapsed().as_millis() as u64,
            undo_len = self.undo_stack().len(),
            merge_id = self.merge_id_counter()
        );
        Ok(())
    }

    fn synchronize_registry(&mut self) -> Result<()> {
        let runtime = self.runtime.clone().ok_or_else(no_runtime)?;

        let external = runtime.borrow().command_names();
        for name in external {
            if self.registry().is_command_registered(&name) {
                continue;
            }
            let command_type = runtime.borrow().command_type(&name)?;
            let factory_runtime = runtime.clone();
            let factory_name = name.clone();
            self.registry_mut()
                .register_bridged(&name, &command_type, move || {
                    Ok(Box::new(BridgedCommand::create(&factory_runtime, &factory_name)?))
                })?;
        }

        for name in self.registry().command_names() {
            if runtime.borrow().is_command_registered(&name) {
                continue;
            }
            let Some(spec) = self.registry().command_specs(&name).cloned() else {
                continue;
            };
            match spec.kind {
                ImplementationKind::Native => runtime.borrow_mut().register_app_command(&name)?,
                ImplementationKind::Bridged => runtime
                    .borrow_mut()
                    .register_command(&name, &spec.command_type)?,
            }
        }
        Ok(())
    }

    fn synchronize_stack(&mut self) -> Result<()> {
        let runtime = self.runtime.clone().ok_or_else(no_runtime)?;

        let pending = runtime.borrow().app_stack();
        let replayed = pending
            .into_iter()
            .try_for_each(|entry| self.replay(&runtime, entry));

        let cleared = runtime.borrow_mut().clear_app_stack();
        self.reconcile_merge_ids();
        replayed?;
        cleared
    }

    fn replay(&mut self, runtime: &RuntimeHandle, entry: PendingEntry) -> Result<()> {
        match entry {
            PendingEntry::AppCommand(request) => self.create_app_command(request),
            PendingEntry::Executed(id) => {
                let cmd = BridgedCommand::executed(runtime, id)?;
                let merge_id = cmd.core().merge_id();
                self.do_command(Box::new(cmd), merge_id)
            }
        }
    }

    fn create_app_command(&mut self, request: AppCommandRequest) -> Result<()> {
        let mut cmd = self.registry().create_command(&request.name)?;
        if request.log_blocked {
            cmd.block_log();
        }
        if !request.args.is_empty() {
            if cmd.as_rtval_scriptable().is_some() {
                let args = request
                    .args
                    .into_iter()
                    .map(|(key, value)| (key, ArgInput::Path(value)))
                    .collect();
                check_rtval_command_args(cmd.as_mut(), args)?;
            } else {
                let args: BTreeMap<String, String> = request
                    .args
                    .iter()
                    .map(|(key, value)| (key.clone(), plain_text(value)))
                    .collect();
                check_command_args(cmd.as_mut(), &args)?;
            }
        }
        self.do_command(cmd, request.merge_id)
    }

    /// Bring both merge id counters to the larger of the two
    pub(crate) fn reconcile_merge_ids(&mut self) {
        let Some(runtime) = self.runtime.clone() else {
            return;
        };
        let external = runtime.borrow().merge_id_counter();
        let counter = external.max(self.merge_id_counter());
        self.set_merge_id_counter(counter);
        if external < counter {
            self.forward_merge_id_counter();
        }
    }

    /// Push the local merge id counter to the runtime
    pub(crate) fn forward_merge_id_counter(&self) {
        let Some(runtime) = &self.runtime else {
            return;
        };
        if let Err(e) = runtime
            .borrow_mut()
            .set_merge_id_counter(self.merge_id_counter())
        {
            tracing::warn!(err_code = e.code(), "merge id counter not forwarded");
        }
    }

    /// Drop the runtime's pending commands after a local failure
    pub(crate) fn clear_runtime_app_stack(&self) {
        let Some(runtime) = &self.runtime else {
            return;
        };
        match runtime.try_borrow_mut() {
            Ok(mut runtime) => {
                if let Err(e) = runtime.clear_app_stack() {
                    tracing::warn!(err_code = e.code(), "pending stack not cleared");
                }
            }
            Err(_) => tracing::warn!("pending stack not cleared, runtime in use"),
        }
    }
}
