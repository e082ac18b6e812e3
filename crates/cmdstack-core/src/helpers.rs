//! Help and history text built from argument declarations

use crate::args::ArgFlags;
use crate::command::Command;
use crate::errors::{CommandError, Result};
use crate::value::cast_to_path;
use std::collections::BTreeMap;

/// Type/flag summary of one argument, empty if the command has no such argument
pub fn args_type_specs(cmd: &dyn Command, key: &str) -> String {
    cmd.as_scriptable()
        .map(|s| s.arg_type_specs(key))
        .unwrap_or_default()
}

/// Help text listing each documented argument
///
/// ```text
/// <command help>
/// Arguments:
/// - key[String, optional]: text
/// ```
///
/// # Errors
///
/// Fails if the command does not take arguments.
pub fn create_help_from_args(
    cmd: &dyn Command,
    command_help: &str,
    args_help: &BTreeMap<String, String>,
) -> Result<String> {
    if cmd.as_scriptable().is_none() {
        return Err(CommandError::NotScriptable {
            command: cmd.name().to_string(),
        }
        .into());
    }
    Ok(render_help(cmd, command_help, args_help, false))
}

/// Like `create_help_from_args`, for typed-argument commands
///
/// Documented keys the command does not declare are skipped.
///
/// # Errors
///
/// Fails if the command does not take typed arguments.
pub fn create_help_from_rtval_args(
    cmd: &dyn Command,
    command_help: &str,
    args_help: &BTreeMap<String, String>,
) -> Result<String> {
    if cmd.as_rtval_scriptable().is_none() {
        return Err(CommandError::NotTypedScriptable {
            command: cmd.name().to_string(),
        }
        .into());
    }
    Ok(render_help(cmd, command_help, args_help, true))
}

fn render_help(
    cmd: &dyn Command,
    command_help: &str,
    args_help: &BTreeMap<String, String>,
    declared_only: bool,
) -> String {
    let mut help = format!("{}\n", command_help);
    if !args_help.is_empty() {
        help.push_str("Arguments:\n");
    }
    for (key, text) in args_help {
        let declared = cmd.as_scriptable().is_some_and(|s| s.has_arg(key));
        if declared_only && !declared {
            continue;
        }
        help.push_str(&format!("- {}{}: {}\n", key, args_type_specs(cmd, key), text));
    }
    help
}

/// History line of the form `name(key="value", other="<path>")`
///
/// Keys whose typed argument is bound to a path are shown in angle brackets.
///
/// # Errors
///
/// Fails if the command does not take arguments.
pub fn create_history_desc_from_args(
    cmd: &dyn Command,
    args_desc: &BTreeMap<String, String>,
) -> Result<String> {
    if cmd.as_scriptable().is_none() {
        return Err(CommandError::NotScriptable {
            command: cmd.name().to_string(),
        }
        .into());
    }
    let mut desc = cmd.name().to_string();
    if args_desc.is_empty() {
        return Ok(desc);
    }
    let rtval = cmd.as_rtval_scriptable();
    let parts: Vec<String> = args_desc
        .iter()
        .map(|(key, value)| {
            let bound = rtval
                .and_then(|r| r.rtval_arg_path(key).ok())
                .is_some_and(|p| !p.is_empty());
            let shown = if bound {
                cast_to_path(value)
            } else {
                value.clone()
            };
            format!("{}=\"{}\"", key, shown)
        })
        .collect();
    desc.push('(');
    desc.push_str(&parts.join(", "));
    desc.push(')');
    Ok(desc)
}

/// History line built from every set, loggable argument of the command
///
/// Path-bound typed arguments contribute their path; arguments flagged
/// `DONT_LOG` are left out.
///
/// # Errors
///
/// Fails if the command does not take arguments.
pub fn history_desc_from_set_args(cmd: &dyn Command) -> Result<String> {
    let scriptable = cmd.as_scriptable().ok_or_else(|| CommandError::NotScriptable {
        command: cmd.name().to_string(),
    })?;
    let rtval = cmd.as_rtval_scriptable();
    let mut args = BTreeMap::new();
    for key in scriptable.arg_keys() {
        if scriptable.has_arg_flag(&key, ArgFlags::DONT_LOG)? || !scriptable.is_arg_set(&key) {
            continue;
        }
        let path = rtval
            .and_then(|r| r.rtval_arg_path(&key).ok())
            .unwrap_or_default();
        let shown = if path.is_empty() {
            scriptable.get_arg(&key)?
        } else {
            path
        };
        args.insert(key, shown);
    }
    create_history_desc_from_args(cmd, &args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ArgTable, Scriptable};
    use crate::command::CommandCore;
    use crate::manager::CommandManager;

    struct Rename {
        core: CommandCore,
        args: ArgTable,
    }

    impl Rename {
        fn new() -> Self {
            let mut args = ArgTable::new();
            args.declare_arg("name", ArgFlags::IN, "").unwrap();
            args.declare_arg("token", ArgFlags::DONT_LOG | ArgFlags::OPTIONAL, "")
                .unwrap();
            let mut cmd = Self {
                core: CommandCore::new(),
                args,
            };
            cmd.registration_callback("rename");
            cmd
        }
    }

    impl Command for Rename {
        fn core(&self) -> &CommandCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut CommandCore {
            &mut self.core
        }

        fn do_it(&mut self, _manager: &mut CommandManager) -> Result<bool> {
            Ok(true)
        }

        fn as_scriptable(&self) -> Option<&dyn Scriptable> {
            Some(&self.args)
        }

        fn as_scriptable_mut(&mut self) -> Option<&mut dyn Scriptable> {
            Some(&mut self.args)
        }
    }

    #[test]
    fn test_help_lists_arguments() {
        let cmd = Rename::new();
        let mut docs = BTreeMap::new();
        docs.insert("name".to_string(), "new name".to_string());
        let help = create_help_from_args(&cmd, "Rename a node", &docs).unwrap();
        assert_eq!(
            help,
            "Rename a node\nArguments:\n- name[String, IN]: new name\n"
        );
    }

    #[test]
    fn test_rtval_help_requires_typed_args() {
        let cmd = Rename::new();
        let err = create_help_from_rtval_args(&cmd, "x", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("does not accept typed values"));
    }

    #[test]
    fn test_history_desc_from_set_args_skips_hidden() {
        let mut cmd = Rename::new();
        cmd.args.set_arg("name", "cube").unwrap();
        cmd.args.set_arg("token", "secret").unwrap();
        assert_eq!(
            history_desc_from_set_args(&cmd).unwrap(),
            "rename(name=\"cube\")"
        );
    }

    #[test]
    fn test_history_desc_without_args_is_name() {
        let cmd = Rename::new();
        assert_eq!(
            create_history_desc_from_args(&cmd, &BTreeMap::new()).unwrap(),
            "rename"
        );
    }
}
