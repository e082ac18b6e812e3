//! Argument declaration and validation for scriptable commands
//!
//! A scriptable command declares each argument key with a set of flags and
//! an optional default before anything can set, read or query it. Values
//! are kept in their literal text form.

use crate::errors::{CommandError, Result};
use bitflags::bitflags;
use cmdstack_core_types::Sensitive;
use std::collections::BTreeMap;

bitflags! {
    /// Bitset of argument flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArgFlags: u8 {
        /// The argument may be left unset
        const OPTIONAL = 1;
        /// The argument value is kept out of logs and history descriptions
        const DONT_LOG = 2;
        /// Resolved from its path before execution
        const IN = 4;
        /// Written back to its path after execution
        const OUT = 8;
        /// Both resolved before and written back after execution
        const IO = 16;
    }
}

impl ArgFlags {
    pub fn is_input(&self) -> bool {
        self.intersects(ArgFlags::IN | ArgFlags::IO)
    }

    pub fn is_output(&self) -> bool {
        self.intersects(ArgFlags::OUT | ArgFlags::IO)
    }

    pub fn is_optional(&self) -> bool {
        self.intersects(ArgFlags::OPTIONAL)
    }

    pub fn is_hidden(&self) -> bool {
        self.intersects(ArgFlags::DONT_LOG)
    }

    /// Bracketed type/flag summary, e.g. `[String, optional, IN]`
    pub fn describe(&self, type_label: &str) -> String {
        let mut specs = format!("[{}", type_label);
        let labels = [
            (ArgFlags::OPTIONAL, "optional"),
            (ArgFlags::DONT_LOG, "dont-log"),
            (ArgFlags::IN, "IN"),
            (ArgFlags::OUT, "OUT"),
            (ArgFlags::IO, "IO"),
        ];
        for (flag, label) in labels {
            if self.intersects(flag) {
                specs.push_str(", ");
                specs.push_str(label);
            }
        }
        specs.push(']');
        specs
    }
}

/// Argument capability of a command
///
/// Every accessor except `has_arg` fails with a validation error when the
/// key is empty or was never declared.
pub trait Scriptable {
    /// Record the registry-assigned command name used in error messages
    fn bind_command_name(&mut self, name: &str);

    /// Declare an argument; a non-empty default is applied immediately
    ///
    /// # Errors
    ///
    /// Fails if `key` is empty.
    fn declare_arg(&mut self, key: &str, flags: ArgFlags, default: &str) -> Result<()>;

    fn has_arg(&self, key: &str) -> bool;

    /// # Errors
    ///
    /// Fails if `key` is empty or undeclared.
    fn has_arg_flag(&self, key: &str, flag: ArgFlags) -> Result<bool>;

    /// Declared keys in sorted order
    fn arg_keys(&self) -> Vec<String>;

    fn is_arg_set(&self, key: &str) -> bool;

    /// Literal form of the argument value (empty if unset)
    ///
    /// # Errors
    ///
    /// Fails if `key` is undeclared.
    fn get_arg(&self, key: &str) -> Result<String>;

    /// # Errors
    ///
    /// Fails if `key` is empty or undeclared, or the value does not parse.
    fn set_arg(&mut self, key: &str, value: &str) -> Result<()>;

    /// # Errors
    ///
    /// Fails on the first non-optional argument that is not set.
    fn validate_set_args(&self) -> Result<()>;

    /// One line per argument: key, type/flags, value and default
    fn args_description(&self) -> String;

    /// Type/flag summary of one argument, empty if undeclared
    fn arg_type_specs(&self, key: &str) -> String;
}

#[derive(Debug, Clone)]
struct ArgSpec {
    flags: ArgFlags,
    default: String,
}

/// Plain-text argument table
#[derive(Debug, Clone, Default)]
pub struct ArgTable {
    command: String,
    specs: BTreeMap<String, ArgSpec>,
    values: BTreeMap<String, String>,
}

impl ArgTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_name(&self) -> &str {
        &self.command
    }

    fn check_key(&self, key: &str) -> Result<&ArgSpec> {
        if key.is_empty() {
            return Err(CommandError::EmptyArgKey {
                command: self.command.clone(),
            }
            .into());
        }
        self.specs.get(key).ok_or_else(|| {
            CommandError::UnknownArg {
                command: self.command.clone(),
                key: key.to_string(),
            }
            .into()
        })
    }
}

impl Scriptable for ArgTable {
    fn bind_command_name(&mut self, name: &str) {
        self.command = name.to_string();
    }

    fn declare_arg(&mut self, key: &str, flags: ArgFlags, default: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CommandError::EmptyArgKey {
                command: self.command.clone(),
            }
            .into());
        }
        self.specs.insert(
            key.to_string(),
            ArgSpec {
                flags,
                default: default.to_string(),
            },
        );
        if !default.is_empty() {
            self.set_arg(key, default)?;
        }
        Ok(())
    }

    fn has_arg(&self, key: &str) -> bool {
        self.specs.contains_key(key)
    }

    fn has_arg_flag(&self, key: &str, flag: ArgFlags) -> Result<bool> {
        Ok(self.check_key(key)?.flags.intersects(flag))
    }

    fn arg_keys(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }

    fn is_arg_set(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !v.is_empty())
    }

    fn get_arg(&self, key: &str) -> Result<String> {
        self.check_key(key)?;
        Ok(self.values.get(key).cloned().unwrap_or_default())
    }

    fn set_arg(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_key(key)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn validate_set_args(&self) -> Result<()> {
        for (key, spec) in &self.specs {
            if !spec.flags.is_optional() && !self.is_arg_set(key) {
                return Err(CommandError::ArgNotSet {
                    command: self.command.clone(),
                    key: key.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn args_description(&self) -> String {
        self.specs
            .iter()
            .map(|(key, spec)| {
                let value = Sensitive::new(self.values.get(key).cloned().unwrap_or_default());
                let mut line = format!(
                    "    [{}], opt: {}, val: {}",
                    key,
                    spec.flags.describe("String"),
                    value.render(spec.flags.is_hidden())
                );
                if !spec.default.is_empty() {
                    line.push_str(&format!(", defVal: {}", spec.default));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn arg_type_specs(&self, key: &str) -> String {
        self.specs
            .get(key)
            .map(|spec| spec.flags.describe("String"))
            .unwrap_or_default()
    }
}
