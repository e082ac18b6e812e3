//! Typed (path-value) arguments
//!
//! Each typed argument holds a `PathValue` and, for arguments whose type is
//! not known yet, the literal JSON text it was set from. The JSON is only
//! turned into a typed value once a caller asks for it with a concrete type.

use crate::args::{ArgFlags, Scriptable};
use crate::errors::{CommandError, ExError, Result};
use crate::value::{cast_from_path, cast_to_path, PathValue, Value, ValueType};
use cmdstack_core_types::Sensitive;
use std::collections::BTreeMap;

/// Typed-argument capability of a command
pub trait RtvalScriptable: Scriptable {
    /// Declare a typed argument
    ///
    /// # Errors
    ///
    /// Fails if `key` is empty.
    fn declare_rtval_arg(
        &mut self,
        key: &str,
        ty: ValueType,
        flags: ArgFlags,
        default: Option<Value>,
    ) -> Result<()>;

    /// Current type of the argument (`Any` while unknown)
    ///
    /// # Errors
    ///
    /// Fails if `key` is undeclared.
    fn rtval_arg_type(&self, key: &str) -> Result<ValueType>;

    /// # Errors
    ///
    /// Fails if `key` is undeclared.
    fn rtval_arg_path(&self, key: &str) -> Result<String>;

    /// # Errors
    ///
    /// Fails if `key` is undeclared.
    fn rtval_arg(&self, key: &str) -> Result<PathValue>;

    /// Typed value of the argument, if any
    ///
    /// # Errors
    ///
    /// Fails if `key` is undeclared, or the argument was only set as JSON
    /// and has no typed value yet.
    fn rtval_arg_value(&self, key: &str) -> Result<Option<Value>>;

    /// Typed value of the argument converted to `ty`
    ///
    /// Fixes the argument type to `ty` if it was unknown and parses any
    /// pending JSON text with it.
    ///
    /// # Errors
    ///
    /// Fails if `key` is undeclared, unset, or not convertible to `ty`.
    fn rtval_arg_value_as(&mut self, key: &str, ty: ValueType) -> Result<Value>;

    /// Replace the whole path-value; a typed value fixes the argument type
    ///
    /// # Errors
    ///
    /// Fails if `key` is undeclared.
    fn set_rtval_arg(&mut self, key: &str, value: PathValue) -> Result<()>;

    /// Replace the value while keeping the path
    ///
    /// # Errors
    ///
    /// Fails if `key` is undeclared.
    fn set_rtval_arg_value(&mut self, key: &str, value: Value) -> Result<()>;
}

#[derive(Debug, Clone)]
struct RtvalArgSpec {
    ty: ValueType,
    flags: ArgFlags,
    default: Option<Value>,
}

#[derive(Debug, Clone, Default)]
struct RtvalArgState {
    value: PathValue,
    json: String,
}

/// Typed argument table
#[derive(Debug, Clone, Default)]
pub struct RtvalArgTable {
    command: String,
    specs: BTreeMap<String, RtvalArgSpec>,
    args: BTreeMap<String, RtvalArgState>,
}

impl RtvalArgTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn empty_key(&self) -> ExError {
        CommandError::EmptyArgKey {
            command: self.command.clone(),
        }
        .into()
    }

    fn unknown(&self, key: &str) -> ExError {
        CommandError::UnknownArg {
            command: self.command.clone(),
            key: key.to_string(),
        }
        .into()
    }

    fn spec(&self, key: &str) -> Result<&RtvalArgSpec> {
        self.specs.get(key).ok_or_else(|| self.unknown(key))
    }

    fn state(&self, key: &str) -> Result<&RtvalArgState> {
        self.args.get(key).ok_or_else(|| self.unknown(key))
    }

    fn invalid(&self, key: &str, reason: impl ToString) -> ExError {
        CommandError::InvalidArgValue {
            command: self.command.clone(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

impl Scriptable for RtvalArgTable {
    fn bind_command_name(&mut self, name: &str) {
        self.command = name.to_string();
    }

    fn declare_arg(&mut self, key: &str, flags: ArgFlags, default: &str) -> Result<()> {
        self.declare_rtval_arg(key, ValueType::Any, flags, None)?;
        if !default.is_empty() {
            self.set_arg(key, default)?;
        }
        Ok(())
    }

    fn has_arg(&self, key: &str) -> bool {
        self.specs.contains_key(key)
    }

    fn has_arg_flag(&self, key: &str, flag: ArgFlags) -> Result<bool> {
        if key.is_empty() {
            return Err(self.empty_key());
        }
        Ok(self.spec(key)?.flags.intersects(flag))
    }

    fn arg_keys(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }

    fn is_arg_set(&self, key: &str) -> bool {
        let (Some(spec), Some(state)) = (self.specs.get(key), self.args.get(key)) else {
            return false;
        };
        let typed = state
            .value
            .value
            .as_ref()
            .is_some_and(|v| !spec.ty.is_known() || v.value_type() == spec.ty);
        typed || state.value.has_path() || !state.json.is_empty()
    }

    fn get_arg(&self, key: &str) -> Result<String> {
        let state = self.state(key)?;
        if !state.json.is_empty() {
            return Ok(state.json.clone());
        }
        Ok(state
            .value
            .value
            .as_ref()
            .map(Value::to_json)
            .unwrap_or_default())
    }

    fn set_arg(&mut self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(self.empty_key());
        }
        let ty = self.spec(key)?.ty;
        if let Some(path) = cast_from_path(value) {
            self.set_rtval_arg(key, PathValue::at(path))
        } else if ty.is_known() {
            let typed = Value::from_json(value, ty).map_err(|e| self.invalid(key, e))?;
            self.set_rtval_arg_value(key, typed)
        } else {
            let state = self.args.entry(key.to_string()).or_default();
            state.json = value.to_string();
            Ok(())
        }
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
                let path = self
                    .args
                    .get(key)
                    .map(|s| s.value.path.clone())
                    .unwrap_or_default();
                let value = Sensitive::new(self.get_arg(key).unwrap_or_default());
                let mut line = format!(
                    "    [{}], opt: {}, path: {}, val: {}",
                    key,
                    self.arg_type_specs(key),
                    cast_to_path(&path),
                    value.render(spec.flags.is_hidden())
                );
                if let Some(default) = &spec.default {
                    line.push_str(&format!(", defVal: {}", default));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn arg_type_specs(&self, key: &str) -> String {
        self.specs
            .get(key)
            .map(|spec| spec.flags.describe(&format!("PathValue({})", spec.ty)))
            .unwrap_or_default()
    }
}

impl RtvalScriptable for RtvalArgTable {
    fn declare_rtval_arg(
        &mut self,
        key: &str,
        ty: ValueType,
        flags: ArgFlags,
        default: Option<Value>,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(self.empty_key());
        }
        let value = PathValue {
            path: String::new(),
            value: default.clone(),
        };
        self.specs
            .insert(key.to_string(), RtvalArgSpec { ty, flags, default });
        self.args.insert(
            key.to_string(),
            RtvalArgState {
                value,
                json: String::new(),
            },
        );
        Ok(())
    }

    fn rtval_arg_type(&self, key: &str) -> Result<ValueType> {
        Ok(self.spec(key)?.ty)
    }

    fn rtval_arg_path(&self, key: &str) -> Result<String> {
        Ok(self.state(key)?.value.path.clone())
    }

    fn rtval_arg(&self, key: &str) -> Result<PathValue> {
        Ok(self.state(key)?.value.clone())
    }

    fn rtval_arg_value(&self, key: &str) -> Result<Option<Value>> {
        let state = self.state(key)?;
        if state.value.value.is_none() && !state.json.is_empty() {
            return Err(self.invalid(
                key,
                "set as JSON only, request it with an explicit type",
            ));
        }
        Ok(state.value.value.clone())
    }

    fn rtval_arg_value_as(&mut self, key: &str, ty: ValueType) -> Result<Value> {
        let current = self.spec(key)?.ty;
        if !current.is_known() {
            if let Some(spec) = self.specs.get_mut(key) {
                spec.ty = ty;
            }
        }
        let json = self.state(key)?.json.clone();
        if !json.is_empty() {
            let parse_as = self.spec(key)?.ty;
            let typed = Value::from_json(&json, parse_as).map_err(|e| self.invalid(key, e))?;
            if let Some(state) = self.args.get_mut(key) {
                state.value.value = Some(typed);
            }
        }
        let value = self.state(key)?.value.value.clone().ok_or_else(|| {
            ExError::from(CommandError::ArgNotSet {
                command: self.command.clone(),
                key: key.to_string(),
            })
        })?;
        value.cast_to(ty).map_err(|e| self.invalid(key, e))
    }

    fn set_rtval_arg(&mut self, key: &str, value: PathValue) -> Result<()> {
        let Some(spec) = self.specs.get_mut(key) else {
            return Err(self.unknown(key));
        };
        if let Some(ty) = value.value_type() {
            spec.ty = ty;
        }
        self.args.insert(
            key.to_string(),
            RtvalArgState {
                value,
                json: String::new(),
            },
        );
        Ok(())
    }

    fn set_rtval_arg_value(&mut self, key: &str, value: Value) -> Result<()> {
        let mut pv = self.rtval_arg(key)?;
        pv.value = Some(value);
        self.set_rtval_arg(key, pv)
    }
}
