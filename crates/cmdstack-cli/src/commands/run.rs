//! Run command
//!
//! Usage: cmdstack run <SCRIPT> [--config <PATH>] [--with-args]
//!
//! A session script seeds an in-memory resolver and replays steps:
//!
//! ```toml
//! [config]
//! debug_mode = "debug"
//!
//! [values.node1]
//! x = 2.0
//!
//! [[step]]
//! action = "do"
//! command = "setPathValue"
//! args = { target = "<node1.x>", newValue = "5.0" }
//! merge_group = "drag"
//!
//! [[step]]
//! action = "undo"
//! ```

use clap::Args;
use cmdstack_core::{CommandManager, ManagerConfig, MemoryResolver, Value, NO_MERGE_ID};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Name the script's values are registered under
pub const SESSION_RESOLVER: &str = "session";

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Session script (TOML)
    pub script: PathBuf,

    /// Manager config file, replaces the script's [config] table
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print argument descriptions with the stacks
    #[arg(long)]
    pub with_args: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub config: Option<ManagerConfig>,
    #[serde(default)]
    pub values: toml::Table,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    Do {
        command: String,
        #[serde(default)]
        args: BTreeMap<String, String>,
        /// Steps sharing a group name merge into one undo entry
        #[serde(default)]
        merge_group: Option<String>,
    },
    Undo,
    Redo,
    Clear,
}

/// Execute run command
pub fn execute(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("cannot read '{}': {}", args.script.display(), e))?;
    let script: Script = toml::from_str(&text)?;

    let config = match &args.config {
        Some(path) => ManagerConfig::from_path(path)?,
        None => script.config.clone().unwrap_or_default(),
    };

    let manager = replay(&script, config)?;

    print!("{}", manager.content(args.with_args));
    println!();
    println!("--> Values:");
    for path in value_paths(&script.values) {
        match manager.resolvers().value_at(&path)? {
            Some(value) => println!("{} = {}", path, value),
            None => println!("{} = <unset>", path),
        }
    }
    Ok(())
}

/// Build a manager for the script and run its steps in order
pub fn replay(
    script: &Script,
    config: ManagerConfig,
) -> Result<CommandManager, Box<dyn std::error::Error>> {
    let mut manager = super::new_manager(config)?;

    let mut resolver = MemoryResolver::new();
    for (path, value) in flatten_values(&script.values)? {
        resolver.insert(path, value);
    }
    manager
        .resolvers_mut()
        .register_resolver(SESSION_RESOLVER, Box::new(resolver));

    let mut groups: BTreeMap<String, i32> = BTreeMap::new();
    for (index, step) in script.steps.iter().enumerate() {
        let outcome = match step {
            Step::Do {
                command,
                args,
                merge_group,
            } => {
                let merge_id = match merge_group {
                    Some(group) => *groups
                        .entry(group.clone())
                        .or_insert_with(|| manager.get_new_merge_id()),
                    None => NO_MERGE_ID,
                };
                manager.create_command(command, args, true, merge_id).map(|_| ())
            }
            Step::Undo => manager.undo_command().map(|_| ()),
            Step::Redo => manager.redo_command().map(|_| ()),
            Step::Clear => manager.clear(),
        };
        outcome.map_err(|e| format!("step {}: {}", index + 1, e.report()))?;
    }

    Ok(manager)
}

/// Dotted paths and values of the script's value tables
pub fn flatten_values(
    table: &toml::Table,
) -> Result<Vec<(String, Value)>, Box<dyn std::error::Error>> {
    let mut out = Vec::new();
    flatten_into("", table, &mut out)?;
    Ok(out)
}

fn flatten_into(
    prefix: &str,
    table: &toml::Table,
    out: &mut Vec<(String, Value)>,
) -> Result<(), Box<dyn std::error::Error>> {
    for (key, item) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let value = match item {
            toml::Value::Table(inner) => {
                flatten_into(&path, inner, out)?;
                continue;
            }
            toml::Value::Boolean(b) => Value::Boolean(*b),
            toml::Value::Integer(i) => Value::Integer(*i),
            toml::Value::Float(f) => Value::Float(*f),
            toml::Value::String(s) => Value::String(s.clone()),
            other => {
                return Err(format!(
                    "value '{}' has unsupported type {}",
                    path,
                    other.type_str()
                )
                .into())
            }
        };
        out.push((path, value));
    }
    Ok(())
}

fn value_paths(table: &toml::Table) -> Vec<String> {
    flatten_values(table)
        .map(|values| values.into_iter().map(|(path, _)| path).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Script {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_nested_values_flatten_to_dotted_paths() {
        let script = parse(
            r#"
            [values]
            top = true
            [values.node1]
            x = 2.0
            label = "cube"
            "#,
        );

        let values = flatten_values(&script.values).unwrap();

        assert!(values.contains(&("top".to_string(), Value::Boolean(true))));
        assert!(values.contains(&("node1.x".to_string(), Value::Float(2.0))));
        assert!(values.contains(&("node1.label".to_string(), Value::String("cube".to_string()))));
    }

    #[test]
    fn test_arrays_are_rejected() {
        let script = parse("[values]\nlist = [1, 2]\n");

        let err = flatten_values(&script.values).unwrap_err();

        assert!(err.to_string().contains("'list'"));
    }

    #[test]
    fn test_merge_groups_coalesce_steps() {
        let script = parse(
            r#"
            [values.node1]
            x = 2.0

            [[step]]
            action = "do"
            command = "setPathValue"
            args = { target = "<node1.x>", newValue = "5" }
            merge_group = "drag"

            [[step]]
            action = "do"
            command = "setPathValue"
            args = { target = "<node1.x>", newValue = "9" }
            merge_group = "drag"
            "#,
        );

        let manager = replay(&script, ManagerConfig::default()).unwrap();

        assert_eq!(manager.undo_stack().len(), 1);
        assert_eq!(
            manager.resolvers().value_at("node1.x").unwrap(),
            Some(Value::Float(9.0))
        );
    }

    #[test]
    fn test_undo_redo_and_clear_steps() {
        let script = parse(
            r#"
            [values]
            n = 1

            [[step]]
            action = "do"
            command = "setPathValue"
            args = { target = "<n>", newValue = "4" }

            [[step]]
            action = "undo"

            [[step]]
            action = "redo"

            [[step]]
            action = "clear"
            "#,
        );

        let manager = replay(&script, ManagerConfig::default()).unwrap();

        assert_eq!(manager.count(), 0);
        assert_eq!(
            manager.resolvers().value_at("n").unwrap(),
            Some(Value::Integer(4))
        );
    }

    #[test]
    fn test_failing_step_is_numbered() {
        let script = parse(
            r#"
            [[step]]
            action = "undo"

            [[step]]
            action = "do"
            command = "missing"
            "#,
        );

        let err = replay(&script, ManagerConfig::default()).err().unwrap();

        assert!(err.to_string().starts_with("step 2: [ERR_NOT_REGISTERED]"));
    }
}
