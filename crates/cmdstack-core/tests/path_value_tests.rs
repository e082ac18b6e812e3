#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use cmdstack_core::{
    register_builtin_commands, ArgInput, CommandManager, ExErrorKind, MemoryResolver, PathValue,
    ResolverRegistry, Result, Value, ValueType, NO_MERGE_ID, SET_PATH_VALUE,
};
use common::{args, new_scene, register_test_commands};
use std::collections::BTreeMap;

fn manager_with_scene() -> CommandManager {
    let mut manager = CommandManager::new();
    register_builtin_commands(manager.registry_mut()).unwrap();
    manager.resolvers_mut().register_resolver(
        "scene",
        Box::new(
            MemoryResolver::with_prefix("node1")
                .with_value("node1.x", 2.0)
                .with_value("node1.label", "cube"),
        ),
    );
    manager
}

fn set_path_value(manager: &mut CommandManager, path: &str, value: &str, merge_id: i32) -> Result<()> {
    manager
        .create_command(
            SET_PATH_VALUE,
            &args(&[("target", &format!("<{}>", path)), ("newValue", value)]),
            true,
            merge_id,
        )
        .map(|_| ())
}

fn x(manager: &CommandManager) -> Option<Value> {
    manager.resolvers().value_at("node1.x").unwrap()
}

#[test]
fn test_set_undo_redo_through_resolver() {
    // GIVEN node1.x holding 2.0
    let mut manager = manager_with_scene();

    // WHEN it is set to 5.0
    set_path_value(&mut manager, "node1.x", "5.0", NO_MERGE_ID).unwrap();

    // THEN undo and redo move the value back and forth
    assert_eq!(x(&manager), Some(Value::Float(5.0)));
    manager.undo_command().unwrap();
    assert_eq!(x(&manager), Some(Value::Float(2.0)));
    manager.redo_command().unwrap();
    assert_eq!(x(&manager), Some(Value::Float(5.0)));
}

#[test]
fn test_merged_sets_undo_to_first_value() {
    // GIVEN node1.x holding 2.0 and one merge id
    let mut manager = manager_with_scene();
    let merge_id = manager.get_new_merge_id();

    // WHEN it is set to 5 then 9 with that merge id
    set_path_value(&mut manager, "node1.x", "5", merge_id).unwrap();
    set_path_value(&mut manager, "node1.x", "9", merge_id).unwrap();

    // THEN a single entry remains whose undo restores 2.0
    assert_eq!(manager.undo_stack().len(), 1);
    assert_eq!(x(&manager), Some(Value::Float(9.0)));
    manager.undo_command().unwrap();
    assert_eq!(x(&manager), Some(Value::Float(2.0)));
    manager.redo_command().unwrap();
    assert_eq!(x(&manager), Some(Value::Float(9.0)));
}

#[test]
fn test_new_value_is_cast_to_target_type() {
    let mut manager = manager_with_scene();

    set_path_value(&mut manager, "node1.label", "\"sphere\"", NO_MERGE_ID).unwrap();

    assert_eq!(
        manager.resolvers().value_at("node1.label").unwrap(),
        Some(Value::String("sphere".to_string()))
    );
}

#[test]
fn test_incompatible_new_value_fails_cleanly() {
    let mut manager = manager_with_scene();

    let err = set_path_value(&mut manager, "node1.x", "\"tall\"", NO_MERGE_ID).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::ExecutionFailed);
    assert_eq!(manager.count(), 0);
    assert_eq!(x(&manager), Some(Value::Float(2.0)));
}

#[test]
fn test_unknown_path_is_unresolvable() {
    let mut manager = manager_with_scene();

    let err = set_path_value(&mut manager, "node2.x", "1.0", NO_MERGE_ID).unwrap_err();

    assert!(err.has_kind(ExErrorKind::PathUnresolvable));
    let resolve = err
        .chain()
        .find(|e| e.kind() == ExErrorKind::PathUnresolvable)
        .unwrap();
    assert_eq!(
        resolve.message(),
        "argument 'target' of command 'setPathValue', cannot resolve path 'node2.x'"
    );
    assert_eq!(resolve.arg(), Some("target"));
    assert_eq!(manager.count(), 0);
}

#[test]
fn test_undo_fails_once_resolver_is_gone() {
    // GIVEN an executed set whose resolver is then unregistered
    let mut manager = manager_with_scene();
    set_path_value(&mut manager, "node1.x", "5.0", NO_MERGE_ID).unwrap();
    assert!(manager.resolvers_mut().unregister_resolver("scene"));

    // WHEN undone
    let err = manager.undo_command().unwrap_err();

    // THEN the entry stays undoable
    assert!(err.has_kind(ExErrorKind::PathUnresolvable));
    assert_eq!(manager.undo_stack().len(), 1);
}

#[test]
fn test_typed_values_and_path_values() {
    let mut manager = manager_with_scene();
    let mut values = BTreeMap::new();
    values.insert("target".to_string(), ArgInput::from(PathValue::at("node1.x")));
    values.insert("newValue".to_string(), ArgInput::from(Value::Float(3.5)));

    manager
        .create_command_with_values(SET_PATH_VALUE, values, true, NO_MERGE_ID)
        .unwrap();

    assert_eq!(x(&manager), Some(Value::Float(3.5)));
}

#[test]
fn test_typed_values_rejected_by_plain_commands() {
    let scene = new_scene();
    let mut manager = manager_with_scene();
    register_test_commands(&mut manager, &scene);
    let mut values = BTreeMap::new();
    values.insert("key".to_string(), ArgInput::from(Value::Integer(3)));

    let err = manager
        .create_command_with_values("add", values, true, NO_MERGE_ID)
        .err()
        .expect("typed value rejected");

    assert_eq!(err.kind(), ExErrorKind::ValidationFailed);
    assert_eq!(err.command(), Some("add"));

    let mut text = BTreeMap::new();
    text.insert("key".to_string(), ArgInput::from("a"));
    manager
        .create_command_with_values("add", text, true, NO_MERGE_ID)
        .unwrap();
    assert_eq!(common::value_of(&scene, "a"), 1);
}

// ===== Resolver dispatch =====

#[test]
fn test_first_matching_resolver_answers() {
    let mut registry = ResolverRegistry::new();
    registry.register_resolver(
        "first",
        Box::new(MemoryResolver::new().with_value("shared", 1_i64)),
    );
    registry.register_resolver(
        "second",
        Box::new(
            MemoryResolver::new()
                .with_value("shared", 2_i64)
                .with_value("only.second", true),
        ),
    );

    assert_eq!(registry.value_at("shared").unwrap(), Some(Value::Integer(1)));
    assert_eq!(registry.resolver_name(&PathValue::at("shared")), Some("first"));
    assert_eq!(
        registry.resolver_name(&PathValue::at("only.second")),
        Some("second")
    );
    assert_eq!(
        registry.get_type(&PathValue::at("only.second")).unwrap(),
        ValueType::Boolean
    );
}

#[test]
fn test_set_value_only_reaches_first_match() {
    let mut registry = ResolverRegistry::new();
    registry.register_resolver("first", Box::new(MemoryResolver::new().with_value("p", 1_i64)));
    registry.register_resolver("second", Box::new(MemoryResolver::new().with_value("p", 1_i64)));

    registry
        .set_value(&PathValue::at("p").with_value(7_i64))
        .unwrap();

    let read = |name: &str| {
        let mut value = PathValue::at("p");
        registry.resolver(name).unwrap().get_value(&mut value).unwrap();
        value.value
    };
    assert_eq!(read("first"), Some(Value::Integer(7)));
    assert_eq!(read("second"), Some(Value::Integer(1)));
}

#[test]
fn test_unknown_path_errors() {
    let registry = ResolverRegistry::new();

    let err = registry.value_at("nowhere").unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::PathUnresolvable);
    assert_eq!(err.code(), "ERR_PATH_UNRESOLVABLE");
    assert!(!registry.known_path(&PathValue::at("nowhere")));
}

#[test]
fn test_reregistering_replaces_in_place() {
    let mut registry = ResolverRegistry::new();
    registry.register_resolver("a", Box::new(MemoryResolver::new().with_value("p", 1_i64)));
    registry.register_resolver("b", Box::new(MemoryResolver::new().with_value("p", 2_i64)));

    registry.register_resolver("a", Box::new(MemoryResolver::new().with_value("p", 3_i64)));

    assert_eq!(registry.resolver_names(), vec!["a", "b"]);
    assert_eq!(registry.value_at("p").unwrap(), Some(Value::Integer(3)));
}
