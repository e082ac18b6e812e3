//! cmdstack Core - undoable command execution engine
//!
//! This crate provides the command machinery of an interactive editor:
//! - The `Command` contract with optional argument capabilities
//! - Text and typed (path-value) arguments with declaration and validation
//! - Command registry with native and runtime-bridged implementations
//! - Path-value resolvers addressing values outside the engine
//! - `CommandManager`: undo/redo stacks, sub-commands, merging and rollback
//! - Synchronization bridge with an external command runtime
//! - Structured logging facility and error taxonomy

pub mod args;
pub mod bridge;
pub mod command;
pub mod config;
pub mod errors;
pub mod events;
pub mod helpers;
pub mod logging_facility;
pub mod manager;
pub mod registry;
pub mod resolver;
pub mod rtval_args;
pub mod set_path_value;
pub mod value;

// The logging macros refer to schema constants through this path.
pub use cmdstack_core_types as core_types;

// Re-export commonly used types
pub use args::{ArgFlags, ArgTable, Scriptable};
pub use bridge::{BridgedCommand, ExternalRuntime, RuntimeHandle};
pub use command::{Command, CommandCore, MergeDecision, NO_MERGE_ID};
pub use config::{DebugMode, ManagerConfig};
pub use errors::{CommandError, ExError, ExErrorKind, Result, Severity};
pub use events::{ManagerEvent, ManagerListener, ScriptHistory};
pub use manager::{ArgInput, CommandManager, StackedCommand};
pub use registry::{CommandRegistry, ImplementationKind};
pub use resolver::{MemoryResolver, PathValueResolver, ResolverRegistry};
pub use rtval_args::{RtvalArgTable, RtvalScriptable};
pub use set_path_value::{register_builtin_commands, SetPathValueCommand, SET_PATH_VALUE};
pub use value::{PathValue, Value, ValueType};
