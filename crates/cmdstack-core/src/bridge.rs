//! External-runtime synchronization bridge
//!
//! Some commands live in a second command system (an embedded scripting
//! runtime with its own registry and undo stack). The bridge keeps both
//! sides consistent:
//!
//! - registry names known on one side only are registered on the other
//! - commands the runtime queued for the host are created and executed
//!   locally
//! - commands the runtime already executed are wrapped in `BridgedCommand`
//!   proxies so they take part in local undo/redo
//! - merge id counters are kept in step
//!
//! The runtime is shared between the manager and every proxy through a
//! `RuntimeHandle`. Everything is single-threaded.

pub mod command;
pub mod runtime;
pub mod sync;

pub use command::BridgedCommand;
pub use runtime::{AppCommandRequest, ExternalRuntime, PendingEntry, RuntimeCommandId};

use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle onto the external runtime
pub type RuntimeHandle = Rc<RefCell<dyn ExternalRuntime>>;
