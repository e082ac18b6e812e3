//! Core types shared across cmdstack facilities
//!
//! This crate provides foundational types used by both the error and
//! logging facilities of the command engine:
//!
//! - **Correlation types**: SessionId, ExecutionId
//! - **Sensitive data**: Sensitive<T> marker for argument values flagged as not loggable
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{ExecutionId, SessionId};
pub use sensitive::Sensitive;
