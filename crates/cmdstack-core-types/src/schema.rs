//! Canonical schema constants for structured logging and events
//!
//! Every log line emitted by the engine uses these keys so that captured
//! output can be asserted on and filtered consistently.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_SESSION_ID: &str = "session_id";
pub const FIELD_EXECUTION_ID: &str = "execution_id";

// Command identifiers
pub const FIELD_CMD_NAME: &str = "cmd_name";
pub const FIELD_MERGE_ID: &str = "merge_id";
pub const FIELD_ARG_KEY: &str = "arg_key";
pub const FIELD_PATH: &str = "path";

// Stack sizes
pub const FIELD_UNDO_LEN: &str = "undo_len";
pub const FIELD_REDO_LEN: &str = "redo_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";
pub const FIELD_ERR_SEVERITY: &str = "err_severity";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_SKIPPED: &str = "skipped";
pub const EVENT_DUMP: &str = "dump";
