use cmdstack_core_types::ExecutionId;
use thiserror::Error;

/// Result type alias using the canonical structured error
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers, tests and log
/// consumers can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Lookup
    NotRegistered,

    // Arguments
    ValidationFailed,
    PathUnresolvable,

    // Execution
    ExecutionFailed,
    RollbackFailed,

    // Normal UI states, never fatal
    NothingToUndo,
    NothingToRedo,

    // Integration
    ExternalRuntime,
    Config,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotRegistered => "ERR_NOT_REGISTERED",
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::PathUnresolvable => "ERR_PATH_UNRESOLVABLE",
            ExErrorKind::ExecutionFailed => "ERR_EXECUTION_FAILED",
            ExErrorKind::RollbackFailed => "ERR_ROLLBACK_FAILED",
            ExErrorKind::NothingToUndo => "ERR_NOTHING_TO_UNDO",
            ExErrorKind::NothingToRedo => "ERR_NOTHING_TO_REDO",
            ExErrorKind::ExternalRuntime => "ERR_EXTERNAL_RUNTIME",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Severity attached to a freshly created error of this kind
    pub fn default_severity(&self) -> Severity {
        match self {
            ExErrorKind::NothingToUndo | ExErrorKind::NothingToRedo => Severity::LogOnly,
            ExErrorKind::RollbackFailed | ExErrorKind::Internal => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }
}

/// How a caller is expected to react to an error
///
/// `Fatal` means the undo history can no longer be trusted and should be
/// discarded. `Recoverable` errors leave the stacks consistent. `LogOnly`
/// errors describe normal states and are reported through logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    LogOnly,
    Recoverable,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::LogOnly => "log_only",
            Severity::Recoverable => "recoverable",
            Severity::Fatal => "fatal",
        }
    }
}

/// Canonical structured error type
///
/// Errors raised while executing nested commands are chained through
/// `with_source`, so the outermost error names the top-level command and
/// the chain walks down to the argument or sub-command that failed.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    severity: Severity,
    op: Option<String>,
    command: Option<String>,
    arg: Option<String>,
    execution_id: Option<ExecutionId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            op: None,
            command: None,
            arg: None,
            execution_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add command name context
    pub fn with_command(mut self, name: impl Into<String>) -> Self {
        self.command = Some(name.into());
        self
    }

    /// Add argument key context
    pub fn with_arg(mut self, key: impl Into<String>) -> Self {
        self.arg = Some(key.into());
        self
    }

    pub fn with_execution_id(mut self, id: ExecutionId) -> Self {
        self.execution_id = Some(id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Override the kind's default severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Add source error
    ///
    /// The resulting severity is the higher of this error's and the
    /// source's, so a fatal rollback failure is never downgraded by the
    /// error that wraps it.
    pub fn with_source(mut self, source: ExError) -> Self {
        self.severity = self.severity.max(source.severity);
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }

    pub fn execution_id(&self) -> Option<&ExecutionId> {
        self.execution_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Iterate over this error and every chained source, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &ExError> {
        std::iter::successors(Some(self), |e| e.source_error())
    }

    /// Innermost error of the chain
    pub fn root_cause(&self) -> &ExError {
        self.chain().last().unwrap_or(self)
    }

    /// True if any error in the chain has the given kind
    pub fn has_kind(&self, kind: ExErrorKind) -> bool {
        self.chain().any(|e| e.kind == kind)
    }

    /// Multi-line rendering of the whole chain
    pub fn report(&self) -> String {
        self.chain()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(command) = &self.command {
            write!(f, " (command: {})", command)?;
        }
        if let Some(arg) = &self.arg {
            write!(f, " (arg: {})", arg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for command engine call sites
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    // ===== Lookup =====
    #[error("cannot create command '{name}', it's not registered")]
    NotRegistered { name: String },

    // ===== Argument validation =====
    #[error("command '{command}' is created with args, but is not scriptable")]
    NotScriptable { command: String },

    #[error("command '{command}' is created with typed args, but does not accept typed values")]
    NotTypedScriptable { command: String },

    #[error("command '{command}', key not specified")]
    EmptyArgKey { command: String },

    #[error("no arg named '{key}' in command '{command}'")]
    UnknownArg { command: String, key: String },

    #[error("argument '{key}' in command '{command}' has not been set")]
    ArgNotSet { command: String, key: String },

    #[error("argument '{key}' in command '{command}' has an invalid value: {reason}")]
    InvalidArgValue {
        command: String,
        key: String,
        reason: String,
    },

    #[error("argument '{key}' of command '{command}', cannot resolve path '{path}'")]
    PathUnresolvable {
        command: String,
        key: String,
        path: String,
    },

    #[error("no resolver knows path '{path}'")]
    UnknownPath { path: String },

    // ===== Execution =====
    #[error("doing command '{command}'")]
    DoFailed { command: String },

    #[error("undoing top command '{top}'")]
    UndoTopFailed { top: String },

    #[error("undoing command, top: '{top}', low: '{low}'")]
    UndoLowFailed { top: String, low: String },

    #[error("redoing top command '{top}'")]
    RedoTopFailed { top: String },

    #[error("redoing command, top: '{top}', low: '{low}'")]
    RedoLowFailed { top: String, low: String },

    #[error("while reverting command '{low}' of '{command}'")]
    RollbackFailed { command: String, low: String },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    // ===== Integration =====
    #[error("external runtime error in '{op}': {message}")]
    ExternalRuntime { op: String, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Conversion from call-site errors to the canonical structured error
impl From<CommandError> for ExError {
    fn from(err: CommandError) -> Self {
        let message = err.to_string();
        match err {
            CommandError::NotRegistered { name } => ExError::new(ExErrorKind::NotRegistered)
                .with_op("create_command")
                .with_command(name)
                .with_message(message),

            CommandError::NotScriptable { command }
            | CommandError::NotTypedScriptable { command }
            | CommandError::EmptyArgKey { command } => {
                ExError::new(ExErrorKind::ValidationFailed)
                    .with_command(command)
                    .with_message(message)
            }

            CommandError::UnknownArg { command, key }
            | CommandError::ArgNotSet { command, key }
            | CommandError::InvalidArgValue { command, key, .. } => {
                ExError::new(ExErrorKind::ValidationFailed)
                    .with_command(command)
                    .with_arg(key)
                    .with_message(message)
            }

            CommandError::PathUnresolvable { command, key, .. } => {
                ExError::new(ExErrorKind::PathUnresolvable)
                    .with_command(command)
                    .with_arg(key)
                    .with_message(message)
            }

            CommandError::UnknownPath { .. } => ExError::new(ExErrorKind::PathUnresolvable)
                .with_op("resolve_path")
                .with_message(message),

            CommandError::DoFailed { command } => ExError::new(ExErrorKind::ExecutionFailed)
                .with_op("do_command")
                .with_command(command)
                .with_message(message),

            CommandError::UndoTopFailed { top } | CommandError::UndoLowFailed { top, .. } => {
                ExError::new(ExErrorKind::ExecutionFailed)
                    .with_op("undo_command")
                    .with_command(top)
                    .with_message(message)
            }

            CommandError::RedoTopFailed { top } | CommandError::RedoLowFailed { top, .. } => {
                ExError::new(ExErrorKind::ExecutionFailed)
                    .with_op("redo_command")
                    .with_command(top)
                    .with_message(message)
            }

            CommandError::RollbackFailed { command, .. } => {
                ExError::new(ExErrorKind::RollbackFailed)
                    .with_op("do_command")
                    .with_command(command)
                    .with_message(message)
            }

            CommandError::NothingToUndo => ExError::new(ExErrorKind::NothingToUndo)
                .with_op("undo_command")
                .with_message(message),

            CommandError::NothingToRedo => ExError::new(ExErrorKind::NothingToRedo)
                .with_op("redo_command")
                .with_message(message),

            CommandError::ExternalRuntime { op, .. } => ExError::new(ExErrorKind::ExternalRuntime)
                .with_op(op)
                .with_message(message),

            CommandError::Config { .. } => {
                ExError::new(ExErrorKind::Config).with_message(message)
            }

            CommandError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            CommandError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::Serialization {
            message: err.to_string(),
        }
        .into()
    }
}
