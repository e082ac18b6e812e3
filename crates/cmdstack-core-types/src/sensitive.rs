//! Redaction marker for argument values
//!
//! Command arguments declared with the "don't log" flag are wrapped in
//! `Sensitive<T>` before they reach a log line or a history description.

use std::fmt;

/// Placeholder printed in place of a redacted value
pub const REDACTED: &str = "***REDACTED***";

/// Wrapper that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use cmdstack_core_types::Sensitive;
///
/// let token = Sensitive::new("secret123");
/// assert_eq!(format!("{}", token), "***REDACTED***");
/// assert_eq!(token.expose(), &"secret123");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: fmt::Display> Sensitive<T> {
    /// Render the value, or the redaction placeholder when `hidden` is set
    pub fn render(&self, hidden: bool) -> String {
        if hidden {
            REDACTED.to_string()
        } else {
            self.0.to_string()
        }
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
