//! The main Error type for tunesql

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The unified error type for all tunesql operations.
///
/// - `kind`: what type of error occurred
/// - `message`: human-readable description
/// - `status`: whether the error is retryable
/// - `operation`: what operation caused the error
/// - `context`: key/value pairs for debugging
/// - `source`: the underlying error (if any)
///
/// # Example
///
/// ```rust
/// use tunesql_error::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::StatementFailed, "no such table: Artist")
///     .with_operation("catalog::run")
///     .with_context("sql", "SELECT * FROM Artist");
///
/// assert_eq!(err.kind(), ErrorKind::StatementFailed);
/// assert!(!err.is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Status starts as `Permanent`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: ErrorStatus::Permanent,
            kind,
            message: message.into(),
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Innermost-last operation name, e.g. `database::open`
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// First context value recorded under `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(v.as_str()))
    }

    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Record where the error surfaced. A previous operation is kept in
    /// context under `called`.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            let inner = std::mem::replace(&mut self.operation, operation);
            self.context.push(("called", inner.to_string()));
        } else {
            self.operation = operation;
        }
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the library error this one wraps. Only one source is kept.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

/// One line: `Kind: message at op [key=value, ...] (status): caused by ...`
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }
        if !self.context.is_empty() {
            let pairs: Vec<String> = self.context.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            write!(f, " [{}]", pairs.join(", "))?;
        }
        write!(f, " ({})", self.status)?;
        if let Some(source) = &self.source {
            write!(f, ": caused by {}", source)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Error");
        d.field("kind", &self.kind).field("status", &self.status);
        if !self.operation.is_empty() {
            d.field("operation", &self.operation);
        }
        d.field("message", &self.message);
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        if let Some(source) = &self.source {
            d.field("source", source);
        }
        d.finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// The database file at `path` does not exist
    pub fn database_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(
            ErrorKind::DatabaseNotFound,
            format!("database file '{}' not found", path),
        )
        .with_context("path", path)
    }

    pub fn connection_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionFailed, reason).with_context("path", path)
    }

    pub fn statement_failed(sql: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::StatementFailed, reason).with_context("sql", sql)
    }

    pub fn model_instantiation_failed(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelInstantiationFailed, reason).with_context("model", model)
    }

    pub fn agent_invocation_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::AgentInvocationFailed, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::StatementFailed, "no such table: Artist");
        assert_eq!(err.kind(), ErrorKind::StatementFailed);
        assert_eq!(err.message(), "no such table: Artist");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::AgentInvocationFailed, "connection reset")
            .with_operation("agent::invoke")
            .with_context("model", "steamdj/mistral-cpu-only")
            .with_context("iteration", "3");

        assert_eq!(err.operation(), "agent::invoke");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context_value("iteration"), Some("3"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::StatementFailed, "disk I/O error")
            .with_operation("loader::insert_seed_data")
            .with_operation("loader::create_database");

        assert_eq!(err.operation(), "loader::create_database");
        assert_eq!(err.context()[0], ("called", "loader::insert_seed_data".to_string()));
    }

    #[test]
    fn test_status_is_permanent_until_marked() {
        let err = Error::agent_invocation_failed("model call failed");
        assert!(!err.is_retryable());
        assert!(err.temporary().is_retryable());
        assert!(!Error::database_not_found("music_library.db").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::model_instantiation_failed("mistral", "invalid base url")
            .with_operation("runner::run_questions");

        let display = err.to_string();
        assert_eq!(
            display,
            "ModelInstantiationFailed: invalid base url at runner::run_questions \
             [model=mistral] (permanent)"
        );
    }

    #[test]
    fn test_database_not_found() {
        let err = Error::database_not_found("music_library.db");
        assert_eq!(err.kind(), ErrorKind::DatabaseNotFound);
        assert_eq!(err.context_value("path"), Some("music_library.db"));
        assert!(err.message().contains("music_library.db"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();

        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(format!("{:?}", err).contains("source"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
