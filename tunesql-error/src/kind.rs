//! Error kinds for tunesql operations

use std::fmt;

/// The kind of error that occurred.
///
/// The coarse taxonomy is: connection errors, statement execution errors,
/// model instantiation errors and agent invocation errors. The remaining
/// kinds cover configuration and IO around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Invalid configuration (bad endpoint, unknown agent type)
    ConfigInvalid,

    /// Invalid argument passed to an operation
    InvalidArgument,

    // =========================================================================
    // Database errors
    // =========================================================================
    /// The database file does not exist
    DatabaseNotFound,

    /// Opening or closing a connection failed
    ConnectionFailed,

    /// A SQL statement failed to execute
    StatementFailed,

    // =========================================================================
    // Model / agent errors
    // =========================================================================
    /// The model client could not be created
    ModelInstantiationFailed,

    /// The agent failed while answering a question
    AgentInvocationFailed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            ErrorKind::DatabaseNotFound => "DatabaseNotFound",
            ErrorKind::ConnectionFailed => "ConnectionFailed",
            ErrorKind::StatementFailed => "StatementFailed",

            ErrorKind::ModelInstantiationFailed => "ModelInstantiationFailed",
            ErrorKind::AgentInvocationFailed => "AgentInvocationFailed",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::DatabaseNotFound.to_string(), "DatabaseNotFound");
        assert_eq!(
            ErrorKind::ModelInstantiationFailed.to_string(),
            "ModelInstantiationFailed"
        );
    }
}
