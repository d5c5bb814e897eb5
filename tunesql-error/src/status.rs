//! Error status: how a caller may react to an error

use std::fmt;

/// Whether an operation that failed with this error may succeed if repeated.
///
/// Errors start out `Permanent`; code that knows a failure is transient
/// marks it with `Error::temporary`. No retries are performed by tunesql
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorStatus {
    /// Repeating the operation will fail the same way
    #[default]
    Permanent,
    /// The failure may be transient (network hiccup, model still loading)
    Temporary,
}

impl ErrorStatus {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorStatus::Temporary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
