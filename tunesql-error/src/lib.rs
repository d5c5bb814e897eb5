//! # tunesql-error
//!
//! Unified error handling for the tunesql workspace.
//!
//! ## Design
//!
//! - **ErrorKind**: what went wrong (e.g. DatabaseNotFound, StatementFailed)
//! - **ErrorStatus**: whether retrying could help (Permanent, Temporary)
//! - **Context**: key/value pairs that locate the failure
//! - **Source**: the wrapped library error, kept out of the public surface
//!
//! ## Usage
//!
//! ```rust
//! use tunesql_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::DatabaseNotFound, "music_library.db is missing")
//!         .with_operation("runner::run_questions")
//!         .with_context("path", "music_library.db"))
//! }
//! ```
//!
//! Library errors (rusqlite, reqwest) are wrapped with `set_source(err)` at the
//! call site instead of blanket `From` impls.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the tunesql Error
pub type Result<T> = std::result::Result<T, Error>;
