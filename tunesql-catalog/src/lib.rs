//! # tunesql catalog
//!
//! The SQLite side of tunesql:
//! - **schema**: the Artists / Albums / Tracks tables
//! - **seed**: the fixed demo rows
//! - **loader**: recreates a database file and fills it
//! - **database**: read-only access used by the SQL agent

pub mod database;
pub mod loader;
pub mod schema;
pub mod seed;

pub use database::SqlDatabase;
pub use loader::{create_database, create_tables, insert_seed_data, LoadReport, SeedCounts};
pub use schema::Table;
pub use seed::{Album, Artist, Track, ALBUMS, ARTISTS, TRACKS};

use tunesql_error::Error;

/// Map a rusqlite error on `sql` into a StatementFailed error
pub(crate) fn statement_error<'a>(
    sql: &'a str,
    operation: &'static str,
) -> impl FnOnce(rusqlite::Error) -> Error + 'a {
    move |e| {
        Error::statement_failed(sql.trim(), e.to_string())
            .with_operation(operation)
            .set_source(e)
    }
}
