//! Schema/seed loader.
//!
//! Recreates the catalog file from scratch: remove, connect, create tables,
//! insert seed rows, close. Table creation is best effort; the seed insert is
//! one transaction that is rolled back on the first failure.

use crate::schema::Table;
use crate::seed::{Album, Artist, Track, ALBUMS, ARTISTS, TRACKS};
use crate::statement_error;
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tunesql_error::{Error, Result};

/// Rows actually written per table (ignored duplicates are not counted)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedCounts {
    pub artists: usize,
    pub albums: usize,
    pub tracks: usize,
}

impl SeedCounts {
    pub fn total(&self) -> usize {
        self.artists + self.albums + self.tracks
    }
}

/// What a loader run did
#[derive(Debug, Default)]
pub struct LoadReport {
    pub removed_existing: bool,
    pub tables_created: Vec<Table>,
    pub rows_inserted: SeedCounts,
    /// Statements that failed and were skipped
    pub failures: Vec<Error>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build a fresh catalog database at `path`.
///
/// Only a failure to remove the old file or to open/close the connection is
/// returned as an error; statement failures are logged and collected in the
/// report.
pub fn create_database(path: impl AsRef<Path>) -> Result<LoadReport> {
    let path = path.as_ref();
    let mut report = LoadReport::default();

    if path.exists() {
        fs::remove_file(path).map_err(|e| {
            Error::from(e)
                .with_operation("loader::create_database")
                .with_context("path", path.display().to_string())
        })?;
        info!("Removed old database file: {}", path.display());
        report.removed_existing = true;
    }

    let mut conn = Connection::open(path).map_err(|e| {
        Error::connection_failed(path.display().to_string(), e.to_string())
            .with_operation("loader::create_database")
            .set_source(e)
    })?;
    info!("Successfully connected to SQLite version: {}", rusqlite::version());

    if let Err(e) = conn.pragma_update(None, "foreign_keys", "ON") {
        warn!("Could not enable foreign key enforcement: {}", e);
    }

    info!("Creating tables...");
    let failed_tables = create_tables(&conn);
    report.tables_created = Table::ALL
        .into_iter()
        .filter(|t| !failed_tables.iter().any(|(failed, _)| failed == t))
        .collect();
    report.failures.extend(failed_tables.into_iter().map(|(_, e)| e));
    if report.tables_created.len() == Table::ALL.len() {
        info!("Tables created successfully.");
    }

    info!("Inserting data...");
    match insert_seed_data(&mut conn) {
        Ok(counts) => {
            info!(
                artists = counts.artists,
                albums = counts.albums,
                tracks = counts.tracks,
                "Seed data inserted successfully."
            );
            report.rows_inserted = counts;
        }
        Err(e) => {
            error!("Error inserting data: {}", e);
            report.failures.push(e);
        }
    }

    conn.close().map_err(|(_, e)| {
        Error::connection_failed(path.display().to_string(), e.to_string())
            .with_operation("loader::create_database")
            .set_source(e)
    })?;
    info!("Database setup complete.");

    Ok(report)
}

/// Create all tables, parents first.
///
/// Returns the tables whose statement failed. Failures do not stop the
/// remaining statements and nothing is rolled back.
pub fn create_tables(conn: &Connection) -> Vec<(Table, Error)> {
    let mut failed = Vec::new();

    for table in Table::ALL {
        debug!(table = %table, "executing DDL");
        if let Err(e) = conn
            .execute(table.ddl(), [])
            .map_err(statement_error(table.ddl(), "loader::create_tables"))
        {
            error!("Error executing SQL for table {}: {}", table, e);
            failed.push((table, e));
        }
    }

    failed
}

/// Insert every seed row in one transaction.
///
/// Rows whose id already exists are ignored. Any failure rolls the whole
/// insert back.
pub fn insert_seed_data(conn: &mut Connection) -> Result<SeedCounts> {
    let tx = conn.transaction().map_err(|e| {
        Error::statement_failed("BEGIN", e.to_string())
            .with_operation("loader::insert_seed_data")
            .set_source(e)
    })?;

    match insert_rows(&tx) {
        Ok(counts) => {
            tx.commit().map_err(statement_error("COMMIT", "loader::insert_seed_data"))?;
            Ok(counts)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback() {
                warn!("Rollback failed: {}", rollback);
            }
            Err(e)
        }
    }
}

fn insert_rows(conn: &Connection) -> Result<SeedCounts> {
    let op = "loader::insert_seed_data";
    let mut counts = SeedCounts::default();

    let mut stmt = conn.prepare(Artist::INSERT).map_err(statement_error(Artist::INSERT, op))?;
    for artist in ARTISTS {
        counts.artists += stmt
            .execute(params![artist.id, artist.name])
            .map_err(statement_error(Artist::INSERT, op))?;
    }

    let mut stmt = conn.prepare(Album::INSERT).map_err(statement_error(Album::INSERT, op))?;
    for album in ALBUMS {
        counts.albums += stmt
            .execute(params![album.id, album.title, album.artist_id])
            .map_err(statement_error(Album::INSERT, op))?;
    }

    let mut stmt = conn.prepare(Track::INSERT).map_err(statement_error(Track::INSERT, op))?;
    for track in TRACKS {
        counts.tracks += stmt
            .execute(params![track.id, track.name, track.album_id, track.milliseconds])
            .map_err(statement_error(Track::INSERT, op))?;
    }

    Ok(counts)
}
