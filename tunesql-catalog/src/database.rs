//! Read-only view of a catalog database for the SQL agent.
//!
//! Output is plain text meant for a language model: table DDL with a few
//! sample rows, and query results rendered as a list of tuples.

use crate::statement_error;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::debug;
use tunesql_error::{Error, Result};

pub struct SqlDatabase {
    conn: Connection,
    path: PathBuf,
    sample_rows: usize,
    max_string_length: usize,
}

impl SqlDatabase {
    pub const DEFAULT_SAMPLE_ROWS: usize = 3;
    pub const DEFAULT_MAX_STRING_LENGTH: usize = 300;

    /// Open an existing database file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::database_not_found(path.display().to_string())
                .with_operation("database::open"));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            Error::connection_failed(path.display().to_string(), e.to_string())
                .with_operation("database::open")
                .set_source(e)
        })?;
        debug!("opened {} read-only", path.display());

        Ok(Self {
            conn,
            path: path.to_path_buf(),
            sample_rows: Self::DEFAULT_SAMPLE_ROWS,
            max_string_length: Self::DEFAULT_MAX_STRING_LENGTH,
        })
    }

    /// Number of example rows appended to each table in `table_info`
    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn with_max_string_length(mut self, len: usize) -> Self {
        self.max_string_length = len;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uri(&self) -> String {
        format!("sqlite:///{}", self.path.display())
    }

    pub fn dialect(&self) -> &'static str {
        "sqlite"
    }

    /// User tables, sorted by name. SQLite's own `sqlite_*` tables are hidden.
    pub fn usable_table_names(&self) -> Result<Vec<String>> {
        const SQL: &str = "SELECT name FROM sqlite_master \
                           WHERE type = 'table' AND name NOT LIKE 'sqlite~_%' ESCAPE '~' \
                           ORDER BY name";
        let op = "database::usable_table_names";

        let mut stmt = self.conn.prepare(SQL).map_err(statement_error(SQL, op))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(statement_error(SQL, op))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(statement_error(SQL, op))?;
        Ok(names)
    }

    /// DDL plus sample rows for the given tables (all usable tables if `None`).
    ///
    /// Names are matched case-insensitively; unknown names are an error.
    pub fn table_info(&self, tables: Option<&[&str]>) -> Result<String> {
        let usable = self.usable_table_names()?;

        let selected: Vec<&str> = match tables {
            None => usable.iter().map(String::as_str).collect(),
            Some(requested) => {
                let mut selected = Vec::new();
                let mut missing = Vec::new();
                for name in requested {
                    match usable.iter().find(|u| u.eq_ignore_ascii_case(name.trim())) {
                        Some(found) => selected.push(found.as_str()),
                        None => missing.push(format!("'{}'", name.trim())),
                    }
                }
                if !missing.is_empty() {
                    return Err(Error::invalid_argument(format!(
                        "table_names {{{}}} not found in database",
                        missing.join(", ")
                    ))
                    .with_operation("database::table_info"));
                }
                selected
            }
        };

        let mut blocks = Vec::with_capacity(selected.len());
        for table in selected {
            blocks.push(self.describe_table(table)?);
        }
        Ok(blocks.join("\n\n"))
    }

    fn describe_table(&self, table: &str) -> Result<String> {
        const DDL_SQL: &str = "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1";
        let op = "database::table_info";

        let ddl: String = self
            .conn
            .query_row(DDL_SQL, [table], |row| row.get(0))
            .map_err(statement_error(DDL_SQL, op))?;

        let mut info = ddl.trim().to_string();
        if self.sample_rows == 0 {
            return Ok(info);
        }

        let sample_sql = format!("SELECT * FROM \"{}\" LIMIT {}", table, self.sample_rows);
        let (columns, rows) = self.fetch(&sample_sql, op)?;

        info.push_str(&format!(
            "\n\n/*\n{} rows from {} table:\n{}",
            self.sample_rows,
            table,
            columns.join("\t")
        ));
        for row in rows {
            let cells: Vec<String> = row.iter().map(|v| truncate(&plain_value(v), 100)).collect();
            info.push('\n');
            info.push_str(&cells.join("\t"));
        }
        info.push_str("\n*/");

        Ok(info)
    }

    /// Run one statement and render its rows as `[(a, b), (c, d)]`.
    ///
    /// A statement that returns no rows renders as an empty string.
    pub fn run(&self, sql: &str) -> Result<String> {
        debug!(sql, "running query");
        let (_, rows) = self.fetch(sql, "database::run")?;
        if rows.is_empty() {
            return Ok(String::new());
        }

        let tuples: Vec<String> = rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = row
                    .iter()
                    .map(|v| repr_value(v, self.max_string_length))
                    .collect();
                if cells.len() == 1 {
                    format!("({},)", cells[0])
                } else {
                    format!("({})", cells.join(", "))
                }
            })
            .collect();

        Ok(format!("[{}]", tuples.join(", ")))
    }

    /// Like `run`, but errors come back as `Error: <message>` text
    pub fn run_no_throw(&self, sql: &str) -> String {
        match self.run(sql) {
            Ok(out) => out,
            Err(e) => {
                debug!("query failed: {}", e);
                format!("Error: {}", e.message())
            }
        }
    }

    fn fetch(&self, sql: &str, op: &'static str) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let mut stmt = self.conn.prepare(sql).map_err(statement_error(sql, op))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.is_empty() {
            stmt.execute([]).map_err(statement_error(sql, op))?;
            return Ok((columns, Vec::new()));
        }

        let width = columns.len();
        let mut rows = stmt.query([]).map_err(statement_error(sql, op))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(statement_error(sql, op))? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Value>(i).map_err(statement_error(sql, op))?);
            }
            out.push(values);
        }

        Ok((columns, out))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Value as shown in sample rows
fn plain_value(value: &Value) -> String {
    match value {
        Value::Null => "None".into(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => format!("{:?}", f),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

/// Value as shown inside result tuples; text is quoted
fn repr_value(value: &Value, max_string_length: usize) -> String {
    match value {
        Value::Text(s) => quote(&truncate(s, max_string_length)),
        other => plain_value(other),
    }
}

fn quote(s: &str) -> String {
    // Single quotes unless the text has a single quote and no double quote
    let delim = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::create_database;
    use tempfile::TempDir;
    use tunesql_error::ErrorKind;

    fn seeded() -> (TempDir, SqlDatabase) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("music_library.db");
        create_database(&path).unwrap();
        let db = SqlDatabase::open(&path).unwrap();
        (dir, db)
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = SqlDatabase::open(dir.path().join("nope.db")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::DatabaseNotFound);
        assert!(!dir.path().join("nope.db").exists());
    }

    #[test]
    fn test_usable_table_names_hide_internal_tables() {
        let (_dir, db) = seeded();
        // AUTOINCREMENT creates sqlite_sequence
        assert_eq!(db.usable_table_names().unwrap(), vec!["Albums", "Artists", "Tracks"]);
    }

    #[test]
    fn test_uri_and_dialect() {
        let (_dir, db) = seeded();
        assert!(db.uri().starts_with("sqlite:///"));
        assert!(db.uri().ends_with("music_library.db"));
        assert_eq!(db.dialect(), "sqlite");
    }

    #[test]
    fn test_table_info_has_ddl_and_samples() {
        let (_dir, db) = seeded();
        let info = db.table_info(Some(&["artists"][..])).unwrap();

        assert!(info.starts_with("CREATE TABLE"));
        assert!(info.contains("Artists (\n    ArtistId INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(info.contains("3 rows from Artists table:\nArtistId\tName\n1\tQueen\n2\tLed Zeppelin\n3\tThe Beatles\n*/"));
        assert!(!info.contains("Albums"));
    }

    #[test]
    fn test_table_info_without_samples() {
        let (_dir, db) = seeded();
        let db = db.with_sample_rows(0);
        let info = db.table_info(Some(&["Tracks"][..])).unwrap();
        assert!(info.contains("Milliseconds"));
        assert!(!info.contains("/*"));
    }

    #[test]
    fn test_table_info_all_tables() {
        let (_dir, db) = seeded();
        let info = db.table_info(None).unwrap();
        for table in ["Albums", "Artists", "Tracks"] {
            assert!(info.contains(&format!("rows from {} table:", table)));
        }
    }

    #[test]
    fn test_table_info_unknown_table() {
        let (_dir, db) = seeded();
        let err = db.table_info(Some(&["Artists", "Genres"][..])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.message(), "table_names {'Genres'} not found in database");
    }

    #[test]
    fn test_run_renders_tuples() {
        let (_dir, db) = seeded();

        assert_eq!(db.run("SELECT COUNT(*) FROM Artists").unwrap(), "[(3,)]");
        assert_eq!(
            db.run("SELECT ArtistId, Name FROM Artists ORDER BY ArtistId LIMIT 2").unwrap(),
            "[(1, 'Queen'), (2, 'Led Zeppelin')]"
        );
        assert_eq!(
            db.run("SELECT Name, Milliseconds FROM Tracks WHERE TrackId = 2").unwrap(),
            "[(\"You're My Best Friend\", 170000)]"
        );
        assert_eq!(db.run("SELECT NULL, 1.5").unwrap(), "[(None, 1.5)]");
        assert_eq!(db.run("SELECT * FROM Artists WHERE Name = 'ABBA'").unwrap(), "");
    }

    #[test]
    fn test_longest_track_query() {
        let (_dir, db) = seeded();
        let out = db
            .run(
                "SELECT t.Name, ar.Name FROM Tracks t \
                 JOIN Albums al ON al.AlbumId = t.AlbumId \
                 JOIN Artists ar ON ar.ArtistId = al.ArtistId \
                 ORDER BY t.Milliseconds DESC LIMIT 1",
            )
            .unwrap();
        assert_eq!(out, "[('Stairway to Heaven', 'Led Zeppelin')]");
    }

    #[test]
    fn test_long_text_is_truncated() {
        let (_dir, db) = seeded();
        let db = db.with_max_string_length(5);
        assert_eq!(db.run("SELECT 'Bohemian Rhapsody'").unwrap(), "[('Bohem...',)]");
    }

    #[test]
    fn test_writes_are_rejected() {
        let (_dir, db) = seeded();
        let err = db.run("DELETE FROM Tracks").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StatementFailed);
        assert_eq!(db.run("SELECT COUNT(*) FROM Tracks").unwrap(), "[(9,)]");
    }

    #[test]
    fn test_run_no_throw() {
        let (_dir, db) = seeded();
        let out = db.run_no_throw("SELECT * FROM Genres");
        assert!(out.starts_with("Error: "));
        assert!(out.contains("no such table: Genres"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("Queen"), "'Queen'");
        assert_eq!(quote("You're"), "\"You're\"");
        assert_eq!(quote("a'b\"c"), "'a\\'b\"c'");
    }
}
