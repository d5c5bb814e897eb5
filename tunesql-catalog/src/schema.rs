//! Catalog schema: three tables in a parent/child chain.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Artists,
    Albums,
    Tracks,
}

impl Table {
    /// All tables, parents before children
    pub const ALL: [Table; 3] = [Table::Artists, Table::Albums, Table::Tracks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Artists => "Artists",
            Table::Albums => "Albums",
            Table::Tracks => "Tracks",
        }
    }

    pub fn ddl(&self) -> &'static str {
        match self {
            Table::Artists => {
                "CREATE TABLE IF NOT EXISTS Artists (
    ArtistId INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL
)"
            }
            Table::Albums => {
                "CREATE TABLE IF NOT EXISTS Albums (
    AlbumId INTEGER PRIMARY KEY AUTOINCREMENT,
    Title TEXT NOT NULL,
    ArtistId INTEGER NOT NULL,
    FOREIGN KEY (ArtistId) REFERENCES Artists (ArtistId)
)"
            }
            Table::Tracks => {
                "CREATE TABLE IF NOT EXISTS Tracks (
    TrackId INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    AlbumId INTEGER NOT NULL,
    Milliseconds INTEGER,
    FOREIGN KEY (AlbumId) REFERENCES Albums (AlbumId)
)"
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
