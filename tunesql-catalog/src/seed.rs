//! Fixed demo rows.
//!
//! Rows are bound as statement parameters, so titles with quotes
//! ("You're My Best Friend") need no escaping.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub title: &'static str,
    pub artist_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    pub id: i64,
    pub name: &'static str,
    pub album_id: i64,
    pub milliseconds: i64,
}

impl Artist {
    pub const INSERT: &'static str = "INSERT OR IGNORE INTO Artists (ArtistId, Name) VALUES (?1, ?2)";
}

impl Album {
    pub const INSERT: &'static str =
        "INSERT OR IGNORE INTO Albums (AlbumId, Title, ArtistId) VALUES (?1, ?2, ?3)";
}

impl Track {
    pub const INSERT: &'static str =
        "INSERT OR IGNORE INTO Tracks (TrackId, Name, AlbumId, Milliseconds) VALUES (?1, ?2, ?3, ?4)";
}

pub const ARTISTS: &[Artist] = &[
    Artist { id: 1, name: "Queen" },
    Artist { id: 2, name: "Led Zeppelin" },
    Artist { id: 3, name: "The Beatles" },
];

pub const ALBUMS: &[Album] = &[
    Album { id: 1, title: "A Night at the Opera", artist_id: 1 },
    Album { id: 2, title: "News of the World", artist_id: 1 },
    Album { id: 3, title: "Led Zeppelin IV", artist_id: 2 },
    Album { id: 4, title: "Abbey Road", artist_id: 3 },
];

pub const TRACKS: &[Track] = &[
    // Queen - A Night at the Opera
    Track { id: 1, name: "Bohemian Rhapsody", album_id: 1, milliseconds: 354320 },
    Track { id: 2, name: "You're My Best Friend", album_id: 1, milliseconds: 170000 },
    // Queen - News of the World
    Track { id: 3, name: "We Will Rock You", album_id: 2, milliseconds: 122000 },
    Track { id: 4, name: "We Are the Champions", album_id: 2, milliseconds: 177000 },
    // Led Zeppelin - Led Zeppelin IV
    Track { id: 5, name: "Stairway to Heaven", album_id: 3, milliseconds: 482000 },
    Track { id: 6, name: "Black Dog", album_id: 3, milliseconds: 294000 },
    // The Beatles - Abbey Road
    Track { id: 7, name: "Come Together", album_id: 4, milliseconds: 260000 },
    Track { id: 8, name: "Something", album_id: 4, milliseconds: 182000 },
    Track { id: 9, name: "Here Comes the Sun", album_id: 4, milliseconds: 185000 },
];
