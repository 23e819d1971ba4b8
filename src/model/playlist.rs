use chrono::{DateTime, Utc};

/// Playlist sort-order codes, as enumerated on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Manual,
    Title,
    Album,
    Artist,
    Bitrate,
    Genre,
    Time,
    Year,
    PlayCount,
    LastPlayed,
    Rating,
    ReleaseDate,
}

impl SortOrder {
    pub fn wire_value(self) -> u32 {
        match self {
            SortOrder::Manual => 1,
            SortOrder::Title => 3,
            SortOrder::Album => 4,
            SortOrder::Artist => 5,
            SortOrder::Bitrate => 6,
            SortOrder::Genre => 7,
            SortOrder::Time => 12,
            SortOrder::Year => 13,
            SortOrder::PlayCount => 20,
            SortOrder::LastPlayed => 21,
            SortOrder::Rating => 23,
            SortOrder::ReleaseDate => 24,
        }
    }

    pub fn from_wire_value(value: u32) -> Self {
        match value {
            3 => SortOrder::Title,
            4 => SortOrder::Album,
            5 => SortOrder::Artist,
            6 => SortOrder::Bitrate,
            7 => SortOrder::Genre,
            12 => SortOrder::Time,
            13 => SortOrder::Year,
            20 => SortOrder::PlayCount,
            21 => SortOrder::LastPlayed,
            23 => SortOrder::Rating,
            24 => SortOrder::ReleaseDate,
            _ => SortOrder::Manual,
        }
    }
}

/// A playlist: an ordered, duplicate-free sequence of track IDs.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: u32,

    /// Empty is only valid for the master playlist.
    pub name: String,

    /// Track IDs in playlist order. No duplicates.
    pub track_ids: Vec<u32>,

    /// The single library-wide index playlist. Protected from delete/rename/clear.
    pub is_master: bool,

    pub is_podcast: bool,

    pub sort_order: SortOrder,

    pub timestamp: DateTime<Utc>,
}

impl Playlist {
    /// Build a regular (non-master) playlist with the given identity.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            track_ids: Vec::new(),
            is_master: false,
            is_podcast: false,
            sort_order: SortOrder::Manual,
            timestamp: Utc::now(),
        }
    }

    /// Build the master playlist with the given identity.
    pub fn master(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
            track_ids: Vec::new(),
            is_master: true,
            is_podcast: false,
            sort_order: SortOrder::Manual,
            timestamp: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_wire_roundtrip() {
        for so in [
            SortOrder::Manual,
            SortOrder::Title,
            SortOrder::Album,
            SortOrder::Artist,
            SortOrder::Bitrate,
            SortOrder::Genre,
            SortOrder::Time,
            SortOrder::Year,
            SortOrder::PlayCount,
            SortOrder::LastPlayed,
            SortOrder::Rating,
            SortOrder::ReleaseDate,
        ] {
            assert_eq!(SortOrder::from_wire_value(so.wire_value()), so);
        }
    }

    #[test]
    fn new_playlist_is_not_master() {
        let p = Playlist::new(2, "Favorites");
        assert!(!p.is_master);
        assert!(p.is_empty());
    }

    #[test]
    fn master_playlist_has_empty_name() {
        let m = Playlist::master(1);
        assert!(m.is_master);
        assert_eq!(m.name, "");
    }
}
