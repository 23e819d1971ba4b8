use super::{Playlist, Track};

/// Complete on-device music library: version/identity fields plus the
/// ordered tracks and playlists they describe.
#[derive(Debug, Clone)]
pub struct Library {
    /// Database format version. Default `0x15` (iTunes 7.2-era format).
    pub version: u16,

    /// Random 64-bit identifier for the database itself.
    pub database_id: u64,

    /// Random 64-bit identifier stable across re-saves of this library.
    pub library_persistent_id: u64,

    /// Two-character language tag, e.g. `"en"`.
    pub language: String,

    /// All tracks, in library order. The master playlist's `track_ids`
    /// mirrors this order on save.
    tracks: Vec<Track>,

    /// All playlists, including the master playlist.
    playlists: Vec<Playlist>,
}

impl Library {
    /// Create a new empty library with the device's default version and language.
    pub fn new() -> Self {
        Self {
            version: 0x15,
            database_id: 0,
            library_persistent_id: 0,
            language: "en".to_string(),
            tracks: Vec::new(),
            playlists: Vec::new(),
        }
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn add_playlist(&mut self, playlist: Playlist) {
        self.playlists.push(playlist);
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut Vec<Track> {
        &mut self.tracks
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn playlists_mut(&mut self) -> &mut Vec<Playlist> {
        &mut self.playlists
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    pub fn track_by_id(&self, id: u32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_by_id_mut(&mut self, id: u32) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn playlist_by_id(&self, id: u32) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    pub fn playlist_by_id_mut(&mut self, id: u32) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.id == id)
    }

    pub fn playlist_by_name(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    pub fn master_playlist(&self) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.is_master)
    }

    pub fn master_playlist_mut(&mut self) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.is_master)
    }

    /// `max(existing ids) + 1`, or `1` if the library has no tracks yet.
    pub fn next_track_id(&self) -> u32 {
        self.tracks.iter().map(|t| t.id).max().map_or(1, |m| m + 1)
    }

    /// `max(existing ids) + 1`, or `1` if the library has no playlists yet.
    pub fn next_playlist_id(&self) -> u32 {
        self.playlists.iter().map(|p| p.id).max().map_or(1, |m| m + 1)
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::playlist::SortOrder;

    #[test]
    fn new_library_is_empty() {
        let lib = Library::new();
        assert_eq!(lib.track_count(), 0);
        assert_eq!(lib.playlist_count(), 0);
        assert_eq!(lib.version, 0x15);
        assert_eq!(lib.language, "en");
    }

    #[test]
    fn next_ids_start_at_one() {
        let lib = Library::new();
        assert_eq!(lib.next_track_id(), 1);
        assert_eq!(lib.next_playlist_id(), 1);
    }

    #[test]
    fn next_ids_follow_max() {
        let mut lib = Library::new();
        lib.add_track(Track::new(5, 1, ":iPod_Control:Music:F00:AAAA.mp3"));
        lib.add_track(Track::new(2, 2, ":iPod_Control:Music:F00:BBBB.mp3"));
        assert_eq!(lib.next_track_id(), 6);

        lib.add_playlist(Playlist::new(3, "Favorites"));
        assert_eq!(lib.next_playlist_id(), 4);
    }

    #[test]
    fn lookups_find_by_id_and_name() {
        let mut lib = Library::new();
        lib.add_track(Track::new(1, 10, ":iPod_Control:Music:F00:AAAA.mp3"));
        lib.add_playlist(Playlist::master(1));
        let mut favorites = Playlist::new(2, "Favorites");
        favorites.sort_order = SortOrder::Title;
        lib.add_playlist(favorites);

        assert!(lib.track_by_id(1).is_some());
        assert!(lib.track_by_id(99).is_none());
        assert!(lib.master_playlist().is_some());
        assert_eq!(lib.playlist_by_name("Favorites").unwrap().id, 2);
    }
}
