//! Playlist and track mutation operations.
//!
//! Every operation here checks all of its preconditions before touching the
//! library, so a failing call leaves the library exactly as it was.

use crate::error::{LibraryError, Result};
use crate::model::{Library, Playlist, SortOrder};

impl Library {
    /// Create a new empty playlist. Fails `Duplicate` if the name is already used.
    pub fn create_playlist(&mut self, name: impl Into<String>, sort_order: SortOrder) -> Result<u32> {
        let name = name.into();
        if self.playlist_by_name(&name).is_some() {
            return Err(LibraryError::Duplicate(name));
        }

        let id = self.next_playlist_id();
        let mut playlist = Playlist::new(id, name);
        playlist.sort_order = sort_order;
        self.add_playlist(playlist);
        Ok(id)
    }

    /// Delete a playlist. The master playlist cannot be deleted.
    pub fn delete_playlist(&mut self, playlist_id: u32) -> Result<()> {
        let playlist = self
            .playlist_by_id(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        if playlist.is_master {
            return Err(LibraryError::MasterProtected);
        }

        self.playlists_mut().retain(|p| p.id != playlist_id);
        Ok(())
    }

    /// Rename a playlist. The master playlist cannot be renamed.
    pub fn rename_playlist(&mut self, playlist_id: u32, new_name: impl Into<String>) -> Result<()> {
        let new_name = new_name.into();

        let playlist = self
            .playlist_by_id(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        if playlist.is_master {
            return Err(LibraryError::MasterProtected);
        }

        if let Some(existing) = self.playlist_by_name(&new_name) {
            if existing.id != playlist_id {
                return Err(LibraryError::Duplicate(new_name));
            }
        }

        self.playlist_by_id_mut(playlist_id).unwrap().name = new_name;
        Ok(())
    }

    /// Add a track to a playlist, optionally at a given position (clamped to
    /// `[0, len]`; `None` means append).
    pub fn add_track_to_playlist(&mut self, playlist_id: u32, track_id: u32, pos: Option<usize>) -> Result<()> {
        if self.track_by_id(track_id).is_none() {
            return Err(LibraryError::NotFound(format!("track {track_id}")));
        }

        let playlist = self
            .playlist_by_id(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        if playlist.track_ids.contains(&track_id) {
            return Err(LibraryError::AlreadyPresent { playlist_id, track_id });
        }

        let playlist = self.playlist_by_id_mut(playlist_id).unwrap();
        let pos = pos.unwrap_or(playlist.track_ids.len()).min(playlist.track_ids.len());
        playlist.track_ids.insert(pos, track_id);
        Ok(())
    }

    /// Remove a track's membership in one playlist (not the library).
    pub fn remove_track_from_playlist(&mut self, playlist_id: u32, track_id: u32) -> Result<()> {
        let playlist = self
            .playlist_by_id_mut(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        if !playlist.track_ids.contains(&track_id) {
            return Err(LibraryError::NotPresent { playlist_id, track_id });
        }

        playlist.track_ids.retain(|&t| t != track_id);
        Ok(())
    }

    /// Replace a playlist's track order wholesale. `new_order` must contain
    /// exactly the playlist's current tracks (as a set).
    pub fn reorder_playlist(&mut self, playlist_id: u32, new_order: Vec<u32>) -> Result<()> {
        let playlist = self
            .playlist_by_id(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;

        let mut current_sorted = playlist.track_ids.clone();
        current_sorted.sort_unstable();
        let mut new_sorted = new_order.clone();
        new_sorted.sort_unstable();
        if current_sorted != new_sorted {
            return Err(LibraryError::OrderMismatch);
        }

        self.playlist_by_id_mut(playlist_id).unwrap().track_ids = new_order;
        Ok(())
    }

    /// Move one track to a new position within a playlist (clamped to `[0, len]`).
    pub fn move_track_in_playlist(&mut self, playlist_id: u32, track_id: u32, new_pos: usize) -> Result<()> {
        let playlist = self
            .playlist_by_id_mut(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        if !playlist.track_ids.contains(&track_id) {
            return Err(LibraryError::NotPresent { playlist_id, track_id });
        }

        playlist.track_ids.retain(|&t| t != track_id);
        let new_pos = new_pos.min(playlist.track_ids.len());
        playlist.track_ids.insert(new_pos, track_id);
        Ok(())
    }

    /// Remove every track from a playlist. The master playlist cannot be cleared.
    pub fn clear_playlist(&mut self, playlist_id: u32) -> Result<()> {
        let playlist = self
            .playlist_by_id(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        if playlist.is_master {
            return Err(LibraryError::MasterProtected);
        }

        self.playlist_by_id_mut(playlist_id).unwrap().track_ids.clear();
        Ok(())
    }

    /// Deep-copy a playlist's track list under a new name.
    pub fn duplicate_playlist(&mut self, playlist_id: u32, new_name: impl Into<String>) -> Result<u32> {
        let new_name = new_name.into();

        let source = self
            .playlist_by_id(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        if self.playlist_by_name(&new_name).is_some() {
            return Err(LibraryError::Duplicate(new_name));
        }

        let track_ids = source.track_ids.clone();
        let sort_order = source.sort_order;

        let id = self.next_playlist_id();
        let mut new_playlist = Playlist::new(id, new_name);
        new_playlist.track_ids = track_ids;
        new_playlist.sort_order = sort_order;
        self.add_playlist(new_playlist);
        Ok(id)
    }

    /// Set a playlist's sort order.
    pub fn set_playlist_sort_order(&mut self, playlist_id: u32, sort_order: SortOrder) -> Result<()> {
        let playlist = self
            .playlist_by_id_mut(playlist_id)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {playlist_id}")))?;
        playlist.sort_order = sort_order;
        Ok(())
    }

    /// Remove a track from the library entirely, cascading into every
    /// playlist's `track_ids`. Distinct from `remove_track_from_playlist`,
    /// which only touches one playlist's membership.
    pub fn remove_track(&mut self, track_id: u32) -> Result<()> {
        if self.track_by_id(track_id).is_none() {
            return Err(LibraryError::NotFound(format!("track {track_id}")));
        }

        self.tracks_mut().retain(|t| t.id != track_id);
        for playlist in self.playlists_mut() {
            playlist.track_ids.retain(|&t| t != track_id);
        }
        Ok(())
    }
}
