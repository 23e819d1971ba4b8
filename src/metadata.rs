//! Opaque tag-reader contract consumed by the sync path.
//!
//! The library itself never parses audio tags; it asks a provider for a
//! fixed [`MetadataRecord`] and copies those fields onto a new [`Track`].

use std::path::Path;

/// Tag fields read from a source audio file before it becomes a [`Track`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub genre: String,
    pub composer: String,
    pub comment: String,
    pub year: u32,
    pub track_number: u32,
    pub total_tracks: u32,
    pub disc_number: u32,
    pub total_discs: u32,
    pub duration_ms: u32,
    pub bitrate: u32,
    pub sample_rate: u32,
}

impl MetadataRecord {
    /// The all-defaults record, with `path`'s file stem as the title (what a
    /// provider falls back to on any internal failure; it must never
    /// propagate an error of its own).
    pub fn defaults_for(path: &Path) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            title,
            artist: String::new(),
            album: String::new(),
            album_artist: String::new(),
            genre: String::new(),
            composer: String::new(),
            comment: String::new(),
            year: 0,
            track_number: 0,
            total_tracks: 0,
            disc_number: 1,
            total_discs: 1,
            duration_ms: 0,
            bitrate: 0,
            sample_rate: 44_100,
        }
    }
}

/// Reads tag metadata from an audio file. Implementations must never panic
/// or propagate an error (on any internal failure, return the all-defaults
/// record via [`MetadataRecord::defaults_for`]).
pub trait MetadataProvider {
    fn read(&self, path: &Path) -> MetadataRecord;
}

/// Default provider used by callers without a real tag-reading collaborator
/// wired up, and by this crate's own tests. Always returns the all-defaults
/// record.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubMetadataProvider;

impl MetadataProvider for StubMetadataProvider {
    fn read(&self, path: &Path) -> MetadataRecord {
        MetadataRecord::defaults_for(path)
    }
}
