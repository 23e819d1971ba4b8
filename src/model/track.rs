use chrono::{DateTime, Utc};

/// On-device audio container, stored as the reversed-ASCII `file_type` wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Mp3,
    Aac,
    M4a,
    M4p,
    Wav,
}

impl FileType {
    /// Detect the device's file type from a source extension (case-insensitive).
    /// Returns `None` for anything outside the supported set.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(FileType::Mp3),
            "aac" => Some(FileType::Aac),
            "m4a" | "mp4" => Some(FileType::M4a),
            "m4p" => Some(FileType::M4p),
            _ => None,
        }
    }

    /// The 4-character, space-padded ASCII extension tag this variant encodes to
    /// (before the wire-level byte reversal; see `codec::atoms::file_type_code`).
    pub fn ascii_tag(self) -> &'static [u8; 4] {
        match self {
            FileType::Mp3 => b"MP3 ",
            FileType::Aac => b"AAC ",
            FileType::M4a => b"M4A ",
            FileType::M4p => b"M4P ",
            FileType::Wav => b"WAV ",
        }
    }

    pub fn from_ascii_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"MP3 " => Some(FileType::Mp3),
            b"AAC " => Some(FileType::Aac),
            b"M4A " => Some(FileType::M4a),
            b"M4P " => Some(FileType::M4p),
            b"WAV " => Some(FileType::Wav),
            _ => None,
        }
    }
}

/// Media-type flags, mirroring the device's content-type bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    AudioVideo,
    Audio,
    Video,
    Podcast,
    VideoPodcast,
    Audiobook,
    MusicVideo,
    TvShow,
}

impl MediaType {
    pub fn wire_value(self) -> u32 {
        match self {
            MediaType::AudioVideo => 0x00,
            MediaType::Audio => 0x01,
            MediaType::Video => 0x02,
            MediaType::Podcast => 0x04,
            MediaType::VideoPodcast => 0x06,
            MediaType::Audiobook => 0x08,
            MediaType::MusicVideo => 0x20,
            MediaType::TvShow => 0x40,
        }
    }

    pub fn from_wire_value(value: u32) -> Self {
        match value {
            0x01 => MediaType::Audio,
            0x02 => MediaType::Video,
            0x04 => MediaType::Podcast,
            0x06 => MediaType::VideoPodcast,
            0x08 => MediaType::Audiobook,
            0x20 => MediaType::MusicVideo,
            0x40 => MediaType::TvShow,
            _ => MediaType::AudioVideo,
        }
    }
}

/// Gapless-playback bookkeeping carried between adjacent album tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaplessInfo {
    pub pregap: u32,
    pub postgap: u32,
    pub sample_count: u64,
    pub gapless_data: u32,
    pub track_flag: bool,
    pub album_flag: bool,
}

/// A single track in the library.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Unique identifier for this track, allocated as `max(existing) + 1`.
    pub id: u32,

    /// 64-bit identifier used for external artwork linking. Random and stable.
    pub dbid: u64,

    /// On-device path, e.g. `:iPod_Control:Music:F07:ABCD.mp3`.
    pub path: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Album artist (compilation credit)
    pub album_artist: String,

    /// Genre
    pub genre: String,

    /// Composer
    pub composer: String,

    /// Free-text comment
    pub comment: String,

    pub duration_ms: u32,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub size_bytes: u32,

    pub track_number: u32,
    pub total_tracks: u32,
    pub disc_number: u32,
    pub total_discs: u32,
    pub year: u32,

    /// 0-100 in steps of 20 (0, 20, 40, 60, 80, 100)
    pub rating: u8,
    pub play_count: u32,
    pub skip_count: u32,

    pub date_added: DateTime<Utc>,
    pub last_played: Option<DateTime<Utc>>,
    pub last_modified: DateTime<Utc>,

    pub file_type: FileType,
    pub media_type: MediaType,
    pub compilation: bool,

    pub gapless: GaplessInfo,
}

impl Track {
    /// Build a track with the given identity and the library's usual defaults
    /// for everything else. Callers fill in the rest with struct-update syntax.
    pub fn new(id: u32, dbid: u64, path: impl Into<String>) -> Self {
        Self {
            id,
            dbid,
            path: path.into(),
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            album_artist: String::new(),
            genre: String::new(),
            composer: String::new(),
            comment: String::new(),
            duration_ms: 0,
            bitrate: 0,
            sample_rate: 44_100,
            size_bytes: 0,
            track_number: 0,
            total_tracks: 0,
            disc_number: 1,
            total_discs: 1,
            year: 0,
            rating: 0,
            play_count: 0,
            skip_count: 0,
            date_added: Utc::now(),
            last_played: None,
            last_modified: Utc::now(),
            file_type: FileType::Mp3,
            media_type: MediaType::Audio,
            compilation: false,
            gapless: GaplessInfo::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_extension_is_case_insensitive() {
        assert_eq!(FileType::from_extension("MP3"), Some(FileType::Mp3));
        assert_eq!(FileType::from_extension("Mp4"), Some(FileType::M4a));
        assert_eq!(FileType::from_extension("flac"), None);
    }

    #[test]
    fn file_type_ascii_tag_roundtrip() {
        for ft in [
            FileType::Mp3,
            FileType::Aac,
            FileType::M4a,
            FileType::M4p,
            FileType::Wav,
        ] {
            assert_eq!(FileType::from_ascii_tag(ft.ascii_tag()), Some(ft));
        }
    }

    #[test]
    fn media_type_wire_roundtrip() {
        for mt in [
            MediaType::AudioVideo,
            MediaType::Audio,
            MediaType::Video,
            MediaType::Podcast,
            MediaType::VideoPodcast,
            MediaType::Audiobook,
            MediaType::MusicVideo,
            MediaType::TvShow,
        ] {
            assert_eq!(MediaType::from_wire_value(mt.wire_value()), mt);
        }
    }

    #[test]
    fn new_track_has_sensible_defaults() {
        let t = Track::new(1, 42, ":iPod_Control:Music:F00:ABCD.mp3");
        assert_eq!(t.sample_rate, 44_100);
        assert_eq!(t.disc_number, 1);
        assert_eq!(t.total_discs, 1);
        assert!(t.title.is_empty());
        assert!(t.last_played.is_none());
    }
}
