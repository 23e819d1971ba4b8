//! Decode an iTunesDB byte stream into a [`Library`].
//!
//! Mirrors the offset table in `serializer` in reverse. Corruption inside a
//! section or record stops that parent's child iteration early rather than
//! failing the whole parse; only damage at the top level (a missing `mhbd`
//! or `mhsd` identifier, or running out of bytes mid-field) is a hard error.

use chrono::Utc;

use super::atoms::*;
use crate::error::{LibraryError, Result};
use crate::model::{FileType, GaplessInfo, Library, MediaType, Playlist, SortOrder, Track};

/// A forward-only cursor over the database bytes, with bounds-checked reads.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(LibraryError::InvalidDatabase(format!(
                "unexpected end of file at offset {} wanting {} bytes",
                self.pos, len
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn magic(&mut self) -> Result<[u8; 4]> {
        Ok(self.take(4)?.try_into().unwrap())
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Move the cursor to an absolute offset, as long as it doesn't go
    /// backwards or past the end of the buffer.
    fn seek_to(&mut self, target: usize) -> Result<()> {
        if target > self.data.len() {
            return Err(LibraryError::InvalidDatabase(format!(
                "declared length {} exceeds buffer of {} bytes",
                target,
                self.data.len()
            )));
        }
        if target < self.pos {
            return Err(LibraryError::InvalidDatabase(format!(
                "declared length {target} would move the cursor backwards from {}",
                self.pos
            )));
        }
        self.pos = target;
        Ok(())
    }
}

/// Parse a complete iTunesDB byte stream into a [`Library`]. Pure: performs
/// no I/O and never mutates the input.
pub fn parse(bytes: &[u8]) -> Result<Library> {
    let mut r = Reader::new(bytes);

    if r.magic()? != *b"mhbd" {
        return Err(LibraryError::InvalidDatabase("missing mhbd header".into()));
    }
    let header_len = r.u32()? as usize;
    let _total_len = r.u32()?;
    let _const1 = r.u32()?;
    let db_version = r.u32()?;
    let num_sections = r.u32()?;
    let database_id = r.u64()?;
    let _const2 = r.u16()?;
    let _pad1 = r.u32()?;
    let _pad2 = r.u64()?;
    let _pad3 = r.take(24)?;
    let language_bytes = r.take(2)?;
    let library_persistent_id = r.u64()?;
    r.seek_to(header_len.max(r.pos))?;

    let mut library = Library::new();
    library.version = db_version as u16;
    library.database_id = database_id;
    library.library_persistent_id = library_persistent_id;
    library.language = String::from_utf8_lossy(language_bytes).into_owned();

    for _ in 0..num_sections {
        let section_start = r.pos;
        if r.remaining() < 16 {
            log::warn!("truncated section header at offset {section_start}, stopping");
            break;
        }
        let magic = r.magic()?;
        if magic != *b"mhsd" {
            return Err(LibraryError::InvalidDatabase(format!(
                "expected mhsd section header at offset {section_start}"
            )));
        }
        let section_header_len = r.u32()? as usize;
        let section_total_len = r.u32()? as usize;
        let section_type = r.u32()?;

        if section_total_len == 0 || section_start + section_total_len > bytes.len() {
            log::warn!("section at {section_start} declares an impossible length, stopping");
            break;
        }

        r.seek_to(section_start + section_header_len)?;

        match section_type {
            1 => parse_track_list(&mut r, &mut library)?,
            2 => parse_playlist_list(&mut r, &mut library)?,
            other => log::debug!("skipping unrecognized section type {other}"),
        }

        // Whatever happened inside, resync to the section's declared bounds.
        r.seek_to(section_start + section_total_len)?;
    }

    Ok(library)
}

fn parse_track_list(r: &mut Reader, library: &mut Library) -> Result<()> {
    let list_start = r.pos;
    if r.magic()? != *b"mhlt" {
        log::warn!("expected mhlt at offset {list_start}, skipping track list");
        return Ok(());
    }
    let header_len = r.u32()? as usize;
    let num_tracks = r.u32()?;
    r.seek_to(list_start + header_len)?;

    for _ in 0..num_tracks {
        match parse_track_record(r) {
            Ok(Some(track)) => library.add_track(track),
            Ok(None) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn parse_track_record(r: &mut Reader) -> Result<Option<Track>> {
    let record_start = r.pos;
    if r.remaining() < 4 || r.magic()? != *b"mhit" {
        log::warn!("expected mhit at offset {record_start}, stopping track iteration");
        return Ok(None);
    }
    let header_len = r.u32()? as usize;
    let total_len = r.u32()? as usize;
    if total_len == 0 || record_start + total_len > r.data.len() {
        log::warn!("track record at {record_start} declares an impossible length, stopping");
        return Ok(None);
    }
    let num_children = r.u32()?;

    let unique_id = r.u32()?;
    let _visible = r.u32()?;
    let file_type_code = r.u32()?;
    let _vbr_flag = r.u8()?;
    let _codec_flag = r.u8()?;
    let compilation = r.u8()? != 0;
    let rating = r.u8()?;
    let last_modified = r.u32()?;
    let size_bytes = r.u32()?;
    let duration_ms = r.u32()?;
    let track_number = r.u32()?;
    let total_tracks = r.u32()?;
    let year = r.u32()?;
    let bitrate = r.u32()?;
    let sample_rate_shifted = r.u32()?;
    let _volume = r.u32()?;
    let _start_time = r.u32()?;
    let _stop_time = r.u32()?;
    let _soundcheck = r.u32()?;
    let play_count = r.u32()?;
    let _play_count2 = r.u32()?;
    let last_played = r.u32()?;
    let disc_number = r.u32()?;
    let total_discs = r.u32()?;
    let _user_id = r.u32()?;
    let date_added = r.u32()?;
    let _bookmark_time = r.u32()?;
    let dbid = r.u64()?;
    let _checked = r.u8()?;
    let _app_rating = r.u8()?;
    let _bpm = r.u16()?;
    let _artwork_count = r.u16()?;
    let _const_ffff = r.u16()?;
    let _artwork_size = r.u32()?;
    let _pad = r.u32()?;
    let _sample_rate_float = r.f32()?;
    let _date_released = r.u32()?;
    let _format_hint = r.u16()?;
    let _pad2 = r.u16()?;
    let _pad3 = r.u32()?;
    let _pad4 = r.u32()?;
    let skip_count = r.u32()?;
    let _last_skipped = r.u32()?;
    let _has_artwork = r.u8()?;
    let _skip_when_shuffling = r.u8()?;
    let _remember_position = r.u8()?;
    let _podcast_flag = r.u8()?;
    let _dbid2 = r.u64()?;
    let _has_lyrics = r.u8()?;
    let _is_movie = r.u8()?;
    let _played_mark = r.u8()?;
    let _pad5 = r.u8()?;
    let _pad6 = r.u32()?;
    let pregap = r.u32()?;
    let sample_count = r.u64()?;
    let _pad7 = r.u32()?;
    let postgap = r.u32()?;
    let _pad8 = r.u32()?;
    let media_type = r.u32()?;
    let _season_number = r.u32()?;
    let _episode_number = r.u32()?;
    let _pad9 = r.take(24)?;
    let _pad10 = r.u32()?;
    let gapless_data = r.u32()?;
    let _pad11 = r.u32()?;
    let gapless_track_flag = r.u16()?;
    let gapless_album_flag = r.u16()?;
    let _integrity_hash = r.take(20)?;

    r.seek_to(record_start + header_len)?;

    let mut track = Track::new(unique_id, dbid, String::new());
    track.file_type = FileType::from_ascii_tag(&file_type_tag(file_type_code)).unwrap_or(FileType::Mp3);
    track.media_type = MediaType::from_wire_value(media_type);
    track.compilation = compilation;
    track.rating = rating;
    track.last_modified = mac_epoch_to_unix(last_modified).unwrap_or_else(Utc::now);
    track.size_bytes = size_bytes;
    track.duration_ms = duration_ms;
    track.track_number = track_number;
    track.total_tracks = total_tracks;
    track.year = year;
    track.bitrate = bitrate;
    track.sample_rate = sample_rate_shifted >> 16;
    track.play_count = play_count;
    track.last_played = mac_epoch_to_unix(last_played);
    track.disc_number = disc_number;
    track.total_discs = total_discs;
    track.date_added = mac_epoch_to_unix(date_added).unwrap_or_else(Utc::now);
    track.skip_count = skip_count;
    track.gapless = GaplessInfo {
        pregap,
        postgap,
        sample_count,
        gapless_data,
        track_flag: gapless_track_flag != 0,
        album_flag: gapless_album_flag != 0,
    };

    for _ in 0..num_children {
        if r.pos >= record_start + total_len {
            break;
        }
        match parse_data_object(r) {
            Some((mhod_type, payload)) => apply_track_string(&mut track, mhod_type, payload),
            None => break,
        }
    }

    Ok(Some(track))
}

/// Read one `mhod` child, returning its type and decoded string payload if
/// it was a recognized string-shaped type. Returns `None` if the child is
/// unreadable (truncated or zero-length), signaling the caller to stop.
fn parse_data_object(r: &mut Reader) -> Option<(u32, Option<String>)> {
    let child_start = r.pos;
    if r.remaining() < MHOD_HEADER_SIZE {
        return None;
    }
    if r.magic().ok()? != *b"mhod" {
        return None;
    }
    let _header_len = r.u32().ok()? as usize;
    let total_len = r.u32().ok()? as usize;
    let mhod_type = r.u32().ok()?;
    let _zero = r.u64().ok()?;

    if total_len == 0 || child_start + total_len > r.data.len() {
        return None;
    }

    let payload = if (1..=14).contains(&mhod_type) || (18..=31).contains(&mhod_type) {
        let _encoding_marker = r.u32().ok()?;
        let payload_len = r.u32().ok()? as usize;
        let _encoding_flag = r.u32().ok()?;
        let _reserved = r.u32().ok()?;
        if r.pos + payload_len > child_start + total_len {
            None
        } else {
            let bytes = r.take(payload_len).ok()?;
            Some(if mhod_type == MHOD_LOCATION {
                decode_path(bytes)
            } else {
                decode_text(bytes)
            })
        }
    } else {
        None
    };

    // Always resync to the child's declared end, discarding anything unread.
    r.seek_to(child_start + total_len).ok()?;
    Some((mhod_type, payload))
}

fn apply_track_string(track: &mut Track, mhod_type: u32, payload: Option<String>) {
    let Some(value) = payload else { return };
    match mhod_type {
        MHOD_TITLE => track.title = value,
        MHOD_LOCATION => track.path = value,
        MHOD_ALBUM => track.album = value,
        MHOD_ARTIST => track.artist = value,
        MHOD_GENRE => track.genre = value,
        MHOD_COMPOSER => track.composer = value,
        MHOD_COMMENT => track.comment = value,
        MHOD_ALBUM_ARTIST => track.album_artist = value,
        _ => {}
    }
}

fn parse_playlist_list(r: &mut Reader, library: &mut Library) -> Result<()> {
    let list_start = r.pos;
    if r.magic()? != *b"mhlp" {
        log::warn!("expected mhlp at offset {list_start}, skipping playlist list");
        return Ok(());
    }
    let header_len = r.u32()? as usize;
    let num_playlists = r.u32()?;
    r.seek_to(list_start + header_len)?;

    for _ in 0..num_playlists {
        match parse_playlist_record(r) {
            Ok(Some(playlist)) => library.add_playlist(playlist),
            Ok(None) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn parse_playlist_record(r: &mut Reader) -> Result<Option<Playlist>> {
    let record_start = r.pos;
    if r.remaining() < 4 || r.magic()? != *b"mhyp" {
        log::warn!("expected mhyp at offset {record_start}, stopping playlist iteration");
        return Ok(None);
    }
    let header_len = r.u32()? as usize;
    let total_len = r.u32()? as usize;
    if total_len == 0 || record_start + total_len > r.data.len() {
        log::warn!("playlist record at {record_start} declares an impossible length, stopping");
        return Ok(None);
    }
    let num_string_children = r.u32()?;
    let num_item_children = r.u32()?;
    let is_master = r.u8()? != 0;
    let _pad1 = r.take(3)?;
    let timestamp = r.u32()?;
    let playlist_id = r.u64()?;
    let _pad2 = r.u32()?;
    let _string_child_count = r.u16()?;
    let is_podcast = r.u16()? != 0;
    let sort_order = r.u32()?;

    r.seek_to(record_start + header_len)?;

    let mut playlist = Playlist::new((playlist_id & 0xFFFF_FFFF) as u32, String::new());
    playlist.is_master = is_master;
    playlist.is_podcast = is_podcast;
    playlist.sort_order = SortOrder::from_wire_value(sort_order);
    playlist.timestamp = mac_epoch_to_unix(timestamp).unwrap_or_else(Utc::now);

    for _ in 0..num_string_children {
        if r.pos >= record_start + total_len {
            break;
        }
        match parse_data_object(r) {
            Some((MHOD_TITLE, Some(title))) => playlist.name = title,
            Some(_) => {}
            None => break,
        }
    }

    for _ in 0..num_item_children {
        if r.pos >= record_start + total_len {
            break;
        }
        match parse_playlist_item(r) {
            Some(track_id) => playlist.track_ids.push(track_id),
            None => break,
        }
    }

    Ok(Some(playlist))
}

fn parse_playlist_item(r: &mut Reader) -> Option<u32> {
    let item_start = r.pos;
    if r.remaining() < 4 || r.magic().ok()? != *b"mhip" {
        return None;
    }
    let header_len = r.u32().ok()? as usize;
    let total_len = r.u32().ok()? as usize;
    if total_len == 0 || item_start + total_len > r.data.len() {
        return None;
    }
    let _num_children = r.u32().ok()?;
    let _podcast_group_flag = r.u16().ok()?;
    let _pad = r.u16().ok()?;
    let _group_id = r.u32().ok()?;
    let track_id = r.u32().ok()?;
    let _timestamp = r.u32().ok()?;
    let _podcast_group_ref = r.u32().ok()?;

    r.seek_to(item_start + header_len).ok()?;
    r.seek_to(item_start + total_len).ok()?;
    Some(track_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serializer::serialize;
    use crate::model::Track;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_missing_mhbd() {
        let err = parse(b"not a database").unwrap_err();
        assert!(matches!(err, LibraryError::InvalidDatabase(_)));
    }

    #[test]
    fn roundtrips_empty_library() {
        let mut lib = Library::new();
        let mut rng = StdRng::seed_from_u64(1);
        let bytes = serialize(&mut lib, &mut rng);
        let reloaded = parse(&bytes).unwrap();
        assert_eq!(reloaded.track_count(), 0);
        assert_eq!(reloaded.playlist_count(), 1);
        assert!(reloaded.master_playlist().unwrap().track_ids.is_empty());
        assert_eq!(reloaded.version, 0x15);
        assert_eq!(reloaded.language, "en");
    }

    #[test]
    fn roundtrips_tracks_and_user_playlist() {
        let mut lib = Library::new();
        let mut t1 = Track::new(1, 0, ":iPod_Control:Music:F00:S001.mp3");
        t1.title = "Song One".into();
        t1.artist = "Artist A".into();
        t1.album = "Album X".into();
        let mut t2 = Track::new(2, 0, ":iPod_Control:Music:F00:S002.mp3");
        t2.title = "Song Two".into();
        lib.add_track(t1);
        lib.add_track(t2);
        let favorites_id = lib.create_playlist("Favorites", SortOrder::Manual).unwrap();
        lib.add_track_to_playlist(favorites_id, 1, None).unwrap();

        let mut rng = StdRng::seed_from_u64(2);
        let bytes = serialize(&mut lib, &mut rng);
        let reloaded = parse(&bytes).unwrap();

        assert_eq!(reloaded.track_count(), 2);
        assert_eq!(reloaded.track_by_id(1).unwrap().title, "Song One");
        assert_eq!(
            reloaded.master_playlist().unwrap().track_ids,
            vec![1, 2]
        );
        let favorites = reloaded.playlist_by_name("Favorites").unwrap();
        assert_eq!(favorites.track_ids, vec![1]);
    }

    #[test]
    fn declared_bytes_begin_with_mhbd_and_header_len() {
        let mut lib = Library::new();
        let mut rng = StdRng::seed_from_u64(3);
        let bytes = serialize(&mut lib, &mut rng);
        assert_eq!(&bytes[0..4], b"mhbd");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 104);
    }

    #[test]
    fn truncated_child_length_stops_without_erroring() {
        let mut lib = Library::new();
        let mut t = Track::new(1, 7, ":iPod_Control:Music:F00:ABCD.mp3");
        t.title = "Truncated".into();
        lib.add_track(t);
        let mut rng = StdRng::seed_from_u64(4);
        let mut bytes = serialize(&mut lib, &mut rng);

        // Find the track record's mhit tag and corrupt its total_len to
        // something larger than the remaining buffer.
        let mhit_pos = bytes.windows(4).position(|w| w == b"mhit").unwrap();
        let bogus_len = (bytes.len() as u32) * 2;
        bytes[mhit_pos + 8..mhit_pos + 12].copy_from_slice(&bogus_len.to_le_bytes());

        let reloaded = parse(&bytes).unwrap();
        assert!(reloaded.track_count() <= 1);
    }
}
