//! Encode a [`Library`] into an iTunesDB byte stream.
//!
//! Builds each record as its own byte buffer (fixed header first, then
//! children), the same way the reference device-codec writer in this crate's
//! lineage builds PDB records: track a running child count, zero-pad to the
//! record's fixed header size, then append variable content.

use rand::RngCore;

use super::atoms::*;
use crate::model::{Library, Playlist, Track};
use crate::rng::random_persistent_id;

/// Encode `library` to its on-disk byte representation. Synthesizes a master
/// playlist if one is missing, refreshes the master's track order, and
/// replaces zero persistent IDs with fresh random ones drawn from `rng`.
pub fn serialize(library: &mut Library, rng: &mut dyn RngCore) -> Vec<u8> {
    if library.master_playlist().is_none() {
        let id = library.next_playlist_id();
        library.playlists_mut().insert(0, Playlist::master(id));
        log::debug!("synthesized missing master playlist with id {id}");
    }

    let track_order: Vec<u32> = library.tracks().iter().map(|t| t.id).collect();
    library.master_playlist_mut().unwrap().track_ids = track_order;

    if library.database_id == 0 {
        library.database_id = random_persistent_id(rng);
    }
    if library.library_persistent_id == 0 {
        library.library_persistent_id = random_persistent_id(rng);
    }

    let track_section = build_track_list_section(library.tracks());
    let playlist_section = build_playlist_list_section(library.playlists());

    let mut out = Vec::with_capacity(MHBD_HEADER_SIZE + track_section.len() + playlist_section.len());
    let total_len = (MHBD_HEADER_SIZE + track_section.len() + playlist_section.len()) as u32;
    out.extend(build_database_header(library, total_len));
    out.extend(track_section);
    out.extend(playlist_section);

    log::info!(
        "serialized library: {} tracks, {} playlists, {} bytes",
        library.track_count(),
        library.playlist_count(),
        out.len()
    );
    out
}

fn build_database_header(library: &Library, total_len: u32) -> Vec<u8> {
    let mut h = Vec::with_capacity(MHBD_HEADER_SIZE);
    h.extend_from_slice(b"mhbd");
    h.extend_from_slice(&(MHBD_HEADER_SIZE as u32).to_le_bytes());
    h.extend_from_slice(&total_len.to_le_bytes());
    h.extend_from_slice(&1u32.to_le_bytes());
    h.extend_from_slice(&(library.version as u32).to_le_bytes());
    h.extend_from_slice(&2u32.to_le_bytes()); // num_sections: track list + playlist list
    h.extend_from_slice(&library.database_id.to_le_bytes());
    h.extend_from_slice(&2u16.to_le_bytes());
    h.extend_from_slice(&0u32.to_le_bytes());
    h.extend_from_slice(&0u64.to_le_bytes());
    h.extend_from_slice(&[0u8; 24]);
    let mut language = [0u8; 2];
    let lang_bytes = library.language.as_bytes();
    language[..lang_bytes.len().min(2)].copy_from_slice(&lang_bytes[..lang_bytes.len().min(2)]);
    h.extend_from_slice(&language);
    h.extend_from_slice(&library.library_persistent_id.to_le_bytes());
    h.resize(MHBD_HEADER_SIZE, 0);
    h
}

fn build_track_list_section(tracks: &[Track]) -> Vec<u8> {
    let mut list = Vec::new();
    list.extend_from_slice(b"mhlt");
    list.extend_from_slice(&(MHLT_HEADER_SIZE as u32).to_le_bytes());
    list.extend_from_slice(&(tracks.len() as u32).to_le_bytes());
    list.resize(MHLT_HEADER_SIZE, 0);

    for track in tracks {
        list.extend(build_track_record(track));
    }

    let mut section = Vec::with_capacity(MHSD_HEADER_SIZE + list.len());
    section.extend(build_section_header(1, (MHSD_HEADER_SIZE + list.len()) as u32));
    section.extend(list);
    section
}

fn build_playlist_list_section(playlists: &[Playlist]) -> Vec<u8> {
    let mut list = Vec::new();
    list.extend_from_slice(b"mhlp");
    list.extend_from_slice(&(MHLP_HEADER_SIZE as u32).to_le_bytes());
    list.extend_from_slice(&(playlists.len() as u32).to_le_bytes());
    list.resize(MHLP_HEADER_SIZE, 0);

    for playlist in playlists {
        list.extend(build_playlist_record(playlist));
    }

    let mut section = Vec::with_capacity(MHSD_HEADER_SIZE + list.len());
    section.extend(build_section_header(2, (MHSD_HEADER_SIZE + list.len()) as u32));
    section.extend(list);
    section
}

fn build_section_header(section_type: u32, total_len: u32) -> Vec<u8> {
    let mut h = Vec::with_capacity(MHSD_HEADER_SIZE);
    h.extend_from_slice(b"mhsd");
    h.extend_from_slice(&(MHSD_HEADER_SIZE as u32).to_le_bytes());
    h.extend_from_slice(&total_len.to_le_bytes());
    h.extend_from_slice(&section_type.to_le_bytes());
    h.resize(MHSD_HEADER_SIZE, 0);
    h
}

fn build_track_record(track: &Track) -> Vec<u8> {
    let is_mp3 = track.file_type == crate::model::FileType::Mp3;

    let mut children = Vec::new();
    let mut child_count = 0u32;
    for (mhod_type, value) in [
        (MHOD_TITLE, &track.title),
        (MHOD_ARTIST, &track.artist),
        (MHOD_ALBUM, &track.album),
        (MHOD_ALBUM_ARTIST, &track.album_artist),
        (MHOD_GENRE, &track.genre),
        (MHOD_COMPOSER, &track.composer),
        (MHOD_COMMENT, &track.comment),
    ] {
        if !value.is_empty() {
            children.push((mhod_type, value.clone()));
        }
    }
    if !track.path.is_empty() {
        children.push((MHOD_LOCATION, track.path.clone()));
    }
    // Emission order per the wire contract: title, location, artist, album,
    // album-artist, genre, composer, comment.
    let order = [
        MHOD_TITLE,
        MHOD_LOCATION,
        MHOD_ARTIST,
        MHOD_ALBUM,
        MHOD_ALBUM_ARTIST,
        MHOD_GENRE,
        MHOD_COMPOSER,
        MHOD_COMMENT,
    ];
    let mut child_bytes = Vec::new();
    for wanted in order {
        if let Some((_, value)) = children.iter().find(|(t, _)| *t == wanted) {
            child_bytes.extend(build_string_mhod(wanted, value));
            child_count += 1;
        }
    }

    let mut header = Vec::with_capacity(MHIT_HEADER_SIZE);
    header.extend_from_slice(b"mhit");
    header.extend_from_slice(&(MHIT_HEADER_SIZE as u32).to_le_bytes());
    header.extend_from_slice(&((MHIT_HEADER_SIZE + child_bytes.len()) as u32).to_le_bytes());
    header.extend_from_slice(&child_count.to_le_bytes());
    header.extend_from_slice(&track.id.to_le_bytes());
    header.extend_from_slice(&1u32.to_le_bytes()); // visible
    header.extend_from_slice(&file_type_code(track.file_type.ascii_tag()).to_le_bytes());
    header.push(0); // vbr_flag
    header.push(if is_mp3 { 1 } else { 0 }); // codec_flag
    header.push(track.compilation as u8);
    header.push(track.rating);
    header.extend_from_slice(&unix_to_mac_epoch(Some(track.last_modified)).to_le_bytes());
    header.extend_from_slice(&track.size_bytes.to_le_bytes());
    header.extend_from_slice(&track.duration_ms.to_le_bytes());
    header.extend_from_slice(&track.track_number.to_le_bytes());
    header.extend_from_slice(&track.total_tracks.to_le_bytes());
    header.extend_from_slice(&track.year.to_le_bytes());
    header.extend_from_slice(&track.bitrate.to_le_bytes());
    header.extend_from_slice(&(track.sample_rate << 16).to_le_bytes());
    header.extend_from_slice(&0i32.to_le_bytes()); // volume
    header.extend_from_slice(&0u32.to_le_bytes()); // start_time
    header.extend_from_slice(&0u32.to_le_bytes()); // stop_time
    header.extend_from_slice(&0u32.to_le_bytes()); // soundcheck
    header.extend_from_slice(&track.play_count.to_le_bytes());
    header.extend_from_slice(&track.play_count.to_le_bytes()); // play_count2
    header.extend_from_slice(&unix_to_mac_epoch(track.last_played).to_le_bytes());
    header.extend_from_slice(&track.disc_number.to_le_bytes());
    header.extend_from_slice(&track.total_discs.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // user_id
    header.extend_from_slice(&unix_to_mac_epoch(Some(track.date_added)).to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // bookmark_time
    header.extend_from_slice(&track.dbid.to_le_bytes());
    header.push(0); // checked
    header.push(0); // app_rating
    header.extend_from_slice(&0u16.to_le_bytes()); // bpm
    header.extend_from_slice(&0u16.to_le_bytes()); // artwork_count
    header.extend_from_slice(&0xFFFFu16.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // artwork_size
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&0f32.to_le_bytes()); // sample_rate_float
    header.extend_from_slice(&0u32.to_le_bytes()); // date_released
    header.extend_from_slice(&(if is_mp3 { 0x000Cu16 } else { 0x0033u16 }).to_le_bytes());
    header.extend_from_slice(&0u16.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&track.skip_count.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // last_skipped
    header.push(0x02); // has_artwork
    header.push(0); // skip_when_shuffling
    header.push(0); // remember_position
    header.push(0); // podcast_flag
    header.extend_from_slice(&track.dbid.to_le_bytes()); // dbid2
    header.push(0); // has_lyrics
    header.push(0); // is_movie
    header.push(0); // played_mark
    header.push(0);
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&track.gapless.pregap.to_le_bytes());
    header.extend_from_slice(&track.gapless.sample_count.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&track.gapless.postgap.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&track.media_type.wire_value().to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // season_number
    header.extend_from_slice(&0u32.to_le_bytes()); // episode_number
    header.extend_from_slice(&[0u8; 24]);
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&track.gapless.gapless_data.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&(track.gapless.track_flag as u16).to_le_bytes());
    header.extend_from_slice(&(track.gapless.album_flag as u16).to_le_bytes());
    header.extend_from_slice(&[0u8; 20]); // integrity hash slot, left zero
    header.resize(MHIT_HEADER_SIZE, 0);

    header.extend(child_bytes);
    header
}

fn build_string_mhod(mhod_type: u32, value: &str) -> Vec<u8> {
    let payload = if mhod_type == MHOD_LOCATION {
        encode_path(value).unwrap_or_else(|e| {
            log::error!("failed to encode on-device path {value:?}: {e}");
            Vec::new()
        })
    } else {
        encode_text(value)
    };

    let mut out = Vec::with_capacity(MHOD_HEADER_SIZE + 16 + payload.len());
    out.extend_from_slice(b"mhod");
    out.extend_from_slice(&(MHOD_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&((MHOD_HEADER_SIZE + 16 + payload.len()) as u32).to_le_bytes());
    out.extend_from_slice(&mhod_type.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // encoding_marker
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // encoding_flag
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend(payload);
    out
}

fn build_position_mhod(position: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(MHOD_HEADER_SIZE + 4);
    out.extend_from_slice(b"mhod");
    out.extend_from_slice(&(MHOD_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&((MHOD_HEADER_SIZE + 4) as u32).to_le_bytes());
    out.extend_from_slice(&MHOD_POSITION.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&position.to_le_bytes());
    out
}

fn build_playlist_item(track_id: u32, position: u32) -> Vec<u8> {
    let position_mhod = build_position_mhod(position);

    let mut header = Vec::with_capacity(MHIP_HEADER_SIZE);
    header.extend_from_slice(b"mhip");
    header.extend_from_slice(&(MHIP_HEADER_SIZE as u32).to_le_bytes());
    header.extend_from_slice(&((MHIP_HEADER_SIZE + position_mhod.len()) as u32).to_le_bytes());
    header.extend_from_slice(&1u32.to_le_bytes()); // num_children
    header.extend_from_slice(&0u16.to_le_bytes()); // podcast_group_flag
    header.extend_from_slice(&0u16.to_le_bytes());
    header.extend_from_slice(&(position + 1).to_le_bytes()); // group_id
    header.extend_from_slice(&track_id.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // timestamp
    header.extend_from_slice(&0u32.to_le_bytes()); // podcast_group_ref
    header.resize(MHIP_HEADER_SIZE, 0);

    header.extend(position_mhod);
    header
}

fn build_playlist_record(playlist: &Playlist) -> Vec<u8> {
    let title_mhod = if playlist.is_master {
        Vec::new()
    } else {
        build_string_mhod(MHOD_TITLE, &playlist.name)
    };
    let num_string_children = if title_mhod.is_empty() { 0u32 } else { 1u32 };

    let mut items = Vec::new();
    for (position, &track_id) in playlist.track_ids.iter().enumerate() {
        items.extend(build_playlist_item(track_id, position as u32));
    }

    let total_len = MHYP_HEADER_SIZE + title_mhod.len() + items.len();

    let mut header = Vec::with_capacity(MHYP_HEADER_SIZE);
    header.extend_from_slice(b"mhyp");
    header.extend_from_slice(&(MHYP_HEADER_SIZE as u32).to_le_bytes());
    header.extend_from_slice(&(total_len as u32).to_le_bytes());
    header.extend_from_slice(&num_string_children.to_le_bytes());
    header.extend_from_slice(&(playlist.track_ids.len() as u32).to_le_bytes());
    header.push(playlist.is_master as u8);
    header.extend_from_slice(&[0u8; 3]);
    header.extend_from_slice(&unix_to_mac_epoch(Some(playlist.timestamp)).to_le_bytes());
    header.extend_from_slice(&(playlist.id as u64).to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&(num_string_children as u16).to_le_bytes());
    header.extend_from_slice(&(playlist.is_podcast as u16).to_le_bytes());
    header.extend_from_slice(&playlist.sort_order.wire_value().to_le_bytes());
    header.resize(MHYP_HEADER_SIZE, 0);

    header.extend(title_mhod);
    header.extend(items);
    header
}
