//! Sync orchestration: copy a source file onto the device and register it,
//! or batch-sync a whole folder cooperatively.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::RngCore;
use walkdir::WalkDir;

use crate::error::{LibraryError, Result};
use crate::metadata::MetadataProvider;
use crate::model::{FileType, Library, MediaType, SortOrder, Track};
use crate::rng::random_persistent_id;

use super::organizer::{allocate_filename, device_path_for, filesystem_path_for, select_folder};
use super::Device;

/// Copy one source file onto the device and append it to `library`'s
/// master playlist: validate the extension, read metadata, optionally
/// check for a duplicate, pick a folder and filename, copy the bytes,
/// then register the new track.
pub fn sync_file(
    device: &Device,
    library: &mut Library,
    source: &Path,
    provider: &dyn MetadataProvider,
    check_duplicate: bool,
    rng: &mut dyn RngCore,
) -> Result<Track> {
    let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("");
    let file_type = FileType::from_extension(extension)
        .ok_or_else(|| LibraryError::UnsupportedFormat(extension.to_string()))?;

    let record = provider.read(source);

    if check_duplicate
        && library
            .tracks()
            .iter()
            .any(|t| t.title == record.title && t.artist == record.artist && t.album == record.album)
    {
        return Err(LibraryError::AlreadyExists {
            title: record.title,
            artist: record.artist,
        });
    }

    let folder_index = select_folder(device)?;
    let folder = device.folder_path(folder_index);
    let filename = allocate_filename(&folder, extension, rng);
    let dest = folder.join(&filename);

    copy_preserving_mtime(source, &dest)?;

    let size_bytes = dest
        .metadata()
        .with_context(|| format!("reading size of synced file {dest:?}"))
        .map_err(LibraryError::from_anyhow)?
        .len() as u32;

    let on_device_path = device_path_for(folder_index, &filename);
    let track_id = library.next_track_id();
    let mut track = Track::new(track_id, random_persistent_id(rng), on_device_path);
    track.title = record.title;
    track.artist = record.artist;
    track.album = record.album;
    track.album_artist = record.album_artist;
    track.genre = record.genre;
    track.composer = record.composer;
    track.comment = record.comment;
    track.year = record.year;
    track.track_number = record.track_number;
    track.total_tracks = record.total_tracks;
    track.disc_number = record.disc_number;
    track.total_discs = record.total_discs;
    track.duration_ms = record.duration_ms;
    track.bitrate = record.bitrate;
    track.sample_rate = record.sample_rate;
    track.size_bytes = size_bytes;
    track.file_type = file_type;
    track.media_type = MediaType::Audio;

    library.add_track(track.clone());
    if let Some(master) = library.master_playlist_mut() {
        master.track_ids.push(track_id);
    }

    log::info!("synced {source:?} to {dest:?} as track {track_id}");
    Ok(track)
}

fn copy_preserving_mtime(source: &Path, dest: &Path) -> Result<()> {
    copy_preserving_mtime_inner(source, dest).map_err(LibraryError::from_anyhow)
}

fn copy_preserving_mtime_inner(source: &Path, dest: &Path) -> anyhow::Result<()> {
    std::fs::copy(source, dest)
        .with_context(|| format!("copying {source:?} to {dest:?}"))?;

    let modified = std::fs::metadata(source)
        .with_context(|| format!("reading mtime of {source:?}"))?
        .modified()
        .with_context(|| format!("reading mtime of {source:?}"))?;
    filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified))
        .with_context(|| format!("preserving mtime on {dest:?}"))?;
    Ok(())
}

/// Locate a track's on-device file via its stored path, unlink it
/// (non-fatal if already absent), then cascade removal through the library
/// and every playlist.
pub fn remove_track_file(device: &Device, library: &mut Library, track_id: u32) -> Result<()> {
    let track = library
        .track_by_id(track_id)
        .ok_or_else(|| LibraryError::NotFound(format!("track {track_id}")))?;
    let fs_path = filesystem_path_for(device, &track.path);

    if fs_path.exists() {
        if let Err(e) = std::fs::remove_file(&fs_path) {
            log::warn!("failed to remove {fs_path:?}: {e}");
        }
    }

    library.remove_track(track_id)
}

/// Outcome of a batch [`sync_folder`] call: every track that made it in,
/// and every source file that didn't along with why.
#[derive(Debug, Default)]
pub struct SyncBatchReport {
    pub synced: Vec<Track>,
    pub failed: Vec<(PathBuf, LibraryError)>,
}

/// Sync every supported audio file under `folder` into `library`, in sorted
/// path order, one file at a time. `progress` is called `(current, total,
/// filename)` before each attempt; `is_cancelled` is polled between files
/// and, once true, stops the batch without rolling back what already
/// synced.
#[allow(clippy::too_many_arguments)]
pub fn sync_folder(
    device: &Device,
    library: &mut Library,
    folder: &Path,
    recursive: bool,
    create_playlist: bool,
    provider: &dyn MetadataProvider,
    rng: &mut dyn RngCore,
    mut progress: Option<&mut dyn FnMut(usize, usize, &str)>,
    mut is_cancelled: impl FnMut() -> bool,
) -> SyncBatchReport {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(FileType::from_extension)
                .is_some()
        })
        .collect();
    paths.sort();

    let total = paths.len();
    let mut report = SyncBatchReport::default();

    for (i, path) in paths.into_iter().enumerate() {
        if is_cancelled() {
            log::warn!("sync_folder cancelled after {i} of {total} files");
            break;
        }

        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(cb) = progress.as_deref_mut() {
            cb(i + 1, total, &filename);
        }

        match sync_file(device, library, &path, provider, true, rng) {
            Ok(track) => report.synced.push(track),
            Err(e) => {
                log::warn!("failed to sync {path:?}: {e}");
                report.failed.push((path, e));
            }
        }
    }

    if create_playlist && !report.synced.is_empty() {
        let base_name = folder
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Synced".to_string());

        let mut name = base_name.clone();
        let mut counter = 1;
        while library.playlist_by_name(&name).is_some() {
            counter += 1;
            name = format!("{base_name} ({counter})");
        }

        if let Ok(playlist_id) = library.create_playlist(name, SortOrder::Manual) {
            for track in &report.synced {
                let _ = library.add_track_to_playlist(playlist_id, track.id, None);
            }
        }
    }

    report
}
