//! On-device directory layout: folder load-balancing, filename allocation,
//! and conversion between the colon-delimited on-device path form and real
//! filesystem paths.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::RngCore;

use crate::error::{LibraryError, Result};
use crate::rng::random_filename_stem;

use super::Device;

/// Number of load-balanced music folders, `F00` through `F49`.
pub const FOLDER_COUNT: u8 = 50;

/// Create `iPod_Control/Music/F00`..`F49` and the `iTunes` directory
/// alongside it, if they don't already exist.
pub fn ensure_music_folders(device: &Device) -> Result<()> {
    ensure_music_folders_inner(device).map_err(LibraryError::from_anyhow)
}

fn ensure_music_folders_inner(device: &Device) -> anyhow::Result<()> {
    for i in 0..FOLDER_COUNT {
        let folder = device.folder_path(i);
        fs::create_dir_all(&folder)
            .with_context(|| format!("creating music folder {folder:?}"))?;
    }
    let itunes_dir = device.mount_root.join("iPod_Control").join("iTunes");
    fs::create_dir_all(&itunes_dir)
        .with_context(|| format!("creating iTunes directory {itunes_dir:?}"))?;
    Ok(())
}

/// Pick the `Fnn` folder with the fewest entries, creating folders on demand
/// first. Ties go to the lowest index.
pub fn select_folder(device: &Device) -> Result<u8> {
    ensure_music_folders(device)?;
    select_folder_inner(device).map_err(LibraryError::from_anyhow)
}

fn select_folder_inner(device: &Device) -> anyhow::Result<u8> {
    let mut best_index = 0u8;
    let mut best_count = usize::MAX;
    for i in 0..FOLDER_COUNT {
        let folder = device.folder_path(i);
        let count = fs::read_dir(&folder)
            .with_context(|| format!("listing music folder {folder:?}"))?
            .count();
        if count < best_count {
            best_count = count;
            best_index = i;
        }
    }
    log::debug!("selected F{best_index:02} ({best_count} entries)");
    Ok(best_index)
}

/// Draw a random 4-character `A-Z0-9` basename for `folder`, resampling on
/// collision with an existing file.
pub fn allocate_filename(folder: &Path, extension: &str, rng: &mut dyn RngCore) -> String {
    loop {
        let stem = random_filename_stem(rng);
        let filename = format!("{stem}.{extension}");
        if !folder.join(&filename).exists() {
            return filename;
        }
    }
}

/// Build the on-device colon path for `filename` inside `Fnn`.
pub fn device_path_for(folder_index: u8, filename: &str) -> String {
    format!(":iPod_Control:Music:F{folder_index:02}:{filename}")
}

/// Resolve an on-device colon path to a real filesystem path under the
/// mount root: strip the leading `:`, then turn every remaining `:` into a
/// path separator.
pub fn filesystem_path_for(device: &Device, on_device_path: &str) -> PathBuf {
    let relative = on_device_path
        .trim_start_matches(':')
        .replace(':', "/");
    device.mount_root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn select_folder_prefers_lowest_index_on_tie() {
        let tmp = TempDir::new().unwrap();
        let device = Device::new(tmp.path());
        let chosen = select_folder(&device).unwrap();
        assert_eq!(chosen, 0);
    }

    #[test]
    fn select_folder_picks_the_emptiest_folder() {
        let tmp = TempDir::new().unwrap();
        let device = Device::new(tmp.path());
        ensure_music_folders(&device).unwrap();

        for i in 0..10u8 {
            let folder = device.folder_path(i);
            for n in 0..5 {
                fs::write(folder.join(format!("F{n}.mp3")), b"x").unwrap();
            }
        }

        assert_eq!(select_folder(&device).unwrap(), 10);
    }

    #[test]
    fn allocate_filename_avoids_existing_names() {
        use rand::SeedableRng;

        let tmp = TempDir::new().unwrap();
        let device = Device::new(tmp.path());
        ensure_music_folders(&device).unwrap();
        let folder = device.folder_path(0);

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let first = allocate_filename(&folder, "mp3", &mut rng);
        fs::write(folder.join(&first), b"x").unwrap();

        let mut rng2 = rand::rngs::StdRng::seed_from_u64(7);
        let second = allocate_filename(&folder, "mp3", &mut rng2);
        assert_ne!(first, second);
    }

    #[test]
    fn device_path_roundtrips_through_filesystem_path() {
        let device = Device::new("/mnt/ipod");
        let path = device_path_for(7, "ABCD.mp3");
        assert_eq!(path, ":iPod_Control:Music:F07:ABCD.mp3");
        assert_eq!(
            filesystem_path_for(&device, &path),
            PathBuf::from("/mnt/ipod/iPod_Control/Music/F07/ABCD.mp3")
        );
    }
}
