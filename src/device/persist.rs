//! Atomic database persistence: serialize, write to a sibling temp path,
//! then rename over the destination. The rename is the commit point; a
//! failure before it leaves the existing database untouched.

use std::fs;

use anyhow::Context;
use rand::RngCore;

use crate::codec;
use crate::error::{LibraryError, Result};
use crate::model::Library;

use super::Device;

/// Serialize `library` and atomically replace the device's `iTunesDB` file.
pub fn save_library(device: &Device, library: &mut Library, rng: &mut dyn RngCore) -> Result<()> {
    let bytes = codec::serialize(library, rng);
    let len = bytes.len();
    write_atomically(&device.itunes_db_path(), &bytes).map_err(LibraryError::from_anyhow)?;
    log::info!("saved database to {:?} ({len} bytes)", device.itunes_db_path());
    Ok(())
}

fn write_atomically(dest: &std::path::Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {parent:?}"))?;
    }

    let temp = dest.with_extension("tmp");
    fs::write(&temp, bytes).with_context(|| format!("writing temp file {temp:?}"))?;

    if let Err(e) = fs::rename(&temp, dest) {
        let _ = fs::remove_file(&temp);
        return Err(e).with_context(|| format!("renaming {temp:?} to {dest:?}"));
    }
    Ok(())
}

/// Read and parse the device's `iTunesDB` file.
pub fn load_library(device: &Device) -> Result<Library> {
    let path = device.itunes_db_path();
    let bytes = fs::read(&path)
        .with_context(|| format!("reading database file {path:?}"))
        .map_err(LibraryError::from_anyhow)?;
    codec::parse(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_roundtrips_an_empty_library() {
        let tmp = TempDir::new().unwrap();
        let device = Device::new(tmp.path());
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);

        let mut library = Library::new();
        save_library(&device, &mut library, &mut rng).unwrap();

        let loaded = load_library(&device).unwrap();
        assert_eq!(loaded.track_count(), 0);
        assert_eq!(loaded.playlist_count(), 1);
        assert!(loaded.master_playlist().unwrap().track_ids.is_empty());
    }

    #[test]
    fn save_leaves_no_temp_file_behind_on_success() {
        let tmp = TempDir::new().unwrap();
        let device = Device::new(tmp.path());
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);

        let mut library = Library::new();
        save_library(&device, &mut library, &mut rng).unwrap();

        let temp = device.itunes_db_path().with_extension("tmp");
        assert!(!temp.exists());
        assert!(device.itunes_db_path().exists());
    }

    #[test]
    fn load_missing_database_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let device = Device::new(tmp.path());
        let err = load_library(&device).unwrap_err();
        assert!(matches!(err, LibraryError::Io { .. }));
    }
}
