//! Filesystem pairing: load-balanced file placement on the device, the
//! colon-path ↔ filesystem-path conversion, sync orchestration, and atomic
//! database persistence.
//!
//! Everything here talks to a real mount point. The codec and model layers
//! below never touch a filesystem; this is the only module that does.

mod organizer;
mod persist;
mod sync;

pub use organizer::{
    allocate_filename, device_path_for, ensure_music_folders, filesystem_path_for, select_folder,
    FOLDER_COUNT,
};
pub use persist::{load_library, save_library};
pub use sync::{remove_track_file, sync_file, sync_folder, SyncBatchReport};

use std::path::PathBuf;

/// A mounted device, identified solely by its filesystem mount root. Every
/// other on-device path is derived from this one: `iPod_Control/Music/Fnn`
/// for media, `iPod_Control/iTunes/iTunesDB` for the database.
#[derive(Debug, Clone)]
pub struct Device {
    pub mount_root: PathBuf,
}

impl Device {
    pub fn new(mount_root: impl Into<PathBuf>) -> Self {
        Self {
            mount_root: mount_root.into(),
        }
    }

    pub fn music_dir(&self) -> PathBuf {
        self.mount_root.join("iPod_Control").join("Music")
    }

    pub fn itunes_db_path(&self) -> PathBuf {
        self.mount_root
            .join("iPod_Control")
            .join("iTunes")
            .join("iTunesDB")
    }

    pub fn folder_path(&self, index: u8) -> PathBuf {
        self.music_dir().join(format!("F{index:02}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_paths_follow_the_fixed_layout() {
        let device = Device::new("/mnt/ipod");
        assert_eq!(
            device.music_dir(),
            PathBuf::from("/mnt/ipod/iPod_Control/Music")
        );
        assert_eq!(
            device.itunes_db_path(),
            PathBuf::from("/mnt/ipod/iPod_Control/iTunes/iTunesDB")
        );
        assert_eq!(
            device.folder_path(7),
            PathBuf::from("/mnt/ipod/iPod_Control/Music/F07")
        );
    }
}
