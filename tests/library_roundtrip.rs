//! End-to-end tests over a simulated device mount: save/load round-trips
//! and the filesystem-pairing sync path, all against a `tempfile::TempDir`
//! standing in for a real iPod mount point.

use ipod_librarian::device::{save_library, sync_file, sync_folder, Device};
use ipod_librarian::metadata::StubMetadataProvider;
use ipod_librarian::model::{Playlist, Track};
use ipod_librarian::{Library, LibraryError};
use rand::SeedableRng;
use std::fs;
use tempfile::TempDir;

fn rng() -> rand::rngs::StdRng {
    rand::rngs::StdRng::seed_from_u64(1)
}

#[test]
fn empty_save_and_load_roundtrips() {
    let mount = TempDir::new().unwrap();
    let device = Device::new(mount.path());

    let mut library = Library::new();
    save_library(&device, &mut library, &mut rng()).unwrap();

    let loaded = ipod_librarian::device::load_library(&device).unwrap();
    assert_eq!(loaded.version, 0x15);
    assert_eq!(loaded.language, "en");
    assert!(loaded.tracks().is_empty());
    assert_eq!(loaded.playlist_count(), 1);
    assert!(loaded.master_playlist().unwrap().track_ids.is_empty());
}

#[test]
fn two_track_roundtrip_preserves_order_and_fields() {
    let mount = TempDir::new().unwrap();
    let device = Device::new(mount.path());

    let mut library = Library::new();
    library.add_playlist(Playlist::master(1));

    let mut t1 = Track::new(1, 0, ":iPod_Control:Music:F00:S001.mp3");
    t1.title = "Song One".to_string();
    t1.artist = "Artist A".to_string();
    t1.album = "Album X".to_string();
    library.add_track(t1);

    let mut t2 = Track::new(2, 0, ":iPod_Control:Music:F00:S002.mp3");
    t2.title = "Song Two".to_string();
    t2.artist = "Artist A".to_string();
    t2.album = "Album X".to_string();
    library.add_track(t2);
    library.master_playlist_mut().unwrap().track_ids = vec![1, 2];

    save_library(&device, &mut library, &mut rng()).unwrap();
    let loaded = ipod_librarian::device::load_library(&device).unwrap();

    assert_eq!(loaded.tracks().len(), 2);
    assert_eq!(loaded.tracks()[0].title, "Song One");
    assert_eq!(loaded.master_playlist().unwrap().track_ids, vec![1, 2]);
}

#[test]
fn user_playlist_survives_a_save_and_load_cycle() {
    let mount = TempDir::new().unwrap();
    let device = Device::new(mount.path());

    let mut library = Library::new();
    library.add_playlist(Playlist::master(1));
    library.add_track(Track::new(1, 0, ":iPod_Control:Music:F00:S001.mp3"));
    library.master_playlist_mut().unwrap().track_ids = vec![1];

    let mut favorites = Playlist::new(2, "Favorites");
    favorites.track_ids = vec![1];
    library.add_playlist(favorites);

    save_library(&device, &mut library, &mut rng()).unwrap();
    let loaded = ipod_librarian::device::load_library(&device).unwrap();

    let favorites = loaded
        .playlists()
        .iter()
        .find(|p| !p.is_master)
        .expect("a non-master playlist should have survived the round-trip");
    assert_eq!(favorites.name, "Favorites");
    assert_eq!(favorites.track_ids, vec![1]);
}

#[test]
fn master_playlist_rejects_delete_rename_and_clear() {
    let mut library = Library::new();
    library.add_playlist(Playlist::master(1));

    assert!(matches!(
        library.delete_playlist(1),
        Err(LibraryError::MasterProtected)
    ));
    assert!(matches!(
        library.rename_playlist(1, "x"),
        Err(LibraryError::MasterProtected)
    ));
    assert!(matches!(
        library.clear_playlist(1),
        Err(LibraryError::MasterProtected)
    ));
}

#[test]
fn load_balanced_placement_picks_the_emptiest_folder() {
    use ipod_librarian::device::{ensure_music_folders, select_folder};

    let mount = TempDir::new().unwrap();
    let device = Device::new(mount.path());
    ensure_music_folders(&device).unwrap();

    for i in 0..10u8 {
        let folder = device.folder_path(i);
        for n in 0..5 {
            fs::write(folder.join(format!("existing{n}.mp3")), b"x").unwrap();
        }
    }

    assert_eq!(select_folder(&device).unwrap(), 10);
}

#[test]
fn sync_file_copies_onto_the_device_and_persists_through_save_load() {
    let mount = TempDir::new().unwrap();
    let device = Device::new(mount.path());
    let mut library = Library::new();
    library.add_playlist(Playlist::master(1));

    let sources = TempDir::new().unwrap();
    let source = sources.path().join("My Song.mp3");
    fs::write(&source, b"audio bytes").unwrap();

    let track = sync_file(
        &device,
        &mut library,
        &source,
        &StubMetadataProvider,
        true,
        &mut rng(),
    )
    .unwrap();
    assert_eq!(track.title, "My Song");

    save_library(&device, &mut library, &mut rng()).unwrap();
    let loaded = ipod_librarian::device::load_library(&device).unwrap();
    assert_eq!(loaded.tracks().len(), 1);
    assert_eq!(loaded.tracks()[0].title, "My Song");
    assert_eq!(loaded.master_playlist().unwrap().track_ids, vec![track.id]);
}

#[test]
fn sync_folder_builds_a_batch_report_and_an_optional_playlist() {
    let mount = TempDir::new().unwrap();
    let device = Device::new(mount.path());
    let mut library = Library::new();
    library.add_playlist(Playlist::master(1));

    let sources = TempDir::new().unwrap();
    fs::write(sources.path().join("one.mp3"), b"one").unwrap();
    fs::write(sources.path().join("two.mp3"), b"two").unwrap();
    fs::write(sources.path().join("readme.txt"), b"not audio").unwrap();

    let report = sync_folder(
        &device,
        &mut library,
        sources.path(),
        false,
        true,
        &StubMetadataProvider,
        &mut rng(),
        None,
        || false,
    );

    assert_eq!(report.synced.len(), 2);
    assert!(report.failed.is_empty());
    assert_eq!(library.track_count(), 2);
    assert_eq!(library.master_playlist().unwrap().track_ids.len(), 2);
    assert!(library
        .playlists()
        .iter()
        .any(|p| !p.is_master && p.track_ids.len() == 2));
}
