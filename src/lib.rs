//! iPod Librarian
//!
//! Reads, mutates, and writes the iTunesDB library file used by 5.5-generation
//! iPod-style media players, and pairs that database against the device's
//! music files on disk.
//!
//! This crate is a library: it has no opinion on how a device's mount point
//! is discovered, how audio tags are actually read from a file, or how a
//! caller presents progress to a user. Those are the three external seams
//! ([`device::Device`] construction, [`metadata::MetadataProvider`], and the
//! `sync_folder` progress callback) a host application plugs into.

pub mod codec;
pub mod device;
pub mod error;
pub mod metadata;
pub mod model;
pub mod mutation;
pub mod rng;

pub use device::Device;
pub use error::{LibraryError, Result};
pub use model::{FileType, GaplessInfo, Library, MediaType, Playlist, SortOrder, Track};
