//! Crate-wide error taxonomy.
//!
//! One enum covers the codec, the mutation API, and the filesystem-pairing
//! layer. Internal I/O-heavy code still reaches for `anyhow::Context` to
//! attach a path or operation before folding the result into [`LibraryError::Io`];
//! callers of this crate only ever see `LibraryError`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the iTunesDB codec, the library mutation API, and
/// device filesystem pairing.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The byte stream is not a well-formed iTunesDB at the top level.
    #[error("invalid database: {0}")]
    InvalidDatabase(String),

    /// An on-device path encoded to more than 112 bytes.
    #[error("encoded path exceeds 112 bytes: {0:?}")]
    PathTooLong(String),

    /// A referenced track or playlist ID does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A playlist name collided with an existing one.
    #[error("duplicate playlist name: {0:?}")]
    Duplicate(String),

    /// The operation targeted the master playlist, which cannot be
    /// deleted, renamed, or cleared.
    #[error("master playlist is protected from this operation")]
    MasterProtected,

    /// The track is already a member of the playlist.
    #[error("track {track_id} already present in playlist {playlist_id}")]
    AlreadyPresent { playlist_id: u32, track_id: u32 },

    /// The track is not a member of the playlist.
    #[error("track {track_id} not present in playlist {playlist_id}")]
    NotPresent { playlist_id: u32, track_id: u32 },

    /// `reorder_playlist` was called with a different multiset of track IDs.
    #[error("reorder must contain exactly the playlist's current tracks")]
    OrderMismatch,

    /// The source file extension is not one this device supports.
    #[error("unsupported source format: {0:?}")]
    UnsupportedFormat(String),

    /// Duplicate-detection heuristic matched an existing (title, artist, album) triple.
    #[error("track already exists: {artist} - {title}")]
    AlreadyExists { title: String, artist: String },

    /// Underlying filesystem error, with the path it occurred on when known.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },
}

impl From<io::Error> for LibraryError {
    fn from(source: io::Error) -> Self {
        LibraryError::Io { path: None, source }
    }
}

impl LibraryError {
    /// Attach a path to an I/O error for a more useful message, without
    /// changing the variant a caller matches on.
    pub fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LibraryError::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Fold an `anyhow::Error` built from `.context(...)`-annotated I/O calls
    /// into the public `Io` variant. The context chain (path, operation) is
    /// preserved in the error message; the original `io::Error` is recovered
    /// as the `#[source]` when it's still the root cause.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let message = err.to_string();
        let kind = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<io::Error>())
            .map(|io_err| io_err.kind())
            .unwrap_or(io::ErrorKind::Other);
        LibraryError::Io {
            path: None,
            source: io::Error::new(kind, message),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn from_anyhow_preserves_context_message_and_io_kind() {
        let root = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let wrapped: anyhow::Result<()> = Err(root).context("reading /mnt/ipod/iTunesDB");

        let err = LibraryError::from_anyhow(wrapped.unwrap_err());
        match err {
            LibraryError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
                assert!(source.to_string().contains("reading /mnt/ipod/iTunesDB"));
            }
            other => panic!("expected Io variant, got {other:?}"),
        }
    }
}
