//! Injectable entropy source.
//!
//! The serializer and the sync layer both need randomness (fresh 64-bit
//! persistent IDs, random on-device filenames) but must stay deterministic
//! under test. Every call site that needs entropy takes `&mut dyn RngCore`
//! rather than reaching for a global generator.

use rand::rngs::ThreadRng;
use rand::{Rng, RngCore};

/// A production entropy source. Tests should build a seeded
/// `rand::rngs::StdRng::seed_from_u64(n)` instead for determinism.
pub fn system_rng() -> ThreadRng {
    rand::rng()
}

/// Generate a nonzero random 63-bit ID, as used for `database_id`,
/// `library_persistent_id`, and a fresh track's `dbid`.
pub fn random_persistent_id(rng: &mut dyn RngCore) -> u64 {
    loop {
        let id = rng.next_u64() & 0x7FFF_FFFF_FFFF_FFFF;
        if id != 0 {
            return id;
        }
    }
}

const FILENAME_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random 4-character uppercase-alphanumeric basename.
pub fn random_filename_stem(rng: &mut dyn RngCore) -> String {
    (0..4)
        .map(|_| {
            let idx = rng.random_range(0..FILENAME_ALPHABET.len());
            FILENAME_ALPHABET[idx] as char
        })
        .collect()
}
