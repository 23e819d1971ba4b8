//! Fixed header sizes, the two string codecs, epoch conversion, and the
//! file-type wire encoding. Every other codec module reads its offset
//! table against the constants here.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{LibraryError, Result};

/// Seconds between the Mac HFS+ epoch (1904-01-01) and the Unix epoch.
pub const MAC_EPOCH_OFFSET: u64 = 2_082_844_800;

pub const MHBD_HEADER_SIZE: usize = 104;
pub const MHSD_HEADER_SIZE: usize = 96;
pub const MHLT_HEADER_SIZE: usize = 92;
pub const MHLP_HEADER_SIZE: usize = 92;
pub const MHIT_HEADER_SIZE: usize = 388;
pub const MHYP_HEADER_SIZE: usize = 108;
pub const MHIP_HEADER_SIZE: usize = 76;
pub const MHOD_HEADER_SIZE: usize = 24;

/// Maximum encoded byte length of an on-device path.
pub const MAX_PATH_BYTES: usize = 112;

pub const MHOD_TITLE: u32 = 1;
pub const MHOD_LOCATION: u32 = 2;
pub const MHOD_ALBUM: u32 = 3;
pub const MHOD_ARTIST: u32 = 4;
pub const MHOD_GENRE: u32 = 5;
pub const MHOD_COMMENT: u32 = 8;
pub const MHOD_COMPOSER: u32 = 12;
pub const MHOD_ALBUM_ARTIST: u32 = 22;
pub const MHOD_POSITION: u32 = 100;

/// Encode a string as UTF-16LE with no BOM and no null terminator.
pub fn encode_text(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2);
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Decode a UTF-16LE byte slice. Malformed surrogate pairs are replaced
/// with U+FFFD, matching `char::decode_utf16`'s lossy mode.
pub fn decode_text(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Encode an on-device path: ensure a leading `:`, then turn any `/` into
/// `:`, then encode as UTF-16LE. Fails if the encoded form exceeds
/// [`MAX_PATH_BYTES`].
pub fn encode_path(path: &str) -> Result<Vec<u8>> {
    let with_leading_colon = if path.starts_with(':') {
        path.to_string()
    } else {
        format!(":{path}")
    };
    let normalized = with_leading_colon.replace('/', ":");
    let encoded = encode_text(&normalized);
    if encoded.len() > MAX_PATH_BYTES {
        return Err(LibraryError::PathTooLong(normalized));
    }
    Ok(encoded)
}

/// Decode an on-device path from its UTF-16LE wire form.
pub fn decode_path(bytes: &[u8]) -> String {
    decode_text(bytes)
}

/// Convert a Mac HFS+ epoch timestamp (seconds since 1904-01-01) to a UTC
/// instant. `0` means "unset" and decodes to `None`.
pub fn mac_epoch_to_unix(seconds: u32) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    let unix_secs = seconds as i64 - MAC_EPOCH_OFFSET as i64;
    Utc.timestamp_opt(unix_secs, 0).single()
}

/// Convert a UTC instant to a Mac HFS+ epoch timestamp. `None` encodes as `0`.
pub fn unix_to_mac_epoch(instant: Option<DateTime<Utc>>) -> u32 {
    match instant {
        None => 0,
        Some(t) => (t.timestamp() + MAC_EPOCH_OFFSET as i64).max(0) as u32,
    }
}

/// Compute the on-wire `file_type` code for a 4-character, space-padded
/// ASCII extension tag (e.g. `"MP3 "`). The wire format stores the bytes
/// reversed from natural ASCII order; reading those wire bytes back with
/// `u32::from_le_bytes` reproduces the value returned here, so a single
/// table serves both directions.
pub fn file_type_code(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

/// Inverse of [`file_type_code`]: recover the 4-character ASCII tag from the
/// on-wire value read as a little-endian u32.
pub fn file_type_tag(code: u32) -> [u8; 4] {
    code.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_roundtrip_ascii() {
        let encoded = encode_text("Hello");
        assert_eq!(encoded, b"H\x00e\x00l\x00l\x00o\x00");
        assert_eq!(decode_text(&encoded), "Hello");
    }

    #[test]
    fn text_roundtrip_unicode() {
        let s = "Café 日本語";
        assert_eq!(decode_text(&encode_text(s)), s);
    }

    #[test]
    fn text_empty() {
        assert!(encode_text("").is_empty());
        assert_eq!(decode_text(&[]), "");
    }

    #[test]
    fn path_prepends_colon_before_slash_substitution() {
        let encoded = encode_path("/iPod_Control/Music/F00/X.mp3").unwrap();
        assert_eq!(encoded, encode_text("::iPod_Control:Music:F00:X.mp3"));
    }

    #[test]
    fn path_without_leading_slash_just_gets_colon() {
        let encoded = encode_path("iPod_Control:Music:F00:ABCD.mp3").unwrap();
        assert_eq!(encoded, encode_text(":iPod_Control:Music:F00:ABCD.mp3"));
    }

    #[test]
    fn path_roundtrip() {
        let p = ":iPod_Control:Music:F07:ABCD.mp3";
        let encoded = encode_path(p).unwrap();
        assert_eq!(decode_path(&encoded), p);
    }

    #[test]
    fn path_at_max_length_succeeds() {
        // 56 UTF-16 code units * 2 bytes = 112 bytes, the maximum.
        let stem = "A".repeat(55);
        let path = format!(":{stem}");
        assert_eq!(encode_text(&path).len(), MAX_PATH_BYTES);
        assert!(encode_path(&path).is_ok());
    }

    #[test]
    fn path_over_max_length_fails() {
        let stem = "A".repeat(56);
        let path = format!(":{stem}");
        assert!(encode_text(&path).len() > MAX_PATH_BYTES);
        assert!(matches!(
            encode_path(&path),
            Err(LibraryError::PathTooLong(_))
        ));
    }

    #[test]
    fn epoch_zero_is_unset() {
        assert_eq!(mac_epoch_to_unix(0), None);
        assert_eq!(unix_to_mac_epoch(None), 0);
    }

    #[test]
    fn epoch_roundtrip() {
        let original = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let mac = unix_to_mac_epoch(Some(original));
        assert_eq!(mac_epoch_to_unix(mac), Some(original));
    }

    #[test]
    fn file_type_code_mp3() {
        assert_eq!(file_type_code(b"MP3 "), 0x4D503320);
        // On the wire, writing that value as LE bytes reverses the ASCII.
        assert_eq!(file_type_code(b"MP3 ").to_le_bytes(), *b" 3PM");
    }

    #[test]
    fn file_type_tag_roundtrip() {
        assert_eq!(file_type_tag(file_type_code(b"MP3 ")), *b"MP3 ");
        assert_eq!(file_type_tag(file_type_code(b"M4A ")), *b"M4A ");
    }
}
