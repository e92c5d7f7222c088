//! Save snapshot file format
//!
//! A save is a 16 byte header followed by a brotli stream:
//!
//! ```text
//! u64 raw_size          (little-endian, decompressed byte length)
//! u64 compressed_size   (little-endian, length of the payload below)
//! [u8; compressed_size] brotli output of the UTF-8 JSON snapshot
//! ```
//!
//! The JSON root is an object mapping stringified entity ids to entity
//! objects. Writes are all-or-nothing: each write goes to its own temporary
//! file next to the final name and is renamed into place once fully on disk.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Size of the `raw_size` + `compressed_size` header
pub const HEADER_LEN: usize = 16;

/// File extension used for save snapshots
pub const SAVE_EXTENSION: &str = "sav";

/// Error type for reading and writing save snapshots
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("compression failed: {0}")]
    Compression(String),
    #[error("decompression failed: {0}")]
    Decompression(String),
    #[error("save file truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },
    #[error("decompressed size mismatch: header says {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("save is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("save is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save root is not a JSON object")]
    NotAnObject,
    #[error("save thread exited without reporting a result")]
    Interrupted,
}

/// Compress `raw` and prepend the size header.
pub fn encode(raw: &[u8]) -> Result<Vec<u8>, SaveError> {
    // Quality 6, window 22 - same balance of speed/ratio as level files
    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(raw),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(|e| SaveError::Compression(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(&(raw.len() as u64).to_le_bytes());
    out.extend_from_slice(&(compressed.len() as u64).to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

/// Validate the header and decompress the payload.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, SaveError> {
    if bytes.len() < HEADER_LEN {
        return Err(SaveError::Truncated {
            expected: HEADER_LEN as u64,
            actual: bytes.len() as u64,
        });
    }

    let raw_size = read_u64(&bytes[0..8]);
    let compressed_size = read_u64(&bytes[8..16]);
    let payload = &bytes[HEADER_LEN..];
    if (payload.len() as u64) < compressed_size {
        return Err(SaveError::Truncated {
            expected: HEADER_LEN as u64 + compressed_size,
            actual: bytes.len() as u64,
        });
    }

    let mut decompressed = Vec::new();
    brotli::BrotliDecompress(
        &mut Cursor::new(&payload[..compressed_size as usize]),
        &mut decompressed,
    )
    .map_err(|e| SaveError::Decompression(e.to_string()))?;

    if decompressed.len() as u64 != raw_size {
        return Err(SaveError::SizeMismatch {
            expected: raw_size,
            actual: decompressed.len() as u64,
        });
    }
    Ok(decompressed)
}

/// Compress `raw` and write it to `path`.
///
/// Nothing is left at `path` (or next to it) when compression or writing fails.
pub fn write_save(path: &Path, raw: &[u8]) -> Result<(), SaveError> {
    let bytes = encode(raw)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Each write stages into its own file; a failed persist drops (and deletes) it
    let mut staging = NamedTempFile::new_in(dir)?;
    staging.write_all(&bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| SaveError::Io(e.error))?;
    Ok(())
}

/// First `<base>`, `<base>-1`, `<base>-2`... that has no save file in `dir`
/// and isn't in `taken`.
pub fn unique_save_name(dir: &Path, base: &str, taken: &[&str]) -> String {
    let free = |name: &str| {
        !taken.contains(&name) && !dir.join(format!("{}.{}", name, SAVE_EXTENSION)).exists()
    };
    if free(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|name| free(name.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Read a save file and return its decompressed JSON text.
pub fn read_save(path: &Path) -> Result<String, SaveError> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8(decode(&bytes)?)?)
}

/// Read a save file and parse its id → entity mapping.
pub fn read_snapshot(path: &Path) -> Result<Map<String, Value>, SaveError> {
    let text = read_save(path)?;
    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(SaveError::NotAnObject),
    }
}

/// Filesystem-safe save name for the given moment (no extension).
pub fn save_file_name(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"{"17":{"x":1.0,"y":2.0,"motion_x":0.0,"motion_y":0.0,"id":17}}"#;

    #[test]
    fn test_header_records_sizes() {
        let bytes = encode(SNAPSHOT.as_bytes()).unwrap();
        assert_eq!(read_u64(&bytes[0..8]), SNAPSHOT.len() as u64);
        assert_eq!(read_u64(&bytes[8..16]), (bytes.len() - HEADER_LEN) as u64);
    }

    #[test]
    fn test_write_and_read_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saves").join("first.sav");

        write_save(&path, SNAPSHOT.as_bytes()).unwrap();
        let snapshot = read_snapshot(&path).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["17"]["id"], 17);
        // Staging file was renamed away
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = encode(SNAPSHOT.as_bytes()).unwrap();
        let result = decode(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(SaveError::Truncated { .. })));

        let result = decode(&bytes[..10]);
        assert!(matches!(result, Err(SaveError::Truncated { expected: 16, actual: 10 })));
    }

    #[test]
    fn test_corrupt_payload_reports_decompression_error() {
        let raw = SNAPSHOT.repeat(50);
        let bytes = encode(raw.as_bytes()).unwrap();

        // Cut the brotli stream in half but keep the header self-consistent
        let half = (bytes.len() - HEADER_LEN) / 2;
        let mut cut = bytes[..HEADER_LEN + half].to_vec();
        cut[8..16].copy_from_slice(&(half as u64).to_le_bytes());

        let err = decode(&cut).unwrap_err();
        assert!(matches!(err, SaveError::Decompression(_)));
        assert!(err.to_string().starts_with("decompression failed"));
    }

    #[test]
    fn test_raw_size_mismatch() {
        let mut bytes = encode(SNAPSHOT.as_bytes()).unwrap();
        bytes[0..8].copy_from_slice(&1u64.to_le_bytes());
        assert!(matches!(
            decode(&bytes),
            Err(SaveError::SizeMismatch { expected: 1, .. })
        ));
    }

    #[test]
    fn test_non_object_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.sav");
        write_save(&path, b"[1, 2, 3]").unwrap();
        assert!(matches!(read_snapshot(&path), Err(SaveError::NotAnObject)));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_save(&dir.path().join("nope.sav")),
            Err(SaveError::Io(_))
        ));
    }

    #[test]
    fn test_save_file_name_is_filesystem_safe() {
        let when = Local.with_ymd_and_hms(2016, 7, 3, 14, 5, 9).unwrap();
        let name = save_file_name(when);
        assert_eq!(name, "2016-07-03_14-05-09");
        assert!(!name.contains(':'));
    }

    #[test]
    fn test_unique_save_name_skips_existing_and_taken() {
        let dir = TempDir::new().unwrap();
        let base = "2016-07-03_14-05-09";
        assert_eq!(unique_save_name(dir.path(), base, &[]), base);

        write_save(&dir.path().join(format!("{}.sav", base)), b"{}").unwrap();
        assert_eq!(unique_save_name(dir.path(), base, &[]), format!("{}-1", base));

        let taken = format!("{}-1", base);
        assert_eq!(
            unique_save_name(dir.path(), base, &[taken.as_str()]),
            format!("{}-2", base)
        );
    }
}
