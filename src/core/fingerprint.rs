/*!
 * Per-file fingerprints: modification time, size and optional CRC-32
 */

use std::fs::Metadata;
use std::path::Path;

use filetime::FileTime;
use midsync_core_manifest::{Fingerprint, Policy, Timestamp};

use super::checksum::calculate_crc32;
use crate::error::Result;

/// Modification time of `metadata` as a manifest timestamp
pub fn modified_timestamp(metadata: &Metadata) -> Timestamp {
    let modified = FileTime::from_last_modification_time(metadata);
    Timestamp::new(modified.unix_seconds(), modified.nanoseconds())
}

/// Fingerprint the file at `path`; the checksum is computed only when the
/// policy enables CRC-32 mode
pub fn fingerprint_file(path: &Path, policy: &Policy, chunk_size: usize) -> Result<Fingerprint> {
    let metadata = std::fs::metadata(path)?;

    let crc32 = if policy.crc32 {
        Some(calculate_crc32(path, chunk_size)?)
    } else {
        None
    };

    Ok(Fingerprint {
        mtime: modified_timestamp(&metadata),
        size: metadata.len(),
        crc32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_fingerprint_without_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"0123456789").unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 250)).unwrap();

        let fp = fingerprint_file(&path, &Policy::new(true, true, false), 4096).unwrap();
        assert_eq!(fp.size, 10);
        assert_eq!(fp.mtime, Timestamp::new(1_700_000_000, 250));
        assert_eq!(fp.crc32, None);
    }

    #[test]
    fn test_fingerprint_with_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("check.txt");
        fs::write(&path, b"123456789").unwrap();

        let fp = fingerprint_file(&path, &Policy::new(false, false, true), 2).unwrap();
        assert_eq!(fp.crc32, Some(0xCBF4_3926));
    }

    #[test]
    fn test_fingerprint_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = fingerprint_file(&dir.path().join("gone"), &Policy::default(), 16).unwrap_err();
        assert!(matches!(err, crate::error::MidsyncError::Io(_)));
    }
}
