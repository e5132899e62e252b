/*!
 * Staleness predicate: does the requester need this candidate file?
 */

use std::collections::BTreeMap;
use std::path::Path;

use midsync_core_manifest::{Fingerprint, Policy};

use super::checksum::calculate_crc32;
use super::fingerprint::modified_timestamp;
use crate::error::Result;

/// Decide whether `candidate` must be pushed for `token`
///
/// Rules are applied in order and the first one that fires decides:
///
/// 1. Unknown token: always needed.
/// 2. `policy.mtime` and candidate strictly older than recorded: not needed.
/// 3. `policy.size` and candidate strictly smaller than recorded: not needed.
/// 4. `policy.crc32`: needed iff the candidate's CRC-32 differs.
/// 5. Otherwise: needed iff the modification times differ at all.
///
/// Rules 2 and 3 only use metadata, so an obviously older or smaller file is
/// rejected before its content is read.
pub fn needs_update(
    entries: &BTreeMap<String, Fingerprint>,
    token: &str,
    candidate: &Path,
    policy: &Policy,
    chunk_size: usize,
) -> Result<bool> {
    let Some(recorded) = entries.get(token) else {
        return Ok(true);
    };

    let metadata = std::fs::metadata(candidate)?;
    let candidate_mtime = modified_timestamp(&metadata);

    if policy.mtime && candidate_mtime < recorded.mtime {
        return Ok(false);
    }

    if policy.size && metadata.len() < recorded.size {
        return Ok(false);
    }

    if policy.crc32 {
        let crc = calculate_crc32(candidate, chunk_size)?;
        return Ok(recorded.crc32 != Some(crc));
    }

    Ok(candidate_mtime != recorded.mtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use midsync_core_manifest::Timestamp;
    use std::fs;
    use tempfile::TempDir;

    const T1: i64 = 1_700_000_000;

    struct Fixture {
        _dir: TempDir,
        path: std::path::PathBuf,
    }

    fn candidate(content: &[u8], mtime_secs: i64) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidate.bin");
        fs::write(&path, content).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
        Fixture { _dir: dir, path }
    }

    fn entries_with(token: &str, secs: i64, size: u64, crc32: Option<u32>) -> BTreeMap<String, Fingerprint> {
        let mut entries = BTreeMap::new();
        entries.insert(
            token.to_string(),
            Fingerprint {
                mtime: Timestamp::new(secs, 0),
                size,
                crc32,
            },
        );
        entries
    }

    fn all_policies() -> Vec<Policy> {
        let mut policies = Vec::new();
        for bits in 0..8u8 {
            policies.push(Policy::new(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0));
        }
        policies
    }

    #[test]
    fn absent_token_always_needs_update() {
        let fixture = candidate(b"hello", T1);
        let entries = entries_with("other.txt", T1, 5, Some(crc32fast::hash(b"hello")));

        for policy in all_policies() {
            assert!(
                needs_update(&entries, "a.txt", &fixture.path, &policy, 4096).unwrap(),
                "absent token must be copied under {:?}",
                policy
            );
        }
    }

    #[test]
    fn older_candidate_never_needs_update_with_mtime_gate() {
        let fixture = candidate(b"completely different content", T1 - 60);
        let entries = entries_with("a.txt", T1, 5, Some(crc32fast::hash(b"hello")));

        for policy in all_policies().into_iter().filter(|p| p.mtime) {
            assert!(
                !needs_update(&entries, "a.txt", &fixture.path, &policy, 4096).unwrap(),
                "older candidate must be rejected under {:?}",
                policy
            );
        }
    }

    #[test]
    fn smaller_candidate_rejected_with_size_gate() {
        let fixture = candidate(b"abc", T1 + 60);
        let entries = entries_with("a.txt", T1, 10, Some(0));

        let policy = Policy::new(false, true, true);
        assert!(!needs_update(&entries, "a.txt", &fixture.path, &policy, 4096).unwrap());
    }

    #[test]
    fn size_gate_off_lets_smaller_candidate_through() {
        let fixture = candidate(b"abc", T1 + 60);
        let entries = entries_with("a.txt", T1, 10, None);

        let policy = Policy::new(false, false, false);
        assert!(needs_update(&entries, "a.txt", &fixture.path, &policy, 4096).unwrap());
    }

    #[test]
    fn checksum_mode_decides_on_content() {
        let fixture = candidate(b"hello", T1 + 3600);
        let same = entries_with("a.txt", T1, 5, Some(crc32fast::hash(b"hello")));
        let changed = entries_with("a.txt", T1, 5, Some(crc32fast::hash(b"HELLO")));
        let policy = Policy::new(false, false, true);

        // Newer mtime alone does not matter in checksum mode
        assert!(!needs_update(&same, "a.txt", &fixture.path, &policy, 4096).unwrap());
        assert!(needs_update(&changed, "a.txt", &fixture.path, &policy, 4096).unwrap());
    }

    #[test]
    fn checksum_mode_with_missing_recorded_checksum_needs_update() {
        let fixture = candidate(b"hello", T1);
        let entries = entries_with("a.txt", T1, 5, None);
        let policy = Policy::new(false, false, true);
        assert!(needs_update(&entries, "a.txt", &fixture.path, &policy, 4096).unwrap());
    }

    #[test]
    fn mtime_mode_identical_time_needs_no_update() {
        let fixture = candidate(b"different bytes", T1);
        let entries = entries_with("a.txt", T1, 5, None);
        let policy = Policy::default();
        assert!(!needs_update(&entries, "a.txt", &fixture.path, &policy, 4096).unwrap());
    }

    #[test]
    fn mtime_mode_any_difference_needs_update() {
        let entries = entries_with("a.txt", T1, 5, None);
        let policy = Policy::default();

        let newer = candidate(b"hello", T1 + 1);
        assert!(needs_update(&entries, "a.txt", &newer.path, &policy, 4096).unwrap());

        // Without the mtime gate an older candidate also counts as changed
        let older = candidate(b"hello", T1 - 1);
        assert!(needs_update(&entries, "a.txt", &older.path, &policy, 4096).unwrap());
    }

    #[test]
    fn sub_second_difference_is_detected() {
        let fixture = candidate(b"hello", T1);
        set_file_mtime(&fixture.path, FileTime::from_unix_time(T1, 500_000_000)).unwrap();
        let entries = entries_with("a.txt", T1, 5, None);

        let actual = modified_timestamp(&fs::metadata(&fixture.path).unwrap());
        let expected = actual != Timestamp::new(T1, 0);
        assert_eq!(
            needs_update(&entries, "a.txt", &fixture.path, &Policy::default(), 4096).unwrap(),
            expected
        );
    }

    #[test]
    fn unreadable_candidate_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let entries = entries_with("a.txt", T1, 5, None);
        let missing = dir.path().join("a.txt");
        assert!(needs_update(&entries, "a.txt", &missing, &Policy::default(), 4096).is_err());
    }
}
