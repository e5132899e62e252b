/*!
 * Building a request: record what the local directory already has
 */

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use midsync_core_manifest::{Policy, RequestManifest};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::duration_millis;
use super::fingerprint::fingerprint_file;
use super::validation::validate_directory;
use super::walk::{ExcludeSet, SourceWalker};
use crate::config::SyncConfig;
use crate::error::{MidsyncError, Result};

/// What a finished `request` produced
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub manifest_path: PathBuf,
    pub name: String,
    pub policy: Policy,
    pub files: usize,
    pub total_bytes: u64,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

/// Subject name of a directory: the last component of its absolute path
pub fn subject_name(directory: &Path) -> Result<String> {
    let absolute = directory.canonicalize()?;
    absolute
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or(MidsyncError::InvalidPath(absolute))
}

/// Fingerprint every file under `directory` into a request manifest
///
/// Nothing is written if any file cannot be fingerprinted.
pub fn scan_directory(directory: &Path, policy: Policy, config: &SyncConfig) -> Result<RequestManifest> {
    validate_directory(directory)?;

    let mut manifest = RequestManifest::new(subject_name(directory)?, policy)?;
    let excludes = ExcludeSet::new(&config.exclude_patterns)?;

    for file in SourceWalker::new(directory, excludes) {
        let file = file?;
        let fingerprint = fingerprint_file(&file.path, &policy, config.chunk_size)?;
        debug!(token = %file.token, size = fingerprint.size, "recorded");
        manifest.insert(file.token, fingerprint)?;
    }

    Ok(manifest)
}

/// Build the request for `directory` and write it into `midpoint`
pub fn build_request(
    directory: &Path,
    midpoint: &Path,
    policy: Policy,
    config: &SyncConfig,
) -> Result<RequestSummary> {
    validate_directory(directory)?;
    validate_directory(midpoint)?;

    let start = Instant::now();
    let manifest = scan_directory(directory, policy, config)?;
    let manifest_path = manifest.path_in(midpoint);

    if manifest_path.exists() {
        warn!(path = %manifest_path.display(), "replacing existing request");
    }
    manifest.save(&manifest_path)?;

    info!(
        name = %manifest.name,
        files = manifest.len(),
        path = %manifest_path.display(),
        "request written"
    );

    Ok(RequestSummary {
        manifest_path,
        name: manifest.name.clone(),
        policy,
        files: manifest.len(),
        total_bytes: manifest.total_bytes(),
        duration: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempdir().unwrap();
        let dir = root.path().join("photos");
        let mid = root.path().join("mid");
        fs::create_dir_all(dir.join("2024")).unwrap();
        fs::create_dir_all(&mid).unwrap();
        fs::write(dir.join("a.txt"), b"aaaa").unwrap();
        fs::write(dir.join("2024/img.jpg"), b"jpegdata").unwrap();
        (root, dir, mid)
    }

    #[test]
    fn test_build_request_writes_manifest() {
        let (_root, dir, mid) = setup();
        filetime::set_file_mtime(dir.join("a.txt"), FileTime::from_unix_time(1_700_000_000, 0))
            .unwrap();

        let summary =
            build_request(&dir, &mid, Policy::new(true, false, true), &SyncConfig::default())
                .unwrap();

        assert_eq!(summary.name, "photos");
        assert_eq!(summary.files, 2);
        assert_eq!(summary.total_bytes, 12);
        assert_eq!(summary.manifest_path, mid.join("photos.midsync"));

        let manifest = RequestManifest::load(&summary.manifest_path).unwrap();
        assert_eq!(manifest.policy, Policy::new(true, false, true));
        let a = manifest.get("a.txt").unwrap();
        assert_eq!(a.mtime.secs, 1_700_000_000);
        assert_eq!(a.crc32, Some(crc32fast::hash(b"aaaa")));
        assert!(manifest.get("2024/img.jpg").is_some());
    }

    #[test]
    fn test_checksums_skipped_without_crc_mode() {
        let (_root, dir, mid) = setup();
        build_request(&dir, &mid, Policy::default(), &SyncConfig::default()).unwrap();

        let manifest = RequestManifest::load(mid.join("photos.midsync")).unwrap();
        assert!(manifest.entries.values().all(|fp| fp.crc32.is_none()));
    }

    #[test]
    fn test_empty_directory_gives_empty_manifest() {
        let root = tempdir().unwrap();
        let dir = root.path().join("empty");
        fs::create_dir_all(&dir).unwrap();

        let summary =
            build_request(&dir, root.path(), Policy::default(), &SyncConfig::default()).unwrap();
        assert_eq!(summary.files, 0);
        assert!(RequestManifest::load(&summary.manifest_path).unwrap().is_empty());
    }

    #[test]
    fn test_excluded_files_not_recorded() {
        let (_root, dir, mid) = setup();
        fs::write(dir.join("junk.tmp"), b"x").unwrap();
        let config = SyncConfig {
            exclude_patterns: vec!["*.tmp".to_string()],
            ..Default::default()
        };

        build_request(&dir, &mid, Policy::default(), &config).unwrap();
        let manifest = RequestManifest::load(mid.join("photos.midsync")).unwrap();
        assert!(manifest.get("junk.tmp").is_none());
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_invalid_arguments_rejected_before_io() {
        let (_root, dir, mid) = setup();
        let file = dir.join("a.txt");

        let err = build_request(&file, &mid, Policy::default(), &SyncConfig::default())
            .unwrap_err();
        assert!(err.is_fatal());

        let err = build_request(&dir, &file, Policy::default(), &SyncConfig::default())
            .unwrap_err();
        assert!(matches!(err, MidsyncError::InvalidArgument { .. }));
        assert!(!mid.join("photos.midsync").exists());
    }

    #[test]
    fn test_subject_name_resolves_relative_dot() {
        let (_root, dir, _mid) = setup();
        assert_eq!(subject_name(&dir.join("2024/..")).unwrap(), "photos");
    }
}
