/*!
 * Answering a request: push what the requester lacks into the midpoint
 *
 * The copy loop is checkpointed. Entries are updated in memory after every
 * staged file; if anything fails the updated manifest is written back over
 * the request file, so the next run resumes where this one stopped. Only a
 * complete walk removes the request file.
 */

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use midsync_core_manifest::RequestManifest;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::duration_millis;
use super::fingerprint::fingerprint_file;
use super::lock::RespondLock;
use super::stager::{LocalStager, Stager};
use super::staleness::needs_update;
use super::validation::{validate_directory, validate_file};
use super::walk::{ExcludeSet, SourceWalker};
use crate::config::SyncConfig;
use crate::error::{MidsyncError, Result, EXIT_PARTIAL, EXIT_SUCCESS};

/// Counters for one respond run
///
/// In dry-run mode `files_copied` and `bytes_copied` count what would have
/// been copied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RespondStats {
    pub files_scanned: u64,
    pub files_copied: u64,
    pub files_skipped: u64,
    pub bytes_copied: u64,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

/// How a respond run ended
#[derive(Debug)]
pub enum RespondOutcome {
    /// Every needed file was staged and the request file was removed
    Complete(RespondStats),

    /// The loop stopped on `error`; the request file now records progress
    Incomplete {
        stats: RespondStats,
        error: MidsyncError,
    },
}

impl RespondOutcome {
    pub fn stats(&self) -> &RespondStats {
        match self {
            RespondOutcome::Complete(stats) => stats,
            RespondOutcome::Incomplete { stats, .. } => stats,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, RespondOutcome::Complete(_))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RespondOutcome::Complete(_) => EXIT_SUCCESS,
            RespondOutcome::Incomplete { .. } => EXIT_PARTIAL,
        }
    }
}

/// Progress notifications emitted while responding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespondEvent<'a> {
    /// About to stage `token`
    Copying { token: &'a str, bytes: u64 },
    /// Dry run: `token` would be staged
    WouldCopy { token: &'a str, bytes: u64 },
    /// The requester already has an acceptable `token`
    Skipped { token: &'a str },
}

type Observer = Box<dyn FnMut(&RespondEvent<'_>)>;

/// Answers request files against a local directory
pub struct Responder<S: Stager = LocalStager> {
    config: SyncConfig,
    stager: S,
    dry_run: bool,
    observer: Option<Observer>,
}

impl Responder<LocalStager> {
    pub fn new(config: SyncConfig) -> Self {
        let stager = LocalStager::new(config.preserve_permissions);
        Self::with_stager(config, stager)
    }
}

impl<S: Stager> Responder<S> {
    pub fn with_stager(config: SyncConfig, stager: S) -> Self {
        Self {
            dry_run: config.dry_run,
            config,
            stager,
            observer: None,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Register a callback receiving one event per visited file
    pub fn on_event<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&RespondEvent<'_>) + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Answer `request_file` from `directory`
    ///
    /// Returns `Err` for anything that prevents the loop from starting
    /// (bad arguments, lock held, unreadable manifest) and when the
    /// checkpoint itself cannot be written. Failures inside the loop yield
    /// [`RespondOutcome::Incomplete`]. In dry-run mode nothing is written and
    /// loop failures are returned as `Err`.
    pub fn respond(&mut self, request_file: &Path, directory: &Path) -> Result<RespondOutcome> {
        validate_file(request_file)?;
        validate_directory(directory)?;
        let excludes = ExcludeSet::new(&self.config.exclude_patterns)?;

        let _lock = if self.dry_run {
            None
        } else {
            Some(RespondLock::acquire(request_file)?)
        };

        let mut manifest = RequestManifest::load(request_file)?;
        let midpoint = match request_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        info!(
            name = %manifest.name,
            entries = manifest.len(),
            dry_run = self.dry_run,
            "responding to request"
        );

        let start = Instant::now();
        let mut stats = RespondStats::default();
        let result = self
            .copy_loop(&mut manifest, midpoint, directory, excludes, &mut stats)
            .and_then(|()| {
                if self.dry_run {
                    Ok(())
                } else {
                    self.stager.remove_request(request_file)
                }
            });
        stats.duration = start.elapsed();

        match result {
            Ok(()) => {
                info!(
                    copied = stats.files_copied,
                    skipped = stats.files_skipped,
                    dry_run = self.dry_run,
                    "response complete"
                );
                Ok(RespondOutcome::Complete(stats))
            }
            Err(error) if self.dry_run => Err(error),
            Err(error) => {
                warn!(
                    error = %error,
                    category = %error.category(),
                    request = %request_file.display(),
                    "response incomplete, writing checkpoint"
                );
                manifest.save(request_file)?;
                Ok(RespondOutcome::Incomplete { stats, error })
            }
        }
    }

    fn copy_loop(
        &mut self,
        manifest: &mut RequestManifest,
        midpoint: &Path,
        directory: &Path,
        excludes: ExcludeSet,
        stats: &mut RespondStats,
    ) -> Result<()> {
        let policy = manifest.policy;
        let chunk_size = self.config.chunk_size;

        for file in SourceWalker::new(directory, excludes) {
            let file = file?;
            stats.files_scanned += 1;

            if !needs_update(&manifest.entries, &file.token, &file.path, &policy, chunk_size)? {
                debug!(token = %file.token, "up to date");
                stats.files_skipped += 1;
                self.emit(&RespondEvent::Skipped { token: &file.token });
                continue;
            }

            let size = fs::metadata(&file.path)?.len();

            if self.dry_run {
                stats.files_copied += 1;
                stats.bytes_copied += size;
                self.emit(&RespondEvent::WouldCopy {
                    token: &file.token,
                    bytes: size,
                });
                continue;
            }

            let dest = manifest.staging_path(midpoint, &file.token)?;
            self.emit(&RespondEvent::Copying {
                token: &file.token,
                bytes: size,
            });

            let bytes = self.stager.stage(&file.path, &dest)?;
            let fingerprint = fingerprint_file(&file.path, &policy, chunk_size)?;
            info!(token = %file.token, bytes, "staged");

            manifest.insert(file.token, fingerprint)?;
            stats.files_copied += 1;
            stats.bytes_copied += bytes;
        }

        Ok(())
    }

    fn emit(&mut self, event: &RespondEvent<'_>) {
        if let Some(observer) = self.observer.as_mut() {
            observer(event);
        }
    }
}
