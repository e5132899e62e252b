/*!
 * Deterministic walk of a synchronized directory
 */

use std::path::{Path, PathBuf};

use glob::Pattern;
use midsync_core_manifest::token_from_relative;
use walkdir::WalkDir;

use crate::error::{MidsyncError, Result};

/// A regular file found under the walked root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// `/`-separated path relative to the root
    pub token: String,

    /// Full path on disk
    pub path: PathBuf,
}

/// Compiled exclude patterns
///
/// A pattern excludes an entry when it matches either the whole token or the
/// entry's final component, so `.git` excludes that directory at any depth.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    MidsyncError::Config(format!("Invalid exclude pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, token: &str) -> bool {
        let last = token.rsplit('/').next().unwrap_or(token);
        self.patterns
            .iter()
            .any(|p| p.matches(token) || p.matches(last))
    }
}

/// Iterator over the regular files below a root, in file-name order
///
/// Symbolic links are not followed and are not reported; neither are other
/// special files. Excluded directories are pruned without being read.
pub struct SourceWalker {
    root: PathBuf,
    inner: walkdir::IntoIter,
    excludes: ExcludeSet,
}

impl SourceWalker {
    pub fn new(root: &Path, excludes: ExcludeSet) -> Self {
        let inner = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Self {
            root: root.to_path_buf(),
            inner,
            excludes,
        }
    }
}

impl Iterator for SourceWalker {
    type Item = Result<SourceFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };

            if entry.depth() == 0 {
                continue;
            }

            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(relative) => relative,
                Err(_) => {
                    return Some(Err(MidsyncError::InvalidPath(entry.path().to_path_buf())))
                }
            };

            let token = match token_from_relative(relative) {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "skipping entry whose name cannot be recorded"
                    );
                    if entry.file_type().is_dir() {
                        self.inner.skip_current_dir();
                    }
                    continue;
                }
            };

            if !self.excludes.is_empty() && self.excludes.matches(&token) {
                tracing::debug!(token = %token, "excluded");
                if entry.file_type().is_dir() {
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            return Some(Ok(SourceFile {
                token,
                path: entry.into_path(),
            }));
        }
    }
}
