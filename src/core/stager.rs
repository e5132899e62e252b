/*!
 * Copying files into the midpoint staging subtree
 */

use std::fs;
use std::path::Path;

use super::metadata::preserve_metadata;
use crate::error::Result;

/// Writes into the midpoint on behalf of a responder
///
/// `stage` must create missing parent directories and leave the staged copy
/// with the source's modification time.
pub trait Stager {
    /// Copy `source` to `dest`, returning the number of bytes written
    fn stage(&self, source: &Path, dest: &Path) -> Result<u64>;

    /// Remove a fully answered request file
    fn remove_request(&self, request_file: &Path) -> Result<()> {
        fs::remove_file(request_file)?;
        Ok(())
    }
}

/// Stager backed by the local filesystem
#[derive(Debug, Clone, Copy)]
pub struct LocalStager {
    pub preserve_permissions: bool,
}

impl LocalStager {
    pub fn new(preserve_permissions: bool) -> Self {
        Self {
            preserve_permissions,
        }
    }
}

impl Default for LocalStager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Stager for LocalStager {
    fn stage(&self, source: &Path, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        // A previous run may have left a read-only copy behind
        if fs::symlink_metadata(dest).map(|m| m.is_file()).unwrap_or(false) {
            fs::remove_file(dest)?;
        }

        let bytes = fs::copy(source, dest)?;
        preserve_metadata(source, dest, self.preserve_permissions)?;
        Ok(bytes)
    }
}
