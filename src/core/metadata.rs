/*!
 * File metadata preservation (timestamps, permissions)
 */

use crate::error::{MidsyncError, Result};
use filetime::{set_file_times, FileTime};
use std::path::Path;

/// Copy timestamps, and optionally permission bits, from source to destination
///
/// Permissions are applied after the timestamps so a read-only source does
/// not block the timestamp update on the copy.
pub fn preserve_metadata(source_path: &Path, dest_path: &Path, permissions: bool) -> Result<()> {
    let metadata = std::fs::metadata(source_path).map_err(|e| {
        MidsyncError::MetadataFailed(format!("Failed to read source metadata: {}", e))
    })?;

    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);

    set_file_times(dest_path, accessed, modified)
        .map_err(|e| MidsyncError::MetadataFailed(format!("Failed to set timestamps: {}", e)))?;

    if permissions {
        std::fs::set_permissions(dest_path, metadata.permissions()).map_err(|e| {
            MidsyncError::MetadataFailed(format!("Failed to set permissions: {}", e))
        })?;
    }

    Ok(())
}
