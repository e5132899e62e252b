/*!
 * Argument validation performed before any command touches the filesystem
 */

use std::path::Path;

use crate::error::{MidsyncError, Result};

/// Require `path` to be an existing directory
pub fn validate_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(MidsyncError::not_a_directory(path))
    }
}

/// Require `path` to be an existing regular file
pub fn validate_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MidsyncError::not_a_file(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_directory_checks() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, b"x").unwrap();

        assert!(validate_directory(dir.path()).is_ok());
        assert!(matches!(
            validate_directory(&file),
            Err(MidsyncError::InvalidArgument { expected: PathKind::Directory, .. })
        ));
        assert!(validate_directory(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_file_checks() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, b"x").unwrap();

        assert!(validate_file(&file).is_ok());
        assert!(matches!(
            validate_file(dir.path()),
            Err(MidsyncError::InvalidArgument { expected: PathKind::File, .. })
        ));
    }

    #[test]
    fn test_message_names_path() {
        let err = validate_directory(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.to_string(), "'/definitely/not/here' is not a directory.");
    }
}
