//! Atomic file output.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;

/// Write a file through a temporary path in the same directory,
/// renaming into place only after `body` succeeds.
///
/// On error the temporary file is dropped and removed; the target path
/// is never left half-written.
pub fn write_atomic(
    path: &Path,
    body: impl FnOnce(&mut dyn Write) -> Result<()>,
) -> Result<PathBuf> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    body(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), "export file written");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;

    #[test]
    fn test_success_leaves_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.asc");
        write_atomic(&path, |w| {
            w.write_all(b"hello")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failure_leaves_nothing_visible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.asc");
        let err = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(FormatError::EmptySeries)
        });
        assert!(err.is_err());
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
