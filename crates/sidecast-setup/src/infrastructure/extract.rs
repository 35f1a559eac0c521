//! Idempotent extraction of bundled archives.
//!
//! Extraction is keyed on the target directory: if it already exists the
//! call is a no-op success, so re-running the orchestrator never re-unpacks
//! (and never needs the archive again).  Failure severity is not decided
//! here — the caller assigns it per invocation, depending on whether the
//! unpacked contents are mandatory or a convenience.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use zip::ZipArchive;

/// What an extraction call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// The archive was unpacked into the target directory.
    Unpacked,
    /// The target directory pre-existed; nothing was touched.
    AlreadyPresent,
}

/// Error type for archive extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive {path} is not a valid zip: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to unpack {path}: {source}")]
    Unpack {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Unpacks bundled zip archives exactly once per target directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageExtractor;

impl PackageExtractor {
    /// Extracts `archive` into `target`.
    ///
    /// Entry paths are validated by the zip library during extraction, so an
    /// archive cannot write outside `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the archive cannot be opened, is not a
    /// valid zip, or an entry fails to unpack.
    pub fn extract(&self, archive: &Path, target: &Path) -> Result<Extraction, ExtractError> {
        if target.exists() {
            debug!(dir = %target.display(), "target already present — skipping extraction");
            return Ok(Extraction::AlreadyPresent);
        }

        let file = File::open(archive).map_err(|source| ExtractError::Open {
            path: archive.to_path_buf(),
            source,
        })?;
        let mut zip = ZipArchive::new(file).map_err(|source| ExtractError::Malformed {
            path: archive.to_path_buf(),
            source,
        })?;
        zip.extract(target).map_err(|source| ExtractError::Unpack {
            path: archive.to_path_buf(),
            source,
        })?;

        info!(
            archive = %archive.display(),
            dir = %target.display(),
            entries = zip.len(),
            "archive unpacked"
        );
        Ok(Extraction::Unpacked)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).expect("create archive");
        let mut writer = zip::ZipWriter::new(file);
        for (name, body) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(body).expect("write entry");
        }
        writer.finish().expect("finish archive");
    }

    #[test]
    fn test_extract_unpacks_entries() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("driver.zip");
        write_zip(&archive, &[("driver/readme.txt", b"hello")]);
        let target = dir.path().join("driver-out");

        // Act
        let result = PackageExtractor.extract(&archive, &target).unwrap();

        // Assert
        assert_eq!(result, Extraction::Unpacked);
        let body = std::fs::read_to_string(target.join("driver/readme.txt")).unwrap();
        assert_eq!(body, "hello");
    }

    #[test]
    fn test_second_extraction_is_a_no_op() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("driver.zip");
        write_zip(&archive, &[("a.txt", b"x")]);
        let target = dir.path().join("out");

        // Act: first run unpacks.
        assert_eq!(
            PackageExtractor.extract(&archive, &target).unwrap(),
            Extraction::Unpacked
        );

        // Deleting the archive proves the second run never opens it.
        std::fs::remove_file(&archive).unwrap();

        // Assert: second run succeeds without the archive.
        assert_eq!(
            PackageExtractor.extract(&archive, &target).unwrap(),
            Extraction::AlreadyPresent
        );
    }

    #[test]
    fn test_pre_existing_target_skips_even_without_archive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();

        let result = PackageExtractor
            .extract(&dir.path().join("missing.zip"), &target)
            .unwrap();
        assert_eq!(result, Extraction::AlreadyPresent);
    }

    #[test]
    fn test_missing_archive_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PackageExtractor
            .extract(&dir.path().join("missing.zip"), &dir.path().join("out"))
            .expect_err("missing archive must fail");
        assert!(matches!(err, ExtractError::Open { .. }));
    }

    #[test]
    fn test_garbage_archive_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        std::fs::write(&archive, b"this is not a zip file").unwrap();

        let err = PackageExtractor
            .extract(&archive, &dir.path().join("out"))
            .expect_err("garbage archive must fail");
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }
}
