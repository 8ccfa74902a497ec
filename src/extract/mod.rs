// src/extract/mod.rs

use crate::error::{PipelineError, Result};
use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};
use zip::ZipArchive;

/// Extract every entry of the ZIP at `archive` into `dest`, creating `dest` if needed.
/// Returns the paths of the files written.
///
/// Entries whose names would land outside `dest` are rejected. When `overwrite` is
/// false, an entry that collides with an existing file aborts the extraction.
#[instrument(level = "info", skip_all, fields(archive = %archive.as_ref().display(), dest = %dest.as_ref().display()))]
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    dest: Q,
    overwrite: bool,
) -> Result<Vec<PathBuf>> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    let fail = |reason: String| PipelineError::Archive {
        path: archive.to_path_buf(),
        reason,
    };

    let file = File::open(archive).map_err(|e| fail(format!("opening archive: {e}")))?;
    let mut zip = ZipArchive::new(file).map_err(|e| fail(format!("reading archive: {e}")))?;
    fs::create_dir_all(dest)
        .map_err(|e| fail(format!("creating {}: {e}", dest.display())))?;

    let mut written = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| fail(format!("accessing entry #{i}: {e}")))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(fail(format!(
                "entry {} would be written outside {}",
                entry.name(),
                dest.display()
            )));
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| fail(format!("creating {}: {e}", out_path.display())))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| fail(format!("creating {}: {e}", parent.display())))?;
        }
        if !overwrite && out_path.exists() {
            return Err(fail(format!(
                "{} already exists and overwriting is disabled",
                out_path.display()
            )));
        }

        let mut out = File::create(&out_path)
            .map_err(|e| fail(format!("creating {}: {e}", out_path.display())))?;
        let bytes = io::copy(&mut entry, &mut out)
            .map_err(|e| fail(format!("writing {}: {e}", out_path.display())))?;
        debug!(file = %out_path.display(), bytes, "extracted entry");
        written.push(out_path);
    }

    info!(files = written.len(), "archive extracted");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_zip;
    use anyhow::Result;
    use std::fs;

    #[test]
    fn extracts_all_entries() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("orders.csv.zip");
        write_zip(
            &zip_path,
            &[("orders.csv", "Order Id,Ship Mode\n1,First Class\n"), ("notes/readme.txt", "hi")],
        )?;

        let out_dir = dir.path().join("out");
        let files = extract_archive(&zip_path, &out_dir, true)?;

        assert_eq!(files.len(), 2);
        assert_eq!(
            fs::read_to_string(out_dir.join("orders.csv"))?,
            "Order Id,Ship Mode\n1,First Class\n"
        );
        assert_eq!(fs::read_to_string(out_dir.join("notes/readme.txt"))?, "hi");
        Ok(())
    }

    #[test]
    fn missing_archive_is_an_archive_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let err = extract_archive(dir.path().join("nope.zip"), dir.path(), true).unwrap_err();
        assert!(matches!(err, PipelineError::Archive { .. }));
        Ok(())
    }

    #[test]
    fn corrupt_archive_is_an_archive_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("broken.zip");
        fs::write(&zip_path, b"definitely not a zip file")?;
        let err = extract_archive(&zip_path, dir.path(), true).unwrap_err();
        assert!(matches!(err, PipelineError::Archive { .. }));
        Ok(())
    }

    #[test]
    fn unwritable_destination_is_an_archive_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("orders.csv.zip");
        write_zip(&zip_path, &[("orders.csv", "a,b\n1,2\n")])?;
        let not_a_dir = dir.path().join("plain-file");
        fs::write(&not_a_dir, "occupied")?;

        let err = extract_archive(&zip_path, &not_a_dir, true).unwrap_err();
        assert!(matches!(err, PipelineError::Archive { .. }));
        assert!(err.to_string().contains("plain-file"), "{err}");
        Ok(())
    }

    #[test]
    fn existing_file_respects_overwrite_flag() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("orders.csv.zip");
        write_zip(&zip_path, &[("orders.csv", "a,b\n1,2\n")])?;
        let target = dir.path().join("orders.csv");
        fs::write(&target, "stale")?;

        let err = extract_archive(&zip_path, dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&target)?, "stale");

        extract_archive(&zip_path, dir.path(), true)?;
        assert_eq!(fs::read_to_string(&target)?, "a,b\n1,2\n");
        Ok(())
    }
}
