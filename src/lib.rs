pub mod config;
pub mod duck;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod process;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result, Stage};

#[cfg(test)]
pub(crate) mod testutil {
    use anyhow::Result;
    use std::{fs::File, io::Write, path::Path};
    use zip::write::{ExtendedFileOptions, FileOptions};
    use zip::CompressionMethod;

    /// Write a deflated ZIP containing `(name, contents)` entries.
    pub fn write_zip(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
        let mut zip = zip::ZipWriter::new(File::create(path)?);
        for (name, contents) in entries {
            let options = FileOptions::<ExtendedFileOptions>::default()
                .compression_method(CompressionMethod::Deflated);
            zip.start_file(*name, options)?;
            zip.write_all(contents.as_bytes())?;
        }
        zip.finish()?;
        Ok(())
    }

    /// Write `contents` to `dir/name` and return the path.
    pub fn write_csv(dir: &Path, name: &str, contents: &str) -> Result<std::path::PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
