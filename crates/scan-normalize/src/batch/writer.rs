//! Output writer with overwrite protection
//!
//! A destination is either fully written or left as it was: the image is
//! encoded in memory, written to a temporary file next to the destination,
//! and moved into place only when complete.

use super::io::encode_image;
use crate::layout::Destination;
use crate::types::*;
use image::DynamicImage;
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy)]
pub struct OutputWriter {
    overwrite: bool,
}

impl OutputWriter {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Refuse the sheet if any destination exists and overwriting is off
    pub fn check(&self, sheet: usize, destinations: &[Destination]) -> Result<()> {
        if self.overwrite {
            return Ok(());
        }
        match destinations.iter().find(|d| d.path.exists()) {
            Some(existing) => Err(ScanError::DestinationExists {
                sheet,
                path: existing.path.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Encode and write one output file
    pub fn write(&self, sheet: usize, path: &Path, image: &DynamicImage) -> Result<PathBuf> {
        let bytes = encode_image(image, path)?;
        let write_error = |source: std::io::Error| ScanError::Write {
            path: path.to_owned(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(parent).map_err(write_error)?;
        staged.write_all(&bytes).map_err(write_error)?;
        staged.as_file().sync_all().map_err(write_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(write_error)?;
        }

        let persisted = if self.overwrite {
            staged.persist(path)
        } else {
            staged.persist_noclobber(path)
        };
        persisted.map_err(|e| match e.error.kind() {
            std::io::ErrorKind::AlreadyExists => ScanError::DestinationExists {
                sheet,
                path: path.to_owned(),
            },
            _ => write_error(e.error),
        })?;

        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path.to_owned())
    }
}
