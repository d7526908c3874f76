// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! I/O helpers. */

use {
    crate::error::{FixupError, Result},
    std::{
        io::Write,
        path::{Path, PathBuf},
    },
    tempfile::NamedTempFile,
};

/// Read a file into memory, tagging errors with the offending path.
pub fn read_path(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| FixupError::IoPath(path.display().to_string(), e))
}

/// Write `data` to `path` via a temporary file and an atomic rename.
///
/// An interrupted write leaves the original file untouched. The temporary
/// file lives in the destination directory so the rename never crosses a
/// filesystem boundary.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let mut staged = stage_write(path, data)?;
    staged.commit()?;
    Ok(())
}

/// A fully written temporary file awaiting its rename into place.
///
/// Staging all outputs of a logical step before committing any of them
/// keeps multiple persisted forms of the same document consistent: either
/// every rename happens or the originals remain as they were.
pub struct StagedWrite {
    temp: Option<NamedTempFile>,
    dest: PathBuf,
}

impl StagedWrite {
    /// Rename the staged file over the destination.
    pub fn commit(&mut self) -> Result<()> {
        if let Some(temp) = self.temp.take() {
            temp.persist(&self.dest)
                .map_err(|e| FixupError::IoPath(self.dest.display().to_string(), e.error))?;
        }

        Ok(())
    }
}

/// Write `data` to a temporary file next to `path` without committing it.
pub fn stage_write(path: &Path, data: &[u8]) -> Result<StagedWrite> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| FixupError::IoPath(parent.display().to_string(), e))?;
    temp.write_all(data)
        .map_err(|e| FixupError::IoPath(path.display().to_string(), e))?;

    Ok(StagedWrite {
        temp: Some(temp),
        dest: path.to_path_buf(),
    })
}
