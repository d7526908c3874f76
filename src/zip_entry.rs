// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Zip container entry replacement.

The containers handled here (the zipped binary archive and
`artifacts.jar`) are never mutated in place. A replacement produces a
whole new container in memory, carrying every other entry over with its
raw compressed bytes intact, and the result is committed with an atomic
rename. An interrupted run can therefore never leave a half-written
container behind.
*/

use {
    crate::{
        error::{FixupError, Result},
        io::atomic_write,
    },
    std::{
        fs::File,
        io::{BufReader, Cursor, Read, Write},
        path::Path,
    },
    zip::{result::ZipError, write::FileOptions, ZipArchive, ZipWriter},
};

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file =
        File::open(path).map_err(|e| FixupError::IoPath(path.display().to_string(), e))?;

    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Read the full content of a named entry.
pub fn read_entry(archive_path: &Path, entry_name: &str) -> Result<Vec<u8>> {
    let mut archive = open_archive(archive_path)?;

    let mut entry = archive.by_name(entry_name).map_err(|e| match e {
        ZipError::FileNotFound => FixupError::EntryNotFound(
            entry_name.to_string(),
            archive_path.display().to_string(),
        ),
        other => other.into(),
    })?;

    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;

    Ok(data)
}

/// Produce the bytes of a new container with one entry replaced or inserted.
///
/// Every entry other than `entry_name` is copied over without recompression,
/// preserving its compressed bytes and metadata. The replaced entry is
/// written last with default (deflate) options.
pub fn rewrite_entry(archive_path: &Path, entry_name: &str, content: &[u8]) -> Result<Vec<u8>> {
    let mut archive = open_archive(archive_path)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;

        if entry.name() == entry_name {
            continue;
        }

        writer.raw_copy_file(entry)?;
    }

    writer.start_file(entry_name, FileOptions::default())?;
    writer.write_all(content)?;

    Ok(writer.finish()?.into_inner())
}

/// Replace an entry and commit the new container over the original path.
pub fn replace_entry(archive_path: &Path, entry_name: &str, content: &[u8]) -> Result<()> {
    let data = rewrite_entry(archive_path, entry_name, content)?;

    atomic_write(archive_path, &data)
}

/// Test helper: materialize a zip container from `(name, content)` pairs.
#[cfg(test)]
pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);

    for (name, data) in entries {
        writer.start_file(*name, FileOptions::default())?;
        writer.write_all(data)?;
    }

    writer.finish()?;

    Ok(())
}
