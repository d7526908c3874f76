// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
///
/// A missing descriptor or binary archive for an architecture variant is
/// deliberately not represented here: those conditions are logged skips,
/// not errors. Everything below aborts the whole run.
#[derive(Debug, Error)]
pub enum FixupError {
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on path {0}: {1:?}")]
    IoPath(String, std::io::Error),

    #[error("property list error: {0:?}")]
    Plist(#[from] plist::Error),

    #[error("parsed property list is not a dictionary: {0}")]
    PlistNotDictionary(String),

    #[error("malformed embedded property list value for key {0}: {1:?}")]
    MalformedEditValue(String, plist::Error),

    #[error("zip container error: {0:?}")]
    Zip(#[from] zip::result::ZipError),

    #[error("container entry not found: {0} in {1}")]
    EntryNotFound(String, String),

    #[error("container entry is not valid UTF-8: {0}")]
    EntryNotUtf8(String),

    #[error("XZ stream error: {0:?}")]
    Lzma(#[from] xz2::stream::Error),

    #[error("unknown architecture: {0}")]
    UnknownArchitecture(String),

    #[error("bad CLI arguments")]
    CliBadArgument,
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, FixupError>;
