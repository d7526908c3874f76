// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Content digest computation. */

use {
    crate::{error::Result, io::read_path},
    md5::Md5,
    sha2::{Digest, Sha256, Sha512},
    std::{fmt::Formatter, path::Path},
};

/// A checksum flavor recorded in p2 artifact metadata.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChecksumType {
    Md5,
    Sha256,
    Sha512,
}

impl ChecksumType {
    /// All checksum flavors, in metadata patching order.
    pub const ALL: [Self; 3] = [Self::Md5, Self::Sha256, Self::Sha512];

    /// The algorithm name as it appears in `download.checksum.*` properties.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha-256",
            Self::Sha512 => "sha-512",
        }
    }

    /// Names of `artifacts.xml` properties carrying this digest flavor.
    ///
    /// MD5 appears twice: once under the legacy `download.md5` property and
    /// once under the general `download.checksum.md5` property. Both must be
    /// rewritten when the archive content changes.
    pub fn property_names(&self) -> &'static [&'static str] {
        match self {
            Self::Md5 => &["download.md5", "download.checksum.md5"],
            Self::Sha256 => &["download.checksum.sha-256"],
            Self::Sha512 => &["download.checksum.sha-512"],
        }
    }

    /// Digest `data`, returning lowercase hex with no separators.
    pub fn digest_hex(&self, data: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }
}

impl std::fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// All digest flavors of one archive, captured at a single point in time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchiveDigests {
    md5: String,
    sha256: String,
    sha512: String,
}

impl ArchiveDigests {
    /// Digest a byte buffer with every flavor at once.
    pub fn compute(data: &[u8]) -> Self {
        Self {
            md5: ChecksumType::Md5.digest_hex(data),
            sha256: ChecksumType::Sha256.digest_hex(data),
            sha512: ChecksumType::Sha512.digest_hex(data),
        }
    }

    /// Digest the full content of a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::compute(&read_path(path)?))
    }

    /// Obtain the hex digest for a given [ChecksumType].
    pub fn digest(&self, checksum: ChecksumType) -> &str {
        match checksum {
            ChecksumType::Md5 => &self.md5,
            ChecksumType::Sha256 => &self.sha256,
            ChecksumType::Sha512 => &self.sha512,
        }
    }

    /// Iterate over `(flavor, hex digest)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (ChecksumType, &str)> + '_ {
        ChecksumType::ALL.into_iter().map(|c| (c, self.digest(c)))
    }
}
