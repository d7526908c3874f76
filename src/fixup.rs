// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The per-architecture fixup pipeline.

For each configured architecture variant the pipeline:

1. rewrites the app bundle's `Contents/Info.plist` per the configured
   property edits,
2. injects the rewritten descriptor into the variant's zipped binary
   archive, digesting the archive before and after,
3. rewrites the matching digest properties in `artifacts.xml` inside
   `repository/artifacts.jar`,
4. regenerates the `repository/artifacts.xml.xz` mirror.

A missing descriptor or binary archive skips the rest of that variant's
work without failing the run. Any later failure aborts the whole run.
Variants are processed sequentially and independently.
*/

use {
    crate::{
        artifacts::{
            digest_substitutions, encode_xz, patch_digest_properties, ARTIFACTS_XML_ENTRY,
        },
        digest::ArchiveDigests,
        error::{FixupError, Result},
        events,
        io::{atomic_write, stage_write},
        plist_edit::{apply_edits, PropertyEdit},
        zip_entry,
    },
    log::info,
    std::path::{Path, PathBuf},
};

/// Name of the descriptor entry inside a binary archive.
const BINARY_ARCHIVE_ENTRY: &str = "Info.plist";

/// A target CPU architecture for which a separate app bundle and binary
/// archive exist in the build tree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Architecture {
    X86_64,
    Aarch64,
}

impl Architecture {
    /// All known variants, in processing order.
    pub const ALL: [Self; 2] = [Self::X86_64, Self::Aarch64];

    /// The architecture segment used in descriptor and archive paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl std::str::FromStr for Architecture {
    type Err = FixupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86_64" => Ok(Self::X86_64),
            "aarch64" => Ok(Self::Aarch64),
            other => Err(FixupError::UnknownArchitecture(other.to_string())),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration supplied by the build orchestration.
#[derive(Clone, Debug)]
pub struct FixupConfig {
    /// Root path under which all derived paths are resolved.
    pub output_directory: PathBuf,
    /// Qualified project version, suffix of the binary archive filename.
    pub project_version: String,
    /// p2 product identifier.
    pub product_id: String,
    /// Application bundle name, e.g. `Example.app`.
    pub app_name: String,
    /// Descriptor edits as `(key, raw value)` pairs, in application order.
    pub properties: Vec<(String, String)>,
    /// Architecture variants to process.
    pub architectures: Vec<Architecture>,
}

impl FixupConfig {
    /// Path of the app bundle descriptor for an architecture variant.
    pub fn info_plist_path(&self, arch: Architecture) -> PathBuf {
        self.output_directory
            .join("products")
            .join(&self.product_id)
            .join("macosx")
            .join("cocoa")
            .join(arch.as_str())
            .join(&self.app_name)
            .join("Contents")
            .join("Info.plist")
    }

    /// Path of the zipped binary archive for an architecture variant.
    pub fn binary_archive_path(&self, arch: Architecture) -> PathBuf {
        self.output_directory.join("repository").join("binary").join(format!(
            "{}.executable.cocoa.macosx.{}_{}",
            self.product_id,
            arch.as_str(),
            self.project_version
        ))
    }

    /// Path of the artifact metadata container.
    pub fn artifacts_jar_path(&self) -> PathBuf {
        self.output_directory.join("repository").join("artifacts.jar")
    }

    /// Path of the compressed metadata mirror.
    pub fn artifacts_xz_path(&self) -> PathBuf {
        self.output_directory
            .join("repository")
            .join("artifacts.xml.xz")
    }
}

/// Process every configured architecture variant.
pub fn run(config: &FixupConfig) -> Result<()> {
    for arch in &config.architectures {
        process_architecture(config, *arch)?;
    }

    Ok(())
}

fn process_architecture(config: &FixupConfig, arch: Architecture) -> Result<()> {
    let info_plist = config.info_plist_path(arch);

    if !info_plist.exists() {
        info!("Cannot find Info.plist: {}", info_plist.display());
        return Ok(());
    }

    let descriptor = fix_info_plist(config, &info_plist)?;

    let archive = config.binary_archive_path(arch);

    if !archive.exists() {
        info!(
            "Skipping archive manipulation; file not found: {}",
            archive.display()
        );
        return Ok(());
    }

    let old_digests = ArchiveDigests::from_path(&archive)?;
    zip_entry::replace_entry(&archive, BINARY_ARCHIVE_ENTRY, &descriptor)?;
    let new_digests = ArchiveDigests::from_path(&archive)?;

    update_repository_metadata(config, &old_digests, &new_digests)
}

/// Apply the configured property edits to the descriptor on disk.
///
/// The file is only rewritten once the whole edit batch succeeded, so a
/// malformed edit never leaves a partially edited descriptor behind.
/// Returns the serialized XML bytes, which the caller also injects into
/// the binary archive.
fn fix_info_plist(config: &FixupConfig, path: &Path) -> Result<Vec<u8>> {
    let mut dict = plist::Value::from_file(path)?
        .into_dictionary()
        .ok_or_else(|| FixupError::PlistNotDictionary(path.display().to_string()))?;

    let edits = config
        .properties
        .iter()
        .map(|(key, raw)| PropertyEdit::new(key, raw))
        .collect::<Vec<_>>();

    let mut recorded = Vec::new();
    let outcome = apply_edits(&mut dict, &edits, &mut recorded);
    events::emit_all(&recorded);
    outcome?;

    let mut data = Vec::new();
    plist::Value::from(dict).to_writer_xml(&mut data)?;
    atomic_write(path, &data)?;

    Ok(data)
}

/// Rewrite the digest properties in `artifacts.xml` and re-persist both
/// metadata forms.
///
/// The container entry and the compressed mirror are staged to temporary
/// files first and only renamed into place after both writes succeeded, so
/// the two outputs never end up mutually inconsistent.
fn update_repository_metadata(
    config: &FixupConfig,
    old_digests: &ArchiveDigests,
    new_digests: &ArchiveDigests,
) -> Result<()> {
    let jar_path = config.artifacts_jar_path();

    let xml = String::from_utf8(zip_entry::read_entry(&jar_path, ARTIFACTS_XML_ENTRY)?)
        .map_err(|_| FixupError::EntryNotUtf8(ARTIFACTS_XML_ENTRY.to_string()))?;

    let substitutions = digest_substitutions(old_digests, new_digests);

    for substitution in &substitutions {
        info!(
            "Updating binary {} hash from {} to {}",
            substitution.property_name, substitution.old_hex, substitution.new_hex
        );
    }

    let patched = patch_digest_properties(&xml, &substitutions);

    let jar_data = zip_entry::rewrite_entry(&jar_path, ARTIFACTS_XML_ENTRY, patched.as_bytes())?;
    let xz_data = encode_xz(patched.as_bytes())?;

    // One logical commit for both metadata outputs.
    let mut staged_jar = stage_write(&jar_path, &jar_data)?;
    let mut staged_xz = stage_write(&config.artifacts_xz_path(), &xz_data)?;
    staged_jar.commit()?;
    staged_xz.commit()?;

    Ok(())
}
