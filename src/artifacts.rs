// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! p2 artifact metadata patching.

`artifacts.xml` is treated as text, not as a parsed document. Digest
properties have the exact shape `<property name='TAG' value='HEX'/>` and
are rewritten by literal substitution of the tag instantiated with the old
digest. A digest appearing under a different tag is left alone even when
the hex strings are equal.

The `artifacts.xml.xz` mirror is regenerated with one pinned LZMA2
configuration so runs are byte-for-byte reproducible and decodable by any
standard XZ implementation.
*/

use {
    crate::{
        digest::{ArchiveDigests, ChecksumType},
        error::Result,
    },
    std::io::Write,
    xz2::stream::{Check, Filters, LzmaOptions, MatchFinder, Mode, Stream},
};

/// Name of the metadata entry inside `artifacts.jar`.
pub const ARTIFACTS_XML_ENTRY: &str = "artifacts.xml";

// LZMA2 tuning for the compressed mirror. The values themselves only need
// to produce a valid, reasonably compressed stream, but they are pinned so
// output is stable across runs.
const XZ_DICT_SIZE: u32 = 8 * 1024 * 1024;
const XZ_LITERAL_CONTEXT_BITS: u32 = 3;
const XZ_LITERAL_POSITION_BITS: u32 = 0;
const XZ_POSITION_BITS: u32 = 4;
const XZ_NICE_LEN: u32 = 273;
const XZ_DEPTH: u32 = 512;

/// Render a digest property record exactly as it appears in `artifacts.xml`.
fn property_record(name: &str, value: &str) -> String {
    format!("<property name='{}' value='{}'/>", name, value)
}

/// One digest rewrite: every record with `property_name` and `old_hex` is
/// replaced by the record with `new_hex`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DigestSubstitution {
    pub property_name: &'static str,
    pub old_hex: String,
    pub new_hex: String,
}

/// Build the full substitution list for an archive whose digests changed.
///
/// MD5 contributes two substitutions (the legacy `download.md5` property
/// and `download.checksum.md5`); SHA-256 and SHA-512 one each.
pub fn digest_substitutions(
    old: &ArchiveDigests,
    new: &ArchiveDigests,
) -> Vec<DigestSubstitution> {
    let mut substitutions = Vec::new();

    for checksum in ChecksumType::ALL {
        for property_name in checksum.property_names().iter().copied() {
            substitutions.push(DigestSubstitution {
                property_name,
                old_hex: old.digest(checksum).to_string(),
                new_hex: new.digest(checksum).to_string(),
            });
        }
    }

    substitutions
}

/// Apply substitutions to the metadata text, in order.
///
/// Each substitution operates on the output of the previous one. Matching
/// is exact string equality on the rendered record, so every occurrence of
/// the old record is rewritten and unrelated text is untouched.
pub fn patch_digest_properties(text: &str, substitutions: &[DigestSubstitution]) -> String {
    let mut patched = text.to_string();

    for substitution in substitutions {
        patched = patched.replace(
            &property_record(substitution.property_name, &substitution.old_hex),
            &property_record(substitution.property_name, &substitution.new_hex),
        );
    }

    patched
}

/// Encode the metadata text for the `artifacts.xml.xz` mirror.
pub fn encode_xz(data: &[u8]) -> Result<Vec<u8>> {
    let mut options = LzmaOptions::new_preset(6)?;
    options
        .dict_size(XZ_DICT_SIZE)
        .literal_context_bits(XZ_LITERAL_CONTEXT_BITS)
        .literal_position_bits(XZ_LITERAL_POSITION_BITS)
        .position_bits(XZ_POSITION_BITS)
        .mode(Mode::Normal)
        .nice_len(XZ_NICE_LEN)
        .match_finder(MatchFinder::BinaryTree4)
        .depth(XZ_DEPTH);

    let mut filters = Filters::new();
    filters.lzma2(&options);

    let stream = Stream::new_stream_encoder(&filters, Check::Crc64)?;
    let mut encoder = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
    encoder.write_all(data)?;

    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Read};

    const OLD: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const NEW: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn patch_rewrites_matching_tag_only() {
        let text = format!(
            "<properties size='2'>\n  {}\n  {}\n</properties>\n",
            property_record("download.md5", OLD),
            property_record("download.checksum.sha-256", OLD),
        );

        let substitutions = vec![DigestSubstitution {
            property_name: "download.md5",
            old_hex: OLD.to_string(),
            new_hex: NEW.to_string(),
        }];

        let patched = patch_digest_properties(&text, &substitutions);

        assert!(patched.contains(&property_record("download.md5", NEW)));
        assert!(!patched.contains(&property_record("download.md5", OLD)));
        // Same hex under a different tag is untouched.
        assert!(patched.contains(&property_record("download.checksum.sha-256", OLD)));
    }

    #[test]
    fn patch_rewrites_every_occurrence() {
        let record = property_record("download.checksum.sha-512", OLD);
        let text = format!("{}\ntext in between\n{}", record, record);

        let substitutions = vec![DigestSubstitution {
            property_name: "download.checksum.sha-512",
            old_hex: OLD.to_string(),
            new_hex: NEW.to_string(),
        }];

        let patched = patch_digest_properties(&text, &substitutions);

        assert_eq!(patched.matches(NEW).count(), 2);
        assert!(!patched.contains(OLD));
        assert!(patched.contains("text in between"));
    }

    #[test]
    fn substitutions_cover_all_property_names() {
        let old = ArchiveDigests::compute(b"old");
        let new = ArchiveDigests::compute(b"new");

        let substitutions = digest_substitutions(&old, &new);

        let names = substitutions
            .iter()
            .map(|s| s.property_name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "download.md5",
                "download.checksum.md5",
                "download.checksum.sha-256",
                "download.checksum.sha-512",
            ]
        );

        // Legacy and general MD5 substitutions carry the same digest pair.
        assert_eq!(substitutions[0].old_hex, substitutions[1].old_hex);
        assert_eq!(substitutions[0].new_hex, substitutions[1].new_hex);
    }

    #[test]
    fn xz_round_trip_and_determinism() -> Result<()> {
        let text = "<?xml version='1.0' encoding='UTF-8'?>\n<repository name='test'/>\n";

        let first = encode_xz(text.as_bytes())?;
        let second = encode_xz(text.as_bytes())?;
        assert_eq!(first, second);

        let mut decoded = String::new();
        xz2::read::XzDecoder::new(first.as_slice()).read_to_string(&mut decoded)?;
        assert_eq!(decoded, text);

        Ok(())
    }
}
