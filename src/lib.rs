// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Post-build fixup of macOS applications in p2 update-site builds.

A p2 update-site build of a macOS application leaves behind three related
artifacts that must agree with each other:

* the app bundle's `Contents/Info.plist` descriptor,
* a copy of that descriptor inside the per-architecture zipped binary
  archive under `repository/binary/`,
* the `artifacts.xml` metadata (inside `repository/artifacts.jar`, with a
  compressed mirror `repository/artifacts.xml.xz`) recording checksums of
  that archive, which the installer verifies at download time.

This crate rewrites the descriptor per configured property edits, injects
the result into the binary archive, recomputes the archive's MD5, SHA-256
and SHA-512 digests, and rewrites the matching `<property name='...'
value='...'/>` records in the metadata, regenerating both persisted forms.

[fixup::run] drives the whole pipeline from a [fixup::FixupConfig]. The
individual steps live in [plist_edit] (descriptor mutation), [zip_entry]
(container entry replacement), [digest] (checksum computation) and
[artifacts] (metadata patching and the XZ mirror).
*/

pub mod artifacts;
pub mod digest;
pub mod error;
pub mod events;
pub mod fixup;
pub mod io;
pub mod plist_edit;
pub mod zip_entry;

pub use crate::error::{FixupError, Result};
