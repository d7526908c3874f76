// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Descriptor (`Info.plist`) mutation.

Raw property values from the build configuration drive what gets written
into the plist dictionary. The first character of the raw value selects the
target type:

* empty value removes the key,
* `[a,b,c]` becomes an array of strings (split on `,`, no escaping),
* a value starting with `<` is parsed as an embedded plist fragment,
* anything else is stored as a string, verbatim.

This classification is the contract surface for configuration producers
and must not be generalized into a richer grammar.
*/

use {
    crate::{
        error::{FixupError, Result},
        events::Event,
    },
    std::io::Cursor,
};

/// The typed form a raw property value was classified into.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EditValue {
    /// Remove the key if present.
    Remove,
    /// Set the key to a plain string.
    Scalar(String),
    /// Set the key to an array of strings.
    List(Vec<String>),
    /// Set the key to a parsed plist fragment. Holds the unparsed text;
    /// parsing happens at apply time so a malformed fragment aborts the
    /// whole batch.
    SubDocument(String),
}

impl EditValue {
    /// Classify a raw configuration value.
    pub fn classify(raw: &str) -> Self {
        if raw.is_empty() {
            Self::Remove
        } else if raw.starts_with('[') && raw.ends_with(']') {
            let inner = &raw[1..raw.len() - 1];
            Self::List(inner.split(',').map(String::from).collect())
        } else if raw.starts_with('<') {
            Self::SubDocument(raw.to_string())
        } else {
            Self::Scalar(raw.to_string())
        }
    }
}

/// One requested change to a plist dictionary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertyEdit {
    pub key: String,
    /// The raw configuration value, kept for progress messages.
    pub raw: String,
    pub value: EditValue,
}

impl PropertyEdit {
    pub fn new(key: impl ToString, raw: impl ToString) -> Self {
        let raw = raw.to_string();
        let value = EditValue::classify(&raw);

        Self {
            key: key.to_string(),
            raw,
            value,
        }
    }
}

/// Parse an embedded plist fragment such as `<array>...</array>`.
///
/// The fragment is wrapped in a `<plist>` envelope so the XML reader sees a
/// complete document, mirroring how such values appear in a full plist file.
fn parse_fragment(raw: &str) -> std::result::Result<plist::Value, plist::Error> {
    let wrapped = format!("<plist version=\"1.0\">{}</plist>", raw);

    plist::Value::from_reader_xml(Cursor::new(wrapped.into_bytes()))
}

/// Apply a batch of edits to a plist dictionary.
///
/// Edits are applied in iteration order. One [Event] is recorded per edit.
/// A malformed sub-document value aborts the batch with
/// [FixupError::MalformedEditValue]; callers must not persist the
/// dictionary when that happens, so no partial edit ever reaches disk.
pub fn apply_edits(
    dict: &mut plist::Dictionary,
    edits: &[PropertyEdit],
    events: &mut Vec<Event>,
) -> Result<()> {
    for edit in edits {
        match &edit.value {
            EditValue::Remove => {
                dict.remove(&edit.key);
                events.push(Event::info(format!("Removing property '{}'", edit.key)));
            }
            EditValue::Scalar(value) => {
                dict.insert(edit.key.clone(), plist::Value::String(value.clone()));
                events.push(set_event(edit));
            }
            EditValue::List(items) => {
                let array = items
                    .iter()
                    .map(|item| plist::Value::String(item.clone()))
                    .collect();
                dict.insert(edit.key.clone(), plist::Value::Array(array));
                events.push(set_event(edit));
            }
            EditValue::SubDocument(raw) => {
                let value = parse_fragment(raw)
                    .map_err(|e| FixupError::MalformedEditValue(edit.key.clone(), e))?;
                dict.insert(edit.key.clone(), value);
                events.push(set_event(edit));
            }
        }
    }

    Ok(())
}

fn set_event(edit: &PropertyEdit) -> Event {
    Event::info(format!(
        "Setting property '{}' to '{}'",
        edit.key, edit.raw
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(dict: &mut plist::Dictionary, edits: &[PropertyEdit]) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        apply_edits(dict, edits, &mut events)?;
        Ok(events)
    }

    #[test]
    fn classify_variants() {
        assert_eq!(EditValue::classify(""), EditValue::Remove);
        assert_eq!(
            EditValue::classify("1.2.3"),
            EditValue::Scalar("1.2.3".into())
        );
        assert_eq!(
            EditValue::classify("[de,en]"),
            EditValue::List(vec!["de".into(), "en".into()])
        );
        assert_eq!(
            EditValue::classify("<array></array>"),
            EditValue::SubDocument("<array></array>".into())
        );
        // Unterminated bracket syntax falls through to a plain string.
        assert_eq!(
            EditValue::classify("[oops"),
            EditValue::Scalar("[oops".into())
        );
    }

    #[test]
    fn list_split_semantics() {
        assert_eq!(
            EditValue::classify("[a,b,c]"),
            EditValue::List(vec!["a".into(), "b".into(), "c".into()])
        );
        // No escaping for commas: empty segments are preserved as-is.
        assert_eq!(
            EditValue::classify("[a,,c]"),
            EditValue::List(vec!["a".into(), String::new(), "c".into()])
        );
        // "[]" splits into a single empty segment.
        assert_eq!(
            EditValue::classify("[]"),
            EditValue::List(vec![String::new()])
        );
        assert_eq!(
            EditValue::classify("[solo]"),
            EditValue::List(vec!["solo".into()])
        );
    }

    #[test]
    fn set_and_remove() -> Result<()> {
        let mut dict = plist::Dictionary::new();
        dict.insert("Stale".into(), plist::Value::String("old".into()));

        let edits = vec![
            PropertyEdit::new("CFBundleVersion", "1.2.3"),
            PropertyEdit::new("CFBundleLocalizations", "[de,en]"),
            PropertyEdit::new("Stale", ""),
            PropertyEdit::new("Missing", ""),
        ];

        let events = apply(&mut dict, &edits)?;

        assert_eq!(
            dict.get("CFBundleVersion"),
            Some(&plist::Value::String("1.2.3".into()))
        );

        let locales = dict
            .get("CFBundleLocalizations")
            .and_then(|v| v.as_array())
            .unwrap();
        assert_eq!(locales.len(), 2);
        assert_eq!(locales[0], plist::Value::String("de".into()));
        assert_eq!(locales[1], plist::Value::String("en".into()));

        assert!(dict.get("Stale").is_none());
        assert!(dict.get("Missing").is_none());

        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0].message,
            "Setting property 'CFBundleVersion' to '1.2.3'"
        );
        assert_eq!(events[2].message, "Removing property 'Stale'");

        Ok(())
    }

    #[test]
    fn edit_replaces_prior_variant() -> Result<()> {
        let mut dict = plist::Dictionary::new();

        apply(&mut dict, &[PropertyEdit::new("Key", "[a,b]")])?;
        apply(&mut dict, &[PropertyEdit::new("Key", "plain")])?;

        assert_eq!(
            dict.get("Key"),
            Some(&plist::Value::String("plain".into()))
        );

        Ok(())
    }

    #[test]
    fn sub_document_round_trip() -> Result<()> {
        let mut dict = plist::Dictionary::new();

        let fragment = "<array><dict><key>CFBundleTypeName</key><string>Document</string></dict>\
                        <dict><key>CFBundleTypeName</key><string>Backup</string></dict></array>";
        apply(
            &mut dict,
            &[PropertyEdit::new("CFBundleDocumentTypes", fragment)],
        )?;

        let types = dict
            .get("CFBundleDocumentTypes")
            .and_then(|v| v.as_array())
            .unwrap();
        assert_eq!(types.len(), 2);

        let first = types[0].as_dictionary().unwrap();
        assert_eq!(
            first.get("CFBundleTypeName"),
            Some(&plist::Value::String("Document".into()))
        );

        Ok(())
    }

    #[test]
    fn malformed_sub_document_is_fatal() {
        let mut dict = plist::Dictionary::new();
        let mut events = Vec::new();

        let err = apply_edits(
            &mut dict,
            &[PropertyEdit::new("Bad", "<array><unclosed>")],
            &mut events,
        )
        .unwrap_err();

        assert!(matches!(err, FixupError::MalformedEditValue(key, _) if key == "Bad"));
    }

    #[test]
    fn idempotence() -> Result<()> {
        let edits = vec![
            PropertyEdit::new("CFBundleVersion", "2.0.0"),
            PropertyEdit::new("CFBundleLocalizations", "[de,en,fr]"),
        ];

        let mut once = plist::Dictionary::new();
        apply(&mut once, &edits)?;

        let mut twice = once.clone();
        apply(&mut twice, &edits)?;

        assert_eq!(once, twice);

        Ok(())
    }
}
