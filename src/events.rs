// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Progress event records.

Components that mutate state report what they did as a sequence of
[Event] records instead of logging through an ambient sink. The pipeline
collects them and forwards to the [log] facade, so callers control the
destination by configuring whatever logger implementation they like.
*/

/// A single progress record emitted by a pipeline component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    pub level: log::Level,
    pub message: String,
}

impl Event {
    /// Construct an informational event.
    pub fn info(message: impl ToString) -> Self {
        Self {
            level: log::Level::Info,
            message: message.to_string(),
        }
    }
}

/// Forward collected events to the `log` facade.
pub fn emit_all(events: &[Event]) {
    for event in events {
        log::log!(event.level, "{}", event.message);
    }
}
