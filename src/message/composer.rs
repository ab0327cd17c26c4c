//! Template registry and message rendering.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;

use crate::message::templates::{self, TemplateKind};
use crate::schedule::ScheduleEntry;

/// A fully rendered outgoing message.
///
/// A pure value derived from the event key, the day count, and the evaluation
/// date; it has no lifecycle of its own and is recomputed on every
/// invocation, never cached or persisted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComposedMessage {
    /// Subject line (ignored by transports without a subject concept).
    pub subject: String,
    /// Plain-text body.
    pub text_body: String,
    /// HTML body; all interpolated display values are escaped.
    pub html_body: Option<String>,
}

/// Renders messages from a template registry keyed by event identifier.
///
/// The registry always contains the built-in names (`anniversary`,
/// `newyear`); schedule entries add their own keys on top, each mapped to
/// the template the entry declares. An event key that is absent from the
/// registry — or no key at all — falls back to the anniversary template.
/// This fallback is deliberate: a misconfigured key still produces a
/// well-formed default letter instead of an error at send time.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use keepsake::message::MessageComposer;
/// let composer = MessageComposer::new("Baby", "https://example.com/letters/");
/// let today = NaiveDate::from_ymd_opt(2025, 12, 6).unwrap();
/// let message = composer.compose(Some("anniversary"), today, 1097);
/// assert!(message.text_body.contains("第 1097 天"));
/// ```
pub struct MessageComposer {
    display_name: String,
    link_url: String,
    registry: HashMap<String, TemplateKind>,
}

impl MessageComposer {
    /// Creates a composer with the built-in template registry.
    ///
    /// # Arguments
    ///
    /// * `display_name` - How the recipient is addressed in the greeting
    /// * `link_url` - The surprise link embedded in every body
    pub fn new(display_name: &str, link_url: &str) -> Self {
        let registry = HashMap::from([
            ("anniversary".to_owned(), TemplateKind::Anniversary),
            ("newyear".to_owned(), TemplateKind::Newyear),
        ]);

        MessageComposer {
            display_name: display_name.to_owned(),
            link_url: link_url.to_owned(),
            registry,
        }
    }

    /// Registers every schedule entry's key under the template it declares.
    ///
    /// This lets table keys like `anniv2025` or `newyear2026` select their
    /// template without the composer knowing anything about scheduling.
    pub fn with_schedule(mut self, entries: &[ScheduleEntry]) -> Self {
        for entry in entries {
            self.registry.insert(entry.key.clone(), entry.template);
        }
        self
    }

    /// Renders the message for the given event key.
    ///
    /// Deterministic: identical inputs always yield byte-identical output.
    ///
    /// # Arguments
    ///
    /// * `event_key` - The key selected by the gate, or `None`
    /// * `today` - Calendar date of the evaluation instant
    /// * `day_count` - Day count of the relationship, anchor date = day 1
    pub fn compose(
        &self,
        event_key: Option<&str>,
        today: NaiveDate,
        day_count: i64,
    ) -> ComposedMessage {
        let kind = event_key
            .and_then(|key| self.registry.get(key).copied())
            .unwrap_or_default();

        debug!(
            "composing with template {:?} for event key {:?}",
            kind, event_key
        );

        let greeting = templates::greeting(kind, &self.display_name);
        let day_line = templates::day_line(kind, day_count);
        let date_line = templates::date_line(today);

        let text_body = format!(
            "{greeting}\n\n{day_line}\n给你的小惊喜 👉 {link}\n{date_line}",
            link = self.link_url
        );

        let escaped_name = escape_html(&self.display_name);
        let escaped_link = escape_html(&self.link_url);
        let html_body = format!(
            "<p>{greeting}</p>\n<p>{day_line}</p>\n<p>给你的小惊喜 👉 <a href=\"{escaped_link}\">{escaped_link}</a></p>\n<p>{date_line}</p>",
            greeting = templates::greeting(kind, &escaped_name),
        );

        ComposedMessage {
            subject: templates::subject(kind).to_owned(),
            text_body,
            html_body: Some(html_body),
        }
    }
}

/// Escapes a display value for embedding in HTML.
///
/// Display name and link come from operator configuration, not user input,
/// but the HTML body must stay well-formed for any printable Unicode value.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
