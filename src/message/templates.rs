//! The fixed set of named message templates.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifies one of the built-in message templates.
///
/// The set is closed on purpose: every schedule entry maps onto one of these,
/// and unknown event keys fall back to [`TemplateKind::Anniversary`] in the
/// composer.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// The anniversary letter, also the designated default.
    #[default]
    Anniversary,
    /// The New Year variant.
    Newyear,
}

/// Subject line for a template.
pub(crate) fn subject(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Anniversary => "❤️ 纪念日的情书",
        TemplateKind::Newyear => "🎆 新年的情书",
    }
}

/// Opening line of the plain-text and HTML bodies.
pub(crate) fn greeting(kind: TemplateKind, display_name: &str) -> String {
    match kind {
        TemplateKind::Anniversary => format!("{display_name}，纪念日快乐！"),
        TemplateKind::Newyear => format!("{display_name}，新年快乐！"),
    }
}

/// The day-count line of the body.
pub(crate) fn day_line(kind: TemplateKind, day_count: i64) -> String {
    match kind {
        TemplateKind::Anniversary => format!("今天是我们在一起的第 {day_count} 天 ❤️"),
        TemplateKind::Newyear => {
            format!("新的一年也要一起走下去，今天是我们在一起的第 {day_count} 天 ❤️")
        }
    }
}

/// The closing date line, formatted as `YYYY年MM月DD日`.
pub(crate) fn date_line(today: NaiveDate) -> String {
    format!(
        "—— {}年{:02}月{:02}日",
        today.year(),
        today.month(),
        today.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_is_anniversary() {
        assert_eq!(TemplateKind::default(), TemplateKind::Anniversary);
    }

    #[test]
    fn test_template_kind_deserializes_lowercase() {
        let kind: TemplateKind = serde_json::from_str("\"newyear\"").unwrap();
        assert_eq!(kind, TemplateKind::Newyear);
        let kind: TemplateKind = serde_json::from_str("\"anniversary\"").unwrap();
        assert_eq!(kind, TemplateKind::Anniversary);
    }

    #[test]
    fn test_date_line_pads_month_and_day() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(date_line(today), "—— 2026年01月01日");
    }
}
