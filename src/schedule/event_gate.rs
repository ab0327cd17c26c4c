//! Tolerance-window event gating.
//!
//! This module decides which named event, if any, is due at the evaluation
//! instant. Each configured entry describes a target instant and a symmetric
//! tolerance window around it; the gate returns the first entry, in
//! declaration order, whose window contains "now".
//!
//! Targets come in two forms, an explicit configuration choice:
//!
//! - **annual**: a `(month, day, hour, minute)` re-resolved against the
//!   evaluation year on every run, so the event recurs every year without
//!   table updates (the legacy single-event behavior)
//! - **absolute**: a fixed local datetime with an explicit year, for tables
//!   that are maintained by hand (`anniv2025`, `newyear2026`, ...)
//!
//! Both forms can be mixed freely in one table.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::message::TemplateKind;

/// Default tolerance window in seconds (±10 minutes), matching the slack the
/// hosted cron schedulers need.
const DEFAULT_TOLERANCE_SECS: u64 = 600;

fn default_tolerance_secs() -> u64 {
    DEFAULT_TOLERANCE_SECS
}

/// A configured schedule entry, before its target is resolved against the
/// evaluation instant.
///
/// # YAML Form
///
/// ```yaml
/// events:
///   # Recurs every year on Dec 6, 05:20 local time.
///   - key: anniversary
///     annual: { month: 12, day: 6, hour: 5, minute: 20 }
///     tolerance_secs: 600
///   # Fires once, at an absolute local datetime.
///   - key: newyear2026
///     at: "2026-01-01T00:00:00"
///     template: newyear
/// ```
///
/// Entries are evaluated in declaration order; when two windows overlap the
/// first declared entry wins.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScheduleEntry {
    /// Event key, used for window matching, template lookup, and logging.
    pub key: String,
    /// Target instant, either annual or absolute.
    #[serde(flatten)]
    pub target: TargetSpec,
    /// Symmetric tolerance window in seconds around the target.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,
    /// Message template rendered when this event fires.
    #[serde(default)]
    pub template: TemplateKind,
}

/// Target instant of a schedule entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TargetSpec {
    /// Recurs every year; the year is taken from the evaluation instant.
    Annual {
        /// The annually recurring local wall-clock target.
        annual: AnnualTarget,
    },
    /// A fixed local datetime, including the year.
    Absolute {
        /// The absolute local wall-clock target, e.g. `2025-12-06T05:20:00`.
        at: NaiveDateTime,
    },
}

/// An annually recurring wall-clock target.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AnnualTarget {
    /// Calendar month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Minute, 0-59.
    pub minute: u32,
}

/// A schedule entry resolved against the evaluation instant: a concrete
/// target timestamp in the evaluation timezone plus its tolerance window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Event key of the entry this target was resolved from.
    pub key: String,
    /// Target instant in the evaluation timezone.
    pub target: DateTime<Tz>,
    /// Symmetric tolerance around the target.
    pub tolerance: Duration,
}

/// Resolves the configured schedule entries into concrete targets for the
/// given evaluation instant, preserving declaration order.
///
/// Annual entries take their year from `now`. An entry whose target does not
/// exist at that point (Feb 29 outside a leap year, or a local time skipped
/// by a DST transition) is dropped for this run with a warning rather than
/// failing the invocation.
///
/// # Arguments
///
/// * `entries` - The configured schedule, in declaration order
/// * `now` - The evaluation instant; supplies the year for annual entries
///   and the timezone for all of them
pub fn resolve_schedule(entries: &[ScheduleEntry], now: &DateTime<Tz>) -> Vec<ScheduledEvent> {
    entries
        .iter()
        .filter_map(|entry| {
            let local = match &entry.target {
                TargetSpec::Annual { annual } => {
                    let Some(date) = NaiveDate::from_ymd_opt(now.year(), annual.month, annual.day)
                    else {
                        warn!(
                            "event {} has no occurrence in {} ({:02}-{:02}), skipping",
                            entry.key,
                            now.year(),
                            annual.month,
                            annual.day
                        );
                        return None;
                    };
                    match date.and_hms_opt(annual.hour, annual.minute, 0) {
                        Some(local) => local,
                        None => {
                            warn!(
                                "event {} has an invalid time of day {:02}:{:02}, skipping",
                                entry.key, annual.hour, annual.minute
                            );
                            return None;
                        }
                    }
                }
                TargetSpec::Absolute { at } => *at,
            };

            // On a DST fold the earlier occurrence is used.
            let Some(target) = now.timezone().from_local_datetime(&local).earliest() else {
                warn!(
                    "event {} target {} does not exist in {}, skipping",
                    entry.key,
                    local,
                    now.timezone()
                );
                return None;
            };

            debug!(
                "event {} resolved to {} (±{}s)",
                entry.key, target, entry.tolerance_secs
            );

            Some(ScheduledEvent {
                key: entry.key.clone(),
                target,
                tolerance: Duration::seconds(entry.tolerance_secs as i64),
            })
        })
        .collect()
}

/// Returns the first event, in declaration order, whose tolerance window
/// contains the evaluation instant.
///
/// The check is symmetric: an event matches when `|now − target|` does not
/// exceed its tolerance, boundary included. Overlapping windows are a
/// configuration smell the gate tolerates; the first declared entry wins.
///
/// Pure over the instant it is given: no I/O and no clock reads, so a single
/// invocation cannot race against a moving clock.
///
/// # Arguments
///
/// * `now` - The evaluation instant captured at process start
/// * `events` - The resolved schedule, in declaration order
///
/// # Returns
///
/// The first matching event, or `None` when the instant falls outside every
/// window.
pub fn which_event<'a>(now: &DateTime<Tz>, events: &'a [ScheduledEvent]) -> Option<&'a ScheduledEvent> {
    events
        .iter()
        .find(|event| now.signed_duration_since(event.target).abs() <= event.tolerance)
}

/// Selects the event key for a forced send when no window matched.
///
/// This is the explicit manual-override path, separate from window
/// evaluation: the caller-supplied key wins, otherwise the configured
/// default key is used.
pub fn forced_event_key<'a>(force_event: Option<&'a str>, default_event: &'a str) -> &'a str {
    force_event.unwrap_or(default_event)
}
