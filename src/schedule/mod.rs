//! Date math and event gating for scheduled sends.
//!
//! This module contains the decision core of keepsake. It is split into three
//! parts, all of them pure once the clock has been sampled:
//!
//! - [`date_math`]: converts the anchor date and "today" into a day count
//! - [`event_gate`]: decides which named event (if any) is due right now
//! - [`clock`]: the single place where the wall clock is read and normalized
//!   to the configured IANA timezone
//!
//! # Design
//!
//! The clock is sampled exactly once per invocation, at the process boundary.
//! Every downstream function receives that immutable timestamp as an argument
//! and never re-reads the clock, so one run cannot race against itself.
//!
//! # Example Usage
//!
//! ```no_run
//! use keepsake::schedule::{capture_now, days_together, parse_anchor, parse_timezone, which_event};
//!
//! # fn example(entries: &[keepsake::schedule::ScheduleEntry]) -> Result<(), keepsake::config::ConfigError> {
//! let tz = parse_timezone("Asia/Kuala_Lumpur")?;
//! let now = capture_now(tz);
//!
//! let anchor = parse_anchor("2022-12-06")?;
//! let day_count = days_together(anchor, now.date_naive());
//!
//! let schedule = keepsake::schedule::resolve_schedule(entries, &now);
//! if let Some(event) = which_event(&now, &schedule) {
//!     println!("day {day_count}: event {} is due", event.key);
//! }
//! # Ok(())
//! # }
//! ```

mod clock;
mod date_math;
mod event_gate;

pub use crate::schedule::clock::{capture_now, parse_timezone};
pub use crate::schedule::date_math::{days_together, parse_anchor};
pub use crate::schedule::event_gate::{
    AnnualTarget, ScheduleEntry, TargetSpec, forced_event_key, resolve_schedule,
    which_event,
};
