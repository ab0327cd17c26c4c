//! Clock sampling at the process boundary.
//!
//! The wall clock is read exactly once per invocation, here, and immediately
//! normalized to the configured IANA timezone. Everything downstream of this
//! module receives the resulting immutable timestamp as a plain argument and
//! never touches the clock again, regardless of where the host machine runs.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::ConfigError;

/// Parses an IANA timezone name such as `Asia/Kuala_Lumpur`.
///
/// # Arguments
///
/// * `name` - The timezone identifier from the configuration
///
/// # Returns
///
/// The parsed [`Tz`], or a [`ConfigError`] if the name is not a known IANA
/// timezone.
///
/// # Examples
///
/// ```
/// # use keepsake::schedule::parse_timezone;
/// assert!(parse_timezone("Asia/Kuala_Lumpur").is_ok());
/// assert!(parse_timezone("Mars/Olympus_Mons").is_err());
/// ```
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::Invalid(format!("unknown IANA timezone: {name:?}")))
}

/// Samples the wall clock once and normalizes it to the given timezone.
///
/// The returned instant is the single evaluation timestamp for the whole
/// invocation: day counting, window evaluation, and message composition all
/// consume this one value.
pub fn capture_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}
