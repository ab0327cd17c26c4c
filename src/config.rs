//! Configuration loading and pre-flight validation.
//!
//! Configuration is layered with figment: built-in defaults, then an
//! optional YAML file, then environment variables with the `KEEPSAKE_`
//! prefix (`__` separates sections). The result is one immutable [`Config`]
//! value constructed at startup and passed into the pure decision logic;
//! no pure function reads ambient environment state.
//!
//! # Configuration File Format
//!
//! ```yaml
//! anchor_date: "2022-12-06"
//! display_name: "Baby"
//! link_url: "https://jowenthebui.github.io/letterstomylove/"
//! timezone: "Asia/Kuala_Lumpur"
//! recipients: "her@example.com, backup@example.com"
//!
//! events:
//!   - key: anniversary
//!     annual: { month: 12, day: 6, hour: 5, minute: 20 }
//!     tolerance_secs: 600
//!   - key: newyear2026
//!     at: "2026-01-01T00:00:00"
//!     template: newyear
//!
//! transport: email
//! email:
//!   smtp_server: "smtp.gmail.com"
//!   smtp_port: 587
//!   sender: "me@gmail.com"
//!   password: "abcd efgh ijkl mnop"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every scalar can be overridden, which is how credentials are injected
//! from CI secrets:
//!
//! ```bash
//! export KEEPSAKE_RECIPIENTS="her@example.com"
//! export KEEPSAKE_EMAIL__SENDER="me@gmail.com"
//! export KEEPSAKE_EMAIL__PASSWORD="abcd efgh ijkl mnop"
//! export KEEPSAKE_FORCE_SEND=true
//! ```
//!
//! The `events` table cannot be expressed through the environment; it comes
//! from the file or from the built-in default (the annual Dec 6 05:20
//! anniversary, ±10 minutes).

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::TemplateKind;
use crate::schedule::{self, AnnualTarget, ScheduleEntry, TargetSpec};

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "KEEPSAKE_";

/// Error raised for missing or malformed configuration.
///
/// Always fatal and always reported before any outbound call is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting is present but invalid, or a required setting is missing.
    #[error("configuration error: {0}")]
    Invalid(String),
    /// The configuration sources themselves could not be read or merged.
    #[error("configuration error: {0}")]
    Load(#[from] figment::Error),
}

/// Root configuration for one invocation.
///
/// Immutable once loaded; the CLI flags may raise `force_send`, `force_event`
/// and `dry_run` before validation, after which the value is passed by
/// reference into the run.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Anchor date in `YYYY-MM-DD` form; day 1 of the relationship.
    pub anchor_date: String,
    /// How the recipient is addressed in message templates.
    pub display_name: String,
    /// Surprise link embedded in message templates.
    pub link_url: String,
    /// IANA timezone every evaluation instant is normalized to.
    pub timezone: String,
    /// Comma-separated recipient list: email addresses or phone numbers,
    /// depending on the selected transport. A singular value works too.
    pub recipients: String,
    /// Bypass the window check and send regardless.
    pub force_send: bool,
    /// Event key to use when forcing a send outside every window.
    pub force_event: Option<String>,
    /// Event key used for forced sends when `force_event` is not given.
    pub default_event: String,
    /// Compose and log the message but skip the send.
    pub dry_run: bool,
    /// The schedule table, evaluated in declaration order.
    pub events: Vec<ScheduleEntry>,
    /// Which outbound transport carries the message.
    pub transport: TransportKind,
    /// SMTP settings, required when `transport` is `email`.
    pub email: EmailConfig,
    /// Messaging gateway settings, required when `transport` is `sms`.
    pub sms: SmsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            anchor_date: "2022-12-06".to_owned(),
            display_name: "Baby".to_owned(),
            link_url: "https://jowenthebui.github.io/letterstomylove/".to_owned(),
            timezone: "Asia/Kuala_Lumpur".to_owned(),
            recipients: String::new(),
            force_send: false,
            force_event: None,
            default_event: "anniversary".to_owned(),
            dry_run: false,
            events: vec![ScheduleEntry {
                key: "anniversary".to_owned(),
                target: TargetSpec::Annual {
                    annual: AnnualTarget {
                        month: 12,
                        day: 6,
                        hour: 5,
                        minute: 20,
                    },
                },
                tolerance_secs: 600,
                template: TemplateKind::Anniversary,
            }],
            transport: TransportKind::Email,
            email: EmailConfig::default(),
            sms: SmsConfig::default(),
        }
    }
}

/// Selects the outbound transport for this invocation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// SMTP email via lettre.
    Email,
    /// HTTP messaging gateway (Twilio-compatible).
    Sms,
}

/// SMTP settings for the email transport.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP relay hostname.
    pub smtp_server: String,
    /// SMTP port (STARTTLS).
    pub smtp_port: u16,
    /// Sender address, also the default login username.
    pub sender: String,
    /// Login username override (SendGrid-style setups use `apikey` here).
    pub username: String,
    /// Login password or app password.
    pub password: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            smtp_server: "smtp.gmail.com".to_owned(),
            smtp_port: 587,
            sender: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl EmailConfig {
    /// The SMTP login username: the explicit override, or the sender address.
    pub fn resolved_username(&self) -> &str {
        if self.username.is_empty() {
            &self.sender
        } else {
            &self.username
        }
    }
}

/// Settings for the HTTP messaging gateway transport.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SmsConfig {
    /// Account SID, also the basic-auth username.
    pub account_sid: String,
    /// Auth token, the basic-auth password.
    pub auth_token: String,
    /// Sender phone number in E.164 form, e.g. `+15550001111`.
    pub from_number: String,
    /// Gateway base URL; overridable so tests can point at a local server.
    pub api_base: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        SmsConfig {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            api_base: "https://api.twilio.com".to_owned(),
        }
    }
}

impl Config {
    /// Loads the configuration from defaults, an optional YAML file, and
    /// `KEEPSAKE_`-prefixed environment variables, in that precedence order.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to a YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source cannot be read or the
    /// merged result does not deserialize. Semantic checks happen separately
    /// in [`Config::validate`].
    pub fn load(path: Option<&str>) -> Result<Config, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Pre-flight sanity check, run before any network activity.
    ///
    /// Verifies the anchor date, the timezone, the schedule table, the
    /// recipient list, and the credentials of the selected transport.
    /// The first problem found is returned; nothing is sent when this fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        schedule::parse_anchor(&self.anchor_date)?;
        schedule::parse_timezone(&self.timezone)?;

        if self.recipient_list().is_empty() {
            return Err(ConfigError::Invalid(
                "no recipients configured; set recipients to a comma-separated list".to_owned(),
            ));
        }

        if self.events.is_empty() {
            return Err(ConfigError::Invalid(
                "the events table is empty; configure at least one schedule entry".to_owned(),
            ));
        }
        for entry in &self.events {
            validate_entry(entry)?;
        }

        match self.transport {
            TransportKind::Email => self.validate_email(),
            TransportKind::Sms => self.validate_sms(),
        }
    }

    fn validate_email(&self) -> Result<(), ConfigError> {
        if self.email.sender.is_empty() || !self.email.sender.contains('@') {
            return Err(ConfigError::Invalid(
                "email.sender is missing or not an email address".to_owned(),
            ));
        }
        if self.email.password.is_empty() {
            return Err(ConfigError::Invalid(
                "email.password is missing; set the SMTP password or app password".to_owned(),
            ));
        }
        // Gmail app passwords are 16 characters once spaces are removed.
        if self.email.smtp_server == "smtp.gmail.com"
            && self.email.password.replace(' ', "").len() != 16
        {
            warn!("email.password is not 16 characters; is it a Gmail app password?");
        }
        Ok(())
    }

    fn validate_sms(&self) -> Result<(), ConfigError> {
        if self.sms.account_sid.is_empty() {
            return Err(ConfigError::Invalid("sms.account_sid is missing".to_owned()));
        }
        if self.sms.auth_token.is_empty() {
            return Err(ConfigError::Invalid("sms.auth_token is missing".to_owned()));
        }
        if self.sms.from_number.is_empty() {
            return Err(ConfigError::Invalid("sms.from_number is missing".to_owned()));
        }
        Ok(())
    }

    /// The recipient list: comma-split, trimmed, empties dropped.
    ///
    /// A singular value without commas yields a one-element list.
    pub fn recipient_list(&self) -> Vec<String> {
        self.recipients
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Rejects schedule entries whose target can never resolve.
fn validate_entry(entry: &ScheduleEntry) -> Result<(), ConfigError> {
    if entry.key.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "a schedule entry has an empty key".to_owned(),
        ));
    }
    if let TargetSpec::Annual { annual } = &entry.target {
        // Validated against a leap year so Feb 29 stays configurable.
        let valid_date = chrono::NaiveDate::from_ymd_opt(2000, annual.month, annual.day).is_some();
        if !valid_date || annual.hour > 23 || annual.minute > 59 {
            return Err(ConfigError::Invalid(format!(
                "event {} has an invalid annual target {:02}-{:02} {:02}:{:02}",
                entry.key, annual.month, annual.day, annual.hour, annual.minute
            )));
        }
    }
    Ok(())
}
