//! The single-shot run: gate, compose, send.
//!
//! [`App`] wires the pure decision core to one outbound transport. Each run
//! performs at most one gate decision, one message composition, and one send
//! attempt, then reports an [`Outcome`]. There is no shared mutable state
//! between runs and no retry logic; re-invocation belongs to the external
//! scheduler.

use chrono::DateTime;
use chrono_tz::Tz;
use log::info;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::message::{ComposedMessage, MessageComposer};
use crate::schedule::{self, forced_event_key, resolve_schedule, which_event};
use crate::transport::{OutgoingMessage, Transport, TransportError};

/// How a run ended when it did not fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The message was handed to the transport successfully.
    Sent,
    /// Dry-run mode: the message was composed and logged, not sent.
    DryRun,
    /// No window matched and the force flag was off. Not an error.
    Skipped,
}

/// Error raised by a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Pre-flight configuration failure; nothing was sent.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The transport failed during the send attempt.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One invocation of the sender, bound to a validated configuration and a
/// concrete transport.
///
/// # Examples
///
/// ```no_run
/// use keepsake::app::App;
/// use keepsake::config::Config;
/// use keepsake::schedule::{capture_now, parse_timezone};
/// use keepsake::transport::EmailTransport;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::load(None)?;
/// config.validate()?;
///
/// let now = capture_now(parse_timezone(&config.timezone)?);
/// let transport = EmailTransport::new(config.email.clone());
/// let outcome = App::new(config, transport).run(now).await?;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
pub struct App<T: Transport> {
    config: Config,
    transport: T,
}

impl<T: Transport> App<T> {
    /// Binds a configuration to a transport.
    pub fn new(config: Config, transport: T) -> Self {
        App { config, transport }
    }

    /// Evaluates the schedule at `now` and sends at most one message.
    ///
    /// The decision sequence:
    ///
    /// 1. compute the day count from the anchor date
    /// 2. resolve the schedule table against `now` and find the first event
    ///    whose tolerance window contains it
    /// 3. if none matched and the force flag is set, fall back to the forced
    ///    or default event key; otherwise skip
    /// 4. compose the message for the selected key and hand it to the
    ///    transport (or only log it in dry-run mode)
    ///
    /// A window match takes precedence over the forced key, so forcing
    /// during an open window sends that window's event.
    ///
    /// # Arguments
    ///
    /// * `now` - The evaluation instant captured once at process start
    pub async fn run(&self, now: DateTime<Tz>) -> Result<Outcome, RunError> {
        let anchor = schedule::parse_anchor(&self.config.anchor_date)?;
        let today = now.date_naive();
        let day_count = schedule::days_together(anchor, today);

        info!("evaluating at {now}, day {day_count} together");

        let resolved = resolve_schedule(&self.config.events, &now);
        let event_key = match which_event(&now, &resolved) {
            Some(event) => {
                info!("event {} is due (target {})", event.key, event.target);
                event.key.clone()
            }
            None if self.config.force_send => {
                let key = forced_event_key(
                    self.config.force_event.as_deref(),
                    &self.config.default_event,
                );
                info!("no window matched but force flag is set, using event {key}");
                key.to_owned()
            }
            None => {
                info!("outside every send window and force flag not set, skipping");
                return Ok(Outcome::Skipped);
            }
        };

        let composer = MessageComposer::new(&self.config.display_name, &self.config.link_url)
            .with_schedule(&self.config.events);
        let composed = composer.compose(Some(&event_key), today, day_count);
        let message = self.outgoing_message(composed);

        if self.config.dry_run {
            info!(
                "dry run, not sending to {:?}:\n{}",
                message.recipients, message.text_body
            );
            return Ok(Outcome::DryRun);
        }

        self.transport.send(&message).await?;
        Ok(Outcome::Sent)
    }

    /// Pairs the composed content with the configured recipient list.
    fn outgoing_message(&self, composed: ComposedMessage) -> OutgoingMessage {
        OutgoingMessage {
            recipients: self.config.recipient_list(),
            subject: composed.subject,
            text_body: composed.text_body,
            html_body: composed.html_body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kuala_Lumpur;

    use crate::message::TemplateKind;
    use crate::schedule::{AnnualTarget, ScheduleEntry, TargetSpec};
    use crate::transport::MockTransport;

    fn myt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        Kuala_Lumpur.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    /// Configuration mirroring the legacy script: annual Dec 6 05:20 ±600s.
    fn test_config() -> Config {
        let mut config = Config::default();
        config.recipients = "her@example.com".to_owned();
        config.email.sender = "me@gmail.com".to_owned();
        config.email.password = "abcdefghijklmnop".to_owned();
        config
    }

    fn table_config() -> Config {
        let mut config = test_config();
        config.events = vec![
            ScheduleEntry {
                key: "anniv2025".to_owned(),
                target: TargetSpec::Absolute {
                    at: "2025-12-06T05:20:00".parse().unwrap(),
                },
                tolerance_secs: 600,
                template: TemplateKind::Anniversary,
            },
            ScheduleEntry {
                key: "newyear2026".to_owned(),
                target: TargetSpec::Absolute {
                    at: "2026-01-01T00:00:00".parse().unwrap(),
                },
                tolerance_secs: 600,
                template: TemplateKind::Newyear,
            },
        ];
        config
    }

    #[tokio::test]
    async fn test_skip_outside_window_without_force() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let app = App::new(test_config(), transport);
        let outcome = app.run(myt(2025, 6, 1, 12, 0, 0)).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped);
    }

    #[tokio::test]
    async fn test_send_inside_annual_window() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|message: &OutgoingMessage| {
                message.recipients == ["her@example.com"]
                    && message.subject == "❤️ 纪念日的情书"
                    && message.text_body.contains("第 1097 天")
                    && message.html_body.is_some()
            })
            .times(1)
            .returning(|_| Ok(()));

        // 2025-12-06 is day 1097 counted from 2022-12-06.
        let app = App::new(test_config(), transport);
        let outcome = app.run(myt(2025, 12, 6, 5, 20, 0)).await.unwrap();
        assert_eq!(outcome, Outcome::Sent);
    }

    #[tokio::test]
    async fn test_table_mode_selects_newyear_event() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|message: &OutgoingMessage| message.subject == "🎆 新年的情书")
            .times(1)
            .returning(|_| Ok(()));

        let app = App::new(table_config(), transport);
        let outcome = app.run(myt(2026, 1, 1, 0, 0, 0)).await.unwrap();
        assert_eq!(outcome, Outcome::Sent);
    }

    #[tokio::test]
    async fn test_force_send_outside_window_uses_default_event() {
        let mut config = test_config();
        config.force_send = true;

        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|message: &OutgoingMessage| message.subject == "❤️ 纪念日的情书")
            .times(1)
            .returning(|_| Ok(()));

        let app = App::new(config, transport);
        let outcome = app.run(myt(2025, 6, 1, 12, 0, 0)).await.unwrap();
        assert_eq!(outcome, Outcome::Sent);
    }

    #[tokio::test]
    async fn test_force_send_with_explicit_event_key() {
        let mut config = table_config();
        config.force_send = true;
        config.force_event = Some("newyear2026".to_owned());

        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|message: &OutgoingMessage| message.subject == "🎆 新年的情书")
            .times(1)
            .returning(|_| Ok(()));

        let app = App::new(config, transport);
        let outcome = app.run(myt(2025, 6, 1, 12, 0, 0)).await.unwrap();
        assert_eq!(outcome, Outcome::Sent);
    }

    #[tokio::test]
    async fn test_window_match_takes_precedence_over_forced_key() {
        let mut config = table_config();
        config.force_send = true;
        config.force_event = Some("newyear2026".to_owned());

        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|message: &OutgoingMessage| message.subject == "❤️ 纪念日的情书")
            .times(1)
            .returning(|_| Ok(()));

        let app = App::new(config, transport);
        let outcome = app.run(myt(2025, 12, 6, 5, 20, 0)).await.unwrap();
        assert_eq!(outcome, Outcome::Sent);
    }

    #[tokio::test]
    async fn test_dry_run_composes_but_does_not_send() {
        let mut config = test_config();
        config.force_send = true;
        config.dry_run = true;

        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let app = App::new(config, transport);
        let outcome = app.run(myt(2025, 6, 1, 12, 0, 0)).await.unwrap();
        assert_eq!(outcome, Outcome::DryRun);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let mut config = test_config();
        config.force_send = true;

        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError::Authentication("535: bad credentials".to_owned())));

        let app = App::new(config, transport);
        let err = app.run(myt(2025, 6, 1, 12, 0, 0)).await.unwrap_err();

        match err {
            RunError::Transport(e) => assert!(e.is_authentication()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_anchor_surfaces_as_config_error() {
        let mut config = test_config();
        config.anchor_date = "garbage".to_owned();

        let mut transport = MockTransport::new();
        transport.expect_send().times(0);

        let app = App::new(config, transport);
        let err = app.run(myt(2025, 12, 6, 5, 20, 0)).await.unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }
}
