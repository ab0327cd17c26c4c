//! Keepsake - a date-gated anniversary message sender.
//!
//! This is the main entry point for keepsake, a single-shot sender invoked by
//! an external cron-like scheduler (typically a CI workflow). Each invocation
//! decides whether a scheduled event is due right now and, if so, composes
//! and sends one anniversary or New Year message by email or SMS.
//!
//! # Overview
//!
//! Keepsake keeps track of "day N of the relationship": it counts elapsed
//! days from a configured anchor date (the anchor itself is day 1) and only
//! sends when the evaluation instant falls inside the tolerance window of a
//! configured event. The evaluation instant is always normalized to a fixed
//! IANA timezone (default `Asia/Kuala_Lumpur`), so the decision does not
//! depend on where the host machine runs.
//!
//! # Features
//!
//! - **Annual events**: a `(month, day, hour, minute)` target re-resolved
//!   against the current year on every run — set it once, it recurs forever
//! - **Event tables**: absolute targets with explicit years (`anniv2025`,
//!   `newyear2026`, ...) evaluated in declaration order, first match wins
//! - **Two transports**: SMTP email (plain text + HTML alternative) or a
//!   Twilio-compatible SMS gateway
//! - **Force send**: bypass the window check for manual tests, optionally
//!   picking the event identity to send
//! - **Dry run**: compose and log the message without sending anything
//!
//! # Configuration
//!
//! Create a `keepsake.yaml` (every value has a default except recipients and
//! the transport credentials):
//!
//! ```yaml
//! anchor_date: "2022-12-06"
//! display_name: "Baby"
//! recipients: "her@example.com"
//!
//! events:
//!   - key: anniversary
//!     annual: { month: 12, day: 6, hour: 5, minute: 20 }
//!
//! transport: email
//! email:
//!   sender: "me@gmail.com"
//!   password: "abcd efgh ijkl mnop"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Any scalar setting can come from the environment with the `KEEPSAKE_`
//! prefix, which is how CI secrets are injected:
//!
//! ```bash
//! export KEEPSAKE_RECIPIENTS="her@example.com"
//! export KEEPSAKE_EMAIL__SENDER="me@gmail.com"
//! export KEEPSAKE_EMAIL__PASSWORD="abcd efgh ijkl mnop"
//! keepsake --config keepsake.yaml
//! ```
//!
//! # Usage
//!
//! ```bash
//! keepsake --config keepsake.yaml          # normal scheduled invocation
//! keepsake --force --dry-run               # preview the message locally
//! keepsake --force --event newyear2026     # manual send of a specific event
//! ```
//!
//! # Architecture
//!
//! - [`schedule`] - day counting, clock capture, and tolerance-window gating
//! - [`message`] - template registry and deterministic message composition
//! - [`transport`] - SMTP and SMS delivery behind one trait
//! - [`config`] - layered configuration loading and pre-flight validation
//! - [`app`] - the single-shot run wiring the above together
//!
//! # Exit Codes
//!
//! - `0` - message sent, dry run, or deliberate skip (outside every window)
//! - `1` - configuration error, reported before any network activity
//! - `2` - transport rejected the credentials
//! - `3` - any other transport failure
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::app::{App, Outcome, RunError};
use crate::config::{Config, TransportKind};
use crate::transport::{EmailTransport, SmsTransport};

mod app;
mod config;
mod message;
mod schedule;
mod transport;

/// Command-line arguments for keepsake.
///
/// Most configuration lives in the YAML file and the environment (see
/// [`config::Config`]); the flags here are the per-invocation overrides an
/// operator reaches for when testing by hand.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// Optional: with no file, the built-in defaults plus `KEEPSAKE_`
    /// environment variables must supply everything required.
    #[arg(short, long)]
    config: Option<String>,

    /// Send even when no event window matches.
    ///
    /// Equivalent to setting `force_send: true` in the configuration.
    #[arg(short, long)]
    force: bool,

    /// Event key to send when forcing outside every window.
    ///
    /// Only meaningful together with `--force`; without it a forced send
    /// falls back to the configured default event.
    #[arg(short, long)]
    event: Option<String>,

    /// Compose and log the message without sending it.
    #[arg(long)]
    dry_run: bool,
}

/// Main entry point for keepsake.
///
/// Initializes logging, loads and validates the configuration, captures the
/// evaluation instant once, and hands everything to [`App::run`]. The
/// returned exit code follows the contract in the crate documentation.
#[tokio::main]
async fn main() -> ExitCode {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("starting keepsake {}...", env!("CARGO_PKG_VERSION"));

    // Parse command line arguments
    let args = Args::parse();

    // Load configuration, then fold the CLI overrides in before validating
    let mut config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };
    if args.force {
        config.force_send = true;
    }
    if let Some(event) = args.event {
        config.force_event = Some(event);
    }
    if args.dry_run {
        config.dry_run = true;
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::from(1);
    }

    // Sample the clock exactly once, normalized to the configured timezone
    let tz = match schedule::parse_timezone(&config.timezone) {
        Ok(tz) => tz,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(1);
        }
    };
    let now = schedule::capture_now(tz);

    let result = match config.transport {
        TransportKind::Email => {
            let transport = EmailTransport::new(config.email.clone());
            App::new(config, transport).run(now).await
        }
        TransportKind::Sms => {
            let transport = SmsTransport::new(config.sms.clone());
            App::new(config, transport).run(now).await
        }
    };

    match result {
        Ok(Outcome::Sent) => {
            info!("message sent successfully");
            ExitCode::SUCCESS
        }
        Ok(Outcome::DryRun) => {
            info!("dry run complete, nothing sent");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Skipped) => {
            info!("nothing to send today");
            ExitCode::SUCCESS
        }
        Err(RunError::Config(e)) => {
            error!("{e}");
            ExitCode::from(1)
        }
        Err(RunError::Transport(e)) if e.is_authentication() => {
            error!("{e}");
            ExitCode::from(2)
        }
        Err(RunError::Transport(e)) => {
            error!("{e}");
            ExitCode::from(3)
        }
    }
}
