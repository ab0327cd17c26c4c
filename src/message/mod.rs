//! Message composition for scheduled sends.
//!
//! Turns a gate decision into the actual outgoing content:
//!
//! - [`TemplateKind`]: the fixed set of named templates
//! - [`MessageComposer`]: renders a [`ComposedMessage`] (subject, plain-text
//!   body, HTML body) from the event key, the day count, and the evaluation
//!   date
//!
//! Composition is deterministic: the same inputs always produce byte-identical
//! output, and nothing in this module touches the network, the filesystem, or
//! the clock.

mod composer;
mod templates;

pub use crate::message::composer::{ComposedMessage, MessageComposer};
pub use crate::message::templates::TemplateKind;
