//! Conversation session state machine
//!
//! `Session` is the authoritative record of one assessment; `interpret`
//! turns engine replies into session mutations plus UI directives without
//! doing any I/O.

pub mod action;
mod directive;
pub(crate) mod interpret;
pub mod state;

#[cfg(test)]
mod proptests;

pub use action::UserAction;
pub use directive::{Controls, Directive};
pub use interpret::interpret;
pub use state::{Checkpoint, Prompt, Role, Session, TranscriptEntry};
