//! Presentation-side abstraction
//!
//! The controller only ever talks to the UI through this capability set, so
//! tests can swap in a recorder.

use crate::engine::{InfoButton, InputKind, Report, SymptomMatch};
use crate::session::Controls;
use std::sync::Arc;

/// Renders directives produced by the session controller
pub trait Presenter: Send + Sync {
    fn show_message(&self, text: &str, meta: Option<&InfoButton>);

    fn show_options(&self, options: &[String], multiple_select: bool);

    fn update_progress(&self, percent: u8);

    fn render_report(&self, message: Option<&str>, report: &Report);

    fn set_input_mode(&self, kind: InputKind, placeholder: Option<&str>);

    fn notify_error(&self, text: &str);

    fn set_controls_enabled(&self, controls: Controls);

    /// Forget everything shown for the previous session
    fn clear_conversation(&self);

    fn notify(&self, text: &str);

    fn show_share_link(&self, url: &str);

    /// Autocomplete suggestions for the last symptom query
    fn show_suggestions(&self, matches: &[SymptomMatch]);
}

// ============================================================================
// Arc implementation for shared presenters
// ============================================================================

impl<T: Presenter + ?Sized> Presenter for Arc<T> {
    fn show_message(&self, text: &str, meta: Option<&InfoButton>) {
        (**self).show_message(text, meta);
    }

    fn show_options(&self, options: &[String], multiple_select: bool) {
        (**self).show_options(options, multiple_select);
    }

    fn update_progress(&self, percent: u8) {
        (**self).update_progress(percent);
    }

    fn render_report(&self, message: Option<&str>, report: &Report) {
        (**self).render_report(message, report);
    }

    fn set_input_mode(&self, kind: InputKind, placeholder: Option<&str>) {
        (**self).set_input_mode(kind, placeholder);
    }

    fn notify_error(&self, text: &str) {
        (**self).notify_error(text);
    }

    fn set_controls_enabled(&self, controls: Controls) {
        (**self).set_controls_enabled(controls);
    }

    fn clear_conversation(&self) {
        (**self).clear_conversation();
    }

    fn notify(&self, text: &str) {
        (**self).notify(text);
    }

    fn show_share_link(&self, url: &str) {
        (**self).show_share_link(url);
    }

    fn show_suggestions(&self, matches: &[SymptomMatch]) {
        (**self).show_suggestions(matches);
    }
}
