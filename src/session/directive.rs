//! Directives produced for the presentation layer

use crate::engine::{InfoButton, InputKind, Report, SymptomMatch};

/// Which session controls are usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub back: bool,
    pub save: bool,
}

/// UI directives to be rendered after a turn
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    ShowMessage {
        text: String,
        meta: Option<InfoButton>,
    },
    ShowOptions {
        options: Vec<String>,
        multiple_select: bool,
    },
    UpdateProgress {
        percent: u8,
    },
    RenderReport {
        message: Option<String>,
        report: Report,
    },
    SetInputMode {
        kind: InputKind,
        placeholder: Option<String>,
    },
    NotifyError {
        text: String,
    },
    SetControls(Controls),
    /// Drop everything shown for the previous session
    ClearConversation,
    /// Informational notice, not an error
    Notify {
        text: String,
    },
    ShowShareLink {
        url: String,
    },
    ShowSuggestions {
        matches: Vec<SymptomMatch>,
    },
}

impl Directive {
    pub fn message(text: impl Into<String>) -> Self {
        Directive::ShowMessage {
            text: text.into(),
            meta: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Directive::NotifyError { text: text.into() }
    }

    pub fn notify(text: impl Into<String>) -> Self {
        Directive::Notify { text: text.into() }
    }
}
