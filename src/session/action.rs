//! Actions the presentation layer can submit

use crate::engine::QuickAssessRequest;

/// User-initiated actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// (Re)open the conversation
    Start,
    /// Free-text answer
    Message { text: String },
    /// One offered option picked
    OptionChosen { value: String },
    /// Several options picked on a multiple-select prompt
    SelectionSubmitted { values: Vec<String> },
    GoBack,
    StartOver,
    QuickAssess(QuickAssessRequest),
    Save,
    /// Autocomplete lookup; never takes the turn guard
    SymptomQuery { query: String },
}

impl UserAction {
    /// Whether this action needs the single-flight guard
    pub fn is_turn(&self) -> bool {
        !matches!(self, UserAction::SymptomQuery { .. })
    }
}
