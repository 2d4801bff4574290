//! Session state types

use crate::engine::{Flow, InputKind, TurnResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Prompt and Checkpoint
// ============================================================================

/// What the user is currently being asked
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prompt {
    pub message: Option<String>,
    pub options: Vec<String>,
    pub multiple_select: bool,
    pub input_kind: InputKind,
    pub placeholder: Option<String>,
}

impl Prompt {
    /// Follow the prompt forward to what `response` asks next.
    ///
    /// Message and options are always replaced; the input kind only changes
    /// when the engine names a new one.
    pub fn advance(&mut self, response: &TurnResponse) {
        self.message.clone_from(&response.message);
        self.options = response.options.clone().unwrap_or_default();
        self.multiple_select = response.multiple_select.unwrap_or(false);
        if let Some(kind) = response.input_kind {
            self.input_kind = kind;
            self.placeholder.clone_from(&response.placeholder);
        }
    }
}

/// Snapshot of an answered prompt, restored by "go back"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub prompt: Prompt,
}

impl Checkpoint {
    pub fn of(prompt: &Prompt) -> Self {
        Self {
            prompt: prompt.clone(),
        }
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Session
// ============================================================================

/// One assessment session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: Option<String>,
    flow: Flow,
    active_symptom: Option<String>,
    history: Vec<Checkpoint>,
    completed: bool,
    busy: bool,
    allow_backtrack: bool,
    current_prompt: Prompt,
    transcript: Vec<TranscriptEntry>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Session {
    pub fn new(allow_backtrack: bool) -> Self {
        Self {
            session_id: None,
            flow: Flow::Main,
            active_symptom: None,
            history: Vec::new(),
            completed: false,
            busy: false,
            allow_backtrack,
            current_prompt: Prompt::default(),
            transcript: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn active_symptom(&self) -> Option<&str> {
        self.active_symptom.as_deref()
    }

    pub fn history(&self) -> &[Checkpoint] {
        &self.history
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    #[cfg(test)]
    pub fn allows_backtrack(&self) -> bool {
        self.allow_backtrack
    }

    pub fn can_go_back(&self) -> bool {
        self.allow_backtrack && !self.history.is_empty()
    }

    #[cfg(test)]
    pub fn current_prompt(&self) -> &Prompt {
        &self.current_prompt
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    // ------------------------------------------------------------------
    // Single-flight guard
    // ------------------------------------------------------------------

    /// Claim the session for one turn. Returns false, changing nothing, if a
    /// turn is already in flight.
    pub fn try_begin_turn(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn end_turn(&mut self) {
        self.busy = false;
    }

    // ------------------------------------------------------------------
    // Identity and lifecycle
    // ------------------------------------------------------------------

    /// Record the identity issued by a successful start
    pub fn establish(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
        self.history.clear();
        self.completed = false;
    }

    /// Replace everything with a fresh session.
    ///
    /// The backtracking policy and the in-flight flag survive: a restart runs
    /// inside a turn that still holds the guard.
    pub fn reset(&mut self) {
        *self = Self {
            busy: self.busy,
            ..Self::new(self.allow_backtrack)
        };
    }

    /// A report ends the current line of questioning
    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.history.clear();
        self.exit_symptom_flow();
    }

    // ------------------------------------------------------------------
    // Flow
    // ------------------------------------------------------------------

    pub fn enter_symptom_flow(&mut self, symptom: Option<String>) {
        if self.flow == Flow::SymptomSpecific {
            return;
        }
        self.flow = Flow::SymptomSpecific;
        self.active_symptom = symptom;
    }

    pub fn exit_symptom_flow(&mut self) {
        self.flow = Flow::Main;
        self.active_symptom = None;
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn push_checkpoint(&mut self, checkpoint: Checkpoint) {
        if self.allow_backtrack {
            self.history.push(checkpoint);
        }
    }

    pub fn pop_checkpoint(&mut self) -> Option<Checkpoint> {
        if !self.allow_backtrack {
            return None;
        }
        self.history.pop()
    }

    /// Checkpoint of whatever is displayed right now
    pub fn checkpoint_current(&mut self) {
        let checkpoint = Checkpoint::of(&self.current_prompt);
        self.push_checkpoint(checkpoint);
    }

    // ------------------------------------------------------------------
    // Prompt and transcript
    // ------------------------------------------------------------------

    pub fn advance_prompt(&mut self, response: &TurnResponse) {
        self.current_prompt.advance(response);
    }

    pub fn restore_prompt(&mut self, checkpoint: Checkpoint) {
        self.current_prompt = checkpoint.prompt;
    }

    pub fn record(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }
}
