//! Session controller

use super::traits::Presenter;
use crate::engine::{
    AssessmentEngine, BiologicalSex, EngineError, QuickAssessRequest, StartResponse,
    SymptomMatch, TurnResponse,
};
use crate::session::interpret::{controls, restore};
use crate::session::{interpret, Directive, Role, Session, UserAction};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Shortest symptom query worth sending to the engine
const MIN_SYMPTOM_QUERY_CHARS: usize = 2;

const START_FAILED: &str =
    "Sorry, there was an error starting the assessment. Please try again.";
const RESTART_FAILED: &str =
    "Sorry, there was an error starting a new assessment. Please try again.";
const MESSAGE_FAILED: &str =
    "Sorry, there was an error processing your request. Please try again.";
const OPTION_FAILED: &str =
    "Sorry, there was an error processing your selection. Please try again.";
const GO_BACK_FAILED: &str =
    "Sorry, there was an error going back in the conversation. Please continue from here.";
const QUICK_FAILED: &str =
    "Sorry, there was an error generating your assessment. Please try again.";
const SAVE_FAILED: &str = "Failed to save assessment. Please try again.";
const AT_BEGINNING: &str = "You're at the beginning of the conversation.";
const SAVED: &str = "Assessment saved successfully!";

/// Errors a turn can end with
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("No active session. Please start an assessment first.")]
    NoActiveSession,
    #[error("Please enter at least one symptom.")]
    NoSymptomsProvided,
    #[error("Input is empty")]
    EmptyInput,
    #[error("Engine request failed: {0}")]
    TransportFailure(EngineError),
    #[error("Malformed engine response: {0}")]
    MalformedResponse(EngineError),
    #[error("Engine was not told about the step back: {0}")]
    BackendAdvisoryFailure(EngineError),
}

impl TurnError {
    fn from_engine(e: EngineError) -> Self {
        if e.is_malformed() {
            TurnError::MalformedResponse(e)
        } else {
            TurnError::TransportFailure(e)
        }
    }
}

/// How an action ended. Errors stop here; nothing propagates further.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Exchange completed and its result is on screen
    Applied,
    /// Another turn was in flight; nothing happened
    Rejected,
    /// "Go back" with no checkpoint to return to
    NothingToUndo,
    /// Applied locally, but an advisory engine call failed
    Degraded(TurnError),
    Failed(TurnError),
}

impl TurnOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TurnOutcome::Applied | TurnOutcome::Degraded(_))
    }

    pub fn error(&self) -> Option<&TurnError> {
        match self {
            TurnOutcome::Degraded(e) | TurnOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Releases the single-flight guard when the turn ends, whichever way
struct TurnGuard<'a> {
    session: &'a Mutex<Session>,
    id: Uuid,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .end_turn();
        tracing::debug!(turn_id = %self.id, "Turn ended");
    }
}

/// Drives one assessment session against an engine and a presenter
pub struct SessionController<E, P>
where
    E: AssessmentEngine + 'static,
    P: Presenter + 'static,
{
    engine: E,
    presenter: P,
    session: Mutex<Session>,
    share_base_url: String,
}

impl<E, P> SessionController<E, P>
where
    E: AssessmentEngine + 'static,
    P: Presenter + 'static,
{
    pub fn new(engine: E, presenter: P, allow_backtrack: bool) -> Self {
        Self {
            engine,
            presenter,
            session: Mutex::new(Session::new(allow_backtrack)),
            share_base_url: String::new(),
        }
    }

    /// Base URL for links to saved assessments
    pub fn with_share_base_url(mut self, url: &str) -> Self {
        self.share_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Copy of the current session
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    /// Consume actions until the sender goes away, then wait for every
    /// accepted action to finish.
    ///
    /// Every action runs as its own task so that one arriving mid-turn meets
    /// the guard instead of queueing behind the turn in flight.
    pub async fn run(self: Arc<Self>, mut actions: mpsc::Receiver<UserAction>) {
        tracing::info!("Starting session controller");
        let mut in_flight = JoinSet::new();

        while let Some(action) = actions.recv().await {
            tracing::debug!(turn = action.is_turn(), "Action received");
            let controller = Arc::clone(&self);
            in_flight.spawn(async move {
                let outcome = controller.handle(action).await;
                match outcome.error() {
                    Some(e) => tracing::warn!(
                        applied = outcome.is_applied(),
                        error = %e,
                        "Action ended with error"
                    ),
                    None => tracing::debug!(applied = outcome.is_applied(), "Action finished"),
                }
            });
            // Reap what has already finished
            while in_flight.try_join_next().is_some() {}
        }

        if !in_flight.is_empty() {
            tracing::info!(pending = in_flight.len(), "Input closed, finishing actions in flight");
        }
        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Action task failed");
            }
        }

        tracing::info!("Session controller stopped");
    }

    /// Dispatch a single user action
    pub async fn handle(&self, action: UserAction) -> TurnOutcome {
        match action {
            UserAction::Start => self.start().await,
            UserAction::Message { text } => self.submit_message(&text).await,
            UserAction::OptionChosen { value } => self.submit_option(&value).await,
            UserAction::SelectionSubmitted { values } => self.submit_selection(&values).await,
            UserAction::GoBack => self.go_back().await,
            UserAction::StartOver => self.start_over().await,
            UserAction::QuickAssess(QuickAssessRequest {
                age,
                biological_sex,
                symptoms,
            }) => self.quick_assess(age, biological_sex, symptoms).await,
            UserAction::Save => self.save_assessment().await,
            UserAction::SymptomQuery { query } => {
                let matches = self.search_symptoms(&query).await;
                self.present(Directive::ShowSuggestions { matches });
                TurnOutcome::Applied
            }
        }
    }

    // ========================================================================
    // Turn operations
    // ========================================================================

    pub async fn start(&self) -> TurnOutcome {
        let Some(turn) = self.begin_turn("start") else {
            return TurnOutcome::Rejected;
        };
        // Start always opens a fresh session
        let existing = {
            let mut session = self.lock();
            let existing = session.session_id().map(str::to_string);
            session.reset();
            existing
        };
        if let Some(existing) = existing {
            tracing::warn!(session_id = %existing, "Replacing an established session");
            self.present(Directive::ClearConversation);
        }
        self.open_session(&turn, START_FAILED).await
    }

    pub async fn start_over(&self) -> TurnOutcome {
        let Some(turn) = self.begin_turn("start_over") else {
            return TurnOutcome::Rejected;
        };
        // The local reset stands even if the engine is unreachable
        self.lock().reset();
        self.present(Directive::ClearConversation);
        self.open_session(&turn, RESTART_FAILED).await
    }

    pub async fn submit_message(&self, text: &str) -> TurnOutcome {
        let Some(turn) = self.begin_turn("message") else {
            return TurnOutcome::Rejected;
        };
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::Failed(TurnError::EmptyInput);
        }
        self.exchange(&turn, text, false, MESSAGE_FAILED).await
    }

    pub async fn submit_option(&self, value: &str) -> TurnOutcome {
        let Some(turn) = self.begin_turn("option") else {
            return TurnOutcome::Rejected;
        };
        let value = value.trim();
        if value.is_empty() {
            return TurnOutcome::Failed(TurnError::EmptyInput);
        }
        self.exchange(&turn, value, true, OPTION_FAILED).await
    }

    /// Multiple-select answer, sent as one comma-joined option
    pub async fn submit_selection(&self, values: &[String]) -> TurnOutcome {
        let Some(turn) = self.begin_turn("selection") else {
            return TurnOutcome::Rejected;
        };
        let joined = values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if joined.is_empty() {
            return TurnOutcome::Failed(TurnError::EmptyInput);
        }
        self.exchange(&turn, &joined, true, OPTION_FAILED).await
    }

    pub async fn go_back(&self) -> TurnOutcome {
        let Some(turn) = self.begin_turn("go_back") else {
            return TurnOutcome::Rejected;
        };

        let (restored, session_id) = {
            let mut session = self.lock();
            match session.pop_checkpoint() {
                Some(checkpoint) => (
                    Some(restore(&mut session, checkpoint)),
                    session.session_id().map(str::to_string),
                ),
                None => (None, None),
            }
        };

        let Some(directives) = restored else {
            self.present(Directive::message(AT_BEGINNING));
            return TurnOutcome::NothingToUndo;
        };
        self.present_all(directives);

        let Some(session_id) = session_id else {
            return TurnOutcome::Applied;
        };

        // Local state is what the user sees next; the engine is only told
        match self.engine.go_back(&session_id).await {
            Ok(_) => TurnOutcome::Applied,
            Err(e) => {
                tracing::warn!(
                    turn_id = %turn.id,
                    session_id = %session_id,
                    error = %e,
                    "Engine go-back notification failed"
                );
                self.present(Directive::error(GO_BACK_FAILED));
                TurnOutcome::Degraded(TurnError::BackendAdvisoryFailure(e))
            }
        }
    }

    /// One-shot assessment; leaves the session untouched
    pub async fn quick_assess(
        &self,
        age: u32,
        biological_sex: BiologicalSex,
        symptoms: Vec<String>,
    ) -> TurnOutcome {
        let Some(turn) = self.begin_turn("quick_assess") else {
            return TurnOutcome::Rejected;
        };

        let symptoms: Vec<String> = symptoms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if symptoms.is_empty() {
            let error = TurnError::NoSymptomsProvided;
            let notice = error.to_string();
            return self.fail(&turn, error, &notice);
        }

        let request = QuickAssessRequest {
            age,
            biological_sex,
            symptoms,
        };
        let response = match self.engine.quick_assess(&request).await {
            Ok(r) => r,
            Err(e) => return self.fail(&turn, TurnError::from_engine(e), QUICK_FAILED),
        };

        if let Some(error) = response.error {
            self.present(Directive::error(format!("Error: {error}")));
            return TurnOutcome::Applied;
        }
        let Some(report) = response.report else {
            let error = TurnError::MalformedResponse(EngineError::decode(
                "Quick assessment response has no report",
            ));
            return self.fail(&turn, error, QUICK_FAILED);
        };

        self.present(Directive::RenderReport {
            message: response.message,
            report,
        });
        TurnOutcome::Applied
    }

    pub async fn save_assessment(&self) -> TurnOutcome {
        let Some(turn) = self.begin_turn("save") else {
            return TurnOutcome::Rejected;
        };
        let session_id = self.lock().session_id().map(str::to_string);
        let Some(session_id) = session_id else {
            return self.fail(
                &turn,
                TurnError::NoActiveSession,
                "Cannot save assessment: No active session",
            );
        };

        let receipt = match self.engine.save(&session_id).await {
            Ok(r) => r,
            Err(e) => return self.fail(&turn, TurnError::from_engine(e), SAVE_FAILED),
        };
        let Some(assessment_id) = receipt.assessment_id else {
            let error = TurnError::MalformedResponse(EngineError::decode(
                "Save response has no assessment_id",
            ));
            return self.fail(&turn, error, SAVE_FAILED);
        };

        tracing::info!(session_id = %session_id, assessment_id = %assessment_id, "Assessment saved");
        self.present(Directive::notify(SAVED));
        self.present(Directive::ShowShareLink {
            url: format!("{}/assessment/{assessment_id}", self.share_base_url),
        });
        TurnOutcome::Applied
    }

    /// Advisory autocomplete lookup; never takes the turn guard
    pub async fn search_symptoms(&self, query: &str) -> Vec<SymptomMatch> {
        let query = query.trim();
        if query.chars().count() < MIN_SYMPTOM_QUERY_CHARS {
            return Vec::new();
        }
        match self.engine.search_symptoms(query).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(query, error = %e, "Symptom search failed");
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Turn plumbing
    // ========================================================================

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_turn(&self, action: &'static str) -> Option<TurnGuard<'_>> {
        if !self.lock().try_begin_turn() {
            tracing::debug!(action, "Turn rejected, another is in flight");
            return None;
        }
        let id = Uuid::new_v4();
        tracing::debug!(turn_id = %id, action, "Turn accepted");
        Some(TurnGuard {
            session: &self.session,
            id,
        })
    }

    /// Ask the engine for a fresh session and show its opening turn
    async fn open_session(&self, turn: &TurnGuard<'_>, failure_notice: &str) -> TurnOutcome {
        let (session_id, response) = match self
            .engine
            .start()
            .await
            .and_then(StartResponse::into_parts)
        {
            Ok(parts) => parts,
            Err(e) => return self.fail(turn, TurnError::from_engine(e), failure_notice),
        };

        tracing::info!(turn_id = %turn.id, session_id = %session_id, "Session started");
        let directives = {
            let mut session = self.lock();
            session.establish(session_id);
            interpret(&mut session, &response)
        };
        self.present_all(directives);
        TurnOutcome::Applied
    }

    /// Send one input for the established session and apply the reply
    async fn exchange(
        &self,
        turn: &TurnGuard<'_>,
        input: &str,
        checkpoint: bool,
        failure_notice: &str,
    ) -> TurnOutcome {
        let session_id = {
            let mut session = self.lock();
            match session.session_id().map(str::to_string) {
                Some(id) => {
                    if checkpoint {
                        session.checkpoint_current();
                    }
                    Some(id)
                }
                None => None,
            }
        };
        let Some(session_id) = session_id else {
            let error = TurnError::NoActiveSession;
            let notice = error.to_string();
            return self.fail(turn, error, &notice);
        };

        let response = match self
            .engine
            .next(&session_id, input)
            .await
            .and_then(|r: TurnResponse| r.validate().map(|()| r))
        {
            Ok(r) => r,
            Err(e) => return self.fail(turn, TurnError::from_engine(e), failure_notice),
        };

        let directives = {
            let mut session = self.lock();
            session.record(Role::User, input);
            interpret(&mut session, &response)
        };
        self.present_all(directives);
        TurnOutcome::Applied
    }

    fn fail(&self, turn: &TurnGuard<'_>, error: TurnError, notice: &str) -> TurnOutcome {
        tracing::warn!(turn_id = %turn.id, error = %error, "Turn failed");
        self.present(Directive::error(notice));
        // Controls may have changed (e.g. a checkpoint pushed before the failure)
        let current = controls(&self.lock());
        self.present(current);
        TurnOutcome::Failed(error)
    }

    fn present_all(&self, directives: Vec<Directive>) {
        for directive in directives {
            self.present(directive);
        }
    }

    fn present(&self, directive: Directive) {
        let p = &self.presenter;
        match directive {
            Directive::ShowMessage { text, meta } => p.show_message(&text, meta.as_ref()),
            Directive::ShowOptions {
                options,
                multiple_select,
            } => p.show_options(&options, multiple_select),
            Directive::UpdateProgress { percent } => p.update_progress(percent),
            Directive::RenderReport { message, report } => {
                p.render_report(message.as_deref(), &report);
            }
            Directive::SetInputMode { kind, placeholder } => {
                p.set_input_mode(kind, placeholder.as_deref());
            }
            Directive::NotifyError { text } => p.notify_error(&text),
            Directive::SetControls(c) => p.set_controls_enabled(c),
            Directive::ClearConversation => p.clear_conversation(),
            Directive::Notify { text } => p.notify(&text),
            Directive::ShowShareLink { url } => p.show_share_link(&url),
            Directive::ShowSuggestions { matches } => p.show_suggestions(&matches),
        }
    }
}
