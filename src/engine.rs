//! Assessment engine client
//!
//! The engine owns the questionnaire and report generation; this side only
//! speaks its request/response contract.

mod error;
mod http;
mod types;

pub use error::{EngineError, EngineErrorKind};
pub use http::HttpEngine;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Request/response contract of the remote assessment engine
#[async_trait]
pub trait AssessmentEngine: Send + Sync {
    /// Open a new session with no prior input
    async fn start(&self) -> Result<StartResponse, EngineError>;

    /// Submit one piece of user input for an established session
    async fn next(&self, session_id: &str, input: &str) -> Result<TurnResponse, EngineError>;

    /// Tell the engine the user stepped backwards (advisory)
    async fn go_back(&self, session_id: &str) -> Result<BackAck, EngineError>;

    /// One-shot assessment that bypasses the turn-by-turn flow
    async fn quick_assess(
        &self,
        request: &QuickAssessRequest,
    ) -> Result<QuickAssessResponse, EngineError>;

    /// Advisory symptom lookup for autocomplete
    async fn search_symptoms(&self, query: &str) -> Result<Vec<SymptomMatch>, EngineError>;

    /// Persist a snapshot of the session on the engine side
    async fn save(&self, session_id: &str) -> Result<SaveReceipt, EngineError>;
}

#[async_trait]
impl<T: AssessmentEngine + ?Sized> AssessmentEngine for Arc<T> {
    async fn start(&self) -> Result<StartResponse, EngineError> {
        (**self).start().await
    }

    async fn next(&self, session_id: &str, input: &str) -> Result<TurnResponse, EngineError> {
        (**self).next(session_id, input).await
    }

    async fn go_back(&self, session_id: &str) -> Result<BackAck, EngineError> {
        (**self).go_back(session_id).await
    }

    async fn quick_assess(
        &self,
        request: &QuickAssessRequest,
    ) -> Result<QuickAssessResponse, EngineError> {
        (**self).quick_assess(request).await
    }

    async fn search_symptoms(&self, query: &str) -> Result<Vec<SymptomMatch>, EngineError> {
        (**self).search_symptoms(query).await
    }

    async fn save(&self, session_id: &str) -> Result<SaveReceipt, EngineError> {
        (**self).save(session_id).await
    }
}

/// Logging wrapper for engine clients
pub struct LoggingEngine<E> {
    inner: E,
}

impl<E: AssessmentEngine> LoggingEngine<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    fn record<T>(operation: &'static str, started: Instant, result: &Result<T, EngineError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    "Engine request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    operation,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Engine request failed"
                );
            }
        }
    }
}

#[async_trait]
impl<E: AssessmentEngine> AssessmentEngine for LoggingEngine<E> {
    async fn start(&self) -> Result<StartResponse, EngineError> {
        let started = Instant::now();
        let result = self.inner.start().await;
        Self::record("start", started, &result);
        result
    }

    async fn next(&self, session_id: &str, input: &str) -> Result<TurnResponse, EngineError> {
        let started = Instant::now();
        let result = self.inner.next(session_id, input).await;
        Self::record("next", started, &result);
        result
    }

    async fn go_back(&self, session_id: &str) -> Result<BackAck, EngineError> {
        let started = Instant::now();
        let result = self.inner.go_back(session_id).await;
        Self::record("go_back", started, &result);
        result
    }

    async fn quick_assess(
        &self,
        request: &QuickAssessRequest,
    ) -> Result<QuickAssessResponse, EngineError> {
        let started = Instant::now();
        let result = self.inner.quick_assess(request).await;
        Self::record("quick_assess", started, &result);
        result
    }

    async fn search_symptoms(&self, query: &str) -> Result<Vec<SymptomMatch>, EngineError> {
        let started = Instant::now();
        let result = self.inner.search_symptoms(query).await;
        Self::record("search_symptoms", started, &result);
        result
    }

    async fn save(&self, session_id: &str) -> Result<SaveReceipt, EngineError> {
        let started = Instant::now();
        let result = self.inner.save(session_id).await;
        Self::record("save", started, &result);
        result
    }
}
