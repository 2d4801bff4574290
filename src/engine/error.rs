//! Engine error types

use thiserror::Error;

/// Engine error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Timeout, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Decode, message)
    }

    /// Classify a non-success HTTP status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        let kind = if status >= 500 {
            EngineErrorKind::ServerError(status)
        } else {
            EngineErrorKind::ClientError(status)
        };
        Self::new(kind, message)
    }

    /// True when the engine answered but not in the shape we expect
    pub fn is_malformed(&self) -> bool {
        self.kind == EngineErrorKind::Decode
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timed out: {e}"))
        } else if e.is_decode() {
            Self::decode(format!("Unexpected response body: {e}"))
        } else if let Some(status) = e.status() {
            Self::status(status.as_u16(), e.to_string())
        } else {
            Self::network(format!("Network error: {e}"))
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Connection refused, reset, DNS failure
    Network,
    /// The configured request timeout elapsed
    Timeout,
    /// 4xx from the engine (e.g. unknown session)
    ClientError(u16),
    /// 5xx from the engine
    ServerError(u16),
    /// Body was not the expected JSON shape
    Decode,
}
