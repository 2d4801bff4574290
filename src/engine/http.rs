//! HTTP binding of the assessment engine contract

use super::types::*;
use super::{AssessmentEngine, EngineError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

const START_PATH: &str = "/api/assessment/start";
const NEXT_PATH: &str = "/api/assessment/next";
const BACK_PATH: &str = "/api/assessment/back";
const QUICK_PATH: &str = "/api/assessment/quick";
const SAVE_PATH: &str = "/api/assessment/save";
const SEARCH_PATH: &str = "/api/symptoms/search";

/// Engine client speaking JSON over HTTP
pub struct HttpEngine {
    client: Client,
    base_url: String,
}

impl HttpEngine {
    /// `timeout` of `None` leaves exchanges unbounded
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, EngineError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| EngineError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, EngineError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, EngineError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| EngineError::decode(format!("Unexpected response body: {e}")))
    }

    fn classify_error(status: StatusCode, body: &str) -> EngineError {
        // The engine reports failures as {"error": "..."}
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());

        let message = if detail.is_empty() {
            format!("Engine returned {status}")
        } else {
            format!("Engine returned {status}: {detail}")
        };
        EngineError::status(status.as_u16(), message)
    }
}

#[async_trait]
impl AssessmentEngine for HttpEngine {
    async fn start(&self) -> Result<StartResponse, EngineError> {
        self.post(START_PATH, &json!({})).await
    }

    async fn next(&self, session_id: &str, input: &str) -> Result<TurnResponse, EngineError> {
        self.post(
            NEXT_PATH,
            &json!({ "session_id": session_id, "input": input }),
        )
        .await
    }

    async fn go_back(&self, session_id: &str) -> Result<BackAck, EngineError> {
        self.post(BACK_PATH, &json!({ "session_id": session_id }))
            .await
    }

    async fn quick_assess(
        &self,
        request: &QuickAssessRequest,
    ) -> Result<QuickAssessResponse, EngineError> {
        self.post(QUICK_PATH, request).await
    }

    async fn search_symptoms(&self, query: &str) -> Result<Vec<SymptomMatch>, EngineError> {
        let url = Url::parse_with_params(&self.url(SEARCH_PATH), &[("q", query)])
            .map_err(|e| EngineError::network(format!("Invalid engine URL: {e}")))?;
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn save(&self, session_id: &str) -> Result<SaveReceipt, EngineError> {
        self.post(SAVE_PATH, &json!({ "session_id": session_id }))
            .await
    }
}
