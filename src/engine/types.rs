//! Wire types for the assessment engine

use super::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Conversation vocabulary
// ============================================================================

/// Questioning context the engine is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    #[default]
    Main,
    SymptomSpecific,
}

/// Kind of input the engine expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    Number,
    Options,
    #[serde(alias = "multiselect", alias = "multiple_select")]
    MultiSelect,
    SymptomSearch,
    /// Anything this client does not know how to present specially
    #[serde(other)]
    Other,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Number => "number",
            InputKind::Options => "options",
            InputKind::MultiSelect => "multi_select",
            InputKind::SymptomSearch => "symptom_search",
            InputKind::Other => "other",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expandable help attached to a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoButton {
    pub title: String,
    pub content: String,
}

// ============================================================================
// Report
// ============================================================================

/// Recommended specialist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialist {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Final assessment report
///
/// Only the fields this client reads are typed; everything else the engine
/// sends is kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub report_date: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub possible_conditions: Vec<String>,
    #[serde(default)]
    pub warning_signs: Vec<String>,
    #[serde(default)]
    pub specialists: Vec<Specialist>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Responses
// ============================================================================

/// Engine reply to one turn
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub multiple_select: Option<bool>,
    #[serde(default, rename = "input_type")]
    pub input_kind: Option<InputKind>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default, rename = "current_flow")]
    pub flow: Option<Flow>,
    #[serde(default, rename = "current_symptom")]
    pub active_symptom: Option<String>,
    #[serde(default)]
    pub report: Option<Report>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub info_button: Option<InfoButton>,
    #[serde(default)]
    pub show_start_new: Option<bool>,
}

impl TurnResponse {
    /// Progress as a whole percentage in 0..=100
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped first
    pub fn progress_percent(&self) -> Option<u8> {
        self.progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0).round() as u8)
    }

    /// Non-empty option set, if any
    pub fn offered_options(&self) -> Option<&[String]> {
        self.options.as_deref().filter(|o| !o.is_empty())
    }

    /// Reject replies that carry nothing a turn can act on
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.error.is_some()
            || self.message.is_some()
            || self.report.is_some()
            || self.offered_options().is_some()
        {
            Ok(())
        } else {
            Err(EngineError::decode(
                "Response has no message, options, report or error",
            ))
        }
    }
}

/// Engine reply to a session start
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub turn: TurnResponse,
}

impl StartResponse {
    /// Split into the issued session id and the initial turn
    pub fn into_parts(self) -> Result<(String, TurnResponse), EngineError> {
        let session_id = self
            .session_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| EngineError::decode("Start response is missing session_id"))?;
        self.turn.validate()?;
        Ok((session_id, self.turn))
    }
}

/// Acknowledgement of a backward step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub new_state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Biological sex as offered by the engine's questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiologicalSex {
    Female,
    Male,
    Intersex,
}

impl FromStr for BiologicalSex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(BiologicalSex::Female),
            "male" | "m" => Ok(BiologicalSex::Male),
            "intersex" | "i" => Ok(BiologicalSex::Intersex),
            other => Err(format!("unknown biological sex: {other}")),
        }
    }
}

/// Request for a one-shot assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAssessRequest {
    pub age: u32,
    pub biological_sex: BiologicalSex,
    pub symptoms: Vec<String>,
}

/// Engine reply to a one-shot assessment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuickAssessResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub report: Option<Report>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomMatch {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Engine reply to a save request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub assessment_id: Option<String>,
}
