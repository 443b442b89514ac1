use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Confidence band reported alongside a verdict. Derived from phrases in the
/// model's answer, not a calibrated probability.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default, Display, EnumString)]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Verdict {
    /// `None` only when the analysis itself failed.
    pub is_deepfake: Option<bool>,
    pub confidence: Confidence,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl Verdict {
    pub fn determined(is_deepfake: bool, confidence: Confidence, rationale: String) -> Self {
        Self {
            is_deepfake: Some(is_deepfake),
            confidence,
            rationale,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        let error = error.to_string();
        Self {
            is_deepfake: None,
            confidence: Confidence::Medium,
            rationale: format!("Error during analysis: {}", error),
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalysisResults {
    pub verdict: Verdict,
    pub original_file: String,
    pub suspected_file: String,
    /// Base64 image bodies, filled in only when reading results back.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub original_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suspected_image: Option<String>,
}
