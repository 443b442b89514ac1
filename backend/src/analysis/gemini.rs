use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::client::{AnalysisError, AnalysisRequest, AnalysisResponse, MultimodalModel};
use crate::config::AppConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn into_text(self) -> Result<String, AnalysisError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AnalysisError::Blocked(reason));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Google Gemini `generateContent` over HTTPS.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: HttpClient,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            model,
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        Self::new(
            config.api_base_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<&str, AnalysisError> {
        self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)
    }

    /// The key travels in the `x-goog-api-key` header, never in the URL.
    pub fn generate_content_url(&self) -> Result<Url, AnalysisError> {
        Ok(Url::parse(&format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        ))?)
    }

    fn list_models_url(&self) -> Result<Url, AnalysisError> {
        Ok(Url::parse(&format!(
            "{}/v1beta/models",
            self.base_url.trim_end_matches('/')
        ))?)
    }

    async fn send_parts(&self, parts: Vec<Part<'_>>) -> Result<String, AnalysisError> {
        let api_key = self.api_key()?;
        let url = self.generate_content_url()?;
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        log::debug!("Sending generateContent request to model {}", self.model);
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|envelope| envelope.error.message)
                .unwrap_or(raw);
            return Err(AnalysisError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<GenerateContentResponse>().await?.into_text()
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String, AnalysisError> {
        self.send_parts(vec![Part::Text { text: prompt }]).await
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, AnalysisError> {
        let api_key = self.api_key()?;
        let response = self
            .http_client
            .get(self.list_models_url()?)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Service {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<ListModelsResponse>().await?.models)
    }
}

#[async_trait]
impl MultimodalModel for GeminiClient {
    async fn generate(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
        let parts = vec![
            Part::Text {
                text: request.prompt,
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: &request.original.mime_type,
                    data: &request.original.data,
                },
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: &request.suspected.mime_type,
                    data: &request.suspected.data,
                },
            },
        ];
        let text = self.send_parts(parts).await?;
        Ok(AnalysisResponse { text })
    }
}
