use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use shared::Verdict;
use std::path::Path;
use std::sync::Arc;

use super::extractor::extract;
use super::prompt::COMPARISON_PROMPT;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No API key configured. Set GEMINI_API_KEY or GOOGLE_API_KEY.")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),
    #[error("Model service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("Request blocked by the model service: {0}")]
    Blocked(String),
    #[error("Model returned no text")]
    EmptyResponse,
    #[error("Failed to read image {path}: {source}")]
    ReadImage {
        path: String,
        source: std::io::Error,
    },
    #[error("Unsupported or malformed image: {0}")]
    MalformedImage(String),
}

// Request URLs never reach the error text.
impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Http(e.without_url())
    }
}

/// Base64 image body with its MIME type, as sent inline to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8], label: &str) -> Result<Self, AnalysisError> {
        let format = image::guess_format(bytes)
            .map_err(|e| AnalysisError::MalformedImage(format!("{}: {}", label, e)))?;
        Ok(Self {
            mime_type: format.to_mime_type().to_string(),
            data: STANDARD.encode(bytes),
        })
    }

    pub async fn load(path: &Path) -> Result<Self, AnalysisError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AnalysisError::ReadImage {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_bytes(&bytes, &path.display().to_string())
    }
}

/// One comparison: the fixed instruction plus the reference and suspect images.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub prompt: &'static str,
    pub original: EncodedImage,
    pub suspected: EncodedImage,
}

impl AnalysisRequest {
    pub fn new(original: EncodedImage, suspected: EncodedImage) -> Self {
        Self {
            prompt: COMPARISON_PROMPT,
            original,
            suspected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub text: String,
}

/// The external multimodal model. Production uses `GeminiClient`; tests
/// substitute their own.
#[async_trait]
pub trait MultimodalModel: Send + Sync {
    async fn generate(&self, request: &AnalysisRequest) -> Result<AnalysisResponse, AnalysisError>;
}

#[derive(Clone)]
pub struct AnalysisService {
    model: Arc<dyn MultimodalModel>,
}

impl AnalysisService {
    pub fn new(model: Arc<dyn MultimodalModel>) -> Self {
        Self { model }
    }

    /// Always yields a verdict; failures come back as an error-flagged one.
    pub async fn analyze(&self, original_path: &Path, suspected_path: &Path) -> Verdict {
        match self.try_analyze(original_path, suspected_path).await {
            Ok(verdict) => verdict,
            Err(e) => {
                log::error!("Error analyzing images: {}", e);
                Verdict::failed(e)
            }
        }
    }

    async fn try_analyze(
        &self,
        original_path: &Path,
        suspected_path: &Path,
    ) -> Result<Verdict, AnalysisError> {
        let original = EncodedImage::load(original_path).await?;
        let suspected = EncodedImage::load(suspected_path).await?;
        let request = AnalysisRequest::new(original, suspected);

        let response = self.model.generate(&request).await?;
        let extraction = extract(&response.text);
        log::info!(
            "Analysis complete: deepfake={}, confidence={}",
            extraction.is_deepfake,
            extraction.confidence
        );

        Ok(Verdict::determined(
            extraction.is_deepfake,
            extraction.confidence,
            response.text,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use shared::Confidence;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct CannedModel {
        text: String,
        seen: Mutex<Vec<AnalysisRequest>>,
    }

    #[async_trait]
    impl MultimodalModel for CannedModel {
        async fn generate(
            &self,
            request: &AnalysisRequest,
        ) -> Result<AnalysisResponse, AnalysisError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(AnalysisResponse {
                text: self.text.clone(),
            })
        }
    }

    struct UnreachableModel;

    #[async_trait]
    impl MultimodalModel for UnreachableModel {
        async fn generate(&self, _: &AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
            Err(AnalysisError::Service {
                status: 503,
                message: "network unreachable".into(),
            })
        }
    }

    fn image_pair() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("analysis-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let original = dir.join("original_a.png");
        let suspected = dir.join("suspected_b.jpg");
        RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])).save(&original).unwrap();
        RgbImage::from_pixel(8, 8, Rgb([30, 20, 10])).save(&suspected).unwrap();
        (original, suspected)
    }

    #[actix_web::test]
    async fn sends_prompt_and_both_images_in_order() {
        let model = Arc::new(CannedModel {
            text: "Yes, this is manipulated. High confidence.".into(),
            seen: Mutex::new(Vec::new()),
        });
        let service = AnalysisService::new(model.clone());
        let (original, suspected) = image_pair();

        let verdict = service.analyze(&original, &suspected).await;

        assert_eq!(verdict.is_deepfake, Some(true));
        assert_eq!(verdict.confidence, Confidence::High);
        assert_eq!(verdict.rationale, "Yes, this is manipulated. High confidence.");
        assert!(verdict.error.is_none());

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prompt, COMPARISON_PROMPT);
        assert_eq!(seen[0].original.mime_type, "image/png");
        assert_eq!(seen[0].suspected.mime_type, "image/jpeg");
    }

    #[actix_web::test]
    async fn service_failure_becomes_error_verdict() {
        let service = AnalysisService::new(Arc::new(UnreachableModel));
        let (original, suspected) = image_pair();

        let verdict = service.analyze(&original, &suspected).await;

        assert_eq!(verdict.is_deepfake, None);
        assert_eq!(verdict.confidence, Confidence::Medium);
        assert!(verdict.error.as_deref().unwrap().contains("network unreachable"));
    }

    #[actix_web::test]
    async fn malformed_image_never_reaches_the_model() {
        let model = Arc::new(CannedModel {
            text: "unused".into(),
            seen: Mutex::new(Vec::new()),
        });
        let service = AnalysisService::new(model.clone());
        let (original, _) = image_pair();
        let bogus = original.with_file_name("suspected_bogus.png");
        std::fs::write(&bogus, b"plain text, not pixels").unwrap();

        let verdict = service.analyze(&original, &bogus).await;

        assert!(verdict.is_error());
        assert_eq!(verdict.confidence, Confidence::Medium);
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn missing_file_becomes_error_verdict() {
        let service = AnalysisService::new(Arc::new(UnreachableModel));
        let verdict = service
            .analyze(Path::new("/no/such/original.png"), Path::new("/no/such/suspected.png"))
            .await;
        assert!(verdict.error.unwrap().contains("/no/such/original.png"));
    }
}
