pub mod client;
pub mod extractor;
pub mod gemini;
pub mod prompt;

pub use client::{AnalysisError, AnalysisRequest, AnalysisResponse, AnalysisService, EncodedImage, MultimodalModel};
pub use extractor::{extract, Extraction};
pub use gemini::GeminiClient;
