// Custom error types for the translation workflow
//
// Using thiserror for ergonomic error definitions with:
// - Type-safe error matching at the HTTP boundary
// - Source error chaining

use thiserror::Error;

/// Errors while turning an upload into a normalized binary image
#[derive(Debug, Error)]
pub enum ImageReadError {
    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// OCR engine errors
///
/// These never cross the adapter boundary: `OcrService` absorbs them and
/// degrades to an empty extraction (see `services::ocr`).
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine initialization failed: {0}")]
    Initialization(String),

    #[error("OCR image handoff failed: {0}")]
    ImageLoad(String),

    #[error("OCR extraction failed: {0}")]
    Extraction(String),
}

/// Translation service errors
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("model inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("translation timed out after {0}s")]
    Timeout(u64),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("upscale factor must be between 1 and 4, got {0}")]
    InvalidUpscaleFactor(u32),

    #[error("threshold window must be odd and >= 3, got {0}")]
    InvalidThresholdWindow(u32),

    #[error("invalid translation config: {0}")]
    InvalidTranslationConfig(String),

    #[error("invalid OCR config: {0}")]
    InvalidOcrConfig(String),
}

/// Pipeline orchestration errors
///
/// Everything the orchestrator can surface to a caller. OCR faults are
/// absent on purpose: they are recovered inside the OCR adapter.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image preprocessing failed: {0}")]
    ImageRead(#[from] ImageReadError),

    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("worker task failed: {0}")]
    TaskJoin(String),
}
