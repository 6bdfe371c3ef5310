// Library exports for the Sanskrit document translation workflow

// Core modules
pub mod core;
pub mod orchestration;
pub mod server;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use crate::core::{
    config::Config,
    errors::{ConfigError, ImageReadError, OcrError, PipelineError, TranslationError},
    types::{DocumentOutcome, Extraction, TranslateRequest, UploadResponse},
};

pub use orchestration::TranslationPipeline;

pub use server::{router, AppState};

pub use services::{
    OcrEngine, OcrService, OrtSeq2Seq, Preprocessor, TesseractEngine, TranslationModel,
    TranslationService,
};

pub use utils::{filter_devanagari, Metrics};
