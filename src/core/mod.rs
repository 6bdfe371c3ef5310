pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items for convenience
pub use config::Config;
pub use errors::{ConfigError, ImageReadError, OcrError, PipelineError, TranslationError};
pub use types::{DocumentOutcome, ErrorResponse, Extraction, TranslateRequest, UploadResponse};
