pub mod ocr;
pub mod preprocess;
pub mod translation;

// Re-export commonly used services
pub use ocr::{OcrEngine, OcrService, TesseractEngine};
pub use preprocess::Preprocessor;
pub use translation::{OrtSeq2Seq, TranslationModel, TranslationService};
