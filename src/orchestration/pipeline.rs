// Pipeline orchestrator: composes normalization, OCR, filtering and
// translation into the two request flows.
//
// Both flows are linear, with no retries: validation happens before the
// pipeline runs, OCR faults are absorbed below this layer, and every other
// failure is terminal for its request.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::core::config::Config;
use crate::core::errors::PipelineError;
use crate::core::types::DocumentOutcome;
use crate::services::ocr::{OcrEngine, OcrService, TesseractEngine};
use crate::services::preprocess::Preprocessor;
use crate::services::translation::{OrtSeq2Seq, TranslationModel, TranslationService};
use crate::utils::{decode_and_normalize_async, filter_devanagari, Metrics};

pub struct TranslationPipeline {
    preprocessor: Preprocessor,
    ocr: Arc<OcrService>,
    translator: TranslationService,
    max_new_tokens_document: usize,
    max_new_tokens_text: usize,
    metrics: Option<Metrics>,
}

impl TranslationPipeline {
    /// Assemble the pipeline from injected collaborators. The seams take
    /// trait objects so tests can substitute stub engines and models.
    pub fn new(
        config: &Config,
        engine: Arc<dyn OcrEngine>,
        model: Arc<dyn TranslationModel>,
        metrics: Option<Metrics>,
    ) -> Self {
        Self {
            preprocessor: Preprocessor::new(config.preprocess.clone()),
            ocr: Arc::new(OcrService::new(engine, metrics.clone())),
            translator: TranslationService::new(model, &config.translation, metrics.clone()),
            max_new_tokens_document: config.translation.max_new_tokens_document,
            max_new_tokens_text: config.translation.max_new_tokens_text,
            metrics,
        }
    }

    /// Build the production pipeline: Tesseract engine plus the ORT-backed
    /// model, loaded once before serving begins.
    pub fn from_config(config: &Config, metrics: Option<Metrics>) -> anyhow::Result<Self> {
        info!("initializing OCR engine (language: {})", config.ocr.language);
        let engine = Arc::new(TesseractEngine::new(&config.ocr)?);

        info!("loading translation model from {}", config.translation.model_dir);
        let model = Arc::new(OrtSeq2Seq::load(&config.translation)?);

        Ok(Self::new(config, engine, model, metrics))
    }

    /// Image flow: decode -> normalize -> extract -> filter -> translate,
    /// with an informational early exit when nothing Devanagari survives
    /// filtering. Blank pages are common input, not faults.
    #[instrument(skip(self, bytes), fields(upload_bytes = bytes.len()))]
    pub async fn process_document(&self, bytes: Vec<u8>) -> Result<DocumentOutcome, PipelineError> {
        let normalized = decode_and_normalize_async(self.preprocessor.clone(), bytes)
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))??;

        let ocr = Arc::clone(&self.ocr);
        let extraction = tokio::task::spawn_blocking(move || ocr.extract(&normalized))
            .await
            .map_err(|e| PipelineError::TaskJoin(e.to_string()))?;

        let filtered = filter_devanagari(extraction.text());
        if filtered.trim().is_empty() {
            if let Some(metrics) = &self.metrics {
                metrics.record_document(true);
            }
            return Ok(DocumentOutcome::NoScriptDetected);
        }

        let translation = self
            .translator
            .translate(&filtered, self.max_new_tokens_document)
            .await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_document(false);
        }

        Ok(DocumentOutcome::Translated {
            text: filtered,
            translation,
        })
    }

    /// Direct-text flow: filter -> translate. Callers reject empty raw text
    /// before this runs; text that filters down to nothing still goes to
    /// the model.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn process_text(&self, text: &str) -> Result<String, PipelineError> {
        let filtered = filter_devanagari(text);
        let translation = self
            .translator
            .translate(&filtered, self.max_new_tokens_text)
            .await?;
        Ok(translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{OcrError, TranslationError};
    use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    struct FixedEngine(&'static str);

    impl OcrEngine for FixedEngine {
        fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    struct FaultyEngine;

    impl OcrEngine for FaultyEngine {
        fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Err(OcrError::Extraction("engine crashed".to_string()))
        }
    }

    struct EchoModel;

    impl TranslationModel for EchoModel {
        fn generate(
            &self,
            text: &str,
            _max_input_tokens: usize,
            _max_new_tokens: usize,
        ) -> Result<String, TranslationError> {
            Ok(format!("english({text})"))
        }
    }

    struct FailingModel;

    impl TranslationModel for FailingModel {
        fn generate(&self, _: &str, _: usize, _: usize) -> Result<String, TranslationError> {
            Err(TranslationError::Generation("model exploded".to_string()))
        }
    }

    fn test_config() -> Config {
        Config::new().expect("default config")
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([250, 250, 250])));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
        png
    }

    fn pipeline(
        engine: Arc<dyn OcrEngine>,
        model: Arc<dyn TranslationModel>,
    ) -> TranslationPipeline {
        TranslationPipeline::new(&test_config(), engine, model, None)
    }

    #[tokio::test]
    async fn document_flow_filters_before_translating() {
        let p = pipeline(Arc::new(FixedEngine("धर्मः abc 42")), Arc::new(EchoModel));
        let outcome = p.process_document(png_bytes()).await.unwrap();
        assert_eq!(
            outcome,
            DocumentOutcome::Translated {
                text: "धर्मः  ".to_string(),
                translation: "english(धर्मः  )".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn document_with_no_devanagari_exits_early() {
        let p = pipeline(Arc::new(FixedEngine("lorem ipsum 123")), Arc::new(EchoModel));
        let outcome = p.process_document(png_bytes()).await.unwrap();
        assert_eq!(outcome, DocumentOutcome::NoScriptDetected);
    }

    #[tokio::test]
    async fn ocr_fault_reads_as_nothing_detected_not_an_error() {
        let p = pipeline(Arc::new(FaultyEngine), Arc::new(EchoModel));
        let outcome = p.process_document(png_bytes()).await.unwrap();
        assert_eq!(outcome, DocumentOutcome::NoScriptDetected);
    }

    #[tokio::test]
    async fn translation_fault_propagates_from_document_flow() {
        let p = pipeline(Arc::new(FixedEngine("धर्मः")), Arc::new(FailingModel));
        let err = p.process_document(png_bytes()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Translation(_)));
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_with_image_read_error() {
        let p = pipeline(Arc::new(FixedEngine("धर्मः")), Arc::new(EchoModel));
        let err = p.process_document(b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageRead(_)));
    }

    #[tokio::test]
    async fn text_flow_filters_then_translates() {
        let p = pipeline(Arc::new(FixedEngine("")), Arc::new(EchoModel));
        let translation = p.process_text("धर्मक्षेत्रे x कुरुक्षेत्रे").await.unwrap();
        assert_eq!(translation, "english(धर्मक्षेत्रे  कुरुक्षेत्रे)");
    }
}
