// OCR adapter: fail-soft wrapper around the engine seam
//
// An engine fault must never abort the surrounding request; it degrades to
// "nothing extracted" and only the log tells the difference from a blank
// page. The absorption is visible in the return type.

pub mod engine;

pub use engine::{OcrEngine, TesseractEngine};

use std::sync::Arc;

use image::GrayImage;
use tracing::{debug, warn};

use crate::core::types::Extraction;
use crate::utils::Metrics;

pub struct OcrService {
    engine: Arc<dyn OcrEngine>,
    metrics: Option<Metrics>,
}

impl OcrService {
    pub fn new(engine: Arc<dyn OcrEngine>, metrics: Option<Metrics>) -> Self {
        Self { engine, metrics }
    }

    /// Run the engine on a normalized page. Never fails.
    pub fn extract(&self, image: &GrayImage) -> Extraction {
        match self.engine.recognize(image) {
            Ok(text) => {
                debug!("OCR extracted {} characters", text.chars().count());
                Extraction::Text(text)
            }
            Err(e) => {
                warn!("OCR engine fault absorbed, treating as no text: {e}");
                if let Some(metrics) = &self.metrics {
                    metrics.record_ocr_fault();
                }
                Extraction::Unavailable
            }
        }
    }
}
