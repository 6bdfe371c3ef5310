// Tesseract-backed OCR engine
//
// A fresh Tesseract instance is created per call; instances are not Sync
// and recognition is already the dominant cost.

use std::io::Cursor;

use image::{GrayImage, ImageFormat};
use tesseract::{OcrEngineMode, PageSegMode, Tesseract};

use crate::core::config::OcrConfig;
use crate::core::errors::OcrError;

/// Narrow seam over the external OCR capability: one normalized page image
/// in, raw recognized text out.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;
}

pub struct TesseractEngine {
    language: String,
    tessdata_dir: Option<String>,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let engine = Self {
            language: config.language.clone(),
            tessdata_dir: config.tessdata_dir.clone(),
        };
        // Fail fast at startup if the language data is missing
        engine.init()?;
        Ok(engine)
    }

    fn init(&self) -> Result<Tesseract, OcrError> {
        Tesseract::new_with_oem(
            self.tessdata_dir.as_deref(),
            Some(self.language.as_str()),
            OcrEngineMode::LstmOnly,
        )
        .map_err(|e| OcrError::Initialization(e.to_string()))
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::ImageLoad(format!("failed to encode page image: {e}")))?;

        let mut tess = self.init()?;
        // A scanned page is one uniform block of text, not a sparse layout
        tess.set_page_seg_mode(PageSegMode::PsmSingleBlock);

        let text = tess
            .set_image_from_mem(&png)
            .map_err(|e| OcrError::ImageLoad(e.to_string()))?
            .get_text()
            .map_err(|e| OcrError::Extraction(e.to_string()))?;

        Ok(text)
    }
}
