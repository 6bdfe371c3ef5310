// Wire and pipeline types for the translation workflow

use serde::{Deserialize, Serialize};

/// Raw text coming back from the OCR adapter.
///
/// Engine faults are recovered inside the adapter and show up here as
/// `Unavailable`, which the pipeline treats the same as empty text. The
/// absorption is deliberate: a blank page and a misbehaving engine both mean
/// "nothing extracted" to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Unavailable,
}

impl Extraction {
    pub fn text(&self) -> &str {
        match self {
            Extraction::Text(s) => s,
            Extraction::Unavailable => "",
        }
    }
}

/// Outcome of the document (image upload) pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Translated { text: String, translation: String },
    /// Filtered text was empty or whitespace-only. Informational, not a
    /// fault: blank regions are a common input.
    NoScriptDetected,
}

/// Request body for POST /translate
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,
}

/// Success body for POST /translate
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translation: String,
}

/// Success body for POST /upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl UploadResponse {
    pub fn translated(text: String, translation: String) -> Self {
        Self {
            message: "Sanskrit text extracted and translated successfully".to_string(),
            text: Some(text),
            translation: Some(translation),
        }
    }

    pub fn no_script_detected() -> Self {
        Self {
            message: "No Sanskrit text detected. Try a clearer image.".to_string(),
            text: None,
            translation: None,
        }
    }
}

/// Error body shared by all endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_script_response_omits_translation_field() {
        let body = serde_json::to_value(UploadResponse::no_script_detected()).unwrap();
        assert!(body.get("translation").is_none());
        assert!(body.get("text").is_none());
        assert_eq!(
            body["message"],
            "No Sanskrit text detected. Try a clearer image."
        );
    }

    #[test]
    fn unavailable_extraction_reads_as_empty() {
        assert_eq!(Extraction::Unavailable.text(), "");
        assert_eq!(Extraction::Text("अ".to_string()).text(), "अ");
    }
}
