use crate::core::errors::ConfigError;
use std::env;
use tracing::Level;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
}

/// Image normalization configuration
///
/// Defaults reproduce the preprocessing pipeline the translation model was
/// tuned against: 2x cubic upscale, 3x3 denoise blur, Gaussian-weighted
/// adaptive threshold over a 31-sample window with bias 15, then a closing
/// with a small square element.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub upscale_factor: u32,
    pub denoise_sigma: f32,
    pub threshold_window: u32,
    pub threshold_bias: i16,
    pub closing_radius: u8,
}

/// OCR engine configuration
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract language code for Devanagari Sanskrit
    pub language: String,
    /// Directory holding the traineddata files; None uses the system default
    pub tessdata_dir: Option<String>,
}

/// Translation model configuration
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Directory with encoder.onnx, decoder.onnx, tokenizer.json, config.json
    pub model_dir: String,
    /// Input ids are truncated to this length before encoding
    pub max_input_tokens: usize,
    /// Generation bound for the document (image upload) path
    pub max_new_tokens_document: usize,
    /// Generation bound for the direct-text path
    pub max_new_tokens_text: usize,
    pub timeout_secs: u64,
    pub intra_threads: usize,
}

/// Upload staging configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub preprocess: PreprocessConfig,
    pub ocr: OcrConfig,
    pub translation: TranslationConfig,
    pub upload: UploadConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env();
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Self {
        let log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "trace" => Some(Level::TRACE),
                "debug" => Some(Level::DEBUG),
                "info" => Some(Level::INFO),
                "warn" | "warning" => Some(Level::WARN),
                "error" => Some(Level::ERROR),
                _ => None,
            })
            .unwrap_or(Level::INFO);

        Self {
            server: ServerConfig {
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                log_level,
            },
            preprocess: PreprocessConfig {
                upscale_factor: env::var("UPSCALE_FACTOR")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
                denoise_sigma: env::var("DENOISE_SIGMA")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.8),
                threshold_window: env::var("THRESHOLD_WINDOW")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(31),
                threshold_bias: env::var("THRESHOLD_BIAS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
                closing_radius: env::var("CLOSING_RADIUS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1),
            },
            ocr: OcrConfig {
                language: env::var("OCR_LANGUAGE").unwrap_or_else(|_| "san".to_string()),
                tessdata_dir: env::var("TESSDATA_DIR")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            },
            translation: TranslationConfig {
                model_dir: env::var("MODEL_DIR").unwrap_or_else(|_| "./custom_model".to_string()),
                max_input_tokens: env::var("MAX_INPUT_TOKENS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(512),
                max_new_tokens_document: env::var("MAX_NEW_TOKENS_DOCUMENT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(256),
                max_new_tokens_text: env::var("MAX_NEW_TOKENS_TEXT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(512),
                timeout_secs: env::var("TRANSLATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
                intra_threads: env::var("INTRA_THREADS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| std::cmp::max(num_cpus::get() / 2, 2)),
            },
            upload: UploadConfig {
                upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=4).contains(&self.preprocess.upscale_factor) {
            return Err(ConfigError::InvalidUpscaleFactor(
                self.preprocess.upscale_factor,
            ));
        }

        if self.preprocess.threshold_window < 3 || self.preprocess.threshold_window % 2 == 0 {
            return Err(ConfigError::InvalidThresholdWindow(
                self.preprocess.threshold_window,
            ));
        }

        if self.ocr.language.is_empty() {
            return Err(ConfigError::InvalidOcrConfig(
                "OCR_LANGUAGE must not be empty".to_string(),
            ));
        }

        if self.translation.max_input_tokens == 0 {
            return Err(ConfigError::InvalidTranslationConfig(
                "MAX_INPUT_TOKENS must be > 0".to_string(),
            ));
        }
        if self.translation.max_new_tokens_document == 0
            || self.translation.max_new_tokens_text == 0
        {
            return Err(ConfigError::InvalidTranslationConfig(
                "generation bounds must be > 0".to_string(),
            ));
        }
        if self.translation.timeout_secs == 0 {
            return Err(ConfigError::InvalidTranslationConfig(
                "TRANSLATION_TIMEOUT_SECS must be > 0".to_string(),
            ));
        }
        if self.translation.intra_threads == 0 {
            return Err(ConfigError::InvalidTranslationConfig(
                "INTRA_THREADS must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn log_level(&self) -> Level {
        self.server.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::load_from_env();
        assert!(config.validate().is_ok());
        assert_eq!(config.preprocess.upscale_factor, 2);
        assert_eq!(config.preprocess.threshold_window, 31);
        assert_eq!(config.ocr.language, "san");
    }

    #[test]
    fn even_threshold_window_rejected() {
        let mut config = Config::load_from_env();
        config.preprocess.threshold_window = 30;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThresholdWindow(30))
        ));
    }

    #[test]
    fn zero_generation_bound_rejected() {
        let mut config = Config::load_from_env();
        config.translation.max_new_tokens_text = 0;
        assert!(config.validate().is_err());
    }
}
