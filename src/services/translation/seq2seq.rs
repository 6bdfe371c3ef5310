// ORT-backed sequence-to-sequence translation model
//
// Consumes an exported encoder/decoder ONNX pair plus tokenizer.json from
// the model artifact directory. The decoder is re-run over the full prefix
// each step; generation lengths are bounded by the caller, so the simple
// loop stays cheap enough without a KV cache.

use std::cmp::min;
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;
use ort::{session::Session, value::Value};
use parking_lot::Mutex;
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::core::config::TranslationConfig;
use crate::core::errors::TranslationError;

/// Narrow seam over the translation capability: bounded source text in, one
/// best translation out.
pub trait TranslationModel: Send + Sync {
    fn generate(
        &self,
        text: &str,
        max_input_tokens: usize,
        max_new_tokens: usize,
    ) -> Result<String, TranslationError>;
}

/// Generation constants read from the artifact's config.json
#[derive(Debug, Clone, Deserialize)]
struct GenerationSettings {
    decoder_start_token_id: i64,
    eos_token_id: i64,
    #[serde(default)]
    forced_bos_token_id: Option<i64>,
}

pub struct OrtSeq2Seq {
    tokenizer: Tokenizer,
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    settings: GenerationSettings,
}

impl OrtSeq2Seq {
    /// Load tokenizer, sessions and generation settings from the artifact
    /// directory. Called once at startup; the loaded state is read-only
    /// afterwards (sessions are interior-mutable for inference only).
    pub fn load(config: &TranslationConfig) -> Result<Self> {
        let model_dir = Path::new(&config.model_dir);

        let tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer.json: {e}"))?;

        let settings: GenerationSettings = serde_json::from_str(
            &std::fs::read_to_string(model_dir.join("config.json"))
                .context("failed to read model config.json")?,
        )
        .context("model config.json is missing generation settings")?;

        let encoder = Session::builder()?
            .with_intra_threads(config.intra_threads)?
            .commit_from_file(model_dir.join("encoder.onnx"))
            .context("failed to load encoder.onnx")?;

        let decoder = Session::builder()?
            .with_intra_threads(config.intra_threads)?
            .commit_from_file(model_dir.join("decoder.onnx"))
            .context("failed to load decoder.onnx")?;

        info!(
            "translation model loaded from {} (decoder_start={}, eos={})",
            model_dir.display(),
            settings.decoder_start_token_id,
            settings.eos_token_id
        );

        Ok(Self {
            tokenizer,
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            settings,
        })
    }

    /// Encode source text into ids, truncated to the input bound.
    fn encode_input(&self, text: &str, max_input_tokens: usize) -> Result<Vec<i64>, TranslationError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| TranslationError::Tokenize(e.to_string()))?;

        let ids = encoding.get_ids();
        let len = min(ids.len(), max_input_tokens);
        Ok(ids[..len].iter().map(|&id| i64::from(id)).collect())
    }

    /// Run the encoder, returning the flattened hidden states and their shape.
    fn encode_hidden(
        &self,
        input_ids: &[i64],
        attention_mask: &[i64],
    ) -> Result<(Vec<usize>, Vec<f32>), TranslationError> {
        let seq_len = input_ids.len();

        let ids_array = Array2::from_shape_vec((1, seq_len), input_ids.to_vec())
            .map_err(|e| TranslationError::Generation(e.to_string()))?;
        let (ids_flat, _) = ids_array.into_raw_vec_and_offset();
        let ids_value = Value::from_array(([1usize, seq_len], ids_flat))?;
        let mask_value = Value::from_array(([1usize, seq_len], attention_mask.to_vec()))?;

        let mut encoder = self.encoder.lock();
        let outputs = encoder.run(ort::inputs![
            "input_ids" => ids_value,
            "attention_mask" => mask_value
        ])?;

        // Prefer the conventional output name, fall back to the first output
        let (shape, data) = if let Some(output) = outputs.get("last_hidden_state") {
            output.try_extract_tensor::<f32>()?
        } else {
            let first_key = outputs
                .keys()
                .next()
                .ok_or_else(|| TranslationError::Generation("encoder produced no outputs".to_string()))?;
            outputs[first_key].try_extract_tensor::<f32>()?
        };
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        Ok((dims, data.to_vec()))
    }

    /// One decoder step over the whole prefix; returns the argmax of the
    /// final position's logits.
    fn next_token(
        &self,
        prefix: &[i64],
        hidden_dims: &[usize],
        hidden: &[f32],
        attention_mask: &[i64],
    ) -> Result<i64, TranslationError> {
        let prefix_value = Value::from_array(([1usize, prefix.len()], prefix.to_vec()))?;
        let hidden_shape: [usize; 3] = [hidden_dims[0], hidden_dims[1], hidden_dims[2]];
        let hidden_value = Value::from_array((hidden_shape, hidden.to_vec()))?;
        let mask_value =
            Value::from_array(([1usize, attention_mask.len()], attention_mask.to_vec()))?;

        let (dims, logits) = {
            let mut decoder = self.decoder.lock();
            let outputs = decoder.run(ort::inputs![
                "input_ids" => prefix_value,
                "encoder_hidden_states" => hidden_value,
                "encoder_attention_mask" => mask_value
            ])?;

            let (shape, data) = if let Some(output) = outputs.get("logits") {
                output.try_extract_tensor::<f32>()?
            } else {
                let first_key = outputs.keys().next().ok_or_else(|| {
                    TranslationError::Generation("decoder produced no outputs".to_string())
                })?;
                outputs[first_key].try_extract_tensor::<f32>()?
            };
            let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
            (dims, data.to_vec())
        };

        if dims.len() != 3 {
            return Err(TranslationError::Generation(format!(
                "unexpected logits shape: {dims:?}"
            )));
        }

        let vocab_size = dims[2];
        let last = &logits[(dims[1] - 1) * vocab_size..dims[1] * vocab_size];
        let next = last
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx as i64)
            .ok_or_else(|| TranslationError::Generation("empty logits".to_string()))?;

        Ok(next)
    }
}

impl TranslationModel for OrtSeq2Seq {
    fn generate(
        &self,
        text: &str,
        max_input_tokens: usize,
        max_new_tokens: usize,
    ) -> Result<String, TranslationError> {
        let input_ids = self.encode_input(text, max_input_tokens)?;
        if input_ids.is_empty() {
            return Ok(String::new());
        }

        let attention_mask = vec![1i64; input_ids.len()];
        let (hidden_dims, hidden) = self.encode_hidden(&input_ids, &attention_mask)?;

        if hidden_dims.len() != 3 {
            return Err(TranslationError::Generation(format!(
                "unexpected encoder output shape: {hidden_dims:?}"
            )));
        }

        let mut prefix = vec![self.settings.decoder_start_token_id];
        if let Some(bos) = self.settings.forced_bos_token_id {
            prefix.push(bos);
        }
        let prompt_len = prefix.len();

        for _ in 0..max_new_tokens {
            let next = self.next_token(&prefix, &hidden_dims, &hidden, &attention_mask)?;
            if next == self.settings.eos_token_id {
                break;
            }
            prefix.push(next);
        }

        let generated: Vec<u32> = prefix[prompt_len..].iter().map(|&id| id as u32).collect();
        let decoded = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| TranslationError::Generation(e.to_string()))?;

        debug!(
            "generated {} tokens from {} input tokens",
            generated.len(),
            input_ids.len()
        );

        Ok(decoded.trim().to_string())
    }
}
