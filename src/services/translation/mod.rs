// Translation adapter
//
// Applies the input/output bounds and the cancellation boundary around the
// model seam. Unlike an OCR miss, a translation fault is a real fault and
// propagates to the caller.

pub mod seq2seq;

pub use seq2seq::{OrtSeq2Seq, TranslationModel};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::config::TranslationConfig;
use crate::core::errors::TranslationError;
use crate::utils::Metrics;

pub struct TranslationService {
    model: Arc<dyn TranslationModel>,
    max_input_tokens: usize,
    timeout: Duration,
    metrics: Option<Metrics>,
}

impl TranslationService {
    pub fn new(
        model: Arc<dyn TranslationModel>,
        config: &TranslationConfig,
        metrics: Option<Metrics>,
    ) -> Self {
        Self {
            model,
            max_input_tokens: config.max_input_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            metrics,
        }
    }

    /// Translate `text`, generating at most `max_new_tokens` output tokens.
    ///
    /// The model runs on a blocking thread; a hung generation call is cut
    /// off at the configured timeout instead of pinning a worker forever.
    pub async fn translate(
        &self,
        text: &str,
        max_new_tokens: usize,
    ) -> Result<String, TranslationError> {
        let model = Arc::clone(&self.model);
        let input = text.to_string();
        let max_input_tokens = self.max_input_tokens;

        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || {
            model.generate(&input, max_input_tokens, max_new_tokens)
        });

        let result = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(TranslationError::Timeout(self.timeout.as_secs())),
            Ok(Err(join)) => Err(TranslationError::Generation(format!(
                "translation task failed: {join}"
            ))),
            Ok(Ok(result)) => result,
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_translation(result.is_ok(), started.elapsed());
        }
        debug!(
            "translation finished in {:.0}ms (ok={})",
            started.elapsed().as_secs_f64() * 1000.0,
            result.is_ok()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn config(timeout_secs: u64) -> TranslationConfig {
        TranslationConfig {
            model_dir: "unused".to_string(),
            max_input_tokens: 512,
            max_new_tokens_document: 256,
            max_new_tokens_text: 512,
            timeout_secs,
            intra_threads: 1,
        }
    }

    /// Records the bounds it was invoked with
    struct RecordingModel {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl TranslationModel for RecordingModel {
        fn generate(
            &self,
            text: &str,
            max_input_tokens: usize,
            max_new_tokens: usize,
        ) -> Result<String, TranslationError> {
            self.calls.lock().push((max_input_tokens, max_new_tokens));
            Ok(format!("translated: {text}"))
        }
    }

    struct FailingModel;

    impl TranslationModel for FailingModel {
        fn generate(&self, _: &str, _: usize, _: usize) -> Result<String, TranslationError> {
            Err(TranslationError::Generation("tensor shape mismatch".to_string()))
        }
    }

    struct HangingModel;

    impl TranslationModel for HangingModel {
        fn generate(&self, _: &str, _: usize, _: usize) -> Result<String, TranslationError> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn passes_configured_bounds_to_the_model() {
        let model = Arc::new(RecordingModel {
            calls: Mutex::new(Vec::new()),
        });
        let service = TranslationService::new(model.clone(), &config(30), None);

        let out = service.translate("धर्म", 256).await.unwrap();
        assert_eq!(out, "translated: धर्म");
        assert_eq!(model.calls.lock().as_slice(), &[(512, 256)]);
    }

    #[tokio::test]
    async fn model_faults_propagate() {
        let service = TranslationService::new(Arc::new(FailingModel), &config(30), None);
        let err = service.translate("धर्म", 256).await.unwrap_err();
        assert!(matches!(err, TranslationError::Generation(_)));
    }

    #[tokio::test]
    async fn hung_generation_times_out() {
        let service = TranslationService::new(Arc::new(HangingModel), &config(1), None);
        let err = service.translate("धर्म", 256).await.unwrap_err();
        assert!(matches!(err, TranslationError::Timeout(1)));
    }

    #[tokio::test]
    async fn records_failure_metrics() {
        let metrics = Metrics::new();
        let service =
            TranslationService::new(Arc::new(FailingModel), &config(30), Some(metrics.clone()));
        let _ = service.translate("धर्म", 256).await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.translations_failed, 1);
        assert_eq!(snapshot.translations_ok, 0);
    }
}
