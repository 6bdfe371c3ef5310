use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics collector for the service.
///
/// Thread-safe and cheap to clone; shared across handlers and services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    documents_processed: AtomicUsize,
    documents_no_script: AtomicUsize,
    ocr_faults: AtomicUsize,
    translations_ok: AtomicUsize,
    translations_failed: AtomicUsize,
    translation_latency_ms: RwLock<Vec<u64>>,

    // Per-endpoint request counters
    endpoint_counters: DashMap<String, AtomicUsize>,

    start_time: Instant,
}

/// Point-in-time view of the counters, serializable for the stats surface
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub documents_processed: usize,
    pub documents_no_script: usize,
    pub ocr_faults: usize,
    pub translations_ok: usize,
    pub translations_failed: usize,
    pub translation_latency_avg_ms: u64,
    pub requests: HashMap<String, usize>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                documents_processed: AtomicUsize::new(0),
                documents_no_script: AtomicUsize::new(0),
                ocr_faults: AtomicUsize::new(0),
                translations_ok: AtomicUsize::new(0),
                translations_failed: AtomicUsize::new(0),
                translation_latency_ms: RwLock::new(Vec::new()),
                endpoint_counters: DashMap::new(),
                start_time: Instant::now(),
            }),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        self.inner
            .endpoint_counters
            .entry(endpoint.to_string())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_document(&self, no_script: bool) {
        self.inner.documents_processed.fetch_add(1, Ordering::Relaxed);
        if no_script {
            self.inner.documents_no_script.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ocr_fault(&self) {
        self.inner.ocr_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translation(&self, success: bool, duration: Duration) {
        if success {
            self.inner.translations_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.translations_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.inner
            .translation_latency_ms
            .write()
            .push(duration.as_millis() as u64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latencies = self.inner.translation_latency_ms.read();
        let avg = if latencies.is_empty() {
            0
        } else {
            latencies.iter().sum::<u64>() / latencies.len() as u64
        };

        MetricsSnapshot {
            uptime_seconds: self.inner.start_time.elapsed().as_secs(),
            documents_processed: self.inner.documents_processed.load(Ordering::Relaxed),
            documents_no_script: self.inner.documents_no_script.load(Ordering::Relaxed),
            ocr_faults: self.inner.ocr_faults.load(Ordering::Relaxed),
            translations_ok: self.inner.translations_ok.load(Ordering::Relaxed),
            translations_failed: self.inner.translations_failed.load(Ordering::Relaxed),
            translation_latency_avg_ms: avg,
            requests: self
                .inner
                .endpoint_counters
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
                .collect(),
        }
    }

    /// Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();

        out.push_str("# HELP translator_uptime_seconds Service uptime\n");
        out.push_str("# TYPE translator_uptime_seconds gauge\n");
        out.push_str(&format!(
            "translator_uptime_seconds {}\n",
            snapshot.uptime_seconds
        ));

        out.push_str("# HELP translator_documents_total Documents processed\n");
        out.push_str("# TYPE translator_documents_total counter\n");
        out.push_str(&format!(
            "translator_documents_total {}\n",
            snapshot.documents_processed
        ));

        out.push_str("# HELP translator_documents_no_script_total Documents with no Sanskrit detected\n");
        out.push_str("# TYPE translator_documents_no_script_total counter\n");
        out.push_str(&format!(
            "translator_documents_no_script_total {}\n",
            snapshot.documents_no_script
        ));

        out.push_str("# HELP translator_ocr_faults_total OCR engine faults absorbed\n");
        out.push_str("# TYPE translator_ocr_faults_total counter\n");
        out.push_str(&format!("translator_ocr_faults_total {}\n", snapshot.ocr_faults));

        out.push_str("# HELP translator_translations_total Translation calls by status\n");
        out.push_str("# TYPE translator_translations_total counter\n");
        out.push_str(&format!(
            "translator_translations_total{{status=\"ok\"}} {}\n",
            snapshot.translations_ok
        ));
        out.push_str(&format!(
            "translator_translations_total{{status=\"failed\"}} {}\n",
            snapshot.translations_failed
        ));

        out.push_str("# HELP translator_translation_latency_avg_ms Average translation latency\n");
        out.push_str("# TYPE translator_translation_latency_avg_ms gauge\n");
        out.push_str(&format!(
            "translator_translation_latency_avg_ms {}\n",
            snapshot.translation_latency_avg_ms
        ));

        out.push_str("# HELP translator_requests_total HTTP requests by endpoint\n");
        out.push_str("# TYPE translator_requests_total counter\n");
        let mut endpoints: Vec<_> = snapshot.requests.iter().collect();
        endpoints.sort();
        for (endpoint, count) in endpoints {
            out.push_str(&format!(
                "translator_requests_total{{endpoint=\"{endpoint}\"}} {count}\n"
            ));
        }

        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.record_request("/translate");
        metrics.record_request("/translate");
        metrics.record_document(true);
        metrics.record_ocr_fault();
        metrics.record_translation(true, Duration::from_millis(80));
        metrics.record_translation(false, Duration::from_millis(20));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests["/translate"], 2);
        assert_eq!(snapshot.documents_processed, 1);
        assert_eq!(snapshot.documents_no_script, 1);
        assert_eq!(snapshot.ocr_faults, 1);
        assert_eq!(snapshot.translations_ok, 1);
        assert_eq!(snapshot.translations_failed, 1);
        assert_eq!(snapshot.translation_latency_avg_ms, 50);
    }

    #[test]
    fn prometheus_output_contains_counters() {
        let metrics = Metrics::new();
        metrics.record_request("/upload");
        let text = metrics.to_prometheus();
        assert!(text.contains("translator_requests_total{endpoint=\"/upload\"} 1"));
        assert!(text.contains("# TYPE translator_documents_total counter"));
    }
}
