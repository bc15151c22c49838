//! A simple in-memory metrics recorder for testing.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Sums counter increments per metric name and `outcome` label, and keeps
/// every histogram sample.
#[derive(Debug, Clone, Default)]
pub struct TestMetrics {
    counters: Arc<Mutex<HashMap<String, u64>>>,
    histograms: Arc<Mutex<HashMap<String, Vec<f64>>>>,
}

impl TestMetrics {
    pub fn new() -> Self {
        Default::default()
    }

    /// Total of counter `name`, across all label values.
    pub fn get_counter(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.as_str() == name || key.starts_with(&format!("{}{{", name)))
            .map(|(_, value)| *value)
            .sum()
    }

    /// Value of counter `name` with `outcome` label `outcome`.
    pub fn get_outcome(&self, name: &str, outcome: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(&format!("{}{{outcome={}}}", name, outcome))
            .cloned()
            .unwrap_or(0)
    }

    /// All samples recorded into histogram `name`.
    pub fn get_histogram(&self, name: &str) -> Vec<f64> {
        self.histograms
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

impl Recorder for TestMetrics {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}
    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        let name = match key.labels().find(|label| label.key() == "outcome") {
            Some(label) => format!("{}{{outcome={}}}", key.name(), label.value()),
            None => key.name().to_string(),
        };
        Counter::from_arc(Arc::new(MetricCounter {
            name,
            counters: self.counters.clone(),
        }))
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        // Not implemented for this test helper
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::from_arc(Arc::new(MetricHistogram {
            name: key.name().to_string(),
            histograms: self.histograms.clone(),
        }))
    }
}

#[derive(Debug)]
struct MetricCounter {
    name: String,
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl metrics::CounterFn for MetricCounter {
    fn increment(&self, value: u64) {
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(self.name.clone()).or_insert(0) += value;
    }

    fn absolute(&self, value: u64) {
        let mut counters = self.counters.lock().unwrap();
        counters.insert(self.name.clone(), value);
    }
}

#[derive(Debug)]
struct MetricHistogram {
    name: String,
    histograms: Arc<Mutex<HashMap<String, Vec<f64>>>>,
}

impl metrics::HistogramFn for MetricHistogram {
    fn record(&self, value: f64) {
        let mut histograms = self.histograms.lock().unwrap();
        histograms.entry(self.name.clone()).or_default().push(value);
    }
}
