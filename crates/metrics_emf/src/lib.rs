//! Counters published in the CloudWatch Embedded Metric Format.
//!
//! Metrics are buffered during an invocation and written as a single EMF document
//! when the invocation's [`MetricsScope`] is dropped. CloudWatch extracts them from the
//! function's log stream, so the default sink simply prints to stdout.
//!
//! https://docs.aws.amazon.com/AmazonCloudWatch/latest/monitoring/CloudWatch_Embedded_Metric_Format_Specification.html

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

mod document;

pub use document::{EmfDocument, EmfMetadata, MetricDefinition, MetricDirective};

pub const COLD_START_METRIC: &str = "ColdStart";
const SERVICE_DIMENSION: &str = "service";
const FUNCTION_NAME_DIMENSION: &str = "function_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    Count,
}

/// Destination for completed metric documents.
pub trait MetricsSink: Send + Sync {
    fn publish(&self, document: &EmfDocument);
}

/// Writes each document as a single line on stdout, where the Lambda log agent picks it up.
pub struct StdoutSink;

impl MetricsSink for StdoutSink {
    fn publish(&self, document: &EmfDocument) {
        match serde_json::to_string(document) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!("Failed to serialize metrics: {err}"),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingMetric {
    unit: MetricUnit,
    values: Vec<f64>,
}

pub struct Metrics {
    namespace: String,
    service: String,
    sink: Arc<dyn MetricsSink>,
    pending: Mutex<BTreeMap<String, PendingMetric>>,
    // Cleared by the first invocation of this runtime instance
    cold_start: AtomicBool,
}

impl Metrics {
    /// Metrics written to stdout.
    pub fn new(namespace: &str, service: &str) -> Self {
        Self::with_sink(namespace, service, Arc::new(StdoutSink))
    }

    pub fn with_sink(namespace: &str, service: &str, sink: Arc<dyn MetricsSink>) -> Self {
        Metrics {
            namespace: namespace.to_string(),
            service: service.to_string(),
            sink,
            pending: Mutex::new(BTreeMap::new()),
            cold_start: AtomicBool::new(true),
        }
    }

    /// Record a value, published on the next flush.
    /// Repeated values for the same metric are published together.
    pub fn add_metric(&self, name: &str, unit: MetricUnit, value: f64) {
        let Ok(mut pending) = self.pending.lock() else {
            tracing::warn!(metric = name, "Metrics buffer poisoned, dropping value");
            return;
        };

        pending
            .entry(name.to_string())
            .or_insert_with(|| PendingMetric {
                unit,
                values: Vec::new(),
            })
            .values
            .push(value);
    }

    /// Shorthand for adding a count of one.
    pub fn increment(&self, name: &str) {
        self.add_metric(name, MetricUnit::Count, 1.0);
    }

    /// Publish the `ColdStart` metric if this is the first invocation of the instance.
    /// It goes out in its own document, dimensioned by function name.
    pub fn capture_cold_start(&self, function_name: &str) {
        if !self.cold_start.swap(false, Ordering::SeqCst) {
            return;
        }

        let mut dimensions: BTreeMap<String, String> = BTreeMap::new();
        dimensions.insert(FUNCTION_NAME_DIMENSION.to_string(), function_name.to_string());
        dimensions.insert(SERVICE_DIMENSION.to_string(), self.service.clone());

        let metrics: BTreeMap<String, PendingMetric> = BTreeMap::from([(
            COLD_START_METRIC.to_string(),
            PendingMetric {
                unit: MetricUnit::Count,
                values: vec![1.0],
            },
        )]);

        self.sink.publish(&self.document(dimensions, metrics));
    }

    /// Publish everything recorded since the last flush.
    /// Nothing is written when no metric was recorded.
    pub fn flush(&self) {
        let metrics: BTreeMap<String, PendingMetric> = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };

        if metrics.is_empty() {
            tracing::debug!("No metrics to publish");
            return;
        }

        let dimensions: BTreeMap<String, String> =
            BTreeMap::from([(SERVICE_DIMENSION.to_string(), self.service.clone())]);

        self.sink.publish(&self.document(dimensions, metrics));
    }

    /// Start an invocation: captures the cold start and flushes when the scope is dropped.
    pub fn scope(&self, function_name: &str) -> MetricsScope<'_> {
        self.capture_cold_start(function_name);

        MetricsScope { metrics: self }
    }

    fn document(
        &self,
        dimensions: BTreeMap<String, String>,
        metrics: BTreeMap<String, PendingMetric>,
    ) -> EmfDocument {
        let mut values: Map<String, Value> = Map::new();

        for (name, value) in dimensions.iter() {
            values.insert(name.clone(), Value::String(value.clone()));
        }

        let definitions: Vec<MetricDefinition> = metrics
            .iter()
            .map(|(name, metric)| MetricDefinition {
                name: name.clone(),
                unit: metric.unit,
            })
            .collect();

        for (name, metric) in metrics {
            let value: Value = match metric.values.as_slice() {
                [single] => Value::from(*single),
                many => Value::from(many.to_vec()),
            };
            values.insert(name, value);
        }

        EmfDocument {
            aws: EmfMetadata {
                timestamp: now_millis(),
                cloud_watch_metrics: vec![MetricDirective {
                    namespace: self.namespace.clone(),
                    dimensions: vec![dimensions.into_keys().collect()],
                    metrics: definitions,
                }],
            },
            values,
        }
    }
}

/// Flushes the owning [`Metrics`] when dropped, on every exit path of an invocation.
pub struct MetricsScope<'a> {
    metrics: &'a Metrics,
}

impl Drop for MetricsScope<'_> {
    fn drop(&mut self) {
        self.metrics.flush();
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Collect(Mutex<Vec<EmfDocument>>);

    impl MetricsSink for Collect {
        fn publish(&self, document: &EmfDocument) {
            self.0.lock().unwrap().push(document.clone());
        }
    }

    fn metrics() -> (Metrics, Arc<Collect>) {
        let sink: Arc<Collect> = Arc::new(Collect::default());
        (Metrics::with_sink("ns", "svc", sink.clone()), sink)
    }

    #[test]
    fn flush_publishes_one_document_with_service_dimension() {
        let (metrics, sink) = metrics();

        metrics.increment("GetItemOperations");
        metrics.flush();

        let documents: Vec<EmfDocument> = sink.0.lock().unwrap().clone();
        assert_eq!(1, documents.len());

        let value: Value = serde_json::to_value(&documents[0]).unwrap();
        assert_eq!(json!("svc"), value["service"]);
        assert_eq!(json!(1.0), value["GetItemOperations"]);
        assert_eq!(json!("ns"), value["_aws"]["CloudWatchMetrics"][0]["Namespace"]);
        assert_eq!(json!([["service"]]), value["_aws"]["CloudWatchMetrics"][0]["Dimensions"]);
        assert_eq!(
            json!([{"Name": "GetItemOperations", "Unit": "Count"}]),
            value["_aws"]["CloudWatchMetrics"][0]["Metrics"]
        );
    }

    #[test]
    fn repeated_values_are_published_together() {
        let (metrics, sink) = metrics();

        metrics.increment("FailedOperations");
        metrics.add_metric("FailedOperations", MetricUnit::Count, 2.0);
        metrics.flush();

        let documents: Vec<EmfDocument> = sink.0.lock().unwrap().clone();
        assert_eq!(vec![1.0, 2.0], documents[0].values("FailedOperations"));
    }

    #[test]
    fn flush_without_metrics_publishes_nothing() {
        let (metrics, sink) = metrics();

        metrics.flush();

        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn cold_start_is_captured_once() {
        let (metrics, sink) = metrics();

        drop(metrics.scope("fn"));
        drop(metrics.scope("fn"));

        let documents: Vec<EmfDocument> = sink.0.lock().unwrap().clone();
        assert_eq!(1, documents.len());
        assert_eq!(vec![1.0], documents[0].values(COLD_START_METRIC));
        assert_eq!(Some("fn"), documents[0].dimension("function_name"));
    }

    #[test]
    fn scope_flushes_on_drop() {
        let (metrics, sink) = metrics();

        {
            let _scope: MetricsScope = metrics.scope("fn");
            metrics.increment("HelloWorldInvocations");
        }

        let documents: Vec<EmfDocument> = sink.0.lock().unwrap().clone();
        // Cold start, then the invocation's own document
        assert_eq!(2, documents.len());
        assert_eq!(vec![1.0], documents[1].values("HelloWorldInvocations"));
    }
}
