use crate::MetricUnit;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A log line CloudWatch turns into metrics.
/// Dimension and metric values sit at the top level next to the `_aws` metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmfDocument {
    #[serde(rename = "_aws")]
    pub aws: EmfMetadata,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmfMetadata {
    pub timestamp: u64,
    pub cloud_watch_metrics: Vec<MetricDirective>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDirective {
    pub namespace: String,
    pub dimensions: Vec<Vec<String>>,
    pub metrics: Vec<MetricDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDefinition {
    pub name: String,
    pub unit: MetricUnit,
}

impl EmfDocument {
    /// Values recorded for a metric, empty if the document doesn't define it.
    pub fn values(&self, metric: &str) -> Vec<f64> {
        let defined: bool = self
            .aws
            .cloud_watch_metrics
            .iter()
            .flat_map(|directive| directive.metrics.iter())
            .any(|definition| definition.name == metric);

        if !defined {
            return Vec::new();
        }

        match self.values.get(metric) {
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_f64).collect(),
            Some(value) => value.as_f64().into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }
}
