use crate::analysis::{analyze, project_rows, AnalysisReport};
use crate::dataset::Table;
use http::StatusCode;
use lambda_runtime::{Context, LambdaEvent};
use metrics_emf::{Metrics, MetricsScope};
use model::env::HandlerConfig;
use model::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{Instrument, Span};

pub mod analysis;
pub mod dataset;

pub const INVOCATIONS_METRIC: &str = "HelloWorldInvocations";

pub const SUCCESS_MESSAGE: &str = "Data retrieved successfully!";
pub const FAILURE_MESSAGE: &str = "Data not retrieved!";
pub const NO_DATA: &str = "no_available";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisEnvelope {
    pub status_code: u16,
    pub message: String,
    pub body: AnalysisBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBody {
    pub data: Value,
}

impl AnalysisEnvelope {
    fn success(rows: usize) -> Self {
        AnalysisEnvelope {
            status_code: StatusCode::OK.as_u16(),
            message: SUCCESS_MESSAGE.to_string(),
            body: AnalysisBody { data: Value::from(rows) },
            errors: None,
        }
    }

    fn failure(error: &dyn std::error::Error) -> Self {
        AnalysisEnvelope {
            status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: FAILURE_MESSAGE.to_string(),
            body: AnalysisBody {
                data: Value::from(NO_DATA),
            },
            errors: Some(error.to_string()),
        }
    }
}

/// Summarises the sample employee table on every invocation.
pub struct AnalysisHandler {
    metrics: Metrics,
    config: HandlerConfig,
}

impl AnalysisHandler {
    pub fn new(metrics: Metrics, config: HandlerConfig) -> Self {
        AnalysisHandler { metrics, config }
    }

    /// The incoming event is ignored. Never returns an error.
    pub async fn handle(&self, event: LambdaEvent<Value>) -> Result<AnalysisEnvelope, Error> {
        let (_payload, context): (Value, Context) = event.into_parts();

        let _metrics: MetricsScope = self.metrics.scope(&context.env_config.function_name);

        let request_span: Span = tracing::info_span!(
            "request",
            service = %self.config.service_name,
            correlation_id = %context.request_id,
        );

        let envelope: AnalysisEnvelope = async {
            self.metrics.increment(INVOCATIONS_METRIC);
            self.summarize(&dataset::sample_table())
        }
        .instrument(request_span)
        .await;

        Ok(envelope)
    }

    /// Analyse a table and turn the outcome into an envelope.
    pub fn summarize(&self, table: &Table) -> AnalysisEnvelope {
        let envelope: AnalysisEnvelope = match Self::report(table) {
            Ok(report) => AnalysisEnvelope::success(report.number_of_rows),
            Err(err) => {
                tracing::error!(error = %err, "Error processing data");
                AnalysisEnvelope::failure(err.as_ref())
            }
        };

        tracing::info!(
            status_code = envelope.status_code,
            result = %serde_json::to_string(&envelope).unwrap_or_default(),
            "Lambda execution result"
        );

        envelope
    }

    fn report(table: &Table) -> Result<AnalysisReport, Error> {
        let report: AnalysisReport = analyze(table)?;

        tracing::info!(
            result_details = %serde_json::to_string(&report)?,
            total_rows = report.number_of_rows,
            columns = ?table.columns,
            "Analyzed employee data"
        );

        let projection: BTreeMap<String, Value> = project_rows(table)?;
        tracing::debug!(rows = %serde_json::to_string(&projection)?, "Processed all rows");

        Ok(report)
    }
}
