use lambda_runtime::{service_fn, tracing, Error, LambdaEvent};
use metrics_emf::Metrics;
use model::env::HandlerConfig;
use sample_analysis::AnalysisHandler;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config: HandlerConfig = HandlerConfig::from_env();
    let metrics: Metrics = Metrics::new(&config.metrics_namespace, &config.service_name);

    let handler: AnalysisHandler = AnalysisHandler::new(metrics, config);

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| handler.handle(event))).await
}
