use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::ApiGatewayProxyRequest;
use lambda_runtime::{service_fn, tracing, Error, LambdaEvent};
use metrics_emf::Metrics;
use model::env::HandlerConfig;
use std::sync::Arc;
use store_dynamodb::DynamoDbItemStore;
use table_crud::CrudHandler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config: HandlerConfig = HandlerConfig::from_env();

    let dynamodb_client: aws_sdk_dynamodb::Client = aws_sdk_dynamodb::Client::new(
        &aws_config::load_defaults(BehaviorVersion::latest()).await,
    );
    let store: DynamoDbItemStore =
        DynamoDbItemStore::new(dynamodb_client, config.table_name.clone());
    let metrics: Metrics = Metrics::new(&config.metrics_namespace, &config.service_name);

    tracing::info!(table = %config.table_name, "Starting table handler");

    let handler: CrudHandler = CrudHandler::new(Arc::new(store), metrics, config);

    lambda_runtime::run(service_fn(
        |event: LambdaEvent<ApiGatewayProxyRequest>| handler.handle(event),
    ))
    .await
}
