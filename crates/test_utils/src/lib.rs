use async_trait::async_trait;
use aws_lambda_events::apigw::ApiGatewayProxyRequest;
use aws_sdk_dynamodb::operation::get_item::GetItemOutput;
use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
use aws_smithy_mocks::{mock, mock_client, Rule, RuleMode};
use http::header::HeaderName;
use http::{HeaderValue, Method};
use lambda_runtime::{Context, LambdaEvent};
use metrics_emf::{EmfDocument, Metrics, MetricsSink};
use model::Record;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use store::StoreErrorReason::BackendFailure;
use store::{ItemStore, StoreError, StoreOperation};

mod logs;

pub use logs::{CapturedEvent, LogCapture};

/// Test table and namespace values
pub const TEST_TABLE: &str = "test_table";
pub const TEST_NAMESPACE: &str = "test_namespace";
pub const TEST_SERVICE: &str = "test_service";

/// Wrap a payload in a Lambda event with a default context
pub fn lambda_event<T>(payload: T) -> LambdaEvent<T> {
    LambdaEvent::new(payload, Context::default())
}

/// Builder for API Gateway proxy requests
pub struct ApiRequest {
    inner: ApiGatewayProxyRequest,
}

impl ApiRequest {
    pub fn new(method: Method, path: &str) -> Self {
        let mut inner: ApiGatewayProxyRequest = ApiGatewayProxyRequest::default();
        inner.http_method = method;
        inner.path = Some(path.to_string());
        inner.request_context.request_id = Some("test-request-id".to_string());

        ApiRequest { inner }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn path_parameter(mut self, name: &str, value: &str) -> Self {
        self.inner
            .path_parameters
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        let value: HeaderValue = HeaderValue::from_str(value).expect("Test header should be valid");
        self.inner
            .headers
            .insert(HeaderName::from_static(name), value);
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.inner.body = Some(body.to_string());
        self
    }

    pub fn json_body(self, body: Value) -> Self {
        let body: String = body.to_string();
        self.body(&body)
    }

    pub fn build(self) -> ApiGatewayProxyRequest {
        self.inner
    }

    pub fn event(self) -> LambdaEvent<ApiGatewayProxyRequest> {
        lambda_event(self.inner)
    }
}

/// Metrics sink keeping every published document in memory
#[derive(Default)]
pub struct RecordingSink {
    documents: Mutex<Vec<EmfDocument>>,
}

impl RecordingSink {
    pub fn documents(&self) -> Vec<EmfDocument> {
        self.documents.lock().unwrap().clone()
    }

    /// Sum of every value published for a metric
    pub fn total(&self, metric: &str) -> f64 {
        self.documents()
            .iter()
            .flat_map(|document| document.values(metric))
            .sum()
    }
}

impl MetricsSink for RecordingSink {
    fn publish(&self, document: &EmfDocument) {
        self.documents.lock().unwrap().push(document.clone());
    }
}

/// Metrics writing into a fresh `RecordingSink`
pub fn recording_metrics() -> (Metrics, Arc<RecordingSink>) {
    let sink: Arc<RecordingSink> = Arc::new(RecordingSink::default());
    let metrics: Metrics = Metrics::with_sink(TEST_NAMESPACE, TEST_SERVICE, sink.clone());

    (metrics, sink)
}

/// A store where every operation fails, for exercising error paths
#[derive(Default)]
pub struct FailingStore {
    calls: Mutex<Vec<StoreOperation>>,
}

impl FailingStore {
    /// Operations attempted against the store
    pub fn calls(&self) -> Vec<StoreOperation> {
        self.calls.lock().unwrap().clone()
    }

    fn fail(&self, key: &str, operation: StoreOperation) -> StoreError {
        self.calls.lock().unwrap().push(operation);

        StoreError::new(
            key.to_string(),
            operation,
            BackendFailure("simulated outage".into()),
        )
    }
}

#[async_trait]
impl ItemStore for FailingStore {
    async fn get_item(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Err(self.fail(id, StoreOperation::GetItem))
    }

    async fn put_item(&self, record: Record) -> Result<(), StoreError> {
        Err(self.fail(record.id().unwrap_or_default(), StoreOperation::PutItem))
    }
}

/// A default mock DynamoDB client which returns empty responses
pub fn create_mock_dynamodb_client() -> aws_sdk_dynamodb::Client {
    let get_item_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item)
        .match_requests(|_| true)
        .sequence()
        .output(|| GetItemOutput::builder().build())
        .repeatedly()
        .build();

    let put_item_rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
        .match_requests(|_| true)
        .sequence()
        .output(|| PutItemOutput::builder().build())
        .repeatedly()
        .build();

    mock_client!(
        aws_sdk_dynamodb,
        RuleMode::MatchAny,
        [&get_item_rule, &put_item_rule]
    )
}
