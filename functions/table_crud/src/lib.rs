use crate::operations::Outcome;
use crate::router::Route;
use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use envelope::{build_response, error_response, proxy_response};
use http::{Method, StatusCode};
use lambda_runtime::{Context, LambdaEvent};
use metrics_emf::{Metrics, MetricsScope};
use model::env::HandlerConfig;
use model::{ApiError, Error, ResponseEnvelope};
use serde_json::{json, Value};
use std::sync::Arc;
use store::ItemStore;
use tracing::{Instrument, Span};

pub mod operations;
pub mod router;

pub const GET_ITEM_METRIC: &str = "GetItemOperations";
pub const PUT_ITEM_METRIC: &str = "PutItemOperations";
pub const FAILED_OPERATIONS_METRIC: &str = "FailedOperations";

/// Handles API Gateway requests against the items table.
pub struct CrudHandler {
    store: Arc<dyn ItemStore>,
    metrics: Metrics,
    config: HandlerConfig,
}

impl CrudHandler {
    pub fn new(store: Arc<dyn ItemStore>, metrics: Metrics, config: HandlerConfig) -> Self {
        CrudHandler {
            store,
            metrics,
            config,
        }
    }

    /// Entry point for `lambda_runtime::run`.
    /// Every failure is turned into an envelope, which is sent as the body of the proxy response.
    pub async fn handle(
        &self,
        event: LambdaEvent<ApiGatewayProxyRequest>,
    ) -> Result<ApiGatewayProxyResponse, Error> {
        let (request, context): (ApiGatewayProxyRequest, Context) = event.into_parts();

        // Flushes metrics however the invocation ends
        let _metrics: MetricsScope = self.metrics.scope(&context.env_config.function_name);

        let correlation_id: &str = request
            .request_context
            .request_id
            .as_deref()
            .unwrap_or(context.request_id.as_str());

        let request_span: Span = tracing::info_span!(
            "request",
            service = %self.config.service_name,
            http_method = %request.http_method,
            correlation_id,
        );

        let (envelope, status) = self.dispatch(&request).instrument(request_span).await;

        Ok(proxy_response(&envelope, status)?)
    }

    /// Route a request and build its envelope, returning the final status alongside it.
    pub async fn dispatch(&self, event: &ApiGatewayProxyRequest) -> (ResponseEnvelope, StatusCode) {
        if event.http_method != Method::GET && event.http_method != Method::POST {
            let request: Value = serde_json::to_value(event).unwrap_or_default();
            return error_response(event, &ApiError::MethodNotAllowed { request });
        }

        let path: &str = event.path.as_deref().unwrap_or_default();

        let Some(route) = Route::resolve(&event.http_method, path, &event.path_parameters) else {
            tracing::info!(path, "No route for request");
            return error_response(event, &ApiError::RouteNotFound { request: json!({ "path": path }) });
        };

        tracing::debug!(topic = route.operation(), event = ?event, "Handling request");

        let result: Result<Outcome, ApiError> = match &route {
            Route::GetItem(id) => operations::get_item(self.store.as_ref(), &self.metrics, id).await,
            Route::PutItem => {
                operations::put_item(self.store.as_ref(), &self.metrics, event.body.as_deref()).await
            }
        };

        match result {
            Ok(outcome) => build_response(event, outcome.status, outcome.request, outcome.response),
            Err(err) => self.respond_with_error(event, err),
        }
    }

    fn respond_with_error(
        &self,
        event: &ApiGatewayProxyRequest,
        err: ApiError,
    ) -> (ResponseEnvelope, StatusCode) {
        if let ApiError::Unexpected { operation, error } = &err {
            tracing::error!(operation, error = %error, event = ?event, "Operation failed");
            self.metrics.increment(FAILED_OPERATIONS_METRIC);
        }

        error_response(event, &err)
    }
}
