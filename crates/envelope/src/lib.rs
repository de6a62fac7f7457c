use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use model::{ApiError, ResponseBody, ResponseEnvelope};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Request header which, when set to a valid status code, replaces the status of the response.
pub const STATUS_CODE_HEADER: &str = "x-coe-obs-status-code";

/// Tag value attached to the log of every built response.
pub const LAMBDA_RESULT_TAG: &str = "lambda_result";

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Coe-Obs-Status-Code";
pub const ALLOW_METHODS: &str = "GET,POST,OPTIONS";

pub fn cors_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), ALLOW_ORIGIN.to_string()),
        ("Access-Control-Allow-Headers".to_string(), ALLOW_HEADERS.to_string()),
        ("Access-Control-Allow-Methods".to_string(), ALLOW_METHODS.to_string()),
    ])
}

/// The status requested through [`STATUS_CODE_HEADER`], if any.
/// A value which isn't a valid status code is logged and ignored.
pub fn status_override(headers: &HeaderMap) -> Option<StatusCode> {
    let raw = headers.get(STATUS_CODE_HEADER)?;

    let status: Option<StatusCode> = raw
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok());

    if status.is_none() {
        tracing::warn!(header = STATUS_CODE_HEADER, value = ?raw, "Invalid status code header value");
    }

    status
}

/// Build the standard envelope for a response.
///
/// The status is replaced by the override header when the request carries a valid one,
/// and the final status is returned alongside the envelope.
/// A `response` which isn't a JSON object is wrapped as `{"message": response}`.
pub fn build_response(
    event: &ApiGatewayProxyRequest,
    status: StatusCode,
    request: Value,
    response: Value,
) -> (ResponseEnvelope, StatusCode) {
    let status: StatusCode = status_override(&event.headers).unwrap_or(status);

    let envelope: ResponseEnvelope = ResponseEnvelope {
        status_code: status.as_u16(),
        headers: cors_headers(),
        body: ResponseBody::new(request, response),
    };

    log_query(LAMBDA_RESULT_TAG, &envelope);

    (envelope, status)
}

/// Envelope for a failed operation, status and payloads taken from the error.
pub fn error_response(event: &ApiGatewayProxyRequest, err: &ApiError) -> (ResponseEnvelope, StatusCode) {
    build_response(
        event,
        err.status_code(),
        err.request_payload(),
        Value::String(err.message()),
    )
}

/// Log a payload at info level tagged with `log_query = value`.
/// The tag only applies to this entry, it is removed when the span guard drops.
pub fn log_query<T: Serialize + ?Sized>(value: &str, payload: &T) {
    let span = tracing::info_span!("log_query", log_query = value);
    let _tag = span.enter();

    match serde_json::to_string(payload) {
        Ok(json) => tracing::info!(payload = %json, "{value}"),
        Err(err) => tracing::warn!("Failed to serialize log payload: {err}"),
    }
}

/// Proxy integration response for an envelope.
/// The envelope becomes the JSON text body, `status` and the envelope headers go on the response itself.
pub fn proxy_response(
    envelope: &ResponseEnvelope,
    status: StatusCode,
) -> Result<ApiGatewayProxyResponse, serde_json::Error> {
    let body: String = serde_json::to_string(envelope)?;

    let mut headers: HeaderMap = HeaderMap::new();
    for (name, value) in &envelope.headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid response header"),
        }
    }
    headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(ApiGatewayProxyResponse {
        status_code: i64::from(status.as_u16()),
        headers,
        multi_value_headers: HeaderMap::new(),
        body: Some(Body::Text(body)),
        is_base64_encoded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_utils::{ApiRequest, CapturedEvent, LogCapture};

    fn request_with_override(value: &str) -> ApiGatewayProxyRequest {
        ApiRequest::get("/test/1")
            .header(STATUS_CODE_HEADER, value)
            .build()
    }

    #[test]
    fn envelope_carries_status_and_cors_headers() {
        let event: ApiGatewayProxyRequest = ApiRequest::get("/test/1").build();

        let (envelope, status) =
            build_response(&event, StatusCode::OK, json!({"id": "1"}), json!({"Id": "1"}));

        assert_eq!(StatusCode::OK, status);
        assert_eq!(200, envelope.status_code);
        assert_eq!(Some(&"*".to_string()), envelope.headers.get("Access-Control-Allow-Origin"));
        assert_eq!(Some(&ALLOW_METHODS.to_string()), envelope.headers.get("Access-Control-Allow-Methods"));
        assert_eq!(Some(&ALLOW_HEADERS.to_string()), envelope.headers.get("Access-Control-Allow-Headers"));
        assert_eq!(json!({"id": "1"}), envelope.body.request);
    }

    #[test]
    fn override_header_replaces_status() {
        let event: ApiGatewayProxyRequest = request_with_override("503");

        let (envelope, status) = build_response(&event, StatusCode::OK, Value::Null, json!("ok"));

        assert_eq!(StatusCode::SERVICE_UNAVAILABLE, status);
        assert_eq!(503, envelope.status_code);
    }

    #[test]
    fn override_header_tolerates_whitespace() {
        let event: ApiGatewayProxyRequest = request_with_override(" 418 ");

        assert_eq!(Some(StatusCode::IM_A_TEAPOT), status_override(&event.headers));
    }

    #[test]
    fn malformed_override_is_ignored() {
        for value in ["abc", "", "20x", "-1", "70000", "42"] {
            let event: ApiGatewayProxyRequest = request_with_override(value);

            let (envelope, status) =
                build_response(&event, StatusCode::NOT_FOUND, Value::Null, json!("missing"));

            assert_eq!(StatusCode::NOT_FOUND, status, "value {value:?}");
            assert_eq!(404, envelope.status_code);
            assert_eq!(3, envelope.headers.len());
        }
    }

    #[test]
    fn malformed_override_is_logged_as_warning() {
        let capture: LogCapture = LogCapture::default();
        let event: ApiGatewayProxyRequest = request_with_override("soon");

        capture.run(|| status_override(&event.headers));

        let warnings: Vec<CapturedEvent> = capture
            .events()
            .into_iter()
            .filter(|event| event.level == tracing::Level::WARN)
            .collect();
        assert_eq!(1, warnings.len());
        assert_eq!(Some(STATUS_CODE_HEADER), warnings[0].field("header"));
    }

    #[test]
    fn error_response_uses_error_status_and_message() {
        let event: ApiGatewayProxyRequest = ApiRequest::get("/test/").build();
        let err: ApiError = ApiError::Validation {
            request: json!({"id": ""}),
            message: "Missing required 'id' parameter".to_string(),
        };

        let (envelope, status) = error_response(&event, &err);

        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(Some("Missing required 'id' parameter"), envelope.body.message());
        assert_eq!(json!({"id": ""}), envelope.body.request);
    }

    #[test]
    fn log_tag_is_removed_after_logging() {
        let capture: LogCapture = LogCapture::default();
        let event: ApiGatewayProxyRequest = ApiRequest::get("/test/1").build();

        capture.run(|| {
            build_response(&event, StatusCode::OK, Value::Null, json!("done"));
            tracing::info!("after response");
        });

        let events: Vec<CapturedEvent> = capture.events();
        assert_eq!(2, events.len());

        assert_eq!(Some(LAMBDA_RESULT_TAG), events[0].span_field("log_query"));
        assert_eq!(LAMBDA_RESULT_TAG, events[0].message);
        let payload: Value = serde_json::from_str(events[0].field("payload").unwrap()).unwrap();
        assert_eq!(json!(200), payload["statusCode"]);

        assert_eq!("after response", events[1].message);
        assert_eq!(None, events[1].span_field("log_query"));
    }

    #[test]
    fn proxy_response_carries_envelope_as_json_text() {
        let event: ApiGatewayProxyRequest = request_with_override("503");
        let (envelope, status) =
            build_response(&event, StatusCode::OK, json!({"id": "x"}), json!("ok"));

        let response: ApiGatewayProxyResponse = proxy_response(&envelope, status).unwrap();

        assert_eq!(503, response.status_code);
        assert_eq!(
            Some("*"),
            response
                .headers
                .get("access-control-allow-origin")
                .and_then(|value| value.to_str().ok())
        );

        let Some(Body::Text(text)) = &response.body else {
            panic!("Body should be text, got {:?}", response.body);
        };
        let decoded: ResponseEnvelope = serde_json::from_str(text).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn proxy_response_survives_the_lambda_wire_format() {
        let event: ApiGatewayProxyRequest = ApiRequest::get("/test/x").build();
        let (envelope, status) = build_response(&event, StatusCode::NOT_FOUND, Value::Null, json!("gone"));

        let wire: Value = serde_json::to_value(proxy_response(&envelope, status).unwrap()).unwrap();

        assert!(wire["body"].is_string());
        let decoded: ApiGatewayProxyResponse = serde_json::from_value(wire).unwrap();
        assert_eq!(404, decoded.status_code);
    }
}
