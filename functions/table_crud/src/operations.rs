use crate::{GET_ITEM_METRIC, PUT_ITEM_METRIC};
use http::StatusCode;
use metrics_emf::Metrics;
use model::record::ID_FIELD;
use model::{ApiError, Record};
use serde_json::{json, Value};
use store::ItemStore;

pub const NAME_FIELD: &str = "Name";

/// A successful operation, ready to be wrapped in an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: StatusCode,
    pub request: Value,
    pub response: Value,
}

/// Fetch a record by identifier.
#[tracing::instrument(skip(store, metrics))]
pub async fn get_item(
    store: &dyn ItemStore,
    metrics: &Metrics,
    id: &str,
) -> Result<Outcome, ApiError> {
    let request: Value = json!({ "id": id });

    if id.is_empty() {
        return Err(ApiError::Validation {
            request,
            message: "Missing required 'id' parameter".to_string(),
        });
    }

    tracing::info!(operation = "get_item", id, "Looking up item");

    let record: Option<Record> =
        store
            .get_item(id)
            .await
            .map_err(|err| ApiError::Unexpected {
                operation: "get_item",
                error: err.into(),
            })?;

    match record {
        Some(record) => {
            metrics.increment(GET_ITEM_METRIC);

            Ok(Outcome {
                status: StatusCode::OK,
                request,
                response: record.into(),
            })
        }
        None => Err(ApiError::NotFound {
            request,
            message: format!("Item with ID {id} not found"),
        }),
    }
}

/// Insert the record carried in a JSON request body.
/// A missing body is treated as an empty object.
#[tracing::instrument(skip_all)]
pub async fn put_item(
    store: &dyn ItemStore,
    metrics: &Metrics,
    body: Option<&str>,
) -> Result<Outcome, ApiError> {
    let raw: &str = body.unwrap_or("{}");

    let payload: Value = serde_json::from_str(raw).map_err(|_| ApiError::MalformedInput {
        request: Value::String(raw.to_string()),
        message: "Invalid JSON in request body".to_string(),
    })?;

    let fields = match payload {
        Value::Object(fields) if fields.contains_key(ID_FIELD) && fields.contains_key(NAME_FIELD) => {
            fields
        }
        other => {
            return Err(ApiError::Validation {
                request: other,
                message: "Invalid request: 'Id' and 'Name' fields are required".to_string(),
            })
        }
    };

    let record: Record = Record::new(fields);
    let id: Value = record.get(ID_FIELD).cloned().unwrap_or_default();

    tracing::info!(operation = "put_item", item = ?record.fields(), "Storing item");

    store
        .put_item(record.clone())
        .await
        .map_err(|err| ApiError::Unexpected {
            operation: "put_item",
            error: err.into(),
        })?;

    metrics.increment(PUT_ITEM_METRIC);

    Ok(Outcome {
        status: StatusCode::ACCEPTED,
        request: record.into(),
        response: json!({ "message": "Item created successfully", "id": id }),
    })
}
