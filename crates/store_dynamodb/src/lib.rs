use async_trait::async_trait;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::get_item::{GetItemError, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemError, PutItemOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use model::record::ID_FIELD;
use model::Record;
use std::collections::HashMap;
use store::StoreErrorReason::{BackendFailure, BadRecord};
use store::StoreOperation::{GetItem, PutItem};
use store::{ItemStore, StoreError};

/// Items table backed by DynamoDB, with a string hash key named `Id`.
pub struct DynamoDbItemStore {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl DynamoDbItemStore {
    pub fn new(dynamodb_client: aws_sdk_dynamodb::Client, table_name: String) -> Self {
        DynamoDbItemStore {
            table_name,
            dynamodb_client,
        }
    }

    async fn get(&self, id: &str) -> Result<GetItemOutput, SdkError<GetItemError, HttpResponse>> {
        let key: HashMap<String, AttributeValue> =
            HashMap::from([(ID_FIELD.to_string(), AttributeValue::S(id.to_string()))]);

        self.dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key))
            .send()
            .await
    }

    async fn put(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> Result<PutItemOutput, SdkError<PutItemError, HttpResponse>> {
        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
    }
}

#[async_trait]
impl ItemStore for DynamoDbItemStore {
    async fn get_item(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let output: GetItemOutput = self.get(id).await.map_err(|err| {
            tracing::debug!(table = %self.table_name, "GetItem failed: {}", DisplayErrorContext(&err));
            StoreError::new(id.to_string(), GetItem, BackendFailure(err.into()))
        })?;

        let Some(item) = output.item else {
            return Ok(None);
        };

        let record: Record = serde_dynamo::from_item(item)
            .map_err(|err| StoreError::new(id.to_string(), GetItem, BadRecord(err.to_string())))?;

        Ok(Some(record))
    }

    async fn put_item(&self, record: Record) -> Result<(), StoreError> {
        let Some(key) = record.id().map(str::to_string) else {
            let found: String = record.get(ID_FIELD).map(ToString::to_string).unwrap_or_default();
            return Err(StoreError::new(
                found,
                PutItem,
                BadRecord(format!("'{ID_FIELD}' must be a string")),
            ));
        };

        let item: HashMap<String, AttributeValue> = serde_dynamo::to_item(&record)
            .map_err(|err| StoreError::new(key.clone(), PutItem, BadRecord(err.to_string())))?;

        self.put(item).await.map_err(|err| {
            tracing::debug!(table = %self.table_name, "PutItem failed: {}", DisplayErrorContext(&err));
            StoreError::new(key, PutItem, BackendFailure(err.into()))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::put_item::PutItemInput;
    use aws_sdk_dynamodb::types::error::{ProvisionedThroughputExceededException, ResourceNotFoundException};
    use aws_smithy_mocks::{mock, mock_client, Rule};
    use serde_json::json;
    use store::StoreErrorReason;
    use test_utils::{create_mock_dynamodb_client, TEST_TABLE};

    fn store_with(client: aws_sdk_dynamodb::Client) -> DynamoDbItemStore {
        DynamoDbItemStore::new(client, TEST_TABLE.to_string())
    }

    #[tokio::test]
    async fn get_item_converts_stored_item() {
        let rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item)
            .match_requests(|req| {
                req.table_name() == Some(TEST_TABLE)
                    && req.key().and_then(|key| key.get(ID_FIELD))
                        == Some(&AttributeValue::S("1".to_string()))
            })
            .then_output(|| {
                GetItemOutput::builder()
                    .set_item(Some(HashMap::from([
                        ("Id".to_string(), AttributeValue::S("1".to_string())),
                        ("Name".to_string(), AttributeValue::S("Widget".to_string())),
                    ])))
                    .build()
            });

        let store: DynamoDbItemStore = store_with(mock_client!(aws_sdk_dynamodb, [&rule]));

        let record: Record = store
            .get_item("1")
            .await
            .expect("Lookup should succeed")
            .expect("Record should exist");

        assert_eq!(Some("1"), record.id());
        assert_eq!(Some(&json!("Widget")), record.get("Name"));
    }

    #[tokio::test]
    async fn get_item_without_item_is_none() {
        let store: DynamoDbItemStore = store_with(create_mock_dynamodb_client());

        let found: Option<Record> = store.get_item("missing").await.expect("Lookup should succeed");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn get_item_reports_backend_failure() {
        let rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item).then_error(|| {
            GetItemError::ResourceNotFoundException(
                ResourceNotFoundException::builder()
                    .message("Requested resource not found")
                    .build(),
            )
        });

        let store: DynamoDbItemStore = store_with(mock_client!(aws_sdk_dynamodb, [&rule]));

        let err: StoreError = store.get_item("1").await.expect_err("Lookup should fail");

        assert_eq!(GetItem, err.operation);
        assert_eq!("1", err.key);
        assert!(matches!(err.reason, StoreErrorReason::BackendFailure(_)));
    }

    #[tokio::test]
    async fn put_item_writes_every_field() {
        let rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .match_requests(|req: &PutItemInput| {
                let item = req.item();
                req.table_name() == Some(TEST_TABLE)
                    && item.and_then(|item| item.get("Id")) == Some(&AttributeValue::S("7".to_string()))
                    && item.and_then(|item| item.get("Name")) == Some(&AttributeValue::S("Gear".to_string()))
            })
            .then_output(|| PutItemOutput::builder().build());

        let store: DynamoDbItemStore = store_with(mock_client!(aws_sdk_dynamodb, [&rule]));
        let record: Record = serde_json::from_value(json!({"Id": "7", "Name": "Gear"})).unwrap();

        store.put_item(record).await.expect("Put should succeed");

        assert_eq!(1, rule.num_calls());
    }

    #[tokio::test]
    async fn put_item_reports_backend_failure() {
        let rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item).then_error(|| {
            PutItemError::ProvisionedThroughputExceededException(
                ProvisionedThroughputExceededException::builder()
                    .message("Rate exceeded")
                    .build(),
            )
        });

        let store: DynamoDbItemStore = store_with(mock_client!(aws_sdk_dynamodb, [&rule]));
        let record: Record = serde_json::from_value(json!({"Id": "7", "Name": "Gear"})).unwrap();

        let err: StoreError = store.put_item(record).await.expect_err("Put should fail");

        assert_eq!(PutItem, err.operation);
        assert_eq!("7", err.key);
        assert!(matches!(err.reason, StoreErrorReason::BackendFailure(_)));
        assert_eq!(1, rule.num_calls());
    }

    #[tokio::test]
    async fn put_item_rejects_non_string_id_without_calling_dynamodb() {
        let rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .then_output(|| PutItemOutput::builder().build());

        let store: DynamoDbItemStore = store_with(mock_client!(aws_sdk_dynamodb, [&rule]));
        let record: Record = serde_json::from_value(json!({"Id": 7, "Name": "Gear"})).unwrap();

        let err: StoreError = store.put_item(record).await.expect_err("Put should fail");

        assert_eq!(PutItem, err.operation);
        assert_eq!("7", err.key);
        assert!(matches!(err.reason, StoreErrorReason::BadRecord(_)));
        assert_eq!(0, rule.num_calls());
    }
}
