use async_trait::async_trait;
use model::Record;
use store::StoreErrorReason::{BackendFailure, BadRecord};
use store::StoreOperation::{GetItem, PutItem};
use store::{ItemStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Table kept in process memory, for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryItemStore {
    items: Arc<Mutex<HashMap<String, Record>>>,
}

impl InMemoryItemStore {
    /// Number of records held.
    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn items(
        &self,
        key: &str,
        operation: store::StoreOperation,
    ) -> Result<MutexGuard<'_, HashMap<String, Record>>, StoreError> {
        self.items.lock().map_err(|err| {
            StoreError::new(key.to_string(), operation, BackendFailure(err.to_string().into()))
        })
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get_item(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let items = self.items(id, GetItem)?;

        Ok(items.get(id).cloned())
    }

    async fn put_item(&self, record: Record) -> Result<(), StoreError> {
        // Same constraint as a table with a string hash key
        let id: String = record
            .id()
            .ok_or_else(|| {
                StoreError::new(
                    String::new(),
                    PutItem,
                    BadRecord("Id must be a string".to_string()),
                )
            })?
            .to_string();

        self.items(&id, PutItem)?.insert(id, record);

        Ok(())
    }
}
