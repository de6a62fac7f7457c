use async_trait::async_trait;
use model::{Error, Record};
use std::fmt::{Display, Formatter};

/// Key-value table holding records by their `Id`.
/// Uniqueness of the identifier is left to the implementation, a put replaces any existing record.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Look up a record, `None` when no record has the identifier.
    async fn get_item(&self, id: &str) -> Result<Option<Record>, StoreError>;

    async fn put_item(&self, record: Record) -> Result<(), StoreError>;
}

/// Errors arising from reading or writing the table.
#[derive(Debug)]
pub struct StoreError {
    pub key: String,

    pub operation: StoreOperation,
    pub reason: StoreErrorReason,
}

#[derive(Debug)]
pub enum StoreErrorReason {
    // The record could not be converted to or from the stored format
    BadRecord(String),
    // An error from the underlying store
    BackendFailure(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    GetItem,
    PutItem,
}

impl StoreError {
    pub fn new(key: String, operation: StoreOperation, reason: StoreErrorReason) -> Self {
        StoreError {
            key,
            operation,
            reason,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let operation: &str = match self.operation {
            StoreOperation::GetItem => "get",
            StoreOperation::PutItem => "put",
        };

        match &self.reason {
            StoreErrorReason::BadRecord(reason) => {
                write!(f, "failed to {operation} item [{}]: bad record, {reason}", self.key)
            }
            StoreErrorReason::BackendFailure(err) => {
                write!(f, "failed to {operation} item [{}]: {err}", self.key)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.reason {
            StoreErrorReason::BackendFailure(err) => Some(err.as_ref()),
            StoreErrorReason::BadRecord(_) => None,
        }
    }
}
