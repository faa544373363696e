//! Read-only access to the two CRM order collections.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;
use crate::normalize::Document;

/// Collection labels as they exist in the CRM export.
pub const SALES_COLLECTION: &str = "Pedidos - CRM";
pub const PURCHASES_COLLECTION: &str = "Ordens de compra - CRM";

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_sales(&self) -> Result<Vec<Document>, StoreError>;
    async fn load_purchases(&self) -> Result<Vec<Document>, StoreError>;
}

/// A record store backed by one JSON document array per collection, the
/// format the CRM export job writes.
pub struct JsonFileStore {
    sales_path: PathBuf,
    purchases_path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(sales_path: P, purchases_path: P) -> Self {
        JsonFileStore {
            sales_path: sales_path.into(),
            purchases_path: purchases_path.into(),
        }
    }

    async fn load(&self, path: &Path, collection: &str) -> Result<Vec<Document>, StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Unreachable {
                path: path.to_path_buf(),
                source,
            })?;

        let docs: Vec<Document> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                collection: collection.to_string(),
                source,
            })?;

        if docs.is_empty() {
            return Err(StoreError::Empty {
                collection: collection.to_string(),
            });
        }

        debug!(collection, count = docs.len(), "Loaded record collection");
        Ok(docs)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load_sales(&self) -> Result<Vec<Document>, StoreError> {
        self.load(&self.sales_path, SALES_COLLECTION).await
    }

    async fn load_purchases(&self) -> Result<Vec<Document>, StoreError> {
        self.load(&self.purchases_path, PURCHASES_COLLECTION).await
    }
}
