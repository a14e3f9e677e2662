//! Data store modules for Appwrite integration

pub mod appwrite;
pub mod customers;
pub mod document;
pub mod invoices;
#[cfg(test)]
pub mod memory;
pub mod products;
pub mod schema;
pub mod sellers;
pub mod settings;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use appwrite::AppwriteClient;
pub use customers::CustomerStore;
pub use document::{DocumentStore, IdentityProvider, Query, StoreError};
pub use invoices::InvoiceStore;
pub use products::ProductStore;
pub use sellers::SellerStore;
pub use settings::SettingsStore;

/// Largest page the databases API hands back
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total: u64,
    pub items: Vec<T>,
}

/// Clamp caller-supplied paging to what the API accepts
pub fn paging(limit: Option<u32>, offset: Option<u32>) -> [Query; 2] {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    [Query::limit(limit), Query::offset(offset.unwrap_or(0))]
}

/// Nested attributes are stored as JSON strings; encode them before writing
pub(crate) fn encode_nested(mut value: Value, fields: &[&str]) -> Result<Value, StoreError> {
    for field in fields {
        if let Some(nested) = value.get_mut(*field) {
            if !nested.is_null() && !nested.is_string() {
                *nested = Value::String(serde_json::to_string(nested)?);
            }
        }
    }
    Ok(value)
}

/// Parse JSON-string attributes back into structured values
pub(crate) fn decode_nested(mut value: Value, fields: &[&str]) -> Value {
    let Some(object) = value.as_object_mut() else {
        return value;
    };
    for field in fields {
        let Some(raw) = object.get(*field).and_then(Value::as_str) else {
            continue;
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => {
                object.insert(field.to_string(), parsed);
            }
            // Unparseable content is dropped so the attribute falls back to its default
            Err(_) => {
                object.remove(*field);
            }
        }
    }
    value
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(value)?)
}

/// Fetch every document matching the queries, page by page
pub(crate) async fn list_all(
    store: &dyn DocumentStore,
    collection: &str,
    queries: &[Query],
) -> Result<Vec<Value>, StoreError> {
    let mut documents = Vec::new();
    loop {
        let mut page_queries = queries.to_vec();
        page_queries.push(Query::limit(MAX_PAGE_SIZE));
        page_queries.push(Query::offset(documents.len() as u32));

        let page = store.list_documents(collection, &page_queries).await?;
        let fetched = page.documents.len();
        documents.extend(page.documents);

        if fetched == 0 || documents.len() as u64 >= page.total {
            return Ok(documents);
        }
    }
}
