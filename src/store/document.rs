//! Document store abstraction over the hosted database

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query operators understood by the Appwrite databases API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMethod {
    Equal,
    Search,
    LessThanEqual,
    GreaterThanEqual,
    OrderAsc,
    OrderDesc,
    Limit,
    Offset,
}

/// A single list-documents query, serialized as Appwrite's JSON query string
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub method: QueryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

impl Query {
    fn on(method: QueryMethod, attribute: &str, values: Vec<Value>) -> Self {
        Self {
            method,
            attribute: Some(attribute.to_string()),
            values,
        }
    }

    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self::on(QueryMethod::Equal, attribute, vec![value.into()])
    }

    pub fn search(attribute: &str, term: &str) -> Self {
        Self::on(QueryMethod::Search, attribute, vec![Value::from(term)])
    }

    pub fn less_than_equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self::on(QueryMethod::LessThanEqual, attribute, vec![value.into()])
    }

    pub fn greater_than_equal(attribute: &str, value: impl Into<Value>) -> Self {
        Self::on(QueryMethod::GreaterThanEqual, attribute, vec![value.into()])
    }

    pub fn order_asc(attribute: &str) -> Self {
        Self::on(QueryMethod::OrderAsc, attribute, Vec::new())
    }

    pub fn order_desc(attribute: &str) -> Self {
        Self::on(QueryMethod::OrderDesc, attribute, Vec::new())
    }

    pub fn limit(limit: u32) -> Self {
        Self {
            method: QueryMethod::Limit,
            attribute: None,
            values: vec![Value::from(limit)],
        }
    }

    pub fn offset(offset: u32) -> Self {
        Self {
            method: QueryMethod::Offset,
            attribute: None,
            values: vec![Value::from(offset)],
        }
    }

    /// Encoded form for the `queries[]` URL parameter
    pub fn to_param(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Page of documents returned by a list call
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList<T> {
    pub total: u64,
    pub documents: Vec<T>,
}

/// Document permissions granting a single user full access
pub fn owner_permissions(user_id: &str) -> Vec<String> {
    ["read", "update", "delete"]
        .iter()
        .map(|action| format!("{}(\"user:{}\")", action, user_id))
        .collect()
}

/// Fresh document ID
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// CRUD over schema-less documents. Implemented by `AppwriteClient`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
        permissions: &[String],
    ) -> Result<Value, StoreError>;

    /// `Ok(None)` when the document does not exist
    async fn get_document(&self, collection: &str, document_id: &str)
        -> Result<Option<Value>, StoreError>;

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList<Value>, StoreError>;

    /// Partial update; only the supplied attributes change
    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, StoreError>;

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<(), StoreError>;
}

/// Account created or verified by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: String,
    pub email: String,
}

/// Seller accounts (credentials live with the hosted auth service, never here)
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, StoreError>;

    /// `Ok(None)` when the credentials are rejected
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, StoreError>;
}

/// Document store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Document not found")]
    NotFound,

    #[error("Document already exists")]
    Conflict,
}

impl StoreError {
    /// Map a non-success HTTP status into the matching error
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => StoreError::NotFound,
            409 => StoreError::Conflict,
            _ => StoreError::Api { status, body },
        }
    }
}
