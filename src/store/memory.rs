//! In-memory document store and identity provider for tests

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::document::{
    new_document_id, Account, DocumentList, DocumentStore, IdentityProvider, Query, QueryMethod,
    StoreError,
};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    accounts: Mutex<HashMap<String, (Account, String)>>,
    /// Collections whose writes fail, to exercise best-effort paths
    failing: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_to(&self, collection: &str) {
        self.failing.lock().unwrap().push(collection.to_string());
    }

    fn check_writable(&self, collection: &str) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().iter().any(|c| c == collection) {
            return Err(StoreError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn now() -> Value {
    Value::from(chrono::Utc::now().to_rfc3339())
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a
            .as_str()
            .unwrap_or_default()
            .cmp(b.as_str().unwrap_or_default()),
    }
}

fn matches(doc: &Value, query: &Query) -> bool {
    let Some(attribute) = query.attribute.as_deref() else {
        return true;
    };
    let field = &doc[attribute];
    let Some(expected) = query.values.first() else {
        return true;
    };
    match query.method {
        QueryMethod::Equal => query.values.iter().any(|v| v == field),
        QueryMethod::Search => {
            let needle = expected.as_str().unwrap_or_default().to_lowercase();
            field
                .as_str()
                .map(|s| s.to_lowercase().contains(&needle))
                .unwrap_or(false)
        }
        QueryMethod::LessThanEqual => !field.is_null() && compare(field, expected) != Ordering::Greater,
        QueryMethod::GreaterThanEqual => !field.is_null() && compare(field, expected) != Ordering::Less,
        _ => true,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
        permissions: &[String],
    ) -> Result<Value, StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(document_id) {
            return Err(StoreError::Conflict);
        }

        let mut doc = data;
        doc["$id"] = Value::from(document_id);
        doc["$createdAt"] = now();
        doc["$updatedAt"] = now();
        doc["$permissions"] = json!(permissions);
        docs.insert(document_id.to_string(), doc.clone());
        Ok(doc)
    }

    async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(document_id))
            .cloned())
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList<Value>, StoreError> {
        let collections = self.collections.lock().unwrap();
        let mut docs: Vec<Value> = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| queries.iter().all(|q| matches(doc, q)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for query in queries {
            if let Some(attribute) = query.attribute.as_deref() {
                match query.method {
                    QueryMethod::OrderAsc => docs.sort_by(|a, b| compare(&a[attribute], &b[attribute])),
                    QueryMethod::OrderDesc => docs.sort_by(|a, b| compare(&b[attribute], &a[attribute])),
                    _ => {}
                }
            }
        }

        let total = docs.len() as u64;
        let param = |method: QueryMethod| {
            queries
                .iter()
                .find(|q| q.method == method)
                .and_then(|q| q.values.first())
                .and_then(Value::as_u64)
        };
        let offset = param(QueryMethod::Offset).unwrap_or(0) as usize;
        let limit = param(QueryMethod::Limit).unwrap_or(25) as usize;

        Ok(DocumentList {
            total,
            documents: docs.into_iter().skip(offset).take(limit).collect(),
        })
    }

    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.lock().unwrap();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(document_id))
            .ok_or(StoreError::NotFound)?;

        if let (Some(target), Value::Object(changes)) = (doc.as_object_mut(), data) {
            for (key, value) in changes {
                target.insert(key, value);
            }
        }
        doc["$updatedAt"] = now();
        Ok(doc.clone())
    }

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<(), StoreError> {
        self.check_writable(collection)?;
        let mut collections = self.collections.lock().unwrap();
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(document_id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl IdentityProvider for MemoryStore {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        _name: &str,
    ) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(StoreError::Conflict);
        }
        let account = Account {
            user_id: new_document_id(),
            email: email.to_string(),
        };
        accounts.insert(email.to_string(), (account.clone(), password.to_string()));
        Ok(account)
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .get(email)
            .filter(|(_, stored)| stored == password)
            .map(|(account, _)| account.clone()))
    }
}
