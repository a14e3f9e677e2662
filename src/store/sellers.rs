//! Seller profile management

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::document::{owner_permissions, DocumentStore, StoreError};
use super::schema::collections::SELLERS;
use super::decode;

/// Seller profile. The document ID is the seller's account ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    #[serde(alias = "$id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub business_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(alias = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// New seller for insertion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSeller {
    pub name: String,
    pub email: String,
    pub business_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

/// Seller profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SellerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 128))]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 512))]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub tax_id: Option<String>,
}

/// Seller store operations
#[derive(Clone)]
pub struct SellerStore {
    store: Arc<dyn DocumentStore>,
}

impl SellerStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Get a seller by ID
    pub async fn get_seller(&self, seller_id: &str) -> Result<Option<Seller>, StoreError> {
        match self.store.get_document(SELLERS, seller_id).await? {
            Some(doc) => decode(doc).map(Some),
            None => Ok(None),
        }
    }

    /// Create the seller document for a freshly created account
    pub async fn create_seller(
        &self,
        seller_id: &str,
        seller: &NewSeller,
    ) -> Result<Seller, StoreError> {
        let data = serde_json::to_value(seller)?;
        let doc = self
            .store
            .create_document(SELLERS, seller_id, data, &owner_permissions(seller_id))
            .await?;
        decode(doc)
    }

    /// Update a seller profile
    pub async fn update_seller(
        &self,
        seller_id: &str,
        update: &SellerUpdate,
    ) -> Result<Seller, StoreError> {
        let doc = self
            .store
            .update_document(SELLERS, seller_id, serde_json::to_value(update)?)
            .await?;
        decode(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn new_seller() -> NewSeller {
        NewSeller {
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            business_name: "Ravi Stores".to_string(),
            phone: None,
            address: Some("MG Road".to_string()),
            tax_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_seller() {
        let sellers = SellerStore::new(Arc::new(MemoryStore::new()));
        let created = sellers.create_seller("s1", &new_seller()).await.unwrap();
        assert_eq!(created.id, "s1");
        assert!(created.created_at.is_some());

        let fetched = sellers.get_seller("s1").await.unwrap().unwrap();
        assert_eq!(fetched.business_name, "Ravi Stores");
        assert_eq!(fetched.address.as_deref(), Some("MG Road"));
        assert!(sellers.get_seller("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_only_touches_given_fields() {
        let sellers = SellerStore::new(Arc::new(MemoryStore::new()));
        sellers.create_seller("s1", &new_seller()).await.unwrap();

        let update = SellerUpdate {
            phone: Some("98450 00000".to_string()),
            ..Default::default()
        };
        let updated = sellers.update_seller("s1", &update).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("98450 00000"));
        assert_eq!(updated.name, "Ravi");
    }
}
