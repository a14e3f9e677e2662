//! Customer records

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::document::{new_document_id, owner_permissions, DocumentStore, Query, StoreError};
use super::schema::collections::CUSTOMERS;
use super::{decode, paging, Page};

/// Customer with cumulative spend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(alias = "$id")]
    pub id: String,
    pub seller_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_spent: Decimal,
    #[serde(default)]
    pub invoice_count: i64,
    #[serde(default)]
    pub last_purchase_at: Option<DateTime<Utc>>,
    #[serde(alias = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Customer details supplied by the seller
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 512))]
    pub address: Option<String>,
    #[validate(length(max = 2048))]
    pub notes: Option<String>,
}

/// Customer update; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 512))]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048))]
    pub notes: Option<String>,
}

/// Customer store operations
#[derive(Clone)]
pub struct CustomerStore {
    store: Arc<dyn DocumentStore>,
}

impl CustomerStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a customer with zero spend
    pub async fn create_customer(
        &self,
        seller_id: &str,
        input: &CustomerInput,
    ) -> Result<Customer, StoreError> {
        let mut data = serde_json::to_value(input)?;
        data["sellerId"] = json!(seller_id);
        data["totalSpent"] = json!(0.0);
        data["invoiceCount"] = json!(0);

        let doc = self
            .store
            .create_document(CUSTOMERS, &new_document_id(), data, &owner_permissions(seller_id))
            .await?;
        decode(doc)
    }

    /// Get a customer, hiding other sellers' documents
    pub async fn get_customer(
        &self,
        seller_id: &str,
        customer_id: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let Some(doc) = self.store.get_document(CUSTOMERS, customer_id).await? else {
            return Ok(None);
        };
        let customer: Customer = decode(doc)?;
        Ok((customer.seller_id == seller_id).then_some(customer))
    }

    /// List customers, optionally searching by name
    pub async fn list_customers(
        &self,
        seller_id: &str,
        search: Option<&str>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Page<Customer>, StoreError> {
        let mut queries = vec![Query::equal("sellerId", seller_id)];
        match search.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => queries.push(Query::search("name", term)),
            None => queries.push(Query::order_asc("name")),
        }
        queries.extend(paging(limit, offset));

        let page = self.store.list_documents(CUSTOMERS, &queries).await?;
        Ok(Page {
            total: page.total,
            items: page
                .documents
                .into_iter()
                .map(decode)
                .collect::<Result<_, _>>()?,
        })
    }

    pub async fn count_customers(&self, seller_id: &str) -> Result<u64, StoreError> {
        let page = self
            .store
            .list_documents(CUSTOMERS, &[Query::equal("sellerId", seller_id), Query::limit(1)])
            .await?;
        Ok(page.total)
    }

    /// Update a customer's details
    pub async fn update_customer(
        &self,
        seller_id: &str,
        customer_id: &str,
        update: &CustomerUpdate,
    ) -> Result<Customer, StoreError> {
        if self.get_customer(seller_id, customer_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        let doc = self
            .store
            .update_document(CUSTOMERS, customer_id, serde_json::to_value(update)?)
            .await?;
        decode(doc)
    }

    /// Add a purchase to the customer's running totals
    pub async fn record_purchase(
        &self,
        customer: &Customer,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Customer, StoreError> {
        let data = json!({
            "totalSpent": customer.total_spent.saturating_add(amount),
            "invoiceCount": customer.invoice_count + 1,
            "lastPurchaseAt": at,
        });
        let doc = self.store.update_document(CUSTOMERS, &customer.id, data).await?;
        decode(doc)
    }

    /// Delete a customer. Their invoices are left in place.
    pub async fn delete_customer(&self, seller_id: &str, customer_id: &str) -> Result<(), StoreError> {
        if self.get_customer(seller_id, customer_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        self.store.delete_document(CUSTOMERS, customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    fn input(name: &str) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            email: None,
            phone: Some("99000 11111".to_string()),
            address: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_new_customer_starts_at_zero() {
        let customers = CustomerStore::new(Arc::new(MemoryStore::new()));
        let created = customers.create_customer("s1", &input("Asha")).await.unwrap();
        assert_eq!(created.total_spent, Decimal::ZERO);
        assert_eq!(created.invoice_count, 0);
        assert!(created.last_purchase_at.is_none());
    }

    #[tokio::test]
    async fn test_record_purchase_accumulates() {
        let customers = CustomerStore::new(Arc::new(MemoryStore::new()));
        let created = customers.create_customer("s1", &input("Asha")).await.unwrap();

        let once = customers
            .record_purchase(&created, dec!(250.75), Utc::now())
            .await
            .unwrap();
        let twice = customers
            .record_purchase(&once, dec!(100), Utc::now())
            .await
            .unwrap();

        assert_eq!(twice.total_spent, dec!(350.75));
        assert_eq!(twice.invoice_count, 2);
        assert!(twice.last_purchase_at.is_some());
    }

    #[tokio::test]
    async fn test_record_purchase_at_decimal_limit_does_not_panic() {
        let customers = CustomerStore::new(Arc::new(MemoryStore::new()));
        let mut created = customers.create_customer("s1", &input("Asha")).await.unwrap();
        created.total_spent = Decimal::MAX;

        // Saturates; the stored float may not decode back, either outcome is fine
        let _ = customers
            .record_purchase(&created, dec!(1000), Utc::now())
            .await;
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_seller() {
        let customers = CustomerStore::new(Arc::new(MemoryStore::new()));
        customers.create_customer("s1", &input("Asha Rao")).await.unwrap();
        customers.create_customer("s1", &input("Vikram")).await.unwrap();
        customers.create_customer("s2", &input("Asha Iyer")).await.unwrap();

        let page = customers
            .list_customers("s1", Some("asha"), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Asha Rao");
        assert_eq!(customers.count_customers("s1").await.unwrap(), 2);
    }
}
