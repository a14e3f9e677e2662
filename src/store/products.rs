//! Product inventory management

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::document::{new_document_id, owner_permissions, DocumentStore, Query, StoreError};
use super::schema::collections::PRODUCTS;
use super::{decode, decode_nested, encode_nested, list_all, paging, Page};

/// Attributes stored as JSON strings
const NESTED: &[&str] = &["customAttributes"];

/// Who wrote the current product description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionSource {
    #[default]
    None,
    Ai,
    User,
}

/// Product as stored for a seller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "$id")]
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_source: DescriptionSource,
    pub price: Decimal,
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    pub stock: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_attributes: BTreeMap<String, String>,
    #[serde(alias = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(alias = "$updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// New product for insertion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub seller_id: String,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub description_source: DescriptionSource,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock: i64,
    pub unit: Option<String>,
    pub tags: Vec<String>,
    pub custom_attributes: BTreeMap<String, String>,
}

/// Product update; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 128))]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32))]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<BTreeMap<String, String>>,
    /// Set by the store, never by callers
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub description_source: Option<DescriptionSource>,
}

/// Listing filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Only products at or below this stock level
    pub max_stock: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Product store operations
#[derive(Clone)]
pub struct ProductStore {
    store: Arc<dyn DocumentStore>,
}

impl ProductStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn to_product(doc: serde_json::Value) -> Result<Product, StoreError> {
        decode(decode_nested(doc, NESTED))
    }

    /// Create a product owned by `product.seller_id`
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let data = encode_nested(serde_json::to_value(product)?, NESTED)?;
        let doc = self
            .store
            .create_document(
                PRODUCTS,
                &new_document_id(),
                data,
                &owner_permissions(&product.seller_id),
            )
            .await?;
        Self::to_product(doc)
    }

    /// Get a product, hiding other sellers' documents
    pub async fn get_product(
        &self,
        seller_id: &str,
        product_id: &str,
    ) -> Result<Option<Product>, StoreError> {
        let Some(doc) = self.store.get_document(PRODUCTS, product_id).await? else {
            return Ok(None);
        };
        let product = Self::to_product(doc)?;
        Ok((product.seller_id == seller_id).then_some(product))
    }

    /// Find a seller's product by SKU
    pub async fn find_by_sku(&self, seller_id: &str, sku: &str) -> Result<Option<Product>, StoreError> {
        let page = self
            .store
            .list_documents(
                PRODUCTS,
                &[
                    Query::equal("sellerId", seller_id),
                    Query::equal("sku", sku),
                    Query::limit(1),
                ],
            )
            .await?;
        page.documents.into_iter().next().map(Self::to_product).transpose()
    }

    /// List a seller's products
    pub async fn list_products(
        &self,
        seller_id: &str,
        filter: &ProductFilter,
    ) -> Result<Page<Product>, StoreError> {
        let mut queries = vec![Query::equal("sellerId", seller_id)];
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            queries.push(Query::search("name", term));
        }
        if let Some(category) = filter.category.as_deref() {
            queries.push(Query::equal("category", category));
        }
        if let Some(max_stock) = filter.max_stock {
            queries.push(Query::less_than_equal("stock", max_stock));
            queries.push(Query::order_asc("stock"));
        } else {
            queries.push(Query::order_desc("$createdAt"));
        }
        queries.extend(paging(filter.limit, filter.offset));

        let page = self.store.list_documents(PRODUCTS, &queries).await?;
        Ok(Page {
            total: page.total,
            items: page
                .documents
                .into_iter()
                .map(Self::to_product)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Products at or below the threshold, lowest stock first
    pub async fn low_stock(&self, seller_id: &str, threshold: i64) -> Result<Vec<Product>, StoreError> {
        list_all(
            self.store.as_ref(),
            PRODUCTS,
            &[
                Query::equal("sellerId", seller_id),
                Query::less_than_equal("stock", threshold),
                Query::order_asc("stock"),
            ],
        )
        .await?
        .into_iter()
        .map(Self::to_product)
        .collect()
    }

    /// Number of products the seller has
    pub async fn count_products(&self, seller_id: &str) -> Result<u64, StoreError> {
        let page = self
            .store
            .list_documents(PRODUCTS, &[Query::equal("sellerId", seller_id), Query::limit(1)])
            .await?;
        Ok(page.total)
    }

    /// Update a product; a caller-supplied description is marked as user-written
    pub async fn update_product(
        &self,
        seller_id: &str,
        product_id: &str,
        mut update: ProductUpdate,
    ) -> Result<Product, StoreError> {
        if self.get_product(seller_id, product_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        if update.description.is_some() && update.description_source.is_none() {
            update.description_source = Some(DescriptionSource::User);
        }

        let data = encode_nested(serde_json::to_value(&update)?, NESTED)?;
        let doc = self.store.update_document(PRODUCTS, product_id, data).await?;
        Self::to_product(doc)
    }

    /// Overwrite the stock level
    pub async fn set_stock(&self, product_id: &str, stock: i64) -> Result<Product, StoreError> {
        let doc = self
            .store
            .update_document(PRODUCTS, product_id, json!({ "stock": stock }))
            .await?;
        Self::to_product(doc)
    }

    /// Delete a product
    pub async fn delete_product(&self, seller_id: &str, product_id: &str) -> Result<(), StoreError> {
        if self.get_product(seller_id, product_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        self.store.delete_document(PRODUCTS, product_id).await
    }
}
