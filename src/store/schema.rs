//! Declarative database schema and the idempotent setup that applies it

use serde_json::{json, Value};
use tracing::{info, warn};

use super::appwrite::AppwriteClient;
use super::document::StoreError;

pub mod collections {
    pub const SELLERS: &str = "sellers";
    pub const SELLER_SETTINGS: &str = "seller_settings";
    pub const PRODUCTS: &str = "products";
    pub const CUSTOMERS: &str = "customers";
    pub const INVOICES: &str = "invoices";
}

/// Attribute kinds supported by the databases API
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    String { size: u32 },
    Integer,
    Float,
    Boolean,
    Datetime,
    Email,
    Enum { elements: &'static [&'static str] },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: &'static str,
    pub kind: AttributeKind,
    pub required: bool,
    pub array: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Key,
    Unique,
    Fulltext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub key: &'static str,
    pub kind: IndexKind,
    pub attributes: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub id: &'static str,
    pub name: &'static str,
    pub attributes: Vec<Attribute>,
    pub indexes: Vec<Index>,
}

const fn attr(key: &'static str, kind: AttributeKind, required: bool) -> Attribute {
    Attribute {
        key,
        kind,
        required,
        array: false,
    }
}

const fn text(key: &'static str, size: u32, required: bool) -> Attribute {
    attr(key, AttributeKind::String { size }, required)
}

const fn list(key: &'static str, size: u32) -> Attribute {
    Attribute {
        key,
        kind: AttributeKind::String { size },
        required: false,
        array: true,
    }
}

const fn index(key: &'static str, kind: IndexKind, attributes: &'static [&'static str]) -> Index {
    Index {
        key,
        kind,
        attributes,
    }
}

const PAYMENT_STATUSES: &[&str] = &["paid", "partial", "pending", "cancelled"];
const DESCRIPTION_SOURCES: &[&str] = &["none", "ai", "user"];

/// Every collection the service reads or writes
pub fn definitions() -> Vec<Collection> {
    use AttributeKind::{Boolean, Datetime, Email, Enum, Float, Integer};

    vec![
        Collection {
            id: collections::SELLERS,
            name: "Sellers",
            attributes: vec![
                text("name", 128, true),
                attr("email", Email, true),
                text("businessName", 128, true),
                text("phone", 32, false),
                text("address", 512, false),
                text("taxId", 64, false),
            ],
            indexes: vec![index("email_unique", IndexKind::Unique, &["email"])],
        },
        Collection {
            id: collections::SELLER_SETTINGS,
            name: "Seller settings",
            attributes: vec![
                text("sellerId", 36, true),
                list("enabledFields", 64),
                text("customFields", 16384, false),
                attr("taxRate", Float, true),
                attr("taxInclusive", Boolean, false),
                text("currency", 8, true),
                text("invoicePrefix", 16, true),
                attr("lowStockThreshold", Integer, true),
            ],
            indexes: vec![index("seller", IndexKind::Unique, &["sellerId"])],
        },
        Collection {
            id: collections::PRODUCTS,
            name: "Products",
            attributes: vec![
                text("sellerId", 36, true),
                text("name", 256, true),
                text("sku", 64, true),
                text("category", 128, false),
                text("description", 4096, false),
                attr("descriptionSource", Enum { elements: DESCRIPTION_SOURCES }, false),
                attr("price", Float, true),
                attr("costPrice", Float, false),
                attr("stock", Integer, true),
                text("unit", 32, false),
                list("tags", 64),
                text("customAttributes", 16384, false),
            ],
            indexes: vec![
                index("seller", IndexKind::Key, &["sellerId"]),
                index("seller_sku", IndexKind::Unique, &["sellerId", "sku"]),
                index("seller_stock", IndexKind::Key, &["sellerId", "stock"]),
                index("name_search", IndexKind::Fulltext, &["name"]),
            ],
        },
        Collection {
            id: collections::CUSTOMERS,
            name: "Customers",
            attributes: vec![
                text("sellerId", 36, true),
                text("name", 128, true),
                attr("email", Email, false),
                text("phone", 32, false),
                text("address", 512, false),
                text("notes", 2048, false),
                attr("totalSpent", Float, false),
                attr("invoiceCount", Integer, false),
                attr("lastPurchaseAt", Datetime, false),
            ],
            indexes: vec![
                index("seller", IndexKind::Key, &["sellerId"]),
                index("name_search", IndexKind::Fulltext, &["name"]),
            ],
        },
        Collection {
            id: collections::INVOICES,
            name: "Invoices",
            attributes: vec![
                text("sellerId", 36, true),
                text("invoiceNumber", 64, true),
                text("customerId", 36, false),
                text("customerName", 128, true),
                text("items", 65535, true),
                attr("subtotal", Float, true),
                attr("discount", Float, false),
                attr("taxRate", Float, false),
                attr("taxAmount", Float, false),
                attr("total", Float, true),
                attr("amountPaid", Float, false),
                attr("paymentStatus", Enum { elements: PAYMENT_STATUSES }, true),
                text("paymentMethod", 32, false),
                text("notes", 2048, false),
                attr("dueDate", Datetime, false),
                attr("issuedAt", Datetime, true),
            ],
            indexes: vec![
                index("seller", IndexKind::Key, &["sellerId"]),
                index("seller_number", IndexKind::Unique, &["sellerId", "invoiceNumber"]),
                index("seller_customer", IndexKind::Key, &["sellerId", "customerId"]),
                index("seller_status", IndexKind::Key, &["sellerId", "paymentStatus"]),
                index("issued", IndexKind::Key, &["issuedAt"]),
            ],
        },
    ]
}

impl Attribute {
    /// Endpoint suffix and request body for creating this attribute
    pub fn request(&self) -> (&'static str, Value) {
        let mut body = json!({
            "key": self.key,
            "required": self.required,
            "array": self.array,
        });
        let path = match &self.kind {
            AttributeKind::String { size } => {
                body["size"] = json!(size);
                "string"
            }
            AttributeKind::Integer => "integer",
            AttributeKind::Float => "float",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Datetime => "datetime",
            AttributeKind::Email => "email",
            AttributeKind::Enum { elements } => {
                body["elements"] = json!(elements);
                "enum"
            }
        };
        (path, body)
    }
}

impl Index {
    pub fn request(&self) -> Value {
        let kind = match self.kind {
            IndexKind::Key => "key",
            IndexKind::Unique => "unique",
            IndexKind::Fulltext => "fulltext",
        };
        json!({
            "key": self.key,
            "type": kind,
            "attributes": self.attributes,
        })
    }
}

/// Treat "already exists" as success so setup can be re-run
fn tolerate_existing(result: Result<Value, StoreError>, what: &str) -> Result<(), StoreError> {
    match result {
        Ok(_) => {
            info!(%what, "created");
            Ok(())
        }
        Err(StoreError::Conflict) => {
            info!(%what, "already exists");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Create the database, collections, attributes and indexes
pub async fn apply(client: &AppwriteClient) -> Result<(), StoreError> {
    let database_id = client.database_id().to_string();

    tolerate_existing(
        client
            .post_json("/databases", &json!({ "databaseId": database_id, "name": "Retail" }))
            .await,
        &format!("database {}", database_id),
    )?;

    for collection in definitions() {
        let base = format!("/databases/{}/collections", database_id);

        // Document security on: access comes from per-document permissions only
        tolerate_existing(
            client
                .post_json(
                    &base,
                    &json!({
                        "collectionId": collection.id,
                        "name": collection.name,
                        "permissions": [],
                        "documentSecurity": true,
                    }),
                )
                .await,
            &format!("collection {}", collection.id),
        )?;

        for attribute in &collection.attributes {
            let (kind, body) = attribute.request();
            tolerate_existing(
                client
                    .post_json(&format!("{}/{}/attributes/{}", base, collection.id, kind), &body)
                    .await,
                &format!("attribute {}.{}", collection.id, attribute.key),
            )?;
        }

        for index in &collection.indexes {
            let result = client
                .post_json(&format!("{}/{}/indexes", base, collection.id), &index.request())
                .await;
            // Attributes are created asynchronously; an index can race them
            if let Err(StoreError::Api { status: 400, body }) = &result {
                warn!(collection = collection.id, index = index.key, %body, "index not created, re-run setup once attributes are available");
                continue;
            }
            tolerate_existing(result, &format!("index {}.{}", collection.id, index.key))?;
        }
    }

    Ok(())
}
