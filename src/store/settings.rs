//! Per-seller inventory field and tax settings

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::document::{owner_permissions, DocumentStore, StoreError};
use super::schema::collections::SELLER_SETTINGS;
use super::{decode, decode_nested, encode_nested};

/// Attributes stored as JSON strings
const NESTED: &[&str] = &["customFields"];

/// Built-in inventory fields a seller can toggle on or off
pub const BUILTIN_FIELDS: &[&str] = &[
    "category",
    "description",
    "costPrice",
    "unit",
    "tags",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    Text,
    Number,
    Date,
    Select,
}

/// Seller-defined inventory field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub key: String,
    pub label: String,
    pub field_type: CustomFieldType,
    /// Choices for `select` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Seller settings; one document per seller, keyed by seller ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerSettings {
    pub seller_id: String,
    #[serde(default)]
    pub enabled_fields: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    /// Percentage, e.g. 18 for 18%
    pub tax_rate: Decimal,
    #[serde(default)]
    pub tax_inclusive: bool,
    pub currency: String,
    pub invoice_prefix: String,
    pub low_stock_threshold: i64,
}

impl SellerSettings {
    pub fn defaults(seller_id: &str) -> Self {
        Self {
            seller_id: seller_id.to_string(),
            enabled_fields: BUILTIN_FIELDS.iter().map(|f| f.to_string()).collect(),
            custom_fields: Vec::new(),
            tax_rate: Decimal::ZERO,
            tax_inclusive: false,
            currency: "INR".to_string(),
            invoice_prefix: "INV".to_string(),
            low_stock_threshold: 5,
        }
    }

    /// Every field key product enrichment may fill in
    pub fn fillable_fields(&self) -> Vec<String> {
        self.enabled_fields
            .iter()
            .cloned()
            .chain(self.custom_fields.iter().map(|f| f.key.clone()))
            .collect()
    }
}

/// Settings store operations
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn DocumentStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Stored settings, or the defaults when the seller never saved any
    pub async fn get_settings(&self, seller_id: &str) -> Result<SellerSettings, StoreError> {
        match self.store.get_document(SELLER_SETTINGS, seller_id).await? {
            Some(doc) => decode(decode_nested(doc, NESTED)),
            None => Ok(SellerSettings::defaults(seller_id)),
        }
    }

    /// Insert or replace the seller's settings
    pub async fn save_settings(&self, settings: &SellerSettings) -> Result<SellerSettings, StoreError> {
        let data = encode_nested(serde_json::to_value(settings)?, NESTED)?;
        let seller_id = settings.seller_id.as_str();

        let doc = match self
            .store
            .update_document(SELLER_SETTINGS, seller_id, data.clone())
            .await
        {
            Err(StoreError::NotFound) => {
                self.store
                    .create_document(SELLER_SETTINGS, seller_id, data, &owner_permissions(seller_id))
                    .await?
            }
            other => other?,
        };

        decode(decode_nested(doc, NESTED))
    }
}
