//! Invoice records

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::document::{new_document_id, owner_permissions, DocumentStore, Query, StoreError};
use super::schema::collections::INVOICES;
use super::{decode, decode_nested, encode_nested, list_all, paging, Page};

/// Attributes stored as JSON strings
const NESTED: &[&str] = &["items"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

/// One invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Invoice as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(alias = "$id")]
    pub id: String,
    pub seller_id: String,
    pub invoice_number: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    #[serde(alias = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Amount still owed
    pub fn balance_due(&self) -> Decimal {
        if self.payment_status == PaymentStatus::Cancelled {
            return Decimal::ZERO;
        }
        (self.total - self.amount_paid).max(Decimal::ZERO)
    }
}

/// New invoice for insertion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub seller_id: String,
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
}

/// Listing filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    pub status: Option<PaymentStatus>,
    pub customer_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Invoice store operations
#[derive(Clone)]
pub struct InvoiceStore {
    store: Arc<dyn DocumentStore>,
}

impl InvoiceStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn to_invoice(doc: serde_json::Value) -> Result<Invoice, StoreError> {
        decode(decode_nested(doc, NESTED))
    }

    fn seller_queries(seller_id: &str, filter: &InvoiceFilter) -> Vec<Query> {
        let mut queries = vec![Query::equal("sellerId", seller_id)];
        if let Some(status) = filter.status {
            queries.push(Query::equal("paymentStatus", status.as_str()));
        }
        if let Some(customer_id) = filter.customer_id.as_deref() {
            queries.push(Query::equal("customerId", customer_id));
        }
        queries.push(Query::order_desc("issuedAt"));
        queries
    }

    pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, StoreError> {
        let data = encode_nested(serde_json::to_value(invoice)?, NESTED)?;
        let doc = self
            .store
            .create_document(
                INVOICES,
                &new_document_id(),
                data,
                &owner_permissions(&invoice.seller_id),
            )
            .await?;
        Self::to_invoice(doc)
    }

    /// Get an invoice, hiding other sellers' documents
    pub async fn get_invoice(
        &self,
        seller_id: &str,
        invoice_id: &str,
    ) -> Result<Option<Invoice>, StoreError> {
        let Some(doc) = self.store.get_document(INVOICES, invoice_id).await? else {
            return Ok(None);
        };
        let invoice = Self::to_invoice(doc)?;
        Ok((invoice.seller_id == seller_id).then_some(invoice))
    }

    /// True when the seller already used this invoice number
    pub async fn number_taken(&self, seller_id: &str, invoice_number: &str) -> Result<bool, StoreError> {
        let page = self
            .store
            .list_documents(
                INVOICES,
                &[
                    Query::equal("sellerId", seller_id),
                    Query::equal("invoiceNumber", invoice_number),
                    Query::limit(1),
                ],
            )
            .await?;
        Ok(page.total > 0)
    }

    pub async fn list_invoices(
        &self,
        seller_id: &str,
        filter: &InvoiceFilter,
    ) -> Result<Page<Invoice>, StoreError> {
        let mut queries = Self::seller_queries(seller_id, filter);
        queries.extend(paging(filter.limit, filter.offset));

        let page = self.store.list_documents(INVOICES, &queries).await?;
        Ok(Page {
            total: page.total,
            items: page
                .documents
                .into_iter()
                .map(Self::to_invoice)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Every invoice of the seller, newest first
    pub async fn all_invoices(&self, seller_id: &str) -> Result<Vec<Invoice>, StoreError> {
        list_all(
            self.store.as_ref(),
            INVOICES,
            &Self::seller_queries(seller_id, &InvoiceFilter::default()),
        )
        .await?
        .into_iter()
        .map(Self::to_invoice)
        .collect()
    }

    pub async fn update_payment(
        &self,
        invoice_id: &str,
        status: PaymentStatus,
        amount_paid: Decimal,
    ) -> Result<Invoice, StoreError> {
        let data = json!({
            "paymentStatus": status,
            "amountPaid": amount_paid,
        });
        let doc = self.store.update_document(INVOICES, invoice_id, data).await?;
        Self::to_invoice(doc)
    }

    pub async fn delete_invoice(&self, seller_id: &str, invoice_id: &str) -> Result<(), StoreError> {
        if self.get_invoice(seller_id, invoice_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        self.store.delete_document(INVOICES, invoice_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    fn invoice(seller_id: &str, number: &str, status: PaymentStatus) -> NewInvoice {
        NewInvoice {
            seller_id: seller_id.to_string(),
            invoice_number: number.to_string(),
            customer_id: Some("c1".to_string()),
            customer_name: "Asha".to_string(),
            items: vec![LineItem {
                product_id: Some("p1".to_string()),
                name: "Tea".to_string(),
                sku: None,
                quantity: 2,
                unit_price: dec!(50),
                line_total: dec!(100),
            }],
            subtotal: dec!(100),
            discount: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: dec!(100),
            amount_paid: Decimal::ZERO,
            payment_status: status,
            payment_method: None,
            notes: None,
            due_date: None,
            issued_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_items_survive_storage() {
        let store = Arc::new(MemoryStore::new());
        let invoices = InvoiceStore::new(store.clone());
        let created = invoices
            .create_invoice(&invoice("s1", "INV-1", PaymentStatus::Pending))
            .await
            .unwrap();

        let raw = store.get_document(INVOICES, &created.id).await.unwrap().unwrap();
        assert!(raw["items"].is_string());
        assert_eq!(raw["paymentStatus"], "pending");

        let fetched = invoices.get_invoice("s1", &created.id).await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].quantity, 2);
        assert!(invoices.get_invoice("s2", &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filter_by_status_and_number_lookup() {
        let invoices = InvoiceStore::new(Arc::new(MemoryStore::new()));
        invoices.create_invoice(&invoice("s1", "INV-1", PaymentStatus::Pending)).await.unwrap();
        invoices.create_invoice(&invoice("s1", "INV-2", PaymentStatus::Paid)).await.unwrap();

        let pending = invoices
            .list_invoices(
                "s1",
                &InvoiceFilter {
                    status: Some(PaymentStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.total, 1);
        assert_eq!(pending.items[0].invoice_number, "INV-1");

        assert!(invoices.number_taken("s1", "INV-2").await.unwrap());
        assert!(!invoices.number_taken("s2", "INV-2").await.unwrap());
    }

    #[test]
    fn test_balance_due() {
        let mut inv = Invoice {
            id: "i1".to_string(),
            seller_id: "s1".to_string(),
            invoice_number: "INV-1".to_string(),
            customer_id: None,
            customer_name: "Walk-in".to_string(),
            items: Vec::new(),
            subtotal: dec!(100),
            discount: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: dec!(100),
            amount_paid: dec!(40),
            payment_status: PaymentStatus::Partial,
            payment_method: None,
            notes: None,
            due_date: None,
            issued_at: Utc::now(),
            created_at: None,
        };
        assert_eq!(inv.balance_due(), dec!(60));

        inv.payment_status = PaymentStatus::Cancelled;
        assert_eq!(inv.balance_due(), Decimal::ZERO);
    }
}
