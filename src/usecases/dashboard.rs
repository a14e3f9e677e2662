//! Seller dashboard summary

use rust_decimal::Decimal;
use serde::Serialize;

use super::UseCaseError;
use crate::store::invoices::Invoice;
use crate::store::products::Product;
use crate::store::{CustomerStore, InvoiceStore, ProductStore, SettingsStore};

const RECENT_INVOICES: usize = 5;
const LOW_STOCK_SHOWN: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub currency: String,
    pub product_count: u64,
    pub customer_count: u64,
    pub invoice_count: u64,
    pub low_stock_count: u64,
    pub low_stock: Vec<Product>,
    /// Money actually received
    pub revenue: Decimal,
    /// Unpaid balance over open invoices
    pub outstanding: Decimal,
    pub recent_invoices: Vec<Invoice>,
}

#[derive(Clone)]
pub struct DashboardUseCase {
    products: ProductStore,
    customers: CustomerStore,
    invoices: InvoiceStore,
    settings: SettingsStore,
}

impl DashboardUseCase {
    pub fn new(
        products: ProductStore,
        customers: CustomerStore,
        invoices: InvoiceStore,
        settings: SettingsStore,
    ) -> Self {
        Self {
            products,
            customers,
            invoices,
            settings,
        }
    }

    pub async fn summary(&self, seller_id: &str) -> Result<DashboardSummary, UseCaseError> {
        let settings = self.settings.get_settings(seller_id).await?;
        let product_count = self.products.count_products(seller_id).await?;
        let customer_count = self.customers.count_customers(seller_id).await?;
        let low_stock = self
            .products
            .low_stock(seller_id, settings.low_stock_threshold)
            .await?;
        let invoices = self.invoices.all_invoices(seller_id).await?;

        // Money received stays counted after a cancellation
        let revenue = invoices
            .iter()
            .fold(Decimal::ZERO, |acc, i| acc.saturating_add(i.amount_paid));
        let outstanding = invoices
            .iter()
            .fold(Decimal::ZERO, |acc, i| acc.saturating_add(i.balance_due()));

        Ok(DashboardSummary {
            currency: settings.currency,
            product_count,
            customer_count,
            invoice_count: invoices.len() as u64,
            low_stock_count: low_stock.len() as u64,
            low_stock: low_stock.into_iter().take(LOW_STOCK_SHOWN).collect(),
            revenue,
            outstanding,
            recent_invoices: invoices.into_iter().take(RECENT_INVOICES).collect(),
        })
    }
}
