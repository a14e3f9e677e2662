//! Invoice creation, payment tracking and listing
//!
//! Creating an invoice has two side effects: product stock goes down and the
//! customer's running spend goes up. Both happen after the invoice is stored,
//! and a failure in either is logged and otherwise ignored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::UseCaseError;
use crate::store::customers::Customer;
use crate::store::invoices::{Invoice, InvoiceFilter, LineItem, NewInvoice, PaymentStatus};
use crate::store::{CustomerStore, InvoiceStore, Page, ProductStore, SettingsStore};
use crate::util::codes::invoice_number;

/// Attempts at finding an unused invoice number
const NUMBER_ATTEMPTS: usize = 5;
/// Largest unit price accepted on one line
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
const WALK_IN_CUSTOMER: &str = "Walk-in customer";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub product_id: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub sku: Option<String>,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i64,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceInput {
    pub customer_id: Option<String>,
    #[validate(length(max = 128))]
    pub customer_name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub items: Vec<LineItemInput>,
    pub discount: Option<Decimal>,
    /// Overrides the seller's configured tax rate
    pub tax_rate: Option<Decimal>,
    pub tax_inclusive: Option<bool>,
    pub amount_paid: Option<Decimal>,
    #[validate(length(max = 32))]
    pub payment_method: Option<String>,
    #[validate(length(max = 2048))]
    pub notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentInput {
    pub status: Option<PaymentStatus>,
    pub amount_paid: Option<Decimal>,
}

/// Computed invoice amounts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
}

/// Status implied by how much of the total has been paid
pub fn status_for(total: Decimal, paid: Decimal) -> PaymentStatus {
    if paid >= total {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

fn overflow() -> UseCaseError {
    UseCaseError::Validation("items: invoice amount is too large".to_string())
}

/// Line totals, discount, tax and payment status, rounded to 2 places.
/// With inclusive tax the prices already contain it and the total is unchanged.
pub fn compute_totals(
    items: &[LineItemInput],
    discount: Decimal,
    tax_rate: Decimal,
    tax_inclusive: bool,
    amount_paid: Decimal,
) -> Result<Totals, UseCaseError> {
    if tax_rate.is_sign_negative() || tax_rate > Decimal::ONE_HUNDRED {
        return Err(UseCaseError::Validation(
            "taxRate: must be between 0 and 100".to_string(),
        ));
    }

    let items: Vec<LineItem> = items
        .iter()
        .map(|item| {
            let line_total = item
                .unit_price
                .checked_mul(Decimal::from(item.quantity))
                .ok_or_else(overflow)?;
            Ok(LineItem {
                product_id: item.product_id.clone().filter(|id| !id.is_empty()),
                name: item.name.trim().to_string(),
                sku: item.sku.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price.round_dp(2),
                line_total: line_total.round_dp(2),
            })
        })
        .collect::<Result<_, UseCaseError>>()?;

    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.line_total))
        .ok_or_else(overflow)?;
    let discount = discount.round_dp(2).max(Decimal::ZERO).min(subtotal);
    let taxable = subtotal - discount;
    let rate = tax_rate / Decimal::ONE_HUNDRED;

    let (tax_amount, total) = if tax_inclusive {
        let tax = (taxable - taxable / (Decimal::ONE + rate)).round_dp(2);
        (tax, taxable)
    } else {
        let tax = taxable.checked_mul(rate).ok_or_else(overflow)?.round_dp(2);
        (tax, taxable.checked_add(tax).ok_or_else(overflow)?)
    };

    let amount_paid = amount_paid.round_dp(2).max(Decimal::ZERO).min(total);

    Ok(Totals {
        items,
        subtotal,
        discount,
        tax_rate,
        tax_amount,
        total,
        amount_paid,
        payment_status: status_for(total, amount_paid),
    })
}

#[derive(Clone)]
pub struct ManageInvoicesUseCase {
    invoices: InvoiceStore,
    products: ProductStore,
    customers: CustomerStore,
    settings: SettingsStore,
}

impl ManageInvoicesUseCase {
    pub fn new(
        invoices: InvoiceStore,
        products: ProductStore,
        customers: CustomerStore,
        settings: SettingsStore,
    ) -> Self {
        Self {
            invoices,
            products,
            customers,
            settings,
        }
    }

    pub async fn create_invoice(
        &self,
        seller_id: &str,
        input: CreateInvoiceInput,
    ) -> Result<Invoice, UseCaseError> {
        input.validate()?;
        for (index, item) in input.items.iter().enumerate() {
            item.validate()
                .map_err(|e| UseCaseError::Validation(format!("items[{}]: {}", index, super::validation_message(&e))))?;
            if item.unit_price.is_sign_negative() || item.unit_price > MAX_UNIT_PRICE {
                return Err(UseCaseError::Validation(format!(
                    "items[{}]: unitPrice must be between 0 and {}",
                    index, MAX_UNIT_PRICE
                )));
            }
        }

        let settings = self.settings.get_settings(seller_id).await?;

        let customer = match input.customer_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => Some(
                self.customers
                    .get_customer(seller_id, id)
                    .await?
                    .ok_or(UseCaseError::NotFound("Customer"))?,
            ),
            None => None,
        };
        let customer_name = customer
            .as_ref()
            .map(|c| c.name.clone())
            .or(input.customer_name.clone().filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| WALK_IN_CUSTOMER.to_string());

        let totals = compute_totals(
            &input.items,
            input.discount.unwrap_or(Decimal::ZERO),
            input.tax_rate.unwrap_or(settings.tax_rate),
            input.tax_inclusive.unwrap_or(settings.tax_inclusive),
            input.amount_paid.unwrap_or(Decimal::ZERO),
        )?;

        let issued_at = Utc::now();
        let number = self
            .allocate_number(seller_id, &settings.invoice_prefix, issued_at)
            .await?;

        let invoice = self
            .invoices
            .create_invoice(&NewInvoice {
                seller_id: seller_id.to_string(),
                invoice_number: number,
                customer_id: customer.as_ref().map(|c| c.id.clone()),
                customer_name,
                items: totals.items,
                subtotal: totals.subtotal,
                discount: totals.discount,
                tax_rate: totals.tax_rate,
                tax_amount: totals.tax_amount,
                total: totals.total,
                amount_paid: totals.amount_paid,
                payment_status: totals.payment_status,
                payment_method: input.payment_method,
                notes: input.notes,
                due_date: input.due_date,
                issued_at,
            })
            .await?;

        info!(
            seller_id,
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %invoice.total,
            "Invoice created"
        );

        self.decrement_stock(seller_id, &invoice).await;
        if let Some(customer) = customer {
            self.record_spend(&customer, &invoice).await;
        }

        Ok(invoice)
    }

    async fn allocate_number(
        &self,
        seller_id: &str,
        prefix: &str,
        date: DateTime<Utc>,
    ) -> Result<String, UseCaseError> {
        for _ in 0..NUMBER_ATTEMPTS {
            let number = invoice_number(prefix, date);
            if !self.invoices.number_taken(seller_id, &number).await? {
                return Ok(number);
            }
        }
        Err(UseCaseError::Conflict(
            "Could not allocate an invoice number, try again".to_string(),
        ))
    }

    /// Best-effort; stock never goes below zero
    async fn decrement_stock(&self, seller_id: &str, invoice: &Invoice) {
        for item in &invoice.items {
            let Some(product_id) = item.product_id.as_deref() else {
                continue;
            };

            let product = match self.products.get_product(seller_id, product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    warn!(invoice_id = %invoice.id, product_id, "Invoiced product not found, stock unchanged");
                    continue;
                }
                Err(e) => {
                    warn!(invoice_id = %invoice.id, product_id, error = %e, "Failed to load product for stock update");
                    continue;
                }
            };

            let remaining = product.stock - item.quantity;
            if remaining < 0 {
                warn!(
                    invoice_id = %invoice.id,
                    product_id,
                    stock = product.stock,
                    sold = item.quantity,
                    "Sold more than in stock"
                );
            }

            if let Err(e) = self.products.set_stock(product_id, remaining.max(0)).await {
                warn!(invoice_id = %invoice.id, product_id, error = %e, "Failed to decrement stock");
            }
        }
    }

    /// Best-effort
    async fn record_spend(&self, customer: &Customer, invoice: &Invoice) {
        if let Err(e) = self
            .customers
            .record_purchase(customer, invoice.total, invoice.issued_at)
            .await
        {
            warn!(
                invoice_id = %invoice.id,
                customer_id = %customer.id,
                error = %e,
                "Failed to update customer spend"
            );
        }
    }

    pub async fn get_invoice(&self, seller_id: &str, invoice_id: &str) -> Result<Invoice, UseCaseError> {
        self.invoices
            .get_invoice(seller_id, invoice_id)
            .await?
            .ok_or(UseCaseError::NotFound("Invoice"))
    }

    pub async fn list_invoices(
        &self,
        seller_id: &str,
        filter: &InvoiceFilter,
    ) -> Result<Page<Invoice>, UseCaseError> {
        Ok(self.invoices.list_invoices(seller_id, filter).await?)
    }

    /// Record a payment or cancel. Marking paid without an amount settles the total.
    pub async fn update_payment(
        &self,
        seller_id: &str,
        invoice_id: &str,
        input: UpdatePaymentInput,
    ) -> Result<Invoice, UseCaseError> {
        let invoice = self.get_invoice(seller_id, invoice_id).await?;

        if input.amount_paid.is_some_and(|a| a.is_sign_negative()) {
            return Err(UseCaseError::Validation(
                "amountPaid: must not be negative".to_string(),
            ));
        }

        let (status, amount_paid) = match input.status {
            Some(PaymentStatus::Cancelled) => (PaymentStatus::Cancelled, invoice.amount_paid),
            Some(PaymentStatus::Paid) if input.amount_paid.is_none() => {
                (PaymentStatus::Paid, invoice.total)
            }
            _ => {
                let paid = input
                    .amount_paid
                    .unwrap_or(invoice.amount_paid)
                    .round_dp(2)
                    .min(invoice.total);
                (status_for(invoice.total, paid), paid)
            }
        };

        let updated = self.invoices.update_payment(invoice_id, status, amount_paid).await?;
        info!(
            seller_id,
            invoice_id,
            status = status.as_str(),
            amount_paid = %amount_paid,
            "Invoice payment updated"
        );
        Ok(updated)
    }

    /// Delete an invoice. Stock and customer totals are not restored.
    pub async fn delete_invoice(&self, seller_id: &str, invoice_id: &str) -> Result<(), UseCaseError> {
        self.invoices
            .delete_invoice(seller_id, invoice_id)
            .await
            .map_err(|e| match e {
                crate::store::StoreError::NotFound => UseCaseError::NotFound("Invoice"),
                other => other.into(),
            })
    }
}
