//! Application state shared across routes

use std::sync::Arc;

use crate::ai::{self, AiService};
use crate::config::Config;
use crate::store::{
    AppwriteClient, CustomerStore, DocumentStore, IdentityProvider, InvoiceStore, ProductStore,
    SellerStore, SettingsStore,
};
use crate::usecases::{
    AddProductUseCase, DashboardUseCase, ManageInvoicesUseCase, RegisterSellerUseCase,
};
use crate::util::rate_limit::SellerRateLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sellers: SellerStore,
    pub settings: SettingsStore,
    pub products: ProductStore,
    pub customers: CustomerStore,
    pub register_seller: RegisterSellerUseCase,
    pub add_product: AddProductUseCase,
    pub manage_invoices: ManageInvoicesUseCase,
    pub dashboard: DashboardUseCase,
    /// `None` when no provider key is configured
    pub ai: Option<Arc<dyn AiService>>,
    pub ai_limiter: SellerRateLimiter,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let appwrite = Arc::new(AppwriteClient::new(&config));
        let ai = ai::from_config(&config);
        Self::from_parts(config, appwrite.clone(), appwrite, ai)
    }

    /// Wire stores and use-cases over any document store and identity provider
    pub fn from_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        ai: Option<Arc<dyn AiService>>,
    ) -> Self {
        let config = Arc::new(config);

        // Initialize stores
        let sellers = SellerStore::new(store.clone());
        let settings = SettingsStore::new(store.clone());
        let products = ProductStore::new(store.clone());
        let customers = CustomerStore::new(store.clone());
        let invoices = InvoiceStore::new(store);

        // Initialize use-cases
        let register_seller =
            RegisterSellerUseCase::new(identity, sellers.clone(), settings.clone());
        let ai_limiter = SellerRateLimiter::per_minute(config.ai_rate_limit_per_minute);
        let add_product = AddProductUseCase::new(
            products.clone(),
            settings.clone(),
            ai.clone(),
            ai_limiter.clone(),
        );
        let manage_invoices = ManageInvoicesUseCase::new(
            invoices.clone(),
            products.clone(),
            customers.clone(),
            settings.clone(),
        );
        let dashboard = DashboardUseCase::new(
            products.clone(),
            customers.clone(),
            invoices,
            settings.clone(),
        );

        Self {
            config,
            sellers,
            settings,
            products,
            customers,
            register_seller,
            add_product,
            manage_invoices,
            dashboard,
            ai,
            ai_limiter,
        }
    }
}
