//! Seller registration and login

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::UseCaseError;
use crate::store::document::IdentityProvider;
use crate::store::sellers::{NewSeller, Seller};
use crate::store::settings::SellerSettings;
use crate::store::{SellerStore, SettingsStore, StoreError};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSellerInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
    #[validate(length(min = 1, max = 128))]
    pub business_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 512))]
    pub address: Option<String>,
    #[validate(length(max = 64))]
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Clone)]
pub struct RegisterSellerUseCase {
    identity: Arc<dyn IdentityProvider>,
    sellers: SellerStore,
    settings: SettingsStore,
}

impl RegisterSellerUseCase {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        sellers: SellerStore,
        settings: SettingsStore,
    ) -> Self {
        Self {
            identity,
            sellers,
            settings,
        }
    }

    /// Create the account, the seller profile and default settings
    pub async fn register(&self, mut input: RegisterSellerInput) -> Result<Seller, UseCaseError> {
        input.email = input.email.trim().to_lowercase();
        input.validate()?;
        let email = input.email.clone();

        let account = self
            .identity
            .create_account(&email, &input.password, &input.name)
            .await
            .map_err(|e| match e {
                StoreError::Conflict => {
                    UseCaseError::Conflict("An account with this email already exists".to_string())
                }
                other => other.into(),
            })?;

        let seller = self
            .sellers
            .create_seller(
                &account.user_id,
                &NewSeller {
                    name: input.name,
                    email,
                    business_name: input.business_name,
                    phone: input.phone,
                    address: input.address,
                    tax_id: input.tax_id,
                },
            )
            .await?;

        // Missing settings read back as defaults, so this is not fatal
        if let Err(e) = self
            .settings
            .save_settings(&SellerSettings::defaults(&seller.id))
            .await
        {
            warn!(seller_id = %seller.id, error = %e, "Failed to store default settings");
        }

        info!(seller_id = %seller.id, "Seller registered");
        Ok(seller)
    }

    /// Check credentials and load the seller profile
    pub async fn login(&self, mut input: LoginInput) -> Result<Seller, UseCaseError> {
        input.email = input.email.trim().to_lowercase();
        input.validate()?;

        let account = self
            .identity
            .verify_credentials(&input.email, &input.password)
            .await?
            .ok_or(UseCaseError::InvalidCredentials)?;

        self.sellers
            .get_seller(&account.user_id)
            .await?
            .ok_or(UseCaseError::NotFound("Seller"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::DocumentStore;

    fn use_case(store: Arc<MemoryStore>) -> RegisterSellerUseCase {
        let documents: Arc<dyn DocumentStore> = store.clone();
        RegisterSellerUseCase::new(
            store,
            SellerStore::new(documents.clone()),
            SettingsStore::new(documents),
        )
    }

    fn input(email: &str) -> RegisterSellerInput {
        RegisterSellerInput {
            name: "Meera".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            business_name: "Meera Textiles".to_string(),
            phone: None,
            address: None,
            tax_id: Some("29ABCDE1234F1Z5".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = Arc::new(MemoryStore::new());
        let sellers = use_case(store.clone());

        let seller = sellers.register(input(" Meera@Example.com ")).await.unwrap();
        assert_eq!(seller.email, "meera@example.com");

        let settings = SettingsStore::new(store.clone())
            .get_settings(&seller.id)
            .await
            .unwrap();
        assert_eq!(settings.invoice_prefix, "INV");

        let logged_in = sellers
            .login(LoginInput {
                email: "  MEERA@example.com\n".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, seller.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let sellers = use_case(Arc::new(MemoryStore::new()));
        sellers.register(input("a@example.com")).await.unwrap();
        let err = sellers.register(input("a@example.com")).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let sellers = use_case(Arc::new(MemoryStore::new()));
        sellers.register(input("a@example.com")).await.unwrap();
        let err = sellers
            .login(LoginInput {
                email: "a@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UseCaseError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_short_password_is_validation_error() {
        let sellers = use_case(Arc::new(MemoryStore::new()));
        let mut bad = input("a@example.com");
        bad.password = "short".to_string();
        let err = sellers.register(bad).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(msg) if msg.contains("password")));
    }

    #[tokio::test]
    async fn test_settings_failure_does_not_block_registration() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes_to("seller_settings");
        let seller = use_case(store).register(input("a@example.com")).await;
        assert!(seller.is_ok());
    }
}
