//! Product creation with optional AI enrichment

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::UseCaseError;
use crate::ai::{AiService, ProductContext, ProductEnrichment};
use crate::store::products::{DescriptionSource, NewProduct, Product};
use crate::store::{ProductStore, SettingsStore};
use crate::util::codes::generate_sku;
use crate::util::rate_limit::SellerRateLimiter;

/// Attempts at finding an unused generated SKU
const SKU_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddProductInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 128))]
    pub category: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    /// May be left out when enrichment is requested
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i64,
    #[validate(length(max = 32))]
    pub unit: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_attributes: BTreeMap<String, String>,
    /// Ask the AI service to fill in whatever was left empty
    #[serde(default)]
    pub enrich: bool,
}

/// Created product and whether AI data went into it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub ai_enriched: bool,
}

#[derive(Clone)]
pub struct AddProductUseCase {
    products: ProductStore,
    settings: SettingsStore,
    ai: Option<Arc<dyn AiService>>,
    /// Shared with the AI routes so enrichment counts against the same quota
    ai_limiter: SellerRateLimiter,
}

impl AddProductUseCase {
    pub fn new(
        products: ProductStore,
        settings: SettingsStore,
        ai: Option<Arc<dyn AiService>>,
        ai_limiter: SellerRateLimiter,
    ) -> Self {
        Self {
            products,
            settings,
            ai,
            ai_limiter,
        }
    }

    pub async fn execute(
        &self,
        seller_id: &str,
        input: AddProductInput,
    ) -> Result<AddedProduct, UseCaseError> {
        input.validate()?;
        if input.price.is_none() && !input.enrich {
            return Err(UseCaseError::Validation("price: required".to_string()));
        }
        if input.price.is_some_and(|p| p.is_sign_negative())
            || input.cost_price.is_some_and(|p| p.is_sign_negative())
        {
            return Err(UseCaseError::Validation("price: must not be negative".to_string()));
        }

        let sku = self.resolve_sku(seller_id, input.sku.as_deref(), &input.name).await?;

        let enrichment = if input.enrich {
            self.enrich(seller_id, &input).await
        } else {
            None
        };
        let ai_enriched = enrichment.is_some();
        let product = merge(seller_id, sku, input, enrichment.unwrap_or_default());

        let created = self.products.create_product(&product).await?;
        info!(
            seller_id,
            product_id = %created.id,
            sku = %created.sku,
            ai_enriched,
            "Product created"
        );

        Ok(AddedProduct {
            product: created,
            ai_enriched,
        })
    }

    /// Caller's SKU if unused, otherwise a freshly generated one
    async fn resolve_sku(
        &self,
        seller_id: &str,
        requested: Option<&str>,
        name: &str,
    ) -> Result<String, UseCaseError> {
        if let Some(sku) = requested.map(str::trim).filter(|s| !s.is_empty()) {
            if self.products.find_by_sku(seller_id, sku).await?.is_some() {
                return Err(UseCaseError::Conflict(format!("SKU {} is already in use", sku)));
            }
            return Ok(sku.to_string());
        }

        for _ in 0..SKU_ATTEMPTS {
            let sku = generate_sku(name);
            if self.products.find_by_sku(seller_id, &sku).await?.is_none() {
                return Ok(sku);
            }
        }
        Err(UseCaseError::Conflict(
            "Could not generate a unique SKU, please supply one".to_string(),
        ))
    }

    /// Best-effort enrichment; any failure or a spent quota means "no enrichment"
    async fn enrich(&self, seller_id: &str, input: &AddProductInput) -> Option<ProductEnrichment> {
        let ai = self.ai.as_ref()?;
        if !self.ai_limiter.check(seller_id) {
            warn!(seller_id, "AI rate limit exceeded, creating product without enrichment");
            return None;
        }

        let fields = match self.settings.get_settings(seller_id).await {
            Ok(settings) => settings.fillable_fields(),
            Err(e) => {
                warn!(seller_id, error = %e, "Could not load settings for enrichment");
                Vec::new()
            }
        };

        let context = ProductContext {
            name: input.name.clone(),
            category: input.category.clone(),
            description: input.description.clone(),
            attributes: input.custom_attributes.clone(),
        };

        match ai.auto_fill(&context, &fields).await {
            Ok(enrichment) if !enrichment.is_empty() => Some(enrichment),
            Ok(_) => None,
            Err(e) => {
                warn!(seller_id, provider = %ai.provider(), error = %e, "AI enrichment failed, creating product without it");
                None
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Enrichment only fills what the seller left empty
fn merge(seller_id: &str, sku: String, input: AddProductInput, ai: ProductEnrichment) -> NewProduct {
    let user_description = non_blank(input.description);
    let (description, description_source) = match (user_description, non_blank(ai.description)) {
        (Some(text), _) => (Some(text), DescriptionSource::User),
        (None, Some(text)) => (Some(text), DescriptionSource::Ai),
        (None, None) => (None, DescriptionSource::None),
    };

    let mut custom_attributes = input.custom_attributes;
    for (key, value) in ai.attributes {
        custom_attributes.entry(key).or_insert(value);
    }

    let price = input
        .price
        .or(ai.suggested_price.filter(|p| !p.is_sign_negative()))
        .unwrap_or(Decimal::ZERO)
        .round_dp(2);

    NewProduct {
        seller_id: seller_id.to_string(),
        name: input.name.trim().to_string(),
        sku,
        category: non_blank(input.category).or(non_blank(ai.category)),
        description,
        description_source,
        price,
        cost_price: input.cost_price.map(|p| p.round_dp(2)),
        stock: input.stock,
        unit: non_blank(input.unit).or(non_blank(ai.unit)),
        tags: if input.tags.is_empty() { ai.tags } else { input.tags },
        custom_attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedAi;
    use crate::store::memory::MemoryStore;
    use crate::store::DocumentStore;
    use rust_decimal_macros::dec;

    fn use_case(ai: Option<Arc<dyn AiService>>) -> AddProductUseCase {
        limited_use_case(ai, 100)
    }

    fn limited_use_case(ai: Option<Arc<dyn AiService>>, per_minute: u32) -> AddProductUseCase {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        AddProductUseCase::new(
            ProductStore::new(store.clone()),
            SettingsStore::new(store),
            ai,
            SellerRateLimiter::per_minute(per_minute),
        )
    }

    fn input(name: &str) -> AddProductInput {
        AddProductInput {
            name: name.to_string(),
            price: Some(dec!(99)),
            stock: 5,
            ..Default::default()
        }
    }

    const AUTO_FILL: &str = r#"{"category": "Apparel", "description": "Breathable cotton kurta.",
        "tags": ["cotton"], "suggestedPrice": 899, "unit": "piece",
        "attributes": {"fabric": "cotton", "color": "blue"}}"#;

    #[tokio::test]
    async fn test_plain_product_gets_generated_sku() {
        let added = use_case(None).execute("s1", input("Masala Chai")).await.unwrap();
        assert!(added.product.sku.starts_with("MAS-"));
        assert!(!added.ai_enriched);
        assert_eq!(added.product.description_source, DescriptionSource::None);
    }

    #[tokio::test]
    async fn test_duplicate_sku_conflicts() {
        let products = use_case(None);
        let mut first = input("Chai");
        first.sku = Some("CHAI-1".to_string());
        products.execute("s1", first.clone()).await.unwrap();

        let err = products.execute("s1", first.clone()).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Conflict(_)));

        // Other sellers may reuse it
        assert!(products.execute("s2", first).await.is_ok());
    }

    #[tokio::test]
    async fn test_enrichment_fills_only_empty_fields() {
        let ai: Arc<dyn AiService> = Arc::new(ScriptedAi::answering(&[AUTO_FILL]));
        let mut request = input("Cotton Kurta");
        request.enrich = true;
        request.price = None;
        request.category = Some("Ethnic wear".to_string());
        request.custom_attributes.insert("color".to_string(), "red".to_string());

        let added = use_case(Some(ai)).execute("s1", request).await.unwrap();
        let product = added.product;
        assert!(added.ai_enriched);
        assert_eq!(product.category.as_deref(), Some("Ethnic wear"));
        assert_eq!(product.description_source, DescriptionSource::Ai);
        assert_eq!(product.price, dec!(899));
        assert_eq!(product.unit.as_deref(), Some("piece"));
        assert_eq!(product.custom_attributes["color"], "red");
        assert_eq!(product.custom_attributes["fabric"], "cotton");
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_plain_product() {
        let ai: Arc<dyn AiService> = Arc::new(ScriptedAi::failing());
        let mut request = input("Cotton Kurta");
        request.enrich = true;

        let added = use_case(Some(ai)).execute("s1", request).await.unwrap();
        assert!(!added.ai_enriched);
        assert_eq!(added.product.price, dec!(99));
        assert!(added.product.description.is_none());
    }

    #[tokio::test]
    async fn test_user_description_wins() {
        let ai: Arc<dyn AiService> = Arc::new(ScriptedAi::answering(&[AUTO_FILL]));
        let mut request = input("Cotton Kurta");
        request.enrich = true;
        request.description = Some("Hand-stitched.".to_string());

        let product = use_case(Some(ai)).execute("s1", request).await.unwrap().product;
        assert_eq!(product.description.as_deref(), Some("Hand-stitched."));
        assert_eq!(product.description_source, DescriptionSource::User);
    }

    #[tokio::test]
    async fn test_enrichment_respects_ai_quota() {
        let ai: Arc<dyn AiService> = Arc::new(ScriptedAi::answering(&[AUTO_FILL, AUTO_FILL]));
        let products = limited_use_case(Some(ai), 1);

        let mut request = input("Cotton Kurta");
        request.enrich = true;
        assert!(products.execute("s1", request.clone()).await.unwrap().ai_enriched);

        request.sku = Some("KURTA-2".to_string());
        let second = products.execute("s1", request.clone()).await.unwrap();
        assert!(!second.ai_enriched);
        assert_eq!(second.product.price, dec!(99));

        // Quota is per seller
        request.sku = None;
        assert!(products.execute("s2", request).await.unwrap().ai_enriched);
    }

    #[tokio::test]
    async fn test_price_required_without_enrichment() {
        let mut request = input("Chai");
        request.price = None;
        let err = use_case(None).execute("s1", request).await.unwrap_err();
        assert!(matches!(err, UseCaseError::Validation(_)));
    }
}
