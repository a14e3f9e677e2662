//! AI assistant endpoints
//!
//! Every route here needs a configured provider and counts against the
//! seller's per-minute AI quota.

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

use crate::ai::{AiService, PriceSuggestion, ProductContext, ProductDraft, ProductEnrichment};
use crate::app::AppState;
use crate::http::middleware::AuthenticatedSeller;
use crate::http::routes::AppError;
use crate::usecases::UseCaseError;

/// Provider for this request, after the quota check
fn provider(state: &AppState, seller_id: &str) -> Result<Arc<dyn AiService>, AppError> {
    let ai = state.ai.clone().ok_or(UseCaseError::AiUnavailable)?;
    if !state.ai_limiter.check(seller_id) {
        warn!(seller_id, "AI rate limit exceeded");
        return Err(AppError::TooManyRequests);
    }
    Ok(ai)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(max = 128))]
    pub category: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: std::collections::BTreeMap<String, String>,
    /// Defaults to the seller's configured currency
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
}

impl ProductRequest {
    fn context(&self) -> ProductContext {
        ProductContext {
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct DescriptionResponse {
    description: String,
}

pub async fn description(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<DescriptionResponse>, AppError> {
    req.validate()?;
    let ai = provider(&state, &auth.seller_id)?;
    let description = ai
        .generate_description(&req.context())
        .await
        .map_err(UseCaseError::from)?;
    Ok(Json(DescriptionResponse { description }))
}

pub async fn price(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<PriceSuggestion>, AppError> {
    req.validate()?;
    let ai = provider(&state, &auth.seller_id)?;
    let currency = match req.currency.as_deref() {
        Some(currency) => currency.to_uppercase(),
        None => state.settings.get_settings(&auth.seller_id).await?.currency,
    };
    let suggestion = ai
        .suggest_price(&req.context(), &currency)
        .await
        .map_err(UseCaseError::from)?;
    Ok(Json(suggestion))
}

pub async fn autofill(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ProductEnrichment>, AppError> {
    req.validate()?;
    let ai = provider(&state, &auth.seller_id)?;
    let fields = state
        .settings
        .get_settings(&auth.seller_id)
        .await?
        .fillable_fields();
    let enrichment = ai
        .auto_fill(&req.context(), &fields)
        .await
        .map_err(UseCaseError::from)?;
    Ok(Json(enrichment))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1, max = 20000))]
    pub text: String,
}

#[derive(Serialize)]
pub struct ImportResponse {
    products: Vec<ProductDraft>,
}

/// Parse pasted inventory text into product drafts for the seller to review
pub async fn import(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    req.validate()?;
    let ai = provider(&state, &auth.seller_id)?;
    let products = ai
        .extract_products(&req.text)
        .await
        .map_err(UseCaseError::from)?;
    debug!(seller_id = %auth.seller_id, count = products.len(), "Extracted product drafts");
    Ok(Json(ImportResponse { products }))
}
