//! Product endpoints

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::http::middleware::AuthenticatedSeller;
use crate::http::routes::AppError;
use crate::store::products::{Product, ProductFilter, ProductUpdate};
use crate::store::Page;
use crate::usecases::add_product::{AddProductInput, AddedProduct};

/// Query string for `GET /api/products`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    search: Option<String>,
    category: Option<String>,
    /// Only products at or below the seller's low-stock threshold
    #[serde(default)]
    low_stock: bool,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Product>>, AppError> {
    let max_stock = if params.low_stock {
        let settings = state.settings.get_settings(&auth.seller_id).await?;
        Some(settings.low_stock_threshold)
    } else {
        None
    };

    let filter = ProductFilter {
        search: params.search,
        category: params.category,
        max_stock,
        limit: params.limit,
        offset: params.offset,
    };
    Ok(Json(state.products.list_products(&auth.seller_id, &filter).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<AddProductInput>,
) -> Result<(StatusCode, Json<AddedProduct>), AppError> {
    let added = state.add_product.execute(&auth.seller_id, req).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .products
        .get_product(&auth.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, AppError> {
    req.validate()?;
    if req.price.is_some_and(|p| p.is_sign_negative())
        || req.cost_price.is_some_and(|p| p.is_sign_negative())
    {
        return Err(AppError::BadRequest("price: must not be negative".to_string()));
    }
    if let Some(sku) = req.sku.as_deref() {
        let existing = state.products.find_by_sku(&auth.seller_id, sku).await?;
        if existing.is_some_and(|p| p.id != id) {
            return Err(AppError::Conflict(format!("SKU {} is already in use", sku)));
        }
    }

    let product = state
        .products
        .update_product(&auth.seller_id, &id, req)
        .await
        .map_err(not_found)?;
    Ok(Json(product))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .products
        .delete_product(&auth.seller_id, &id)
        .await
        .map_err(not_found)?;
    Ok(StatusCode::NO_CONTENT)
}

fn not_found(err: crate::store::StoreError) -> AppError {
    match err {
        crate::store::StoreError::NotFound => AppError::NotFound("Product not found".to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::ai::testing::ScriptedAi;
    use crate::ai::AiService;
    use crate::http::routes::tests::{register, send, test_router};

    #[tokio::test]
    async fn test_product_crud() {
        let router = test_router(None);
        let token = register(&router, "a@example.com").await;

        let (status, created) = send(
            &router,
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Masala Chai", "price": 120, "stock": 40 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
        assert_eq!(created["aiEnriched"], false);
        let id = created["id"].as_str().unwrap().to_string();
        assert!(created["sku"].as_str().unwrap().starts_with("MAS-"));

        let (status, body) = send(
            &router,
            "PATCH",
            &format!("/api/products/{}", id),
            Some(&token),
            Some(json!({ "description": "Strong and spiced.", "stock": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["descriptionSource"], "user");
        assert_eq!(body["stock"], 2);

        let (status, body) = send(
            &router,
            "GET",
            "/api/products?lowStock=true",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);

        let (status, _) =
            send(&router, "DELETE", &format!("/api/products/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) =
            send(&router, "GET", &format!("/api/products/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_products_are_scoped_to_seller() {
        let router = test_router(None);
        let owner = register(&router, "owner@example.com").await;
        let other = register(&router, "other@example.com").await;

        let (_, created) = send(
            &router,
            "POST",
            "/api/products",
            Some(&owner),
            Some(json!({ "name": "Chai", "sku": "CHAI-1", "price": 10 })),
        )
        .await;
        let uri = format!("/api/products/{}", created["id"].as_str().unwrap());

        let (status, _) = send(&router, "GET", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&router, "DELETE", &uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&router, "GET", "/api/products", Some(&other), None).await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let router = test_router(None);
        let token = register(&router, "a@example.com").await;

        let (status, _) = send(
            &router,
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({ "name": "", "price": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &router,
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({ "name": "Chai", "price": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_enriched_creation_counts_against_ai_quota() {
        let answer = r#"{"category": "Beverages", "description": "Spiced tea.", "tags": ["tea"]}"#;
        let ai: Arc<dyn AiService> = Arc::new(ScriptedAi::answering(&[answer, answer, answer]));
        let router = test_router(Some(ai));
        let token = register(&router, "a@example.com").await;

        let mut enriched = Vec::new();
        for _ in 0..3 {
            let (status, body) = send(
                &router,
                "POST",
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Masala Chai", "price": 120, "enrich": true })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{}", body);
            enriched.push(body["aiEnriched"].as_bool().unwrap());
        }
        // Test config allows two AI calls per minute
        assert_eq!(enriched, vec![true, true, false]);

        let (status, _) = send(
            &router,
            "POST",
            "/api/ai/description",
            Some(&token),
            Some(json!({ "name": "Masala Chai" })),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
}
