//! Seller account, profile and settings endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::http::middleware::{sign_jwt, AuthenticatedSeller};
use crate::http::routes::AppError;
use crate::store::sellers::{Seller, SellerUpdate};
use crate::store::settings::{CustomField, SellerSettings};
use crate::usecases::register_seller::{LoginInput, RegisterSellerInput};

#[derive(Serialize)]
pub struct AuthResponse {
    seller: Seller,
    token: String,
}

fn issue_token(state: &AppState, seller: Seller) -> Result<AuthResponse, AppError> {
    let token = sign_jwt(
        &seller.id,
        Some(&seller.email),
        state.config.token_ttl,
        &state.config.jwt_secret,
    )?;
    Ok(AuthResponse { seller, token })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterSellerInput>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let seller = state.register_seller.register(req).await?;
    Ok((StatusCode::CREATED, Json(issue_token(&state, seller)?)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginInput>,
) -> Result<Json<AuthResponse>, AppError> {
    let seller = state.register_seller.login(req).await?;
    Ok(Json(issue_token(&state, seller)?))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
) -> Result<Json<Seller>, AppError> {
    let seller = state
        .sellers
        .get_seller(&auth.seller_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Seller not found".to_string()))?;
    Ok(Json(seller))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<SellerUpdate>,
) -> Result<Json<Seller>, AppError> {
    req.validate()?;
    let seller = state.sellers.update_seller(&auth.seller_id, &req).await?;
    Ok(Json(seller))
}

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
) -> Result<Json<SellerSettings>, AppError> {
    Ok(Json(state.settings.get_settings(&auth.seller_id).await?))
}

/// Full replacement of a seller's settings
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    #[serde(default)]
    pub enabled_fields: Vec<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub custom_fields: Vec<CustomField>,
    pub tax_rate: Decimal,
    #[serde(default)]
    pub tax_inclusive: bool,
    #[validate(length(equal = 3))]
    pub currency: String,
    #[validate(length(min = 1, max = 12))]
    pub invoice_prefix: String,
    #[validate(range(min = 0))]
    pub low_stock_threshold: i64,
}

pub async fn save_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<SettingsInput>,
) -> Result<Json<SellerSettings>, AppError> {
    req.validate()?;
    if req.tax_rate.is_sign_negative() || req.tax_rate > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(
            "taxRate: must be between 0 and 100".to_string(),
        ));
    }
    if req.custom_fields.iter().any(|f| f.key.trim().is_empty()) {
        return Err(AppError::BadRequest("customFields: key is required".to_string()));
    }

    let settings = SellerSettings {
        seller_id: auth.seller_id,
        enabled_fields: req.enabled_fields,
        custom_fields: req.custom_fields,
        tax_rate: req.tax_rate,
        tax_inclusive: req.tax_inclusive,
        currency: req.currency.to_uppercase(),
        invoice_prefix: req.invoice_prefix.trim().to_string(),
        low_stock_threshold: req.low_stock_threshold,
    };
    Ok(Json(state.settings.save_settings(&settings).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::http::routes::tests::{register, send, test_router};

    #[tokio::test]
    async fn test_register_login_and_profile() {
        let router = test_router(None);
        register(&router, "meera@example.com").await;

        let (status, body) = send(
            &router,
            "POST",
            "/api/sellers/login",
            None,
            Some(json!({ "email": "meera@example.com", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&router, "GET", "/api/sellers/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["businessName"], "Meera Textiles");

        let (status, body) = send(
            &router,
            "PATCH",
            "/api/sellers/me",
            Some(&token),
            Some(json!({ "phone": "+91 98765 43210" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phone"], "+91 98765 43210");
        assert_eq!(body["name"], "Meera");
    }

    #[tokio::test]
    async fn test_duplicate_registration_and_bad_login() {
        let router = test_router(None);
        register(&router, "a@example.com").await;

        let (status, _) = send(
            &router,
            "POST",
            "/api/sellers/register",
            None,
            Some(json!({
                "name": "Other",
                "email": "a@example.com",
                "password": "long enough",
                "businessName": "Other Shop"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &router,
            "POST",
            "/api/sellers/login",
            None,
            Some(json!({ "email": "a@example.com", "password": "wrong password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let router = test_router(None);
        let token = register(&router, "a@example.com").await;

        let (status, body) =
            send(&router, "GET", "/api/sellers/me/settings", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currency"], "INR");

        let (status, body) = send(
            &router,
            "PUT",
            "/api/sellers/me/settings",
            Some(&token),
            Some(json!({
                "enabledFields": ["category"],
                "customFields": [{ "key": "fabric", "label": "Fabric", "fieldType": "text" }],
                "taxRate": 18,
                "taxInclusive": true,
                "currency": "usd",
                "invoicePrefix": "MT",
                "lowStockThreshold": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["customFields"][0]["key"], "fabric");

        let (status, _) = send(
            &router,
            "PUT",
            "/api/sellers/me/settings",
            Some(&token),
            Some(json!({
                "taxRate": 150,
                "currency": "INR",
                "invoicePrefix": "MT",
                "lowStockThreshold": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
