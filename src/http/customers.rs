//! Customer endpoints

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
use crate::store::customers::{Customer, CustomerInput, CustomerUpdate};
use crate::store::invoices::{Invoice, InvoiceFilter};
use crate::store::{Page, StoreError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    search: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    limit: Option<u32>,
    offset: Option<u32>,
}

fn not_found(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::NotFound("Customer not found".to_string()),
        other => other.into(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Customer>>, AppError> {
    let page = state
        .customers
        .list_customers(
            &auth.seller_id,
            params.search.as_deref(),
            params.limit,
            params.offset,
        )
        .await?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    req.validate()?;
    let customer = state.customers.create_customer(&auth.seller_id, &req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    let customer = state
        .customers
        .get_customer(&auth.seller_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;
    Ok(Json(customer))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
    Json(req): Json<CustomerUpdate>,
) -> Result<Json<Customer>, AppError> {
    req.validate()?;
    let customer = state
        .customers
        .update_customer(&auth.seller_id, &id, &req)
        .await
        .map_err(not_found)?;
    Ok(Json(customer))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .customers
        .delete_customer(&auth.seller_id, &id)
        .await
        .map_err(not_found)?;
    Ok(StatusCode::NO_CONTENT)
}

/// A customer's purchase history, newest first
pub async fn invoices(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Invoice>>, AppError> {
    if state.customers.get_customer(&auth.seller_id, &id).await?.is_none() {
        return Err(AppError::NotFound("Customer not found".to_string()));
    }

    let filter = InvoiceFilter {
        status: None,
        customer_id: Some(id),
        limit: params.limit,
        offset: params.offset,
    };
    Ok(Json(
        state
            .manage_invoices
            .list_invoices(&auth.seller_id, &filter)
            .await?,
    ))
}
