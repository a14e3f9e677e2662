//! Invoice endpoints

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::app::AppState;
use crate::http::middleware::AuthenticatedSeller;
use crate::http::routes::AppError;
use crate::store::invoices::{Invoice, InvoiceFilter};
use crate::store::Page;
use crate::usecases::manage_invoices::{CreateInvoiceInput, UpdatePaymentInput};

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<Json<Page<Invoice>>, AppError> {
    Ok(Json(
        state
            .manage_invoices
            .list_invoices(&auth.seller_id, &filter)
            .await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Json(req): Json<CreateInvoiceInput>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let invoice = state
        .manage_invoices
        .create_invoice(&auth.seller_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(
        state.manage_invoices.get_invoice(&auth.seller_id, &id).await?,
    ))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentInput>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(
        state
            .manage_invoices
            .update_payment(&auth.seller_id, &id, req)
            .await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .manage_invoices
        .delete_invoice(&auth.seller_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
