//! Dashboard endpoint

use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::app::AppState;
use crate::http::middleware::AuthenticatedSeller;
use crate::http::routes::AppError;
use crate::usecases::dashboard::DashboardSummary;

pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSeller>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.dashboard.summary(&auth.seller_id).await?))
}
