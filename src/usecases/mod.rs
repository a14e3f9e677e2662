//! Orchestration of repository and AI calls

pub mod add_product;
pub mod dashboard;
pub mod manage_invoices;
pub mod register_seller;

pub use add_product::AddProductUseCase;
pub use dashboard::DashboardUseCase;
pub use manage_invoices::ManageInvoicesUseCase;
pub use register_seller::RegisterSellerUseCase;

use validator::ValidationErrors;

use crate::ai::AiError;
use crate::store::StoreError;

/// Use-case errors
#[derive(Debug, thiserror::Error)]
pub enum UseCaseError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("AI assistant is not configured")]
    AiUnavailable,

    #[error("AI request failed: {0}")]
    Ai(#[from] AiError),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationErrors> for UseCaseError {
    fn from(errors: ValidationErrors) -> Self {
        UseCaseError::Validation(validation_message(&errors))
    }
}

/// Flatten validator output into "field: code" pairs
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
            format!("{}: {}", field, codes.join(", "))
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
