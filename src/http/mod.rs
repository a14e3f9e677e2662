//! HTTP layer: router, auth middleware and handlers

pub mod ai;
pub mod customers;
pub mod dashboard;
pub mod invoices;
pub mod middleware;
pub mod products;
pub mod routes;
pub mod sellers;

pub use routes::build_router;
