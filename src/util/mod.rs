//! Shared helpers

pub mod codes;
pub mod rate_limit;
pub mod time;
