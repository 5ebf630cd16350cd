//! Shared utilities

pub mod error;
pub mod extract;

pub use error::{AppError, AppResult, ErrorResponse};
pub use extract::ValidatedJson;
