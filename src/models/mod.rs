//! Data models

mod api_key;
mod auth;
mod summary;

pub use api_key::*;
pub use auth::*;
pub use summary::*;
