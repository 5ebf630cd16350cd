//! Middleware components
//!
//! This module contains middleware for:
//! - Session tokens and the session extractor
//! - The page request gate

pub mod gate;
pub mod session;

pub use gate::gate_middleware;
pub use session::{SessionState, SessionUser};
