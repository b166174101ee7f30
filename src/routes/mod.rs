//! HTTP routes for Gradeway

pub mod health;
pub mod jwks;
pub mod launch;
pub mod login;

pub use health::{health_check, version_info};
pub use jwks::handle_jwks;
pub use launch::handle_launch;
pub use login::handle_login;
