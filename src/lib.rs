//! Gradeway - LTI gateway to xAPI learning records
//!
//! Gradeway authenticates LTI launches (1.1 OAuth and 1.3 OIDC), pulls a
//! learner's xAPI statements from a Learning Record Store, folds them into a
//! hierarchical progress report, and syncs a computed grade back to the LMS
//! gradebook.
//!
//! ## Services
//!
//! - **Launch**: LTI 1.1 / 1.3 launch verification and session establishment
//! - **Report**: statement aggregation into an activity tree with best scores
//! - **Passback**: grade transmission via LTI 1.1 Outcomes or 1.3 AGS
//! - **Login**: LTI 1.3 OIDC login initiation
//! - **Jwks**: tool public keyset for LTI Advantage platforms

pub mod config;
pub mod lrs;
pub mod lti;
pub mod passback;
pub mod report;
pub mod routes;
pub mod server;
pub mod session;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GradewayError, Result};
