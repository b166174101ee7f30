//! LTI protocol support
//!
//! Covers both generations of the launch protocol:
//! - LTI 1.1: OAuth 1.0a signed form POST
//! - LTI 1.3: OIDC third-party login + JWT launch, with JWKS publication

pub mod jwks;
pub mod launch;
pub mod login;
pub mod oauth1;

pub use jwks::{keyset_from_pem, Jwk, Jwks};
pub use launch::{GradePassback, LaunchContext, LaunchRejection, LaunchVerifier, LtiVersion};
pub use login::{build_authorization_redirect, LoginRequest, LoginStash};
pub use oauth1::{authorization_header, body_hash, percent_encode, sign_params};
