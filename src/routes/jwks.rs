//! Tool keyset endpoint
//!
//! `GET /lti13/jwks` (also served at `/.well-known/jwks.json`) publishes the
//! tool's RSA public keys so platforms can verify JWTs this tool signs.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;
use tracing::error;

use crate::lti::jwks::{keyset_from_pem, resolve_key_material, Jwks};
use crate::server::AppState;

/// Handle GET /lti13/jwks
pub fn handle_jwks(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let keyset = match resolve_key_material(state.args.lti13_private_key.as_deref()) {
        // No key configured: valid empty keyset
        Ok(None) => Jwks::empty(),
        Ok(Some(pem)) => match keyset_from_pem(&pem) {
            Ok(keyset) => keyset,
            Err(e) => {
                error!("keyset derivation failed: {}", e);
                return error_response("Invalid private key");
            }
        },
        Err(e) => {
            error!("could not read key material: {}", e);
            return error_response("Could not read private key");
        }
    };

    let body = serde_json::to_string(&keyset).unwrap_or_default();
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "public, max-age=3600")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn error_response(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message });
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
