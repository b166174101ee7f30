//! LTI 1.3 OIDC login initiation endpoint
//!
//! Accepts the platform's third-party login request (GET query or POST form)
//! and answers with a 302 to the platform's authorization endpoint. The
//! generated state/nonce is stashed in a fresh session, carried back to the
//! browser via the session cookie.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{info, warn};

use crate::lti::login::{build_authorization_redirect, LoginRequest};
use crate::routes::launch::session_cookie;
use crate::server::AppState;

/// Handle GET/POST /lti13/login
pub async fn handle_login(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let encoded = match *req.method() {
        Method::GET => req.uri().query().unwrap_or_default().to_string(),
        _ => {
            let body = req.collect().await?.to_bytes();
            String::from_utf8_lossy(&body).into_owned()
        }
    };

    let login: LoginRequest = match serde_urlencoded::from_str(&encoded) {
        Ok(login) => login,
        Err(e) => {
            warn!("login initiation with bad parameters: {}", e);
            return Ok(bad_request(&format!("Invalid login request: {}", e)));
        }
    };

    let (redirect, stash) = match build_authorization_redirect(&state.args, &login) {
        Ok(result) => result,
        Err(e) => {
            warn!("login initiation failed: {}", e);
            return Ok(bad_request(&e.to_string()));
        }
    };

    let session_id = state.sessions.create();
    state.sessions.put_login(&session_id, stash);
    info!("OIDC login initiated for issuer {}", login.iss);

    Ok(Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", redirect)
        .header("Set-Cookie", session_cookie(&session_id))
        .body(Full::new(Bytes::new()))
        .unwrap())
}

fn bad_request(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Login Error",
        "message": message,
    });
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
