//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One listener, one
//! connection task per accept, manual routing over (method, path).

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Args;
use crate::lrs::LrsClient;
use crate::lti::launch::LaunchVerifier;
use crate::passback::PassbackClient;
use crate::report::{HeuristicMatcher, MatchStrategy};
use crate::routes;
use crate::session::SessionStore;
use crate::types::Result;

const SESSION_PURGE_INTERVAL_SECONDS: u64 = 60;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub sessions: SessionStore,
    pub verifier: LaunchVerifier,
    pub lrs: LrsClient,
    pub passback: PassbackClient,
    pub matcher: Box<dyn MatchStrategy>,
}

impl AppState {
    pub fn new(args: Args) -> Self {
        let sessions = SessionStore::new(args.session_lifetime_seconds);
        let verifier = LaunchVerifier::new(&args);
        let lrs = LrsClient::new(&args);
        let passback = PassbackClient::new(&args);

        Self {
            args,
            sessions,
            verifier,
            lrs,
            passback,
            matcher: Box::new(HeuristicMatcher),
        }
    }
}

fn spawn_session_purge_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECONDS));
        loop {
            interval.tick().await;
            let purged = state.sessions.purge_expired();
            if purged > 0 {
                debug!("purged {} expired sessions", purged);
            }
        }
    });
}

pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Gradeway listening on {}", state.args.listen);
    if state.args.lti13_configured() {
        info!(
            "LTI 1.3 enabled for issuer {}",
            state.args.lti13_issuer.as_deref().unwrap_or_default()
        );
    } else {
        info!("LTI 1.3 not configured; accepting LTI 1.1 launches only");
    }

    spawn_session_purge_task(Arc::clone(&state));

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probes
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // Tool public keyset for LTI 1.3 platforms
        (Method::GET, "/lti13/jwks") | (Method::GET, "/.well-known/jwks.json") => {
            routes::handle_jwks(Arc::clone(&state))
        }

        // OIDC third-party login initiation
        (Method::GET, "/lti13/login") | (Method::POST, "/lti13/login") => {
            return routes::handle_login(req, state).await;
        }

        // Launch endpoint: the root plus the configured entry path, so LMSes
        // registered against either URL land in the same handler
        (Method::GET, p) | (Method::POST, p)
            if p == "/" || p == state.args.tool_entry_path =>
        {
            return routes::handle_launch(req, state).await;
        }

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        _ => not_found_response(&path),
    };

    Ok(response)
}

fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
